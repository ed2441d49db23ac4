//! Services module - the editing engine for sshd configuration files.
//!
//! The pipeline for one file is:
//!
//! raw text → [`classifier`] → [`scope`] tracking → [`mutation`] / [`insertion`] → [`writer`]
//!
//! and [`editor::SshdConfigEditor`] drives it across every file the
//! [`resolver::LocationResolver`] reports for the requested option.
//!
//! # Components
//!
//! - [`classify`]: one raw line to a [`TypedLine`](crate::models::TypedLine).
//!   Lines with broken quoting are ignored, never fatal.
//! - [`track_scopes`]: tags each line with the `Match` scope it lives in.
//! - [`ConfigDocument`]: a parsed file that renders back byte-identical until edited.
//! - [`mutate`]: updates or comments out every matching directive in a scope.
//! - [`insert`]: adds a directive that does not exist yet, at the right spot.
//! - [`AtomicWriter`]: temp file + rename, optional backup copy.
//! - [`LocationResolver`] / [`ScanResolver`]: which files hold the option.
//! - [`SshdConfigEditor`]: the request-level state machine.
//!
//! # Usage Example
//!
//! ```ignore
//! use sshdedit::models::EditRequest;
//! use sshdedit::services::{ScanResolver, SshdConfigEditor};
//!
//! let resolver = ScanResolver::new(vec!["/etc/ssh/sshd_config".into()]);
//! let editor = SshdConfigEditor::new(resolver);
//!
//! let outcome = editor.apply(
//!     &EditRequest::new("PasswordAuthentication")
//!         .with_value("no")
//!         .with_condition("User bob"),
//! )?;
//! println!("{}", outcome.summary());
//! ```

pub mod classifier;
pub mod document;
pub mod editor;
pub mod insertion;
pub mod mutation;
pub mod resolver;
pub mod scope;
pub mod writer;

pub use classifier::{TokenizeError, classify, split_words};
pub use document::ConfigDocument;
pub use editor::SshdConfigEditor;
pub use insertion::insert;
pub use mutation::{MutationMode, MutationReport, REMOVAL_MARKER, mutate};
pub use resolver::{LocationResolver, Resolution, ScanResolver};
pub use scope::track_scopes;
pub use writer::{AtomicWriter, WriteError, backup_file};
