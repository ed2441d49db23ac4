//! Data models for sshdedit.
//!
//! - [`TypedLine`] / [`Directive`] / [`TaggedLine`]: classified configuration lines
//! - [`ChangeRecord`], [`FileEditResult`], [`EditOutcome`]: what an edit did, for reporting
//! - [`EditRequest`]: one change request (key, value, Match condition, desired state)
//! - [`Settings`]: tool settings loaded by [`ConfigManager`](crate::config::ConfigManager)
//!
//! Models carry no I/O. Parsing, editing and persistence live in
//! [`services`](crate::services).

pub mod change;
pub mod config;
pub mod line;
pub mod request;

pub use change::{ChangeAction, ChangeRecord, DiffEntry, EditOutcome, FileEditResult};
pub use config::{LoggingSettings, Settings};
pub use line::{Directive, GLOBAL_SCOPE, TaggedLine, TypedLine};
pub use request::{DEFAULT_CONFIG_PATH, DesiredState, EditRequest, RequestError};
