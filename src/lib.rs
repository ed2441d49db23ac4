// sshdedit - structure-preserving editor for OpenSSH server configuration
//
// This is the library crate containing the editing engine and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{DesiredState, EditOutcome, EditRequest, Settings};
pub use services::{LocationResolver, Resolution, ScanResolver, SshdConfigEditor};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
