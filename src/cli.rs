//! CLI argument definitions for sshdedit.

use crate::models::{DesiredState, EditRequest, GLOBAL_SCOPE, Settings};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// sshdedit - edit one sshd_config option in place, keeping everything else intact.
///
/// Comments, blank lines and indentation are preserved. Removed options are
/// commented out, not deleted.
#[derive(Parser, Debug)]
#[command(name = "sshdedit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file (defaults, extra files, logging)
    #[arg(short = 's', long = "settings", env = "SSHDEDIT_SETTINGS")]
    pub settings: Option<Utf8PathBuf>,

    /// Main sshd configuration file [default: /etc/ssh/sshd_config]
    #[arg(short = 'c', long = "config-path")]
    pub config_path: Option<Utf8PathBuf>,

    /// Option name, e.g. Port
    #[arg(short = 'k', long, required_unless_present = "write_settings")]
    pub key: Option<String>,

    /// Value to set. Required when state is present.
    #[arg(short = 'v', long)]
    pub value: Option<String>,

    /// Match condition, e.g. "User bob". Use "global" for options outside any Match block.
    #[arg(short = 'm', long, default_value = GLOBAL_SCOPE)]
    pub condition: String,

    /// Whether the option should be present or absent
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,

    /// Back up each file before changing it
    #[arg(short = 'b', long)]
    pub backup: bool,

    /// Additional file to search for the option (repeatable, scanned in order)
    #[arg(short = 'e', long = "extra-file")]
    pub extra_files: Vec<Utf8PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Also write logs to this directory (daily rotation)
    #[arg(long)]
    pub log_dir: Option<Utf8PathBuf>,

    /// Write the effective settings to this file and exit
    #[arg(long)]
    pub write_settings: Option<Utf8PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for DesiredState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => DesiredState::Present,
            StateArg::Absent => DesiredState::Absent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
}

impl Cli {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(path) = &self.config_path {
            settings.config_path = path.clone();
        }
        if self.backup {
            settings.backup = true;
        }
        for extra in &self.extra_files {
            if !settings.extra_files.contains(extra) {
                settings.extra_files.push(extra.clone());
            }
        }
        if self.debug {
            settings.logging.debug = true;
        }
        if let Some(dir) = &self.log_dir {
            settings.logging.dir = Some(dir.clone());
        }
    }

    /// Builds the edit request, or `None` when no key was given.
    pub fn to_request(&self, settings: &Settings) -> Option<EditRequest> {
        let key = self.key.as_deref()?;
        let mut request = EditRequest::new(key)
            .with_config_path(settings.config_path.clone())
            .with_condition(self.condition.clone())
            .with_state(self.state.into())
            .with_backup(settings.backup);
        request.value = self.value.clone();
        Some(request)
    }
}
