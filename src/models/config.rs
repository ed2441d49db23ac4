use super::request::DEFAULT_CONFIG_PATH;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Tool settings, loaded from an optional YAML file and `SSHDEDIT_*` env vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Primary sshd configuration file.
    #[serde(default = "default_config_path")]
    pub config_path: Utf8PathBuf,

    /// Copy each file aside before overwriting it.
    #[serde(default)]
    pub backup: bool,

    /// Additional files scanned for existing options, after `config_path`.
    #[serde(default)]
    pub extra_files: Vec<Utf8PathBuf>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Directory for daily-rotated log files. No file logging when unset.
    #[serde(default)]
    pub dir: Option<Utf8PathBuf>,

    #[serde(default = "default_log_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub debug: bool,

    /// Log to stderr.
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            backup: false,
            extra_files: Vec::new(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_log_prefix(),
            debug: false,
            console: default_console(),
        }
    }
}

impl Settings {
    /// Files the built-in resolver scans, primary config first
    pub fn scan_files(&self) -> Vec<Utf8PathBuf> {
        let mut files = vec![self.config_path.clone()];
        for extra in &self.extra_files {
            if !files.contains(extra) {
                files.push(extra.clone());
            }
        }
        files
    }
}

fn default_config_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn default_log_prefix() -> String {
    "sshdedit".to_string()
}

fn default_console() -> bool {
    true
}
