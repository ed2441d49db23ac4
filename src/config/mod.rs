use crate::models::Settings;
use crate::services::AtomicWriter;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat, Map};

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "SSHDEDIT";

/// Configuration manager for loading and saving the tool's YAML settings.
///
/// Settings are layered, later sources winning:
/// - built-in defaults ([`Settings::default`])
/// - the YAML settings file, when one is given
/// - `SSHDEDIT_*` environment variables, `__` separating nested keys
///   (e.g. `SSHDEDIT_LOGGING__DEBUG=true`, `SSHDEDIT_EXTRA_FILES=a.conf,b.conf`)
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    settings_file: Option<Utf8PathBuf>,
}

impl ConfigManager {
    /// Create a new ConfigManager.
    ///
    /// # Arguments
    /// * `settings_file` - Optional YAML settings file. It must exist when given.
    pub fn new<P: AsRef<Utf8Path>>(settings_file: Option<P>) -> Self {
        Self {
            settings_file: settings_file.map(|p| p.as_ref().to_path_buf()),
        }
    }

    /// Load settings from all layers.
    pub fn load(&self) -> Result<Settings> {
        self.load_with_env(None)
    }

    /// Load settings, reading environment overrides from `env` instead of the
    /// process environment when given.
    fn load_with_env(&self, env: Option<Map<String, String>>) -> Result<Settings> {
        let defaults = Config::try_from(&Settings::default())
            .context("Failed to build default settings")?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.settings_file {
            builder = builder.add_source(File::new(path.as_str(), FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extra_files")
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .with_context(|| match &self.settings_file {
                Some(path) => format!("Failed to load settings from {}", path),
                None => "Failed to load settings".to_string(),
            })?;

        match &self.settings_file {
            Some(path) => tracing::debug!("Loaded settings from {}", path),
            None => tracing::debug!("Loaded settings from defaults and environment"),
        }
        Ok(settings)
    }

    /// Save settings as YAML to `path`.
    ///
    /// # Arguments
    /// * `settings` - The Settings to save
    /// * `path` - Destination file, written atomically
    pub fn save(settings: &Settings, path: &Utf8Path) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        AtomicWriter::default()
            .write(path, &yaml_string)
            .with_context(|| format!("Failed to write settings: {}", path))?;

        tracing::info!("Saved settings to {}", path);
        Ok(())
    }

    /// Get the settings file path, if any.
    pub fn settings_file(&self) -> Option<&Utf8Path> {
        self.settings_file.as_deref()
    }
}
