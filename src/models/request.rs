use super::line::GLOBAL_SCOPE;
use crate::services::split_words;
use camino::Utf8PathBuf;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Default location of the sshd server configuration
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ssh/sshd_config";

/// Keywords the classifier never reads back as options
const RESERVED_KEYS: [&str; 2] = ["match", "include"];

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("Invalid key regex"));

/// Whether the option should end up set or removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// Errors raised while validating a request, before any file is touched
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("parameter \"value\" is required when state is \"present\"")]
    MissingValue,

    #[error("Invalid option name: {0:?}")]
    InvalidKey(String),

    #[error("Option value must be a single line: {0:?}")]
    InvalidValue(String),

    #[error("Invalid Match condition: {0:?}")]
    InvalidCondition(String),
}

/// A single change request against an sshd configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    /// Primary configuration file; receives inserted options.
    pub config_path: Utf8PathBuf,
    pub key: String,
    pub value: Option<String>,
    /// Match condition text, or `"global"`.
    pub condition: String,
    pub state: DesiredState,
    pub backup: bool,
}

impl EditRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            config_path: Utf8PathBuf::from(DEFAULT_CONFIG_PATH),
            key: key.into(),
            value: None,
            condition: GLOBAL_SCOPE.to_string(),
            state: DesiredState::Present,
            backup: false,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_state(mut self, state: DesiredState) -> Self {
        self.state = state;
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Checks the request and returns its normalized scope name.
    ///
    /// The condition is compared the way `Match` headers are read back: its
    /// words joined by single spaces. `Match all` is the global scope, so a
    /// condition of `all` (any case) resolves to `"global"`.
    pub fn validate(&self) -> Result<String, RequestError> {
        if self.state == DesiredState::Present && self.value.is_none() {
            return Err(RequestError::MissingValue);
        }

        if !KEY_PATTERN.is_match(&self.key)
            || RESERVED_KEYS
                .iter()
                .any(|reserved| self.key.eq_ignore_ascii_case(reserved))
        {
            return Err(RequestError::InvalidKey(self.key.clone()));
        }

        if let Some(value) = &self.value {
            if value.contains(['\n', '\r']) || split_words(value).is_err() {
                return Err(RequestError::InvalidValue(value.clone()));
            }
        }

        if self.condition.contains(['\n', '\r']) {
            return Err(RequestError::InvalidCondition(self.condition.clone()));
        }
        let condition = normalize_condition(&self.condition)
            .ok_or_else(|| RequestError::InvalidCondition(self.condition.clone()))?;

        if condition.eq_ignore_ascii_case("all") {
            Ok(GLOBAL_SCOPE.to_string())
        } else {
            Ok(condition)
        }
    }
}

/// Joins the condition's words with single spaces. `None` when it is empty,
/// does not tokenize, or would not read back as the same words once written
/// into a `Match` header.
fn normalize_condition(condition: &str) -> Option<String> {
    let words = split_words(condition).ok()?;
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    match split_words(&joined) {
        Ok(reread) if reread == words => Some(joined),
        _ => None,
    }
}
