use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of edit applied to a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Update,
    Remove,
    InsertGlobal,
    InsertInMatch,
    InsertNewBlock,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeAction::Update => "update",
            ChangeAction::Remove => "remove",
            ChangeAction::InsertGlobal => "insert_global",
            ChangeAction::InsertInMatch => "insert_match",
            ChangeAction::InsertNewBlock => "new_block",
        };
        f.write_str(name)
    }
}

/// A single change, kept for reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    /// 1-based line number in the file as written.
    #[serde(rename = "line", skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl ChangeRecord {
    pub fn update(old_value: &str, new_value: &str, line_number: usize) -> Self {
        Self {
            action: ChangeAction::Update,
            old_value: Some(old_value.to_string()),
            new_value: Some(new_value.to_string()),
            line_number: Some(line_number),
        }
    }

    pub fn remove(old_value: &str, line_number: usize) -> Self {
        Self {
            action: ChangeAction::Remove,
            old_value: Some(old_value.to_string()),
            new_value: None,
            line_number: Some(line_number),
        }
    }

    pub fn insert(action: ChangeAction, new_value: &str, line_number: usize) -> Self {
        Self {
            action,
            old_value: None,
            new_value: Some(new_value.to_string()),
            line_number: Some(line_number),
        }
    }
}

/// What happened to one file visited during a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEditResult {
    pub path: Utf8PathBuf,
    pub found_in_target_scope: bool,
    pub modified: bool,
    pub change_log: Vec<ChangeRecord>,
}

impl FileEditResult {
    pub fn untouched(path: Utf8PathBuf) -> Self {
        Self {
            path,
            found_in_target_scope: false,
            modified: false,
            change_log: Vec::new(),
        }
    }
}

/// Flattened change record with the file it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub file: Utf8PathBuf,
    #[serde(flatten)]
    pub change: ChangeRecord,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.change.line_number {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.change.action)?;
        match (&self.change.old_value, &self.change.new_value) {
            (Some(old), Some(new)) => write!(f, " '{}' -> '{}'", old, new),
            (Some(old), None) => write!(f, " '{}'", old),
            (None, Some(new)) => write!(f, " '{}'", new),
            (None, None) => Ok(()),
        }
    }
}

/// Final result of an edit request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub changed: bool,
    pub diff: Vec<DiffEntry>,
    pub files: Vec<FileEditResult>,
    /// Target file -> backup copy made before it was overwritten.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub backups: IndexMap<Utf8PathBuf, Utf8PathBuf>,
}

impl EditOutcome {
    /// Records a visited file, folding its change log into the diff.
    pub fn push_file(&mut self, result: FileEditResult) {
        if result.modified {
            self.changed = true;
        }
        self.diff
            .extend(result.change_log.iter().cloned().map(|change| DiffEntry {
                file: result.path.clone(),
                change,
            }));
        self.files.push(result);
    }

    /// Human-readable summary of the outcome
    pub fn summary(&self) -> String {
        if !self.changed {
            return "No changes".to_string();
        }

        let mut lines = vec![format!(
            "Changed {} file(s), {} edit(s)",
            self.files.iter().filter(|f| f.modified).count(),
            self.diff.len()
        )];
        lines.extend(self.diff.iter().map(|entry| format!("  {}", entry)));
        lines.extend(
            self.backups
                .iter()
                .map(|(target, backup)| format!("  backup of {}: {}", target, backup)),
        );
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_file_collects_diff() {
        let mut outcome = EditOutcome::default();
        outcome.push_file(FileEditResult::untouched(Utf8PathBuf::from("/a")));
        assert!(!outcome.changed);
        assert!(outcome.diff.is_empty());

        outcome.push_file(FileEditResult {
            path: Utf8PathBuf::from("/b"),
            found_in_target_scope: true,
            modified: true,
            change_log: vec![ChangeRecord::update("22", "2222", 1)],
        });

        assert!(outcome.changed);
        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.diff.len(), 1);
        assert_eq!(outcome.diff[0].file, Utf8PathBuf::from("/b"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(EditOutcome::default().summary(), "No changes");

        let mut outcome = EditOutcome::default();
        outcome.push_file(FileEditResult {
            path: Utf8PathBuf::from("/etc/ssh/sshd_config"),
            found_in_target_scope: false,
            modified: true,
            change_log: vec![ChangeRecord::remove("yes", 7)],
        });

        let summary = outcome.summary();
        assert!(summary.contains("Changed 1 file(s), 1 edit(s)"));
        assert!(summary.contains("/etc/ssh/sshd_config:7: remove 'yes'"));
    }

    #[test]
    fn test_diff_entry_serializes_flat() {
        let entry = DiffEntry {
            file: Utf8PathBuf::from("/etc/ssh/sshd_config"),
            change: ChangeRecord::insert(ChangeAction::InsertNewBlock, "no", 12),
        };
        let yaml = serde_yaml_ng::to_string(&entry).unwrap();

        assert!(yaml.contains("file: /etc/ssh/sshd_config"));
        assert!(yaml.contains("action: insert_new_block"));
        assert!(yaml.contains("line: 12"));
        assert!(!yaml.contains("old_value"));
    }
}
