use super::classifier::classify;
use super::scope::track_scopes;
use crate::models::{TaggedLine, TypedLine};
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::ErrorKind;

/// An in-memory, scope-tagged copy of one configuration file.
///
/// Created fresh from disk for every request; rendering an unmodified
/// document reproduces the input byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<TaggedLine>,
}

impl ConfigDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: track_scopes(text.split_inclusive('\n').map(classify)),
        }
    }

    /// Reads and parses `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist; any other read
    /// failure is an error.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(Self::parse(&text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read config file: {}", path)),
        }
    }

    pub fn lines(&self) -> &[TaggedLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [TaggedLine] {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.lines.iter().any(TaggedLine::is_modified)
    }

    /// Inserts a line at `index`, tagged with `scope`.
    ///
    /// If the line before `index` has no trailing newline it is terminated
    /// first so the two lines are not fused.
    pub fn insert(&mut self, index: usize, line: TypedLine, scope: &str) {
        if index > 0 {
            self.terminate_line(index - 1);
        }
        self.lines.insert(
            index,
            TaggedLine {
                line,
                scope: scope.to_string(),
            },
        );
    }

    /// Appends a line after the last one
    pub fn push(&mut self, line: TypedLine, scope: &str) {
        let index = self.lines.len();
        self.insert(index, line, scope);
    }

    fn terminate_line(&mut self, index: usize) {
        let raw = match &mut self.lines[index].line {
            TypedLine::Ignored { raw } => raw,
            TypedLine::ScopeHeader { raw, .. } => raw,
            TypedLine::Directive(directive) => &mut directive.raw,
        };
        if !raw.ends_with('\n') {
            raw.push('\n');
        }
    }

    pub fn render(&self) -> String {
        self.lines.iter().map(|tagged| tagged.line.raw()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "# sshd\n\nPort 22\n  AllowUsers  a   b\nMatch User bob\n\tX11Forwarding no\nBanner \"broken\n";

    #[test]
    fn test_render_round_trips() {
        let doc = ConfigDocument::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
        assert_eq!(doc.len(), 7);
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_render_without_trailing_newline() {
        let text = "Port 22\nPermitRootLogin no";
        assert_eq!(ConfigDocument::parse(text).render(), text);
    }

    #[test]
    fn test_insert_terminates_previous_line() {
        let mut doc = ConfigDocument::parse("Port 22");
        doc.push(classify("Banner none\n"), "global");
        assert_eq!(doc.render(), "Port 22\nBanner none\n");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp_dir.path()).unwrap().join("missing");
        assert!(ConfigDocument::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp_dir.path()).unwrap().join("sshd_config");
        fs::write(&path, SAMPLE).unwrap();

        let doc = ConfigDocument::load(&path).unwrap().unwrap();
        assert_eq!(doc.render(), SAMPLE);
    }
}
