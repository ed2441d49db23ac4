use super::classifier::split_words;
use super::document::ConfigDocument;
use crate::models::{ChangeAction, ChangeRecord, Directive, TypedLine};

/// Marker appended to directives that were commented out
pub const REMOVAL_MARKER: &str = "# Removed by Ansible";

/// What to do with directives matching the target key and scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMode<'a> {
    /// Rewrite every match to carry this value.
    EnsurePresent(&'a str),
    /// Comment out every match.
    EnsureAbsent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// At least one match existed and the mode was `EnsurePresent`.
    pub found: bool,
    pub changes: Vec<ChangeRecord>,
}

impl MutationReport {
    pub fn modified(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Applies `mode` to every directive for `key` (case-insensitive) inside
/// `scope` (exact match). All other lines are left byte-identical.
pub fn mutate(
    doc: &mut ConfigDocument,
    scope: &str,
    key: &str,
    mode: MutationMode<'_>,
) -> MutationReport {
    let key_lower = key.to_lowercase();
    let wanted = match mode {
        MutationMode::EnsurePresent(new_value) => Some(normalize_value(new_value)),
        MutationMode::EnsureAbsent => None,
    };
    let mut report = MutationReport::default();

    for (index, tagged) in doc.lines_mut().iter_mut().enumerate() {
        if tagged.scope != scope {
            continue;
        }
        let TypedLine::Directive(directive) = &mut tagged.line else {
            continue;
        };
        if !directive.matches_key(&key_lower) || is_removed(directive) {
            continue;
        }

        let line_number = index + 1;
        match mode {
            MutationMode::EnsurePresent(new_value) => {
                report.found = true;
                if wanted.as_deref() == Some(directive.value.as_str()) {
                    tracing::debug!("Line {}: {} already set to {:?}", line_number, directive.key, new_value);
                    continue;
                }
                let change = ChangeRecord::update(&directive.value, new_value, line_number);
                directive.set_value(new_value);
                directive.change = Some(change.clone());
                report.changes.push(change);
            }
            MutationMode::EnsureAbsent => {
                let change = ChangeRecord::remove(&directive.value, line_number);
                comment_out(directive);
                directive.change = Some(change.clone());
                report.changes.push(change);
            }
        }
    }

    report
}

/// Compares in the same form the classifier stores values in, so quoted or
/// oddly spaced requested values are still seen as already set.
fn normalize_value(value: &str) -> String {
    split_words(value)
        .map(|words| words.join(" "))
        .unwrap_or_else(|_| value.to_string())
}

fn comment_out(directive: &mut Directive) {
    directive.raw = format!("# {} {}\n", directive.raw.trim(), REMOVAL_MARKER);
    directive.modified = true;
}

fn is_removed(directive: &Directive) -> bool {
    directive
        .change
        .as_ref()
        .is_some_and(|change| change.action == ChangeAction::Remove)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# header comment
Port 22
PasswordAuthentication yes

Match User bob
    PasswordAuthentication yes
    passwordauthentication   yes
Match Group staff
\tPasswordAuthentication yes
";

    #[test]
    fn test_update_in_match_scope_only() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        let report = mutate(&mut doc, "User bob", "PasswordAuthentication", MutationMode::EnsurePresent("no"));

        assert!(report.found);
        assert_eq!(report.changes.len(), 2);
        assert_eq!(report.changes[0], ChangeRecord::update("yes", "no", 6));
        assert_eq!(report.changes[1], ChangeRecord::update("yes", "no", 7));

        let rendered = doc.render();
        assert_eq!(
            rendered,
            "\
# header comment
Port 22
PasswordAuthentication yes

Match User bob
    PasswordAuthentication no
    passwordauthentication no
Match Group staff
\tPasswordAuthentication yes
"
        );
    }

    #[test]
    fn test_update_noop_when_value_matches() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        let report = mutate(&mut doc, "global", "port", MutationMode::EnsurePresent("22"));

        assert!(report.found);
        assert!(!report.modified());
        assert!(!doc.is_modified());
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_remove_comments_out_trimmed_line() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        let report = mutate(&mut doc, "Group staff", "PasswordAuthentication", MutationMode::EnsureAbsent);

        assert!(!report.found);
        assert_eq!(report.changes, vec![ChangeRecord::remove("yes", 9)]);
        assert!(doc
            .render()
            .ends_with("Match Group staff\n# PasswordAuthentication yes # Removed by Ansible\n"));
    }

    #[test]
    fn test_remove_is_not_repeated() {
        let mut doc = ConfigDocument::parse("Port 22\n");
        mutate(&mut doc, "global", "Port", MutationMode::EnsureAbsent);
        let second = mutate(&mut doc, "global", "Port", MutationMode::EnsureAbsent);

        assert!(second.changes.is_empty());
        assert_eq!(doc.render(), "# Port 22 # Removed by Ansible\n");
    }

    #[test]
    fn test_scope_isolation() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        let report = mutate(&mut doc, "global", "PasswordAuthentication", MutationMode::EnsurePresent("no"));

        assert_eq!(report.changes, vec![ChangeRecord::update("yes", "no", 3)]);
        let rendered = doc.render();
        assert!(rendered.contains("Match User bob\n    PasswordAuthentication yes\n"));
    }

    #[test]
    fn test_no_match_reports_not_found() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        let report = mutate(&mut doc, "User alice", "Port", MutationMode::EnsurePresent("2222"));

        assert!(!report.found);
        assert!(!report.modified());
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_match_all_counts_as_global() {
        let mut doc = ConfigDocument::parse("Match User bob\nBanner a\nMatch all\nBanner b\n");
        let report = mutate(&mut doc, "global", "Banner", MutationMode::EnsurePresent("c"));

        assert_eq!(report.changes, vec![ChangeRecord::update("b", "c", 4)]);
    }

    #[test]
    fn test_quoted_value_is_idempotent() {
        let mut doc = ConfigDocument::parse("Banner /etc/issue\n");
        let first = mutate(&mut doc, "global", "Banner", MutationMode::EnsurePresent("\"/etc/my issue\""));
        assert_eq!(first.changes.len(), 1);
        assert_eq!(doc.render(), "Banner \"/etc/my issue\"\n");

        let mut reparsed = ConfigDocument::parse(&doc.render());
        let second = mutate(&mut reparsed, "global", "Banner", MutationMode::EnsurePresent("\"/etc/my issue\""));
        assert!(second.found);
        assert!(second.changes.is_empty());
    }

    #[test]
    fn test_unmodified_irregular_spacing_untouched() {
        let text = "AllowUsers  a   b\nPort 22\n";
        let mut doc = ConfigDocument::parse(text);
        mutate(&mut doc, "global", "Port", MutationMode::EnsurePresent("2222"));

        assert_eq!(doc.render(), "AllowUsers  a   b\nPort 2222\n");
    }
}
