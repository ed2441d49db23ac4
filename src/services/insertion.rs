use super::document::ConfigDocument;
use crate::models::{ChangeAction, ChangeRecord, Directive, GLOBAL_SCOPE, TypedLine};

/// Indentation used for options inserted inside a `Match` block
pub const MATCH_INDENT: &str = "    ";

/// Adds `key value` to `doc` in `scope`. Used when the option is not present
/// in the target file at all.
///
/// - global: before the first `Match` header, or at the end of the file
/// - named scope: right after the first header for that condition
/// - otherwise: a new `Match` block at the end, after a blank separator line
///   when the file does not already end with one
pub fn insert(doc: &mut ConfigDocument, scope: &str, key: &str, value: &str) -> ChangeRecord {
    if scope == GLOBAL_SCOPE {
        let index = doc
            .lines()
            .iter()
            .position(|tagged| tagged.line.header_scope().is_some())
            .unwrap_or(doc.len());
        let change = ChangeRecord::insert(ChangeAction::InsertGlobal, value, index + 1);
        doc.insert(index, new_directive("", key, value, &change), GLOBAL_SCOPE);
        tracing::debug!("Inserted global {} at line {}", key, index + 1);
        return change;
    }

    let header = doc
        .lines()
        .iter()
        .position(|tagged| tagged.line.header_scope() == Some(scope));

    if let Some(header) = header {
        let index = header + 1;
        let change = ChangeRecord::insert(ChangeAction::InsertInMatch, value, index + 1);
        doc.insert(index, new_directive(MATCH_INDENT, key, value, &change), scope);
        tracing::debug!("Inserted {} into Match {} at line {}", key, scope, index + 1);
        return change;
    }

    let needs_separator = doc.lines().last().is_some_and(|last| !last.line.is_blank());
    if needs_separator {
        let tail_scope = doc_tail_scope(doc).to_string();
        doc.push(TypedLine::Ignored { raw: "\n".to_string() }, &tail_scope);
    }
    doc.push(
        TypedLine::ScopeHeader {
            raw: format!("Match {}\n", scope),
            scope: scope.to_string(),
        },
        scope,
    );
    let change = ChangeRecord::insert(ChangeAction::InsertNewBlock, value, doc.len() + 1);
    doc.push(new_directive(MATCH_INDENT, key, value, &change), scope);
    tracing::debug!("Created Match {} block for {}", scope, key);
    change
}

fn doc_tail_scope(doc: &ConfigDocument) -> &str {
    doc.lines()
        .last()
        .map_or(GLOBAL_SCOPE, |tagged| tagged.scope.as_str())
}

fn new_directive(indent: &str, key: &str, value: &str, change: &ChangeRecord) -> TypedLine {
    TypedLine::Directive(Directive {
        raw: format!("{}{} {}\n", indent, key, value),
        indent: indent.to_string(),
        key: key.to_string(),
        key_lower: key.to_lowercase(),
        value: value.to_string(),
        modified: true,
        change: Some(change.clone()),
    })
}
