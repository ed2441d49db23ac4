use crate::models::{GLOBAL_SCOPE, TaggedLine, TypedLine};

/// Tags every line with the scope in effect at that point.
///
/// Scope starts as `"global"` and switches at each `Match` header until the
/// next one. Single forward pass.
pub fn track_scopes<I>(lines: I) -> Vec<TaggedLine>
where
    I: IntoIterator<Item = TypedLine>,
{
    let mut current = GLOBAL_SCOPE.to_string();

    lines
        .into_iter()
        .map(|line| {
            if let Some(scope) = line.header_scope() {
                current = scope.to_string();
            }
            TaggedLine {
                scope: current.clone(),
                line,
            }
        })
        .collect()
}
