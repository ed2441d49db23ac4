use super::change::ChangeRecord;

/// Scope name used for options outside any `Match` block (and for `Match all`).
pub const GLOBAL_SCOPE: &str = "global";

/// One line of an sshd configuration file, classified.
///
/// `raw` is always the exact text that will be written back, including the
/// trailing newline when the original line had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedLine {
    /// Comment, blank line, unparseable line or `Include`. Never mutated.
    Ignored { raw: String },

    /// A `Match` header. `scope` is `"global"` for `Match all`.
    ScopeHeader { raw: String, scope: String },

    /// A `Key value...` option line.
    Directive(Directive),
}

impl TypedLine {
    pub fn raw(&self) -> &str {
        match self {
            TypedLine::Ignored { raw } => raw,
            TypedLine::ScopeHeader { raw, .. } => raw,
            TypedLine::Directive(directive) => &directive.raw,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw().trim().is_empty()
    }

    pub fn header_scope(&self) -> Option<&str> {
        match self {
            TypedLine::ScopeHeader { scope, .. } => Some(scope),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            TypedLine::Directive(directive) => Some(directive),
            _ => None,
        }
    }
}

/// A key/value option line.
///
/// Until `modified` is set, `raw` is byte-identical to the line read from disk
/// even when `value` was normalized by tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub raw: String,
    /// Exact leading whitespace of the original line.
    pub indent: String,
    /// Key as spelled in the file.
    pub key: String,
    pub key_lower: String,
    /// Value tokens joined with single spaces.
    pub value: String,
    pub modified: bool,
    pub change: Option<ChangeRecord>,
}

impl Directive {
    /// Rewrites the line to carry `new_value`, keeping indent and key spelling.
    pub fn set_value(&mut self, new_value: &str) {
        self.raw = format!("{}{} {}\n", self.indent, self.key, new_value);
        self.value = new_value.to_string();
        self.modified = true;
    }

    pub fn matches_key(&self, key_lower: &str) -> bool {
        self.key_lower == key_lower
    }
}

/// A typed line together with the scope in effect where it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub line: TypedLine,
    pub scope: String,
}

impl TaggedLine {
    pub fn is_modified(&self) -> bool {
        matches!(&self.line, TypedLine::Directive(d) if d.modified)
    }
}
