//! Line classification for the sshd configuration dialect.
//!
//! Each raw line becomes a [`TypedLine`]:
//! - comments, blanks, `Include` lines and lines with broken quoting are
//!   [`TypedLine::Ignored`]
//! - `Match <condition>` is a [`TypedLine::ScopeHeader`]
//! - anything else is a `Key value...` [`Directive`]
//!
//! Tokenization follows POSIX shell word splitting: whitespace separates
//! words, single quotes are literal, double quotes honor `\"` and `\\`, and a
//! backslash outside quotes escapes the next character.

use crate::models::{Directive, GLOBAL_SCOPE, TypedLine};
use thiserror::Error;

const WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Quoting errors. Only ever used to decide that a line is ignored.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("No closing quotation ({0})")]
    UnclosedQuote(char),

    #[error("No escaped character")]
    TrailingEscape,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Between,
    Word,
    Single,
    Double,
    Escape { in_double: bool },
}

/// Splits `text` into shell words.
pub fn split_words(text: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    // A quoted empty string still yields a word.
    let mut started = false;
    let mut state = State::Between;

    for ch in text.chars() {
        state = match state {
            State::Between | State::Word if WHITESPACE.contains(&ch) => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
                State::Between
            }
            State::Between | State::Word => {
                started = true;
                match ch {
                    '\\' => State::Escape { in_double: false },
                    '\'' => State::Single,
                    '"' => State::Double,
                    _ => {
                        current.push(ch);
                        State::Word
                    }
                }
            }
            State::Single => {
                if ch == '\'' {
                    State::Word
                } else {
                    current.push(ch);
                    State::Single
                }
            }
            State::Double => match ch {
                '"' => State::Word,
                '\\' => State::Escape { in_double: true },
                _ => {
                    current.push(ch);
                    State::Double
                }
            },
            State::Escape { in_double } => {
                // Inside double quotes only `"` and `\` are escapable.
                if in_double && ch != '"' && ch != '\\' {
                    current.push('\\');
                }
                current.push(ch);
                if in_double {
                    State::Double
                } else {
                    State::Word
                }
            }
        };
    }

    match state {
        State::Single => Err(TokenizeError::UnclosedQuote('\'')),
        State::Double => Err(TokenizeError::UnclosedQuote('"')),
        State::Escape { .. } => Err(TokenizeError::TrailingEscape),
        State::Between | State::Word => {
            if started {
                words.push(current);
            }
            Ok(words)
        }
    }
}

/// Classifies a single raw line. Pure; never fails.
pub fn classify(raw: &str) -> TypedLine {
    let ignored = || TypedLine::Ignored {
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return ignored();
    }

    let words = match split_words(trimmed) {
        Ok(words) => words,
        Err(e) => {
            tracing::debug!("Ignoring unparseable line {:?}: {}", trimmed, e);
            return ignored();
        }
    };

    let Some((first, rest)) = words.split_first() else {
        return ignored();
    };
    let joined = rest.join(" ");

    if first.eq_ignore_ascii_case("match") {
        let scope = if joined.eq_ignore_ascii_case("all") {
            GLOBAL_SCOPE.to_string()
        } else {
            joined
        };
        return TypedLine::ScopeHeader {
            raw: raw.to_string(),
            scope,
        };
    }

    if first.eq_ignore_ascii_case("include") {
        return ignored();
    }

    let indent_len = raw.len() - raw.trim_start().len();
    TypedLine::Directive(Directive {
        raw: raw.to_string(),
        indent: raw[..indent_len].to_string(),
        key: first.clone(),
        key_lower: first.to_lowercase(),
        value: joined,
        modified: false,
        change: None,
    })
}
