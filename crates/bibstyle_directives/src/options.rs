//! Option lists inside directive braces.
//!
//! An option list is a comma or whitespace separated sequence of
//! `key`, `key=value` and `key=[v1, v2, ...]` items. Keys are ASCII letters
//! and are lowercased. Any other character where a key is expected makes the
//! whole list invalid.

use std::fmt;

use bibstyle_foundation::{Error, Result};

/// The value attached to an option key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// A bare key with no value.
    Flag,
    /// `key=value`.
    Scalar(String),
    /// `key=[a, b, c]`.
    List(Vec<String>),
}

impl OptionValue {
    /// Reads the value as a boolean flag.
    ///
    /// Anything but the literal `false` counts as true.
    #[must_use]
    pub fn as_flag(&self) -> bool {
        !matches!(self, Self::Scalar(s) if s == "false")
    }

    /// Reads the value as a scalar, if it is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as a list; a scalar is a one-element list.
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::Flag => Vec::new(),
            Self::Scalar(s) => vec![s.clone()],
            Self::List(items) => items.clone(),
        }
    }
}

/// One `key[=value]` item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveOption {
    /// Lowercased key.
    pub key: String,
    /// Attached value.
    pub value: OptionValue,
}

impl DirectiveOption {
    /// Creates a bare flag option.
    #[must_use]
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: OptionValue::Flag,
        }
    }

    /// Creates a `key=value` option.
    #[must_use]
    pub fn scalar(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: OptionValue::Scalar(value.into()),
        }
    }

    /// Creates a `key=[...]` option.
    #[must_use]
    pub fn list<S: Into<String>>(key: impl Into<String>, items: impl IntoIterator<Item = S>) -> Self {
        Self {
            key: key.into(),
            value: OptionValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl fmt::Display for DirectiveOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            OptionValue::Flag => write!(f, "{}", self.key),
            OptionValue::Scalar(v) => write!(f, "{}={v}", self.key),
            OptionValue::List(items) => write!(f, "{}=[{}]", self.key, items.join(", ")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    LookingKey,
    Key,
    LookingValue,
    Scalar,
    List,
}

/// Parses the text between a directive's braces.
///
/// # Errors
///
/// Returns a directive error for a key that does not start with a letter,
/// a non-letter inside a key, a value that starts with a stray character,
/// or an unterminated `[` list.
pub fn parse_options(text: &str) -> Result<Vec<DirectiveOption>> {
    let mut options = Vec::new();
    let mut state = State::LookingKey;
    let mut key = String::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match state {
            State::LookingKey => {
                if c.is_whitespace() || c == ',' {
                    continue;
                }
                if !c.is_ascii_alphabetic() {
                    return Err(invalid(text, &format!("unexpected '{c}' before option name")));
                }
                start = i;
                state = State::Key;
            }
            State::Key => {
                if c.is_ascii_alphabetic() {
                    continue;
                }
                key = text[start..i].to_ascii_lowercase();
                if c == ',' {
                    options.push(DirectiveOption::flag(std::mem::take(&mut key)));
                    state = State::LookingKey;
                } else if c.is_whitespace() || c == '=' {
                    state = State::LookingValue;
                } else {
                    return Err(invalid(text, &format!("unexpected '{c}' in option name")));
                }
            }
            State::LookingValue => {
                if c.is_whitespace() || c == '=' {
                    continue;
                }
                if c == ',' {
                    options.push(DirectiveOption::flag(std::mem::take(&mut key)));
                    state = State::LookingKey;
                } else if c == '[' {
                    start = i + 1;
                    state = State::List;
                } else if c == ']' {
                    return Err(invalid(text, "unexpected ']'"));
                } else if c.is_ascii_alphabetic() && !text[..i].trim_end().ends_with('=') {
                    // `key other`: the first key was a bare flag.
                    options.push(DirectiveOption::flag(std::mem::take(&mut key)));
                    start = i;
                    state = State::Key;
                } else {
                    start = i;
                    state = State::Scalar;
                }
            }
            State::Scalar => {
                if c.is_whitespace() || c == ',' {
                    options.push(DirectiveOption::scalar(
                        std::mem::take(&mut key),
                        &text[start..i],
                    ));
                    state = State::LookingKey;
                }
            }
            State::List => {
                if c == ']' {
                    options.push(DirectiveOption::list(
                        std::mem::take(&mut key),
                        split_items(&text[start..i]),
                    ));
                    state = State::LookingKey;
                }
            }
        }
    }

    match state {
        State::LookingKey => {}
        State::Key => options.push(DirectiveOption::flag(text[start..].to_ascii_lowercase())),
        State::LookingValue => options.push(DirectiveOption::flag(key)),
        State::Scalar => options.push(DirectiveOption::scalar(key, &text[start..])),
        State::List => return Err(invalid(text, "unterminated '[' list")),
    }
    Ok(options)
}

fn split_items(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(text: &str, message: &str) -> Error {
    Error::directive(format!("{message} in option list '{text}'"))
}
