//! Typed declarations extracted from lexed commands.
//!
//! The flow is: Source → `Lexer` → `Command` tree → `DeclarationAnalyzer` → `Declaration`

mod analyzer;
mod types;


pub use analyzer::DeclarationAnalyzer;
pub use types::{
    Condition, Constant, ConstantValue, Constraint, DataConstraint, Datatype, EntryProps,
    FieldKind, FieldProps, MandatoryConstraint, Quantifier, ResetKind,
};

/// One top-level data-model declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    /// `\DeclareDatamodelConstant`
    Constant(Constant),
    /// `\DeclareDatamodelEntrytypes`
    Entrytypes {
        /// Declared entry type names.
        names: Vec<String>,
        /// Properties shared by all of them.
        props: EntryProps,
    },
    /// `\DeclareDatamodelFields`
    Fields {
        /// Declared field names.
        names: Vec<String>,
        /// Properties shared by all of them.
        props: FieldProps,
    },
    /// `\DeclareDatamodelEntryfields`; no entries means every entry.
    Entryfields {
        /// Target entry types.
        entries: Vec<String>,
        /// Associated fields.
        fields: Vec<String>,
    },
    /// `\DeclareDatamodelConstraints`; no entries means universal.
    Constraints {
        /// Target entry types.
        entries: Vec<String>,
        /// The block's constraints.
        constraints: Vec<Constraint>,
    },
    /// `\ResetDatamodel...`
    Reset(ResetKind),
}

/// Splits a comma-separated list, ignoring commas nested in braces.
///
/// Items are trimmed and empty items are dropped.
#[must_use]
pub fn split_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&text[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an option list into `(key, value)` pairs.
///
/// `key=value` splits at the first `=`; a bare `key` has no value.
#[must_use]
pub fn parameter_options(text: &str) -> Vec<(String, Option<String>)> {
    split_list(text)
        .into_iter()
        .map(|item| match item.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), Some(value.trim().to_string())),
            None => (item, None),
        })
        .collect()
}

/// Boolean coercion for declaration options: bare or `true` is true.
#[must_use]
pub fn option_flag(value: Option<&str>) -> bool {
    matches!(value, None | Some("true"))
}
