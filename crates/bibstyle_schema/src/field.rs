//! Resolved field records.

use std::fmt;

use bibstyle_foundation::{Error, Result};
use bibstyle_language::{DataConstraint, Datatype, FieldKind, FieldProps};
use regex::Regex;

/// Removes a `\regexp{...}` wrapper from a declared pattern.
///
/// The wrapper runs from `\regexp{` to the last closing brace. Text without
/// a wrapper is returned unchanged.
#[must_use]
pub fn unwrap_regexp(raw: &str) -> String {
    const WRAPPER: &str = "\\regexp{";
    let Some(start) = raw.find(WRAPPER) else {
        return raw.to_string();
    };
    let inner_start = start + WRAPPER.len();
    match raw.rfind('}') {
        Some(end) if end >= inner_start => {
            format!("{}{}{}", &raw[..start], &raw[inner_start..end], &raw[end + 1..])
        }
        _ => raw.to_string(),
    }
}

/// A field pattern, compiled once.
///
/// Two patterns are equal when their sources are.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles a declared pattern for `field`, unwrapping `\regexp{...}`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the source is not a valid regular expression.
    pub fn new(field: &str, raw: &str) -> Result<Self> {
        let source = unwrap_regexp(raw);
        let regex =
            Regex::new(&source).map_err(|e| Error::invalid_pattern(field, e.to_string()))?;
        Ok(Self { source, regex })
    }

    /// The unwrapped pattern source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern matches anywhere in `value`.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CompiledPattern {}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.source).finish()
    }
}

/// A compiled field schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// `field` or `list`; `None` for untyped fields.
    pub kind: Option<FieldKind>,
    /// Value grammar; `None` for untyped fields.
    pub datatype: Option<Datatype>,
    /// Format tag.
    pub format: Option<String>,
    /// An empty value is permitted.
    pub nullok: bool,
    /// Excluded from output.
    pub skipout: bool,
    /// Usable as a label.
    pub label: bool,
    /// Inclusive lower bound for integer values.
    pub rangemin: Option<i64>,
    /// Inclusive upper bound for integer values.
    pub rangemax: Option<i64>,
    /// Pattern for `pattern` datatype values.
    pub pattern: Option<CompiledPattern>,
    /// The field this one is an alias of.
    pub alias_of: Option<String>,
}

impl FieldSchema {
    /// Creates a field from declared properties.
    #[must_use]
    pub fn new(name: impl Into<String>, props: &FieldProps) -> Self {
        Self {
            name: name.into(),
            kind: props.kind,
            datatype: props.datatype,
            format: props.format.clone(),
            nullok: props.nullok,
            skipout: props.skipout,
            label: props.label,
            rangemin: None,
            rangemax: None,
            pattern: None,
            alias_of: None,
        }
    }

    /// Creates the default-shaped record used for names without a declared type.
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, &FieldProps::default())
    }

    /// Returns true if the field was given an explicit type.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.kind.is_some() || self.datatype.is_some()
    }

    /// Returns true if the field holds a list.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind == Some(FieldKind::List)
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn props(&self) -> FieldProps {
        FieldProps {
            kind: self.kind,
            datatype: self.datatype,
            format: self.format.clone(),
            nullok: self.nullok,
            skipout: self.skipout,
            label: self.label,
        }
    }

    /// Applies a field-level data constraint.
    ///
    /// A checker name from the closed datatype set replaces the datatype;
    /// other checker names (`isbn`, `issn`, ...) are left to external tools.
    /// Bounds and pattern are set when given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern does not compile. Everything
    /// else in the constraint is still applied.
    pub fn apply_data_constraint(&mut self, constraint: &DataConstraint) -> Result<()> {
        if let Some(datatype) = constraint.datatype.as_deref().and_then(Datatype::parse) {
            self.datatype = Some(datatype);
        }
        if constraint.rangemin.is_some() {
            self.rangemin = constraint.rangemin;
        }
        if constraint.rangemax.is_some() {
            self.rangemax = constraint.rangemax;
        }
        if let Some(raw) = &constraint.pattern {
            self.pattern = Some(CompiledPattern::new(&self.name, raw)?);
        }
        Ok(())
    }
}
