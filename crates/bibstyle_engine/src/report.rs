//! Violation records.
//!
//! A violation names what went wrong and which fields are involved. It
//! carries no source position; callers attach that themselves.

use std::fmt;

use bibstyle_foundation::LintCode;
use bibstyle_schema::ConditionalRule;

/// What kind of problem a violation reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationKind {
    /// The entry type is not in the style.
    UnknownEntry,
    /// The field is not permitted on the entry.
    UnknownField,
    /// A field of an `all` clause is absent.
    MissingField,
    /// No member of a `some` group is present.
    MissingSomeField,
    /// No member of a `one` group is present.
    MissingOneField,
    /// More than one member of a `one` group is present.
    TooManyFields,
    /// A conditional rule's antecedent holds but its consequent does not.
    FailedConditional,
    /// An empty value on a field that is not `nullok`.
    EmptyValue,
    /// A `range` value without a hyphen separator.
    InvalidRange,
    /// An integer value outside the field's declared bounds.
    OutOfBounds,
    /// A value the date grammar rejects.
    InvalidDate,
    /// A value that does not match the field's pattern.
    PatternMismatch,
}

impl ViolationKind {
    /// The stable code for this kind.
    #[must_use]
    pub const fn code(self) -> LintCode {
        LintCode::new(match self {
            Self::UnknownEntry => 5,
            Self::UnknownField => 7,
            Self::MissingField => 8,
            Self::MissingSomeField => 19,
            Self::MissingOneField => 20,
            Self::TooManyFields => 21,
            Self::FailedConditional => 22,
            Self::EmptyValue => 64,
            Self::InvalidRange => 65,
            Self::OutOfBounds => 66,
            Self::InvalidDate => 67,
            Self::PatternMismatch => 68,
        })
    }

    /// A short description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownEntry => "unknown entry type",
            Self::UnknownField => "unexpected field",
            Self::MissingField => "missing required field",
            Self::MissingSomeField => "missing one of the fields",
            Self::MissingOneField => "missing exactly one of the fields",
            Self::TooManyFields => "only one of the fields is allowed",
            Self::FailedConditional => "conditional constraint failed",
            Self::EmptyValue => "empty value",
            Self::InvalidRange => "invalid range format",
            Self::OutOfBounds => "value out of bounds",
            Self::InvalidDate => "invalid date format",
            Self::PatternMismatch => "invalid pattern match",
        }
    }
}

/// One problem found in an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// What went wrong.
    pub kind: ViolationKind,
    /// The field, group, or entry type involved.
    pub fields: Vec<String>,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new<S: Into<String>>(kind: ViolationKind, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The stable code.
    #[must_use]
    pub fn code(&self) -> LintCode {
        self.kind.code()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{} - {}", self.code(), self.kind.description())?;
        if !self.fields.is_empty() {
            write!(f, ": {}", self.fields.join(", "))?;
        }
        Ok(())
    }
}

/// The result of evaluating an entry's presence constraints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViolationReport {
    /// Absent fields of the `all` clause.
    pub missing_all_fields: Vec<String>,
    /// `some` groups with no member present.
    pub missing_some_fields: Vec<Vec<String>>,
    /// `one` groups with no member present.
    pub missing_one_field: Vec<Vec<String>>,
    /// `one` groups with two or more members present.
    pub too_many_fields: Vec<Vec<String>>,
    /// Conditional rules that did not hold.
    pub failed_conditionals: Vec<ConditionalRule>,
}

impl ViolationReport {
    /// Returns true if every constraint held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of reported problems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.missing_all_fields.len()
            + self.missing_some_fields.len()
            + self.missing_one_field.len()
            + self.too_many_fields.len()
            + self.failed_conditionals.len()
    }

    /// Flattens the report into individual violations.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(
            self.missing_all_fields
                .iter()
                .map(|f| Violation::new(ViolationKind::MissingField, [f.as_str()])),
        );
        for (kind, groups) in [
            (ViolationKind::MissingSomeField, &self.missing_some_fields),
            (ViolationKind::MissingOneField, &self.missing_one_field),
            (ViolationKind::TooManyFields, &self.too_many_fields),
        ] {
            out.extend(groups.iter().map(|g| Violation::new(kind, g.iter().map(String::as_str))));
        }
        out.extend(self.failed_conditionals.iter().map(|rule| {
            let names = rule.antecedent.fields.iter().chain(&rule.consequent.fields);
            Violation::new(ViolationKind::FailedConditional, names.map(String::as_str))
        }));
        out
    }
}
