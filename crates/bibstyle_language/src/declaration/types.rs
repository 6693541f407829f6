//! Declaration type definitions.
//!
//! Typed records extracted from lexed data-model commands. Every consumer
//! matches on these exhaustively; there are no open-ended property bags.

use std::fmt;

// =============================================================================
// Field Types
// =============================================================================

/// Whether a field holds one value or a list of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKind {
    /// A single value.
    Field,
    /// A list of values (names, literals, keys).
    List,
}

impl FieldKind {
    /// Parses `"field"` or `"list"`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "field" => Some(Self::Field),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Returns the declaration keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::List => "list",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value grammar a field follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[allow(missing_docs)]
pub enum Datatype {
    Literal,
    Name,
    Key,
    Range,
    Integer,
    Datepart,
    Date,
    Verbatim,
    Uri,
    Keyword,
    Options,
    Pattern,
    Code,
}

impl Datatype {
    /// Every datatype, in declaration order.
    pub const ALL: [Datatype; 13] = [
        Self::Literal,
        Self::Name,
        Self::Key,
        Self::Range,
        Self::Integer,
        Self::Datepart,
        Self::Date,
        Self::Verbatim,
        Self::Uri,
        Self::Keyword,
        Self::Options,
        Self::Pattern,
        Self::Code,
    ];

    /// Parses a datatype keyword. Returns `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == text)
    }

    /// Returns the declaration keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Name => "name",
            Self::Key => "key",
            Self::Range => "range",
            Self::Integer => "integer",
            Self::Datepart => "datepart",
            Self::Date => "date",
            Self::Verbatim => "verbatim",
            Self::Uri => "uri",
            Self::Keyword => "keyword",
            Self::Options => "options",
            Self::Pattern => "pattern",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties declared for a set of fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldProps {
    /// `field` or `list`; `None` when never declared.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: Option<FieldKind>,
    /// Value grammar; `None` when never declared.
    pub datatype: Option<Datatype>,
    /// Free-form format tag (`xsv`, `default`, ...).
    pub format: Option<String>,
    /// An empty value is permitted.
    pub nullok: bool,
    /// Present in the data but excluded from output.
    pub skipout: bool,
    /// May be used as a label.
    pub label: bool,
}

impl FieldProps {
    /// Creates props with the given kind and datatype.
    #[must_use]
    pub fn typed(kind: FieldKind, datatype: Datatype) -> Self {
        Self {
            kind: Some(kind),
            datatype: Some(datatype),
            ..Self::default()
        }
    }

    /// Sets the format tag.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets `nullok`.
    #[must_use]
    pub fn with_nullok(mut self, nullok: bool) -> Self {
        self.nullok = nullok;
        self
    }

    /// Sets `skipout`.
    #[must_use]
    pub fn with_skipout(mut self, skipout: bool) -> Self {
        self.skipout = skipout;
        self
    }

    /// Sets `label`.
    #[must_use]
    pub fn with_label(mut self, label: bool) -> Self {
        self.label = label;
        self
    }
}

// =============================================================================
// Entry and Constant Types
// =============================================================================

/// Properties declared for a set of entry types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryProps {
    /// Entries of this type are excluded from output.
    pub skipout: bool,
}

/// The value of a data-model constant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConstantValue {
    /// A single string.
    String(String),
    /// A comma-separated list.
    List(Vec<String>),
}

/// A named data-model constant (`\DeclareDatamodelConstant`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constant {
    /// Constant name.
    pub name: String,
    /// Constant value.
    pub value: ConstantValue,
}

// =============================================================================
// Constraint Types
// =============================================================================

/// How many fields of a condition must be present for it to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Quantifier {
    /// Every field is present.
    All,
    /// At least one field is present.
    One,
    /// No field is present.
    None,
}

impl Quantifier {
    /// Parses `all`, `one` or `none`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Returns the declaration keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::One => "one",
            Self::None => "none",
        }
    }

    /// Evaluates the quantifier over `fields` using `present` as the membership test.
    pub fn holds(self, fields: &[String], mut present: impl FnMut(&str) -> bool) -> bool {
        match self {
            Self::All => fields.iter().all(|f| present(f)),
            Self::One => fields.iter().any(|f| present(f)),
            Self::None => !fields.iter().any(|f| present(f)),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a conditional rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    /// How many of `fields` must be present.
    pub quantifier: Quantifier,
    /// The fields tested.
    pub fields: Vec<String>,
}

impl Condition {
    /// Creates a condition.
    #[must_use]
    pub fn new<S: Into<String>>(quantifier: Quantifier, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            quantifier,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Presence requirements for an entry's fields.
///
/// `all` lists fields that must each be present, every `some` group needs at
/// least one member present, and every `one` group needs exactly one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MandatoryConstraint {
    /// Individually required fields.
    pub all: Vec<String>,
    /// At-least-one groups.
    pub some: Vec<Vec<String>>,
    /// Exactly-one groups.
    pub one: Vec<Vec<String>>,
}

impl MandatoryConstraint {
    /// Creates an empty constraint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.some.is_empty() && self.one.is_empty()
    }

    /// Requires `field`, ignoring duplicates.
    pub fn add_all(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.all.contains(&field) {
            self.all.push(field);
        }
    }

    /// Adds an at-least-one group.
    ///
    /// A group that is a strict superset of an existing group replaces it in
    /// place; a group equal to an existing one, or an empty group, is dropped.
    pub fn add_some(&mut self, group: Vec<String>) {
        fold_group(&mut self.some, group, |existing, new| is_strict_subset(existing, new));
    }

    /// Adds an exactly-one group.
    ///
    /// A group that is a strict subset of an existing group replaces it in
    /// place; a group equal to an existing one, or an empty group, is dropped.
    pub fn add_one(&mut self, group: Vec<String>) {
        fold_group(&mut self.one, group, |existing, new| is_strict_subset(new, existing));
    }

    /// Folds every clause of `other` into this constraint.
    pub fn merge(&mut self, other: &MandatoryConstraint) {
        for field in &other.all {
            self.add_all(field.clone());
        }
        for group in &other.some {
            self.add_some(group.clone());
        }
        for group in &other.one {
            self.add_one(group.clone());
        }
    }

    /// Removes `fields` from the `all` list.
    pub fn relax_all(&mut self, fields: &[String]) {
        self.all.retain(|f| !fields.contains(f));
    }

    /// Removes `fields` from every `some` group, dropping groups left empty.
    pub fn relax_some(&mut self, fields: &[String]) {
        relax_groups(&mut self.some, fields);
    }

    /// Removes `fields` from every `one` group, dropping groups left empty.
    pub fn relax_one(&mut self, fields: &[String]) {
        relax_groups(&mut self.one, fields);
    }

    /// Iterates over every field named anywhere in this constraint.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.all
            .iter()
            .chain(self.some.iter().flatten())
            .chain(self.one.iter().flatten())
            .map(String::as_str)
    }
}

fn same_members(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|f| b.contains(f))
}

fn is_strict_subset(small: &[String], big: &[String]) -> bool {
    small.len() < big.len() && small.iter().all(|f| big.contains(f))
}

fn fold_group(
    groups: &mut Vec<Vec<String>>,
    group: Vec<String>,
    replaces: impl Fn(&[String], &[String]) -> bool,
) {
    if group.is_empty() || groups.iter().any(|g| same_members(g, &group)) {
        return;
    }
    if let Some(slot) = groups
        .iter_mut()
        .find(|g| replaces(g.as_slice(), group.as_slice()))
    {
        *slot = group;
    } else {
        groups.push(group);
    }
}

fn relax_groups(groups: &mut Vec<Vec<String>>, fields: &[String]) {
    for group in groups.iter_mut() {
        group.retain(|f| !fields.contains(f));
    }
    groups.retain(|g| !g.is_empty());
}

/// A field-level value constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataConstraint {
    /// Fields the constraint applies to.
    pub fields: Vec<String>,
    /// Checker name (`integer`, `datepart`, `pattern`, `isbn`, ...).
    pub datatype: Option<String>,
    /// Inclusive lower bound.
    pub rangemin: Option<i64>,
    /// Inclusive upper bound.
    pub rangemax: Option<i64>,
    /// Pattern source, possibly wrapped in `\regexp{...}`.
    pub pattern: Option<String>,
}

/// A constraint from a `\DeclareDatamodelConstraints` block.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Constraint {
    /// Field presence requirements.
    Mandatory(MandatoryConstraint),
    /// If `antecedent` holds then `consequent` must hold.
    Conditional {
        /// The triggering condition.
        antecedent: Condition,
        /// The obligation.
        consequent: Condition,
    },
    /// Value grammar for specific fields.
    Data(DataConstraint),
}

impl Constraint {
    /// Returns the declaration keyword of this constraint's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Mandatory(_) => "mandatory",
            Self::Conditional { .. } => "conditional",
            Self::Data(_) => "data",
        }
    }
}

// =============================================================================
// Reset
// =============================================================================

/// The category a `\ResetDatamodel...` command clears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResetKind {
    /// Entry types.
    Entrytypes,
    /// Field types.
    Fields,
    /// Entry-field associations and universal fields.
    Entryfields,
    /// Entry and universal constraints.
    Constraints,
}
