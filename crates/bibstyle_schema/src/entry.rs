//! Resolved entry-type records.

use std::collections::BTreeMap;
use std::sync::Arc;

use bibstyle_language::{Condition, MandatoryConstraint};

use crate::field::FieldSchema;

/// An implication between two field-presence conditions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionalRule {
    /// The triggering condition.
    pub antecedent: Condition,
    /// What must hold when the antecedent does.
    pub consequent: Condition,
}

/// The constraints attached to one entry type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryConstraintSet {
    /// `all` / `some` / `one` presence requirements.
    pub mandatory: MandatoryConstraint,
    /// Conditional rules, in declaration order.
    pub conditional: Vec<ConditionalRule>,
}

impl EntryConstraintSet {
    /// Returns true if the entry has no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.conditional.is_empty()
    }

    /// Adds a conditional rule unless an identical one is present.
    pub fn add_conditional(&mut self, rule: ConditionalRule) {
        if !self.conditional.contains(&rule) {
            self.conditional.push(rule);
        }
    }
}

/// A compiled entry-type schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntrySchema {
    /// Entry type name.
    pub name: String,
    /// Entries of this type are excluded from output.
    pub skipout: bool,
    /// Every field the entry permits, universal fields included.
    pub fields: BTreeMap<String, Arc<FieldSchema>>,
    /// Presence constraints.
    pub constraints: EntryConstraintSet,
    /// The entry type this one is an alias of.
    pub alias_of: Option<String>,
}

impl EntrySchema {
    /// Creates an entry with no fields and no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, skipout: bool) -> Self {
        Self {
            name: name.into(),
            skipout,
            fields: BTreeMap::new(),
            constraints: EntryConstraintSet::default(),
            alias_of: None,
        }
    }

    /// Looks up a permitted field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name).map(AsRef::as_ref)
    }

    /// Returns true if the entry permits `name`.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns a copy under another name, marked as an alias of `target`.
    #[must_use]
    pub fn aliased(&self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: alias.into(),
            alias_of: Some(target.into()),
            ..self.clone()
        }
    }
}
