//! Presence constraint evaluation.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use bibstyle_foundation::NameSet;
use bibstyle_language::Condition;
use bibstyle_schema::EntrySchema;

use crate::report::ViolationReport;

/// Anything that can answer "is this field present?".
pub trait FieldPresence {
    /// Returns true if the entry has a field called `name`.
    fn has_field(&self, name: &str) -> bool;
}

impl<K: Borrow<str> + Ord, V> FieldPresence for BTreeMap<K, V> {
    fn has_field(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<K: Borrow<str> + Eq + Hash, V, S: BuildHasher> FieldPresence for HashMap<K, V, S> {
    fn has_field(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<K: Borrow<str> + Ord> FieldPresence for BTreeSet<K> {
    fn has_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<K: Borrow<str> + Eq + Hash, S: BuildHasher> FieldPresence for HashSet<K, S> {
    fn has_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FieldPresence for NameSet {
    fn has_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<T: AsRef<str>> FieldPresence for [T] {
    fn has_field(&self, name: &str) -> bool {
        self.iter().any(|f| f.as_ref() == name)
    }
}

/// Evaluates a condition against the observed fields.
#[must_use]
pub fn condition_holds<P: FieldPresence + ?Sized>(condition: &Condition, observed: &P) -> bool {
    condition
        .quantifier
        .holds(&condition.fields, |f| observed.has_field(f))
}

/// Checks an entry's mandatory and conditional constraints.
///
/// Only presence matters here; values are checked separately.
#[must_use]
pub fn check_constraints<P: FieldPresence + ?Sized>(entry: &EntrySchema, observed: &P) -> ViolationReport {
    let mandatory = &entry.constraints.mandatory;
    let mut report = ViolationReport::default();

    report.missing_all_fields = mandatory
        .all
        .iter()
        .filter(|f| !observed.has_field(f))
        .cloned()
        .collect();

    for group in &mandatory.some {
        if !group.iter().any(|f| observed.has_field(f)) {
            report.missing_some_fields.push(group.clone());
        }
    }

    for group in &mandatory.one {
        let mut present = group.iter().filter(|f| observed.has_field(f));
        match (present.next(), present.next()) {
            (None, _) => report.missing_one_field.push(group.clone()),
            (Some(_), Some(_)) => report.too_many_fields.push(group.clone()),
            (Some(_), None) => {}
        }
    }

    for rule in &entry.constraints.conditional {
        if condition_holds(&rule.antecedent, observed) && !condition_holds(&rule.consequent, observed) {
            report.failed_conditionals.push(rule.clone());
        }
    }

    report
}
