//! Persistent name sets with structural sharing.
//!
//! A thin wrapper around `im::OrdSet<String>`. Schema aggregation clones
//! field sets freely (entry `derives`, alias propagation, compile snapshots),
//! so cloning has to stay O(1).

use std::fmt;
use std::iter::FromIterator;

/// Ordered, persistent set of schema names (fields or entry types).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NameSet(im::OrdSet<String>);

impl NameSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(im::OrdSet::new())
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the set contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Adds a name in place. Returns true if it was not already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into()).is_none()
    }

    /// Removes a name in place. Returns true if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name).is_some()
    }

    /// Returns a new set with `name` added.
    #[must_use]
    pub fn with(&self, name: impl Into<String>) -> Self {
        Self(self.0.update(name.into()))
    }

    /// Returns a new set with `name` removed.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        Self(self.0.without(name))
    }

    /// Returns the union of two sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.clone().union(other.0.clone()))
    }

    /// Returns the names in `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.clone().relative_complement(other.0.clone()))
    }

    /// Returns true if every name in `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns true if `self` is a subset of `other` and strictly smaller.
    #[must_use]
    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.0.is_proper_subset(&other.0)
    }

    /// Iterates over names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Debug for NameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for NameSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.0.insert(name.into());
        }
    }
}

impl IntoIterator for NameSet {
    type Item = String;
    type IntoIter = im::ordset::ConsumingIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
