//! Collected, non-fatal problems.
//!
//! Parsing, directive application and compilation never abort on a single
//! bad declaration. Each stage returns its partial result together with the
//! problems it skipped over.

use crate::error::{Error, Severity};

/// An ordered list of problems found while processing some input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem.
    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Appends every problem from `other`.
    pub fn append(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    /// Returns the number of recorded problems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if nothing went wrong.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any recorded problem has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity() == Severity::Error)
    }

    /// Iterates over recorded problems in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    /// Iterates over problems of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Error> {
        self.errors.iter().filter(move |e| e.severity() == severity)
    }

    /// Consumes the list, returning the underlying errors.
    #[must_use]
    pub fn into_vec(self) -> Vec<Error> {
        self.errors
    }
}

impl From<Vec<Error>> for Diagnostics {
    fn from(errors: Vec<Error>) -> Self {
        Self { errors }
    }
}

impl Extend<Error> for Diagnostics {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// A (possibly partial) result together with the problems met producing it.
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    /// The produced value.
    pub value: T,
    /// Everything that was skipped or recovered from.
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    /// Creates an outcome with no diagnostics.
    #[must_use]
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Creates an outcome with the given diagnostics.
    #[must_use]
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// Maps the value, keeping the diagnostics.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Moves this outcome's diagnostics into `sink` and returns the value.
    #[must_use]
    pub fn collect_into(self, sink: &mut Diagnostics) -> T {
        sink.append(self.diagnostics);
        self.value
    }

    /// Splits into value and diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }
}
