//! Whole-entry validation.

use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;

use bibstyle_schema::Style;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::constraint::check_constraints;
use crate::report::{Violation, ViolationKind, ViolationReport};
use crate::value::ValueChecker;

/// Everything found wrong with one entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryReport {
    /// The entry type as given.
    pub entry_type: String,
    /// Presence constraint results, before lint filtering.
    pub constraints: ViolationReport,
    /// All reported violations, after lint filtering.
    pub violations: Vec<Violation>,
}

impl EntryReport {
    /// Returns true if nothing is reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

/// Validates entries against a compiled style.
///
/// The validator only borrows the style, so any number of them can read
/// one shared style at once.
#[derive(Clone, Debug)]
pub struct EntryValidator<'s> {
    style: &'s Style,
    config: ValidationConfig,
    values: ValueChecker,
}

impl<'s> EntryValidator<'s> {
    /// Creates a validator with default settings.
    #[must_use]
    pub fn new(style: &'s Style) -> Self {
        Self::with_config(style, ValidationConfig::default())
    }

    /// Creates a validator with the given settings.
    #[must_use]
    pub fn with_config(style: &'s Style, config: ValidationConfig) -> Self {
        let values = ValueChecker::new(config.date_grammar());
        Self { style, config, values }
    }

    /// The style being validated against.
    #[must_use]
    pub fn style(&self) -> &'s Style {
        self.style
    }

    /// The settings in use.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validates one entry given its type and raw field values.
    ///
    /// An unknown entry type yields a single `005` violation and nothing
    /// else. Otherwise presence constraints are checked first, then unknown
    /// fields, then each value in field-name order.
    pub fn validate<K, V>(&self, entry_type: &str, fields: &BTreeMap<K, V>) -> EntryReport
    where
        K: Borrow<str> + Ord,
        V: AsRef<str>,
    {
        let mut report = EntryReport {
            entry_type: entry_type.to_string(),
            ..EntryReport::default()
        };

        let Some(entry) = self.style.entry(entry_type) else {
            debug!(entry = entry_type, "unknown entry type");
            self.push(&mut report.violations, Violation::new(ViolationKind::UnknownEntry, [entry_type]));
            return report;
        };

        report.constraints = check_constraints(entry, fields);
        for violation in report.constraints.violations() {
            self.push(&mut report.violations, violation);
        }

        if self.config.check_unknown_fields {
            for name in fields.keys() {
                let name: &str = name.borrow();
                if !entry.has_field(name) {
                    self.push(&mut report.violations, Violation::new(ViolationKind::UnknownField, [name]));
                }
            }
        }

        for (name, value) in fields {
            let name: &str = name.borrow();
            let field = match entry.field(name) {
                Some(field) => Cow::Borrowed(field),
                None => self.style.field_or_default(name),
            };
            if let Some(violation) = self.values.check(&field, value.as_ref()) {
                self.push(&mut report.violations, violation);
            }
        }

        debug!(
            entry = entry_type,
            violations = report.violations.len(),
            "validated entry"
        );
        report
    }

    /// Validates a batch of entries.
    pub fn validate_all<'a, K, V, I>(&self, entries: I) -> Vec<EntryReport>
    where
        K: Borrow<str> + Ord + 'a,
        V: AsRef<str> + 'a,
        I: IntoIterator<Item = (&'a str, &'a BTreeMap<K, V>)>,
    {
        entries
            .into_iter()
            .map(|(entry_type, fields)| self.validate(entry_type, fields))
            .collect()
    }

    fn push(&self, out: &mut Vec<Violation>, violation: Violation) {
        if self.config.lints.is_enabled(violation.code()) {
            out.push(violation);
        }
    }
}
