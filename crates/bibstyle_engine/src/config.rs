//! Validation settings.

use bibstyle_foundation::{LintCode, LintSelection};

use crate::date::DateGrammar;

/// Settings for [`EntryValidator`](crate::EntryValidator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Range-check month and day digits in dates.
    pub strict_calendar: bool,
    /// Report observed fields the entry does not permit.
    pub check_unknown_fields: bool,
    /// Which violation codes are reported.
    pub lints: LintSelection,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_calendar: false,
            check_unknown_fields: true,
            lints: LintSelection::new(),
        }
    }
}

impl ValidationConfig {
    /// Creates the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns calendar checks on or off.
    #[must_use]
    pub fn with_strict_calendar(mut self, strict: bool) -> Self {
        self.strict_calendar = strict;
        self
    }

    /// Turns unknown field detection on or off.
    #[must_use]
    pub fn with_unknown_fields(mut self, check: bool) -> Self {
        self.check_unknown_fields = check;
        self
    }

    /// Replaces the lint selection.
    #[must_use]
    pub fn with_lints(mut self, lints: LintSelection) -> Self {
        self.lints = lints;
        self
    }

    /// Ignores one code.
    #[must_use]
    pub fn ignoring(mut self, code: LintCode) -> Self {
        self.lints.ignore(code);
        self
    }

    /// The date grammar these settings call for.
    #[must_use]
    pub fn date_grammar(&self) -> DateGrammar {
        DateGrammar::new().with_strict_calendar(self.strict_calendar)
    }
}
