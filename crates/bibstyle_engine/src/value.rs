//! Single field value checks.

use bibstyle_language::Datatype;
use bibstyle_schema::FieldSchema;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::date::DateGrammar;
use crate::report::{Violation, ViolationKind};

static RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\-]*\-+[^\-]*$").expect("valid regex"));

/// Checks raw field values against their schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueChecker {
    dates: DateGrammar,
}

impl ValueChecker {
    /// Creates a checker using `dates` for date values.
    #[must_use]
    pub const fn new(dates: DateGrammar) -> Self {
        Self { dates }
    }

    /// The date grammar in use.
    #[must_use]
    pub const fn dates(self) -> DateGrammar {
        self.dates
    }

    /// Checks one value, returning the first problem found.
    ///
    /// An empty value on a field without `nullok` is always a violation.
    /// List fields get no further checks. Otherwise `range`, `date` and
    /// `datepart` values are checked for shape, declared integer bounds are
    /// checked when the value is an integer, and on a `pattern` field the
    /// declared pattern must match somewhere in the value.
    #[must_use]
    pub fn check(self, field: &FieldSchema, raw: &str) -> Option<Violation> {
        let violation = |kind| Some(Violation::new(kind, [field.name.as_str()]));

        if raw.trim().is_empty() {
            return if field.nullok {
                None
            } else {
                violation(ViolationKind::EmptyValue)
            };
        }
        if field.is_list() {
            return None;
        }

        match field.datatype {
            Some(Datatype::Range) if !RANGE.is_match(raw) => {
                return violation(ViolationKind::InvalidRange);
            }
            Some(Datatype::Date | Datatype::Datepart) if !self.dates.accepts(raw) => {
                return violation(ViolationKind::InvalidDate);
            }
            _ => {}
        }

        if let Ok(n) = raw.trim().parse::<i64>() {
            let below = field.rangemin.is_some_and(|min| n < min);
            let above = field.rangemax.is_some_and(|max| n > max);
            if below || above {
                return violation(ViolationKind::OutOfBounds);
            }
        }

        match (&field.pattern, field.datatype) {
            (Some(pattern), Some(Datatype::Pattern)) if !pattern.is_match(raw) => {
                violation(ViolationKind::PatternMismatch)
            }
            _ => None,
        }
    }
}

/// Checks one value with the default (lax) date grammar.
#[must_use]
pub fn check_value(field: &FieldSchema, raw: &str) -> Option<Violation> {
    ValueChecker::default().check(field, raw)
}
