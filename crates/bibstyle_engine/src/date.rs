//! The bibliographic date grammar.
//!
//! Accepts what the reference bibliography processor accepts, no more and
//! no less:
//!
//! - `..` (open date)
//! - `start` or `start/end`, each a year with optional month, day and
//!   `Thh:mm:ss` time, optionally followed by `%`, `~`, `?` qualifiers and a
//!   `Z` or `±hh:mm` zone, or a season code `YYYY-21` .. `YYYY-24`
//! - extended years `Y12345` / `Y-12345`
//! - unspecified digits `199X`, `19XX`, `1XXX`, `1999-XX`, `1999-01-XX`,
//!   `1999-XX-XX` (without an end date)
//!
//! Digits are ASCII only. Month and day digits are not range-checked unless
//! the grammar is built with `strict_calendar`.

use once_cell::sync::Lazy;
use regex::Regex;

static RANGE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]+)?/?([^/]+)?$").expect("valid regex"));
static UNSPECIFIED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]{3}X|[0-9]{2}XX|[0-9]{1}XXX|[0-9]{4}-(?:XX|[0-9]{2}-XX|XX-XX))$")
        .expect("valid regex")
});
static QUALIFIERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+?)\s*%?\s*~?\s*\??\s*$").expect("valid regex"));
static ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Z|[+-][0-9]{2}:[0-9]{2})$").expect("valid regex"));
static SEASON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?[0-9]{4})-2[1234]$").expect("valid regex"));
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:(-?[0-9]{4})(?:-([0-9]{2})(?:-([0-9]{2})(?:T[0-9]{2}:[0-9]{2}:[0-9]{2})?)?)?",
        r"|Y-?[0-9]{5,})$"
    ))
    .expect("valid regex")
});

/// Decides whether a value is an acceptable date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateGrammar {
    strict_calendar: bool,
}

impl DateGrammar {
    /// The lax grammar: month `13` and day `32` are accepted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_calendar: false,
        }
    }

    /// The grammar with month and day range checks.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict_calendar: true,
        }
    }

    /// Turns calendar checks on or off.
    #[must_use]
    pub const fn with_strict_calendar(mut self, strict: bool) -> Self {
        self.strict_calendar = strict;
        self
    }

    /// Returns true if month and day are range-checked.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        self.strict_calendar
    }

    /// Returns true if `value` is a valid date or date range.
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        if value == ".." {
            return true;
        }
        let Some(caps) = RANGE_SPLIT.captures(value) else {
            return false;
        };
        let Some(start) = caps.get(1).map(|m| m.as_str()) else {
            return false;
        };
        let end = caps.get(2).map(|m| m.as_str());

        if start.contains('X') {
            return end.is_none() && UNSPECIFIED.is_match(start);
        }
        self.accepts_single(start) && end.is_none_or(|end| self.accepts_single(end))
    }

    fn accepts_single(self, date: &str) -> bool {
        let date = QUALIFIERS.replace(date, "$1");
        let date = ZONE.replace(&date, "");
        let date = SEASON.replace(&date, "$1");
        let Some(caps) = DATE.captures(&date) else {
            return false;
        };
        if !self.strict_calendar {
            return true;
        }
        let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) else {
            // Extended year, nothing to range-check.
            return true;
        };
        let month = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let day = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        match (month, day) {
            (None, _) => true,
            (Some(m), None) => (1..=12).contains(&m),
            (Some(m), Some(d)) => (1..=12).contains(&m) && (1..=days_in_month(year, m)).contains(&d),
        }
    }
}

/// Returns true if `value` is accepted by the lax grammar.
#[must_use]
pub fn is_valid_date(value: &str) -> bool {
    DateGrammar::new().accepts(value)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
