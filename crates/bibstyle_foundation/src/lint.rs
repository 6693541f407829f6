//! Stable lint identifiers and watch/ignore selection.
//!
//! Every violation carries a short numeric code, always rendered as three
//! zero-padded digits (`"008"`, `"067"`). Users select which codes to report
//! through `watch` and `ignore` lists.

use std::collections::BTreeSet;
use std::fmt;

/// A stable violation identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LintCode(u16);

impl LintCode {
    /// Creates a code from its number.
    #[must_use]
    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn number(self) -> u16 {
        self.0
    }

    /// Parses a code from its textual id (`"7"`, `"07"`, `"007"`).
    ///
    /// Returns `None` for anything that is not a run of ASCII digits.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        id.parse().ok().map(Self)
    }
}

impl fmt::Display for LintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Left-pads a lint id with zeros to three digits.
///
/// Ids that are already three or more characters long are returned unchanged.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    format!("{id:0>3}")
}

/// Which lint codes are explicitly watched or ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LintSelection {
    watch: BTreeSet<LintCode>,
    ignore: BTreeSet<LintCode>,
}

impl LintSelection {
    /// Creates an empty selection; every code is reported.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a code as watched.
    pub fn watch(&mut self, code: LintCode) {
        self.ignore.remove(&code);
        self.watch.insert(code);
    }

    /// Marks a code as ignored.
    pub fn ignore(&mut self, code: LintCode) {
        self.watch.remove(&code);
        self.ignore.insert(code);
    }

    /// Returns the watched codes.
    #[must_use]
    pub fn watched(&self) -> &BTreeSet<LintCode> {
        &self.watch
    }

    /// Returns the ignored codes.
    #[must_use]
    pub fn ignored(&self) -> &BTreeSet<LintCode> {
        &self.ignore
    }

    /// Returns true if violations with this code should be reported.
    #[must_use]
    pub fn is_enabled(&self, code: LintCode) -> bool {
        !self.ignore.contains(&code)
    }

    /// Layers `other` on top of this selection.
    ///
    /// Codes watched by `other` are re-enabled even if this selection ignored them.
    #[must_use]
    pub fn merged_with(&self, other: &LintSelection) -> LintSelection {
        let mut merged = self.clone();
        for code in &other.ignore {
            merged.ignore(*code);
        }
        for code in &other.watch {
            merged.watch(*code);
        }
        merged
    }
}
