//! Per-style user configuration.
//!
//! The raw form mirrors what a user writes in a JSON or YAML file:
//!
//! ```json
//! {
//!   "global": { "lints": ["ignore 7"], "fields": ["add doi {type=field}"] },
//!   "styles": { "apa": { "entries": ["require article {all=[doi]}"] } }
//! }
//! ```
//!
//! Parsing never fails as a whole: malformed strings are reported and
//! skipped, the rest of the bundle is kept.

use std::collections::BTreeMap;

use bibstyle_foundation::{
    Diagnostics, Error, ErrorContext, LintCode, LintSelection, Outcome, Result,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::directive::{Directive, Target};

static LINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(w|watch|i|ignore)\s+([\s0-9,]+)$").expect("lint pattern is a valid regex")
});

// =============================================================================
// Raw Form
// =============================================================================

/// One bundle of directive strings, as written by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfigBundle {
    /// `watch`/`ignore` lint directives.
    pub lints: Vec<String>,
    /// Field directives.
    pub fields: Vec<String>,
    /// Entry directives.
    pub entries: Vec<String>,
}

/// The whole configuration file, as written by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStyleConfig {
    /// Applies to every style.
    pub global: Option<RawConfigBundle>,
    /// Applies to the named style only.
    pub styles: BTreeMap<String, RawConfigBundle>,
}

// =============================================================================
// Parsed Form
// =============================================================================

/// A parsed bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigBundle {
    /// Lint selection.
    pub lints: LintSelection,
    /// Field directives in order.
    pub fields: Vec<Directive>,
    /// Entry directives in order.
    pub entries: Vec<Directive>,
}

impl ConfigBundle {
    /// Parses a raw bundle, collecting problems.
    #[must_use]
    pub fn parse(raw: &RawConfigBundle) -> Outcome<ConfigBundle> {
        let mut bundle = ConfigBundle::default();
        let mut diags = Diagnostics::new();

        for line in &raw.lints {
            if let Err(e) = parse_lint(line, &mut bundle.lints) {
                diags.push(e);
            }
        }
        for (target, lines, out) in [
            (Target::Field, &raw.fields, &mut bundle.fields),
            (Target::Entry, &raw.entries, &mut bundle.entries),
        ] {
            for line in lines {
                match Directive::parse(target, line) {
                    Ok(directive) => out.push(directive),
                    Err(e) => {
                        warn!(directive = %line, error = %e, "skipping directive");
                        diags.push(e);
                    }
                }
            }
        }
        Outcome::new(bundle, diags)
    }

    /// Returns true if the bundle holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lints == LintSelection::default() && self.fields.is_empty() && self.entries.is_empty()
    }

    /// Field directives followed by entry directives.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.fields.iter().chain(self.entries.iter())
    }
}

/// Parses a lint directive such as `ignore 7, 19` into `selection`.
///
/// # Errors
///
/// Returns a directive error if the line is not a `w`/`watch`/`i`/`ignore`
/// command followed by numbers separated by commas or whitespace.
pub fn parse_lint(line: &str, selection: &mut LintSelection) -> Result<()> {
    let Some(caps) = LINT.captures(line) else {
        return Err(Error::directive("unrecognised lint directive")
            .with_context(ErrorContext::new().with_snippet(line)));
    };
    let watch = matches!(&caps[1], "w" | "watch");
    let ids = caps[2].split(|c: char| c == ',' || c.is_whitespace());
    for id in ids.filter(|s| !s.is_empty()) {
        // Digits only, so this fails only on overflow.
        let Some(code) = LintCode::parse(id) else {
            return Err(Error::directive(format!("lint id {id} out of range"))
                .with_context(ErrorContext::new().with_snippet(line)));
        };
        if watch {
            selection.watch(code);
        } else {
            selection.ignore(code);
        }
    }
    Ok(())
}

/// Parsed configuration for all styles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleConfig {
    global: ConfigBundle,
    styles: BTreeMap<String, ConfigBundle>,
}

impl StyleConfig {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the raw form.
    #[must_use]
    pub fn from_raw(raw: &RawStyleConfig) -> Outcome<StyleConfig> {
        let mut diags = Diagnostics::new();
        let global = match &raw.global {
            Some(bundle) => ConfigBundle::parse(bundle).collect_into(&mut diags),
            None => ConfigBundle::default(),
        };
        let mut styles = BTreeMap::new();
        for (name, bundle) in &raw.styles {
            let (parsed, problems) = ConfigBundle::parse(bundle).into_parts();
            for error in problems {
                let context = error.context.clone().unwrap_or_default().with_source(name.clone());
                diags.push(error.with_context(context));
            }
            styles.insert(name.clone(), parsed);
        }
        Outcome::new(StyleConfig { global, styles }, diags)
    }

    /// The global bundle.
    #[must_use]
    pub fn global(&self) -> &ConfigBundle {
        &self.global
    }

    /// The bundle for one style, if configured.
    #[must_use]
    pub fn style(&self, name: &str) -> Option<&ConfigBundle> {
        self.styles.get(name)
    }

    /// Names of styles with their own bundle.
    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    /// Directives for `style`: the global bundle's, then the style's own.
    pub fn directives_for<'a>(&'a self, style: &str) -> impl Iterator<Item = &'a Directive> + 'a {
        self.global
            .directives()
            .chain(self.styles.get(style).into_iter().flat_map(|bundle| bundle.directives()))
    }

    /// The lint selection for `style`: global, overlaid with the style's own.
    #[must_use]
    pub fn lints_for(&self, style: &str) -> LintSelection {
        match self.styles.get(style) {
            Some(bundle) => self.global.lints.merged_with(&bundle.lints),
            None => self.global.lints.clone(),
        }
    }
}
