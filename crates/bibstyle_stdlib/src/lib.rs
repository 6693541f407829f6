//! The built-in default data model for Bibstyle.
//!
//! This crate provides:
//! - [`DEFAULT_SOURCE`] - The default data-model source, embedded at build time
//! - [`default_template`] - The parsed default model
//!
//! Every style starts from this model; style overlays and directives are
//! layered on top of it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use bibstyle_foundation::Outcome;
use bibstyle_language::Template;
use tracing::debug;

/// The name under which the unmodified default model is compiled.
pub const DEFAULT_STYLE_NAME: &str = "default";

/// The default data-model source.
pub const DEFAULT_SOURCE: &str = include_str!("default.dbx");

/// Parses the default data model.
///
/// The embedded source parses cleanly, so the diagnostics are empty unless
/// the source has been edited.
#[must_use]
pub fn default_template() -> Outcome<Template> {
    let outcome = Template::from_source(DEFAULT_SOURCE);
    debug!(
        entries = outcome.value.entries().len(),
        fields = outcome.value.fields().len(),
        diagnostics = outcome.diagnostics.len(),
        "parsed default data model"
    );
    outcome
}
