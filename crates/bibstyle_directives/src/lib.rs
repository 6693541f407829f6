//! Override directives and per-style configuration for Bibstyle.
//!
//! This crate provides:
//! - [`Directive`] - One parsed `<verb> <name> {options}` override
//! - [`StyleConfig`] - Global and per-style bundles of directives and lint selections
//! - [`DirectiveInterpreter`] - Applies directives to a `ProtoStyle`
//!
//! Parsing and application both collect problems instead of stopping: a
//! malformed or inapplicable directive is reported and skipped.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod directive;
pub mod interpreter;
pub mod options;


pub use config::{ConfigBundle, RawConfigBundle, RawStyleConfig, StyleConfig, parse_lint};
pub use directive::{Directive, Target, Verb};
pub use interpreter::DirectiveInterpreter;
pub use options::{DirectiveOption, OptionValue, parse_options};
