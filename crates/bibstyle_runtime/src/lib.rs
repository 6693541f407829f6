//! Style registry, serialization, and CLI support for Bibstyle.
//!
//! This crate provides:
//! - [`StyleRegistry`] - Compiles, caches and publishes styles
//! - Template, configuration and entry (de)serialization
//! - The `bibstyle` command-line validator

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod registry;
pub mod serialize;

pub use registry::StyleRegistry;
pub use serialize::{
    EntryRecord, TemplateFormat, config_from_json, config_from_yaml, entries_from_json,
    load_config, load_entries, load_template, save_template, template_from_bytes,
    template_from_json, template_to_bytes, template_to_json,
};
