//! Template and style configuration (de)serialization.
//!
//! Templates are stored either as `MessagePack` (the compact precompiled
//! form) or as JSON. Style configuration is read from JSON or YAML. File
//! formats are chosen by extension. Entries to validate are read from a
//! JSON array of `{ "type": ..., "key": ..., "fields": { ... } }` records.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bibstyle_directives::{RawStyleConfig, StyleConfig};
use bibstyle_foundation::{Error, ErrorContext, ErrorKind, Outcome, Result};
use bibstyle_language::Template;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk template formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFormat {
    /// Data-model source text.
    Source,
    /// JSON.
    Json,
    /// Named `MessagePack`.
    MessagePack,
}

impl TemplateFormat {
    /// Picks a format from a file extension; anything unrecognised is `MessagePack`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("dbx" | "def" | "tex") => Self::Source,
            Some("json") => Self::Json,
            _ => Self::MessagePack,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Serializes a template to `MessagePack` bytes.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn template_to_bytes(template: &Template) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(template).map_err(serialization)
}

/// Deserializes a template from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a serialized template.
pub fn template_from_bytes(bytes: &[u8]) -> Result<Template> {
    rmp_serde::from_slice(bytes).map_err(serialization)
}

/// Serializes a template to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn template_to_json(template: &Template) -> Result<String> {
    serde_json::to_string_pretty(template).map_err(serialization)
}

/// Deserializes a template from JSON.
///
/// # Errors
///
/// Returns an error if the text is not a serialized template.
pub fn template_from_json(text: &str) -> Result<Template> {
    serde_json::from_str(text).map_err(serialization)
}

/// Saves a template, as JSON for `.json` paths and `MessagePack` otherwise.
///
/// # Errors
///
/// Returns an error if the path names a source file, or if serialization
/// or writing fails.
pub fn save_template<P: AsRef<Path>>(template: &Template, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = match TemplateFormat::from_path(path) {
        TemplateFormat::Json => template_to_json(template)?.into_bytes(),
        TemplateFormat::MessagePack => template_to_bytes(template)?,
        TemplateFormat::Source => {
            return Err(Error::new(ErrorKind::Serialization(format!(
                "cannot write a template as data-model source: '{}'",
                path.display()
            ))));
        }
    };
    write_file(path, &bytes)
}

/// Loads a template from source text, JSON or `MessagePack`.
///
/// Source files are parsed, so the outcome may carry parse diagnostics;
/// serialized templates load clean.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialized.
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<Outcome<Template>> {
    let path = path.as_ref();
    let bytes = read_file(path)?;
    let format = TemplateFormat::from_path(path);
    debug!(path = %path.display(), ?format, "loading template");
    match format {
        TemplateFormat::Source => Ok(Template::from_source(&utf8(path, bytes)?)),
        TemplateFormat::Json => template_from_json(&utf8(path, bytes)?).map(Outcome::clean),
        TemplateFormat::MessagePack => template_from_bytes(&bytes).map(Outcome::clean),
    }
}

// =============================================================================
// Style Configuration
// =============================================================================

/// Reads raw style configuration from JSON.
///
/// # Errors
///
/// Returns an error if the text is not valid configuration.
pub fn config_from_json(text: &str) -> Result<RawStyleConfig> {
    serde_json::from_str(text).map_err(serialization)
}

/// Reads raw style configuration from YAML.
///
/// # Errors
///
/// Returns an error if the text is not valid configuration.
pub fn config_from_yaml(text: &str) -> Result<RawStyleConfig> {
    serde_yaml_ng::from_str(text).map_err(serialization)
}

/// Loads and parses style configuration, as YAML for `.yaml`/`.yml` paths
/// and JSON otherwise.
///
/// Malformed directives and lint lines are reported in the outcome and
/// skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON/YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Outcome<StyleConfig>> {
    let path = path.as_ref();
    let text = utf8(path, read_file(path)?)?;
    let raw = match extension(path).as_deref() {
        Some("yaml" | "yml") => config_from_yaml(&text),
        _ => config_from_json(&text),
    }
    .map_err(|e| e.with_context(ErrorContext::new().with_source(path.display().to_string())))?;
    Ok(StyleConfig::from_raw(&raw))
}

// =============================================================================
// Entries
// =============================================================================

/// One bibliography entry as handed to the validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// The entry type.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// The citation key, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Raw field values by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl EntryRecord {
    /// Creates a record with no key.
    #[must_use]
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            ..Self::default()
        }
    }

    /// Sets the citation key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Adds a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Reads entry records from a JSON array.
///
/// Entry types and field names are lowercased, matching the case-insensitive
/// names of the data model.
///
/// # Errors
///
/// Returns an error if the text is not an array of entry records.
pub fn entries_from_json(text: &str) -> Result<Vec<EntryRecord>> {
    let records: Vec<EntryRecord> = serde_json::from_str(text).map_err(serialization)?;
    Ok(records
        .into_iter()
        .map(|r| EntryRecord {
            entry_type: r.entry_type.to_lowercase(),
            key: r.key,
            fields: r.fields.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect(),
        })
        .collect())
}

/// Loads entry records from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_entries<P: AsRef<Path>>(path: P) -> Result<Vec<EntryRecord>> {
    let path = path.as_ref();
    entries_from_json(&utf8(path, read_file(path)?)?)
        .map_err(|e| e.with_context(ErrorContext::new().with_source(path.display().to_string())))
}

// =============================================================================
// Helpers
// =============================================================================

fn serialization(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Serialization(e.to_string()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn utf8(path: &Path, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "file '{}' is not valid UTF-8: {e}",
            path.display()
        )))
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;
    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;
    Ok(bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to write to file '{}': {e}",
                path.display()
            )))
        })
}
