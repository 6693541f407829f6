//! The compiled, immutable schema.
//!
//! `Style::compile` resolves a `ProtoStyle` into concrete field and entry
//! records. The result is never mutated; share it behind an `Arc` and
//! publish a fresh one when the active style changes.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bibstyle_foundation::{Diagnostics, Error, Outcome};
use bibstyle_language::{ConstantValue, Constraint};
use im::OrdMap;
use tracing::{debug, warn};

use crate::entry::{EntryConstraintSet, EntrySchema};
use crate::field::FieldSchema;
use crate::proto::ProtoStyle;

/// Compiler settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// How many alias links are followed before giving up.
    pub max_alias_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_alias_depth: 8 }
    }
}

impl CompileOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias depth limit.
    #[must_use]
    pub fn with_max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth;
        self
    }
}

/// Follows `name` through an alias map to the record it ultimately names.
///
/// Returns `None` if the chain is longer than `max_depth` (including cycles).
#[must_use]
pub fn resolve_alias<'a>(
    aliases: &'a OrdMap<String, String>,
    name: &'a str,
    max_depth: usize,
) -> Option<&'a str> {
    let mut current = name;
    for _ in 0..=max_depth {
        match aliases.get(current) {
            Some(target) => current = target,
            None => return Some(current),
        }
    }
    None
}

/// A compiled style.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    name: String,
    constants: BTreeMap<String, ConstantValue>,
    entries: BTreeMap<String, Arc<EntrySchema>>,
    fields: BTreeMap<String, Arc<FieldSchema>>,
    universal_fields: BTreeMap<String, Arc<FieldSchema>>,
    untyped_fields: BTreeSet<String>,
    skipout_fields: BTreeSet<String>,
}

/// Field records under construction.
struct FieldTable {
    fields: BTreeMap<String, FieldSchema>,
    untyped: BTreeSet<String>,
}

impl FieldTable {
    /// Returns the record for `name`, creating an untyped default if missing.
    fn get_or_default(&mut self, name: &str) -> &mut FieldSchema {
        if !self.fields.contains_key(name) {
            self.untyped.insert(name.to_string());
        }
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| FieldSchema::untyped(name))
    }
}

impl Style {
    /// Compiles an aggregate into a style.
    ///
    /// Problems never abort compilation: misplaced constraints, invalid
    /// patterns and undeclared names are reported as diagnostics and the
    /// offending piece is skipped or defaulted.
    #[must_use]
    pub fn compile(name: impl Into<String>, proto: &ProtoStyle, options: &CompileOptions) -> Outcome<Style> {
        let name = name.into();
        let mut diags = Diagnostics::new();
        debug!(
            style = %name,
            entries = proto.entries().len(),
            fields = proto.fields().len(),
            "compiling style"
        );

        let mut table = FieldTable {
            fields: BTreeMap::new(),
            untyped: BTreeSet::new(),
        };

        // Every declared field, aliases included, compiles from its own properties.
        for (field, props) in proto.fields() {
            table.fields.insert(field.clone(), FieldSchema::new(field.clone(), props));
        }

        let mut families: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for alias in proto.field_aliases().keys() {
            match resolve_alias(proto.field_aliases(), alias, options.max_alias_depth) {
                Some(target) if table.fields.contains_key(target) => {
                    if let Some(record) = table.fields.get_mut(alias) {
                        record.alias_of = Some(target.to_string());
                    }
                    families.entry(target).or_default().push(alias.as_str());
                }
                Some(target) => diags.push(Error::schema_integrity(format!(
                    "alias {alias} names undeclared field {target}"
                ))),
                None => diags.push(Error::compile(format!(
                    "alias chain for field {alias} exceeds depth {}",
                    options.max_alias_depth
                ))),
            }
        }

        // A data constraint on a field also binds the field's aliases.
        for constraint in proto.universal_constraints() {
            match constraint {
                Constraint::Data(data) => {
                    for field in &data.fields {
                        let aliases = families.get(field.as_str()).into_iter().flatten();
                        for name in std::iter::once(field.as_str()).chain(aliases.copied()) {
                            if let Err(e) = table.get_or_default(name).apply_data_constraint(data) {
                                diags.push(e);
                            }
                        }
                    }
                }
                other => diags.push(Error::compile(format!(
                    "{} constraint declared without an owning entry",
                    other.type_name()
                ))),
            }
        }

        for field in proto.universal_fields().iter() {
            table.get_or_default(field);
        }
        for (entry, set) in proto.entry_fields() {
            for field in set.iter() {
                table.get_or_default(field);
            }
            if !proto.has_entry(entry) {
                diags.push(Error::schema_integrity(format!(
                    "fields associated with undeclared entry {entry}"
                )));
            }
        }
        for (entry, rules) in proto.entry_rules() {
            for field in rules.mandatory.field_names() {
                table.get_or_default(field);
            }
            if !proto.has_entry(entry) {
                diags.push(Error::schema_integrity(format!(
                    "constraints declared for undeclared entry {entry}"
                )));
            }
            for data in &rules.data {
                diags.push(Error::compile(format!(
                    "data constraint on {} cannot be scoped to entry {entry}",
                    data.fields.join(", ")
                )));
            }
        }

        for field in &table.untyped {
            warn!(field = %field, "field used without a declared type");
            diags.push(Error::schema_integrity(format!("untyped field {field}")));
        }

        let skipout_fields = table
            .fields
            .values()
            .filter(|f| f.skipout)
            .map(|f| f.name.clone())
            .collect();
        let fields: BTreeMap<String, Arc<FieldSchema>> = table
            .fields
            .into_iter()
            .map(|(k, v)| (k, Arc::new(v)))
            .collect();
        let universal_fields: BTreeMap<String, Arc<FieldSchema>> = proto
            .universal_fields()
            .iter()
            .filter_map(|f| fields.get(f).map(|s| (f.to_string(), Arc::clone(s))))
            .collect();

        let mut entries = BTreeMap::new();
        for (entry, props) in proto.entries() {
            if proto.entry_aliases().contains_key(entry) {
                continue;
            }
            let mut schema = EntrySchema::new(entry.clone(), props.skipout);
            let explicit = proto.entry_fields().get(entry).into_iter().flat_map(|s| s.iter());
            for field in explicit.chain(proto.universal_fields().iter()) {
                if let Some(record) = fields.get(field) {
                    schema.fields.insert(field.to_string(), Arc::clone(record));
                }
            }
            if let Some(rules) = proto.entry_rules().get(entry) {
                for field in rules.mandatory.field_names() {
                    if let Some(record) = fields.get(field) {
                        schema
                            .fields
                            .entry(field.to_string())
                            .or_insert_with(|| Arc::clone(record));
                    }
                }
                schema.constraints = EntryConstraintSet {
                    mandatory: rules.mandatory.clone(),
                    conditional: rules.conditional.clone(),
                };
            }
            entries.insert(entry.clone(), Arc::new(schema));
        }

        for alias in proto.entry_aliases().keys() {
            match resolve_alias(proto.entry_aliases(), alias, options.max_alias_depth) {
                Some(target) => match entries.get(target) {
                    Some(schema) => {
                        let aliased = schema.aliased(alias.clone(), target);
                        entries.insert(alias.clone(), Arc::new(aliased));
                    }
                    None => diags.push(Error::schema_integrity(format!(
                        "alias {alias} names undeclared entry {target}"
                    ))),
                },
                None => diags.push(Error::compile(format!(
                    "alias chain for entry {alias} exceeds depth {}",
                    options.max_alias_depth
                ))),
            }
        }

        let style = Style {
            name,
            constants: proto
                .constants()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            entries,
            fields,
            universal_fields,
            untyped_fields: table.untyped,
            skipout_fields,
        };
        Outcome::new(style, diags)
    }

    /// The style's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an entry type.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&EntrySchema> {
        self.entries.get(name).map(AsRef::as_ref)
    }

    /// Looks up a field known to the style.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name).map(AsRef::as_ref)
    }

    /// Looks up a field, falling back to a fresh untyped default.
    ///
    /// The style itself is not changed by asking about unseen names.
    #[must_use]
    pub fn field_or_default(&self, name: &str) -> Cow<'_, FieldSchema> {
        match self.field(name) {
            Some(field) => Cow::Borrowed(field),
            None => Cow::Owned(FieldSchema::untyped(name)),
        }
    }

    /// Iterates over entry types in name order.
    pub fn entries(&self) -> impl Iterator<Item = &EntrySchema> {
        self.entries.values().map(AsRef::as_ref)
    }

    /// Iterates over fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values().map(AsRef::as_ref)
    }

    /// Returns true if `name` is permitted on every entry.
    #[must_use]
    pub fn is_universal(&self, name: &str) -> bool {
        self.universal_fields.contains_key(name)
    }

    /// Iterates over universal field names.
    pub fn universal_fields(&self) -> impl Iterator<Item = &str> {
        self.universal_fields.keys().map(String::as_str)
    }

    /// Fields that were referenced but never given a type.
    #[must_use]
    pub fn untyped_fields(&self) -> &BTreeSet<String> {
        &self.untyped_fields
    }

    /// Fields marked `skipout`.
    #[must_use]
    pub fn skipout_fields(&self) -> &BTreeSet<String> {
        &self.skipout_fields
    }

    /// Looks up a constant.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&ConstantValue> {
        self.constants.get(name)
    }

    /// All constants.
    #[must_use]
    pub fn constants(&self) -> &BTreeMap<String, ConstantValue> {
        &self.constants
    }
}
