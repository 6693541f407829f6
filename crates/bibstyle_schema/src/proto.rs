//! The mutable schema aggregate.
//!
//! A `ProtoStyle` folds an ordered list of templates into one schema and is
//! then edited by override directives. It is built on persistent maps so a
//! snapshot (for example before applying a style's directives) costs O(1).

use bibstyle_foundation::{Error, NameSet, Result};
use bibstyle_language::{
    ConstantValue, Constraint, DataConstraint, EntryProps, FieldProps, MandatoryConstraint,
    ResetKind, Template,
};
use im::OrdMap;
use tracing::debug;

use crate::entry::ConditionalRule;

/// Constraints gathered for one entry type during aggregation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryRules {
    /// Folded presence requirements.
    pub mandatory: MandatoryConstraint,
    /// Conditional rules without duplicates.
    pub conditional: Vec<ConditionalRule>,
    /// Data constraints declared for the entry; rejected at compile time.
    pub data: Vec<DataConstraint>,
}

impl EntryRules {
    /// Folds one constraint into these rules.
    pub fn add(&mut self, constraint: &Constraint) {
        match constraint {
            Constraint::Mandatory(m) => self.mandatory.merge(m),
            Constraint::Conditional {
                antecedent,
                consequent,
            } => {
                let rule = ConditionalRule {
                    antecedent: antecedent.clone(),
                    consequent: consequent.clone(),
                };
                if !self.conditional.contains(&rule) {
                    self.conditional.push(rule);
                }
            }
            Constraint::Data(d) => {
                if !self.data.contains(d) {
                    self.data.push(d.clone());
                }
            }
        }
    }

    /// Returns true if no rule is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.conditional.is_empty() && self.data.is_empty()
    }
}

/// The aggregate schema, prior to compilation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtoStyle {
    constants: OrdMap<String, ConstantValue>,
    entries: OrdMap<String, EntryProps>,
    fields: OrdMap<String, FieldProps>,
    entry_fields: OrdMap<String, NameSet>,
    universal_fields: NameSet,
    entry_rules: OrdMap<String, EntryRules>,
    universal_constraints: Vec<Constraint>,
    field_aliases: OrdMap<String, String>,
    entry_aliases: OrdMap<String, String>,
}

impl ProtoStyle {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Folds templates left to right into a new aggregate.
    #[must_use]
    pub fn aggregate<'a>(templates: impl IntoIterator<Item = &'a Template>) -> Self {
        let mut proto = Self::new();
        for template in templates {
            proto.add_template(template);
        }
        proto
    }

    /// Folds one template into the aggregate.
    ///
    /// A category the template resets is cleared first. Scalar properties
    /// are last-writer-wins; field sets and constraints are unioned.
    pub fn add_template(&mut self, template: &Template) {
        for kind in [
            ResetKind::Entrytypes,
            ResetKind::Fields,
            ResetKind::Entryfields,
            ResetKind::Constraints,
        ] {
            if template.resets(kind) {
                debug!(?kind, "resetting aggregate category");
                self.reset(kind);
            }
        }

        for constant in template.constants() {
            self.constants
                .insert(constant.name.clone(), constant.value.clone());
        }
        for group in template.entries() {
            for name in &group.names {
                self.entries.insert(name.clone(), group.properties.clone());
            }
        }
        for group in template.fields() {
            for name in &group.names {
                self.fields.insert(name.clone(), group.properties.clone());
            }
        }
        for (entry, fields) in template.entry_fields() {
            self.add_entry_fields(entry, fields.iter().cloned());
        }
        self.universal_fields
            .extend(template.universal_fields().iter().cloned());
        for block in template.entry_constraints() {
            for entry in &block.entries {
                let rules = self.rules_mut(entry);
                for constraint in &block.constraints {
                    rules.add(constraint);
                }
            }
        }
        for constraint in template.universal_constraints() {
            if !self.universal_constraints.contains(constraint) {
                self.universal_constraints.push(constraint.clone());
            }
        }
    }

    /// Clears one category of the aggregate.
    pub fn reset(&mut self, kind: ResetKind) {
        match kind {
            ResetKind::Entrytypes => {
                self.entries.clear();
                self.entry_aliases.clear();
            }
            ResetKind::Fields => {
                self.fields.clear();
                self.field_aliases.clear();
            }
            ResetKind::Entryfields => {
                self.entry_fields.clear();
                self.universal_fields = NameSet::new();
            }
            ResetKind::Constraints => {
                self.entry_rules.clear();
                self.universal_constraints.clear();
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Declared constants.
    #[must_use]
    pub fn constants(&self) -> &OrdMap<String, ConstantValue> {
        &self.constants
    }

    /// Declared entry types and their properties.
    #[must_use]
    pub fn entries(&self) -> &OrdMap<String, EntryProps> {
        &self.entries
    }

    /// Declared fields and their properties.
    #[must_use]
    pub fn fields(&self) -> &OrdMap<String, FieldProps> {
        &self.fields
    }

    /// Entry → explicit field set index.
    #[must_use]
    pub fn entry_fields(&self) -> &OrdMap<String, NameSet> {
        &self.entry_fields
    }

    /// Fields permitted on every entry.
    #[must_use]
    pub fn universal_fields(&self) -> &NameSet {
        &self.universal_fields
    }

    /// Entry → constraint index.
    #[must_use]
    pub fn entry_rules(&self) -> &OrdMap<String, EntryRules> {
        &self.entry_rules
    }

    /// Constraints declared without an owning entry.
    #[must_use]
    pub fn universal_constraints(&self) -> &[Constraint] {
        &self.universal_constraints
    }

    /// Field alias → target.
    #[must_use]
    pub fn field_aliases(&self) -> &OrdMap<String, String> {
        &self.field_aliases
    }

    /// Entry alias → target.
    #[must_use]
    pub fn entry_aliases(&self) -> &OrdMap<String, String> {
        &self.entry_aliases
    }

    /// Returns true if `name` is a declared field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns true if `name` is a declared entry type.
    #[must_use]
    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    // =========================================================================
    // Field Edits
    // =========================================================================

    /// Declares or replaces a field.
    pub fn set_field(&mut self, name: impl Into<String>, props: FieldProps) {
        self.fields.insert(name.into(), props);
    }

    /// Mutable access to a declared field's properties.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldProps> {
        self.fields.get_mut(name)
    }

    /// Deletes a field and every reference to it from field sets.
    pub fn remove_field(&mut self, name: &str) {
        self.fields.remove(name);
        self.field_aliases.remove(name);
        self.universal_fields.remove(name);
        let entries: Vec<String> = self.entry_fields.keys().cloned().collect();
        for entry in entries {
            self.remove_entry_fields(&entry, [name]);
        }
    }

    /// Registers `aliases` as alternate names of the field `target`.
    ///
    /// Every field set holding `target` gains the aliases, and a mandatory
    /// `all` requirement on `target` becomes a `some` group of `target` and
    /// its aliases, so any member of the family satisfies it.
    ///
    /// # Errors
    ///
    /// Returns a directive error if `target` is not a declared field, or if
    /// an alias is `target` itself or an alias `target` already leads to.
    pub fn alias_field(&mut self, target: &str, aliases: &[String]) -> Result<()> {
        let Some(props) = self.fields.get(target).cloned() else {
            return Err(Error::directive(format!("cannot alias unknown field {target}")));
        };
        check_alias_links(&self.field_aliases, "field", target, aliases)?;

        for alias in aliases {
            self.fields.insert(alias.clone(), props.clone());
            self.field_aliases.insert(alias.clone(), target.to_string());
        }

        if self.universal_fields.contains(target) {
            self.universal_fields.extend(aliases.iter().cloned());
        }
        let holders: Vec<String> = self
            .entry_fields
            .iter()
            .filter(|(_, set)| set.contains(target))
            .map(|(entry, _)| entry.clone())
            .collect();
        for entry in holders {
            self.add_entry_fields(&entry, aliases.iter().cloned());
        }

        let mut family = vec![target.to_string()];
        family.extend(aliases.iter().cloned());
        let required: Vec<String> = self
            .entry_rules
            .iter()
            .filter(|(_, rules)| rules.mandatory.all.iter().any(|f| f == target))
            .map(|(entry, _)| entry.clone())
            .collect();
        for entry in required {
            let mandatory = &mut self.rules_mut(&entry).mandatory;
            mandatory.relax_all(&family[..1]);
            mandatory.add_some(family.clone());
        }
        Ok(())
    }

    // =========================================================================
    // Entry Edits
    // =========================================================================

    /// Declares or replaces an entry type.
    pub fn set_entry(&mut self, name: impl Into<String>, props: EntryProps) {
        self.entries.insert(name.into(), props);
    }

    /// Mutable access to a declared entry's properties.
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut EntryProps> {
        self.entries.get_mut(name)
    }

    /// Deletes an entry type together with its field set and constraints.
    pub fn remove_entry(&mut self, name: &str) {
        self.entries.remove(name);
        self.entry_fields.remove(name);
        self.entry_rules.remove(name);
        self.entry_aliases.remove(name);
    }

    /// Registers `aliases` as alternate names of the entry type `target`.
    ///
    /// # Errors
    ///
    /// Returns a directive error if `target` is not a declared entry type,
    /// or if an alias would close a cycle as for [`ProtoStyle::alias_field`].
    pub fn alias_entry(&mut self, target: &str, aliases: &[String]) -> Result<()> {
        let Some(props) = self.entries.get(target).cloned() else {
            return Err(Error::directive(format!("cannot alias unknown entry {target}")));
        };
        check_alias_links(&self.entry_aliases, "entry", target, aliases)?;
        for alias in aliases {
            self.entries.insert(alias.clone(), props.clone());
            self.entry_aliases.insert(alias.clone(), target.to_string());
        }
        Ok(())
    }

    /// Adds names to an entry's explicit field set.
    pub fn add_entry_fields<S: Into<String>>(
        &mut self,
        entry: &str,
        fields: impl IntoIterator<Item = S>,
    ) {
        let set = self
            .entry_fields
            .entry(entry.to_string())
            .or_insert_with(NameSet::new);
        set.extend(fields);
        if set.is_empty() {
            self.entry_fields.remove(entry);
        }
    }

    /// Removes names from an entry's explicit field set.
    ///
    /// An entry left with no explicit fields is dropped from the index and
    /// relies on universal fields alone.
    pub fn remove_entry_fields<'a>(
        &mut self,
        entry: &str,
        fields: impl IntoIterator<Item = &'a str>,
    ) {
        let Some(set) = self.entry_fields.get_mut(entry) else {
            return;
        };
        for field in fields {
            set.remove(field);
        }
        if set.is_empty() {
            self.entry_fields.remove(entry);
        }
    }

    /// Replaces an entry's explicit field set.
    pub fn set_entry_fields(&mut self, entry: &str, fields: NameSet) {
        if fields.is_empty() {
            self.entry_fields.remove(entry);
        } else {
            self.entry_fields.insert(entry.to_string(), fields);
        }
    }

    /// Mutable access to an entry's rules, creating them if needed.
    pub fn rules_mut(&mut self, entry: &str) -> &mut EntryRules {
        self.entry_rules
            .entry(entry.to_string())
            .or_insert_with(EntryRules::default)
    }

    /// Replaces an entry's rules.
    pub fn set_rules(&mut self, entry: &str, rules: EntryRules) {
        if rules.is_empty() {
            self.entry_rules.remove(entry);
        } else {
            self.entry_rules.insert(entry.to_string(), rules);
        }
    }
}

/// Rejects aliases that would point a name at itself.
///
/// `links` maps alias to target; `target`'s own chain must not pass through
/// any of the new aliases.
fn check_alias_links(
    links: &OrdMap<String, String>,
    what: &str,
    target: &str,
    aliases: &[String],
) -> Result<()> {
    let mut chain = vec![target];
    let mut current = target;
    while let Some(next) = links.get(current) {
        if chain.contains(&next.as_str()) {
            break;
        }
        chain.push(next.as_str());
        current = next.as_str();
    }
    match aliases.iter().find(|alias| chain.contains(&alias.as_str())) {
        Some(alias) if alias == target => {
            Err(Error::directive(format!("{what} {alias} cannot be an alias of itself")))
        }
        Some(alias) => Err(Error::directive(format!(
            "aliasing {what} {alias} to {target} would form a cycle"
        ))),
        None => Ok(()),
    }
}
