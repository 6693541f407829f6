//! Templates: the flat, unresolved declarations of one data-model source.
//!
//! A `Template` is built once (from source text, or programmatically with a
//! [`TemplateBuilder`]) and never changes afterwards. Aggregation reads it.

use bibstyle_foundation::Outcome;

use crate::comments::strip_comments;
use crate::declaration::{
    Constant, ConstantValue, Constraint, Declaration, DeclarationAnalyzer, EntryProps,
    FieldProps, ResetKind,
};
use crate::lexer::Lexer;

/// Entry types declared together.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedEntries {
    /// Entry type names.
    pub names: Vec<String>,
    /// Shared properties.
    pub properties: EntryProps,
}

/// Fields declared together.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedFields {
    /// Field names.
    pub names: Vec<String>,
    /// Shared properties.
    pub properties: FieldProps,
}

/// A constraint block scoped to specific entry types.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryConstraints {
    /// Target entry types.
    pub entries: Vec<String>,
    /// The block's constraints.
    pub constraints: Vec<Constraint>,
}

/// The declarations of one data-model source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Template {
    constants: Vec<Constant>,
    entries: Vec<NamedEntries>,
    fields: Vec<NamedFields>,
    entry_fields: Vec<(String, Vec<String>)>,
    universal_fields: Vec<String>,
    entry_constraints: Vec<EntryConstraints>,
    universal_constraints: Vec<Constraint>,
    reset_prior_entries: bool,
    reset_prior_fields: bool,
    reset_prior_entry_fields: bool,
    reset_prior_constraints: bool,
}

impl Template {
    /// Parses a data-model source.
    ///
    /// Comments are stripped first. Lexer and analyzer problems are returned
    /// as diagnostics next to whatever could be recovered.
    #[must_use]
    pub fn from_source(text: &str) -> Outcome<Template> {
        let stripped = strip_comments(text);
        let (nodes, mut diagnostics) = Lexer::tokenize(&stripped).into_parts();
        let declarations = DeclarationAnalyzer::analyze_all(&nodes).collect_into(&mut diagnostics);
        Outcome::new(Self::from_declarations(declarations), diagnostics)
    }

    /// Builds a template from already analyzed declarations, in order.
    #[must_use]
    pub fn from_declarations(declarations: impl IntoIterator<Item = Declaration>) -> Template {
        let mut builder = TemplateBuilder::new();
        for decl in declarations {
            builder = builder.declare(decl);
        }
        builder.build()
    }

    /// Declared constants.
    #[must_use]
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Declared entry types.
    #[must_use]
    pub fn entries(&self) -> &[NamedEntries] {
        &self.entries
    }

    /// Declared fields.
    #[must_use]
    pub fn fields(&self) -> &[NamedFields] {
        &self.fields
    }

    /// Entry → field associations.
    #[must_use]
    pub fn entry_fields(&self) -> &[(String, Vec<String>)] {
        &self.entry_fields
    }

    /// Fields associated with every entry type.
    #[must_use]
    pub fn universal_fields(&self) -> &[String] {
        &self.universal_fields
    }

    /// Entry-scoped constraint blocks.
    #[must_use]
    pub fn entry_constraints(&self) -> &[EntryConstraints] {
        &self.entry_constraints
    }

    /// Constraints declared without target entries.
    #[must_use]
    pub fn universal_constraints(&self) -> &[Constraint] {
        &self.universal_constraints
    }

    /// Returns true if this source resets the given category.
    #[must_use]
    pub fn resets(&self, kind: ResetKind) -> bool {
        match kind {
            ResetKind::Entrytypes => self.reset_prior_entries,
            ResetKind::Fields => self.reset_prior_fields,
            ResetKind::Entryfields => self.reset_prior_entry_fields,
            ResetKind::Constraints => self.reset_prior_constraints,
        }
    }

    /// Returns true if the template declares and resets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Template::default()
    }
}

/// Builder for [`Template`].
#[derive(Clone, Debug, Default)]
pub struct TemplateBuilder {
    template: Template,
}

impl TemplateBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one analyzed declaration.
    #[must_use]
    pub fn declare(self, declaration: Declaration) -> Self {
        match declaration {
            Declaration::Constant(Constant { name, value }) => self.constant(name, value),
            Declaration::Entrytypes { names, props } => self.entry_types(names, props),
            Declaration::Fields { names, props } => self.fields(names, props),
            Declaration::Entryfields { entries, fields } if entries.is_empty() => {
                self.universal_fields(fields)
            }
            Declaration::Entryfields { entries, fields } => self.entry_fields(entries, fields),
            Declaration::Constraints {
                entries,
                constraints,
            } => self.constraints(entries, constraints),
            Declaration::Reset(kind) => self.reset(kind),
        }
    }

    /// Declares a constant.
    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: ConstantValue) -> Self {
        self.template.constants.push(Constant {
            name: name.into(),
            value,
        });
        self
    }

    /// Declares entry types.
    #[must_use]
    pub fn entry_types<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
        properties: EntryProps,
    ) -> Self {
        self.template.entries.push(NamedEntries {
            names: names.into_iter().map(Into::into).collect(),
            properties,
        });
        self
    }

    /// Declares fields.
    #[must_use]
    pub fn fields<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
        properties: FieldProps,
    ) -> Self {
        self.template.fields.push(NamedFields {
            names: names.into_iter().map(Into::into).collect(),
            properties,
        });
        self
    }

    /// Associates fields with entry types, merging with earlier associations.
    #[must_use]
    pub fn entry_fields<E: Into<String>, F: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = E>,
        fields: impl IntoIterator<Item = F>,
    ) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        for entry in entries {
            let entry = entry.into();
            match self.template.entry_fields.iter_mut().find(|(e, _)| *e == entry) {
                Some((_, existing)) => {
                    for field in &fields {
                        if !existing.contains(field) {
                            existing.push(field.clone());
                        }
                    }
                }
                None => self.template.entry_fields.push((entry, dedup(&fields))),
            }
        }
        self
    }

    /// Associates fields with every entry type.
    #[must_use]
    pub fn universal_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        for field in fields {
            let field = field.into();
            if !self.template.universal_fields.contains(&field) {
                self.template.universal_fields.push(field);
            }
        }
        self
    }

    /// Adds a constraint block; no entries means universal.
    #[must_use]
    pub fn constraints<S: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = S>,
        constraints: Vec<Constraint>,
    ) -> Self {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            self.template.universal_constraints.extend(constraints);
        } else {
            self.template.entry_constraints.push(EntryConstraints {
                entries,
                constraints,
            });
        }
        self
    }

    /// Discards what this source declared so far for `kind` and marks it reset.
    #[must_use]
    pub fn reset(mut self, kind: ResetKind) -> Self {
        let t = &mut self.template;
        match kind {
            ResetKind::Entrytypes => {
                t.entries.clear();
                t.reset_prior_entries = true;
            }
            ResetKind::Fields => {
                t.fields.clear();
                t.reset_prior_fields = true;
            }
            ResetKind::Entryfields => {
                t.entry_fields.clear();
                t.universal_fields.clear();
                t.reset_prior_entry_fields = true;
            }
            ResetKind::Constraints => {
                t.entry_constraints.clear();
                t.universal_constraints.clear();
                t.reset_prior_constraints = true;
            }
        }
        self
    }

    /// Finishes the template.
    #[must_use]
    pub fn build(self) -> Template {
        self.template
    }
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}
