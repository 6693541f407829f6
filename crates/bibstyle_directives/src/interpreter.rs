//! Applies directives to a `ProtoStyle`.
//!
//! Every directive is applied atomically: its options are evaluated against
//! a working copy and written back only if all of them succeed, so a
//! rejected directive leaves the aggregate untouched.

use bibstyle_foundation::{Diagnostics, Error, ErrorContext, Result};
use bibstyle_language::{Datatype, EntryProps, FieldKind, FieldProps};
use bibstyle_schema::{ProtoStyle, resolve_alias};
use tracing::{debug, warn};

use crate::directive::{Directive, Target, Verb};
use crate::options::{DirectiveOption, OptionValue};

/// Applies override directives.
#[derive(Clone, Debug)]
pub struct DirectiveInterpreter {
    max_derive_depth: usize,
}

impl Default for DirectiveInterpreter {
    fn default() -> Self {
        Self { max_derive_depth: 8 }
    }
}

impl DirectiveInterpreter {
    /// Creates an interpreter with the default `derives` depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many alias links `derives` follows before giving up.
    #[must_use]
    pub fn with_max_derive_depth(mut self, depth: usize) -> Self {
        self.max_derive_depth = depth;
        self
    }

    /// Applies directives in order, collecting the ones that fail.
    pub fn apply_all<'a>(
        &self,
        proto: &mut ProtoStyle,
        directives: impl IntoIterator<Item = &'a Directive>,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for directive in directives {
            match self.apply(proto, directive) {
                Ok(()) => debug!(%directive, target = %directive.target, "applied directive"),
                Err(e) => {
                    warn!(%directive, error = %e, "skipping directive");
                    diags.push(e);
                }
            }
        }
        diags
    }

    /// Applies one directive.
    ///
    /// # Errors
    ///
    /// Returns a directive error for `set`, `require` or a relaxation on a
    /// missing record, a `derives` source that is unknown or too deep, an
    /// unknown option, or an option value of the wrong shape.
    pub fn apply(&self, proto: &mut ProtoStyle, directive: &Directive) -> Result<()> {
        match directive.target {
            Target::Field => self.apply_field(proto, directive),
            Target::Entry => self.apply_entry(proto, directive),
        }
    }

    // =========================================================================
    // Fields
    // =========================================================================

    fn apply_field(&self, proto: &mut ProtoStyle, d: &Directive) -> Result<()> {
        match d.verb {
            Verb::Add | Verb::Set => {
                let mut props = match proto.fields().get(&d.name) {
                    Some(props) => props.clone(),
                    None if d.verb == Verb::Add => FieldProps::default(),
                    None => return Err(d.error(format!("cannot set unknown field {}", d.name))),
                };
                for option in &d.options {
                    self.field_option(proto, d, &mut props, option)?;
                }
                proto.set_field(d.name.clone(), props);
                Ok(())
            }
            Verb::Remove => {
                if !proto.has_field(&d.name) {
                    debug!(field = %d.name, "removing undeclared field");
                }
                proto.remove_field(&d.name);
                Ok(())
            }
            Verb::Alias => {
                let aliases = bare_names(d)?;
                proto
                    .alias_field(&d.name, &aliases)
                    .map_err(|e| with_source(d, e))
            }
            Verb::Require | Verb::RelaxAll | Verb::RelaxSome | Verb::RelaxOne => {
                Err(d.error(format!("'{}' cannot be applied to a field", d.verb)))
            }
        }
    }

    fn field_option(
        &self,
        proto: &ProtoStyle,
        d: &Directive,
        props: &mut FieldProps,
        option: &DirectiveOption,
    ) -> Result<()> {
        match option.key.as_str() {
            "type" => {
                let value = scalar(d, option)?;
                props.kind = Some(
                    FieldKind::parse(value)
                        .ok_or_else(|| d.error(format!("unknown field type '{value}'")))?,
                );
            }
            "datatype" => {
                let value = scalar(d, option)?;
                props.datatype = Some(
                    Datatype::parse(value)
                        .ok_or_else(|| d.error(format!("unknown datatype '{value}'")))?,
                );
            }
            "format" => props.format = Some(scalar(d, option)?.to_string()),
            "nullok" => props.nullok = option.value.as_flag(),
            "skipout" => props.skipout = option.value.as_flag(),
            "label" => props.label = option.value.as_flag(),
            "derives" => {
                let from = scalar(d, option)?;
                let source = self.resolve(d, proto.field_aliases(), from)?;
                *props = proto
                    .fields()
                    .get(source)
                    .cloned()
                    .ok_or_else(|| d.error(format!("cannot derive from unknown field {from}")))?;
            }
            other => return Err(d.error(format!("unknown field option '{other}'"))),
        }
        Ok(())
    }

    // =========================================================================
    // Entries
    // =========================================================================

    fn apply_entry(&self, proto: &mut ProtoStyle, d: &Directive) -> Result<()> {
        match d.verb {
            Verb::Add | Verb::Set => self.add_or_set_entry(proto, d),
            Verb::Remove => {
                if !proto.has_entry(&d.name) {
                    debug!(entry = %d.name, "removing undeclared entry");
                }
                proto.remove_entry(&d.name);
                Ok(())
            }
            Verb::Alias => {
                let aliases = bare_names(d)?;
                proto
                    .alias_entry(&d.name, &aliases)
                    .map_err(|e| with_source(d, e))
            }
            Verb::Require => Self::require(proto, d),
            Verb::RelaxAll | Verb::RelaxSome | Verb::RelaxOne => Self::relax(proto, d),
        }
    }

    fn add_or_set_entry(&self, proto: &mut ProtoStyle, d: &Directive) -> Result<()> {
        let mut props = match proto.entries().get(&d.name) {
            Some(props) => props.clone(),
            None if d.verb == Verb::Add => EntryProps::default(),
            None => return Err(d.error(format!("cannot set unknown entry {}", d.name))),
        };
        let mut fields = proto.entry_fields().get(&d.name).cloned().unwrap_or_default();

        let options = gather_lists(&d.options, &["add", "remove"], &["skipout", "derives"]);
        for option in &options {
            match option.key.as_str() {
                "skipout" => props.skipout = option.value.as_flag(),
                "derives" => {
                    let from = scalar(d, option)?;
                    let source = self.resolve(d, proto.entry_aliases(), from)?;
                    props = proto
                        .entries()
                        .get(source)
                        .cloned()
                        .ok_or_else(|| d.error(format!("cannot derive from unknown entry {from}")))?;
                    fields = proto.entry_fields().get(source).cloned().unwrap_or_default();
                }
                "add" => fields.extend(list(d, option)?),
                "remove" => {
                    for name in list(d, option)? {
                        fields.remove(&name);
                    }
                }
                other => return Err(d.error(format!("unknown entry option '{other}'"))),
            }
        }

        proto.set_entry(d.name.clone(), props);
        proto.set_entry_fields(&d.name, fields);
        Ok(())
    }

    fn require(proto: &mut ProtoStyle, d: &Directive) -> Result<()> {
        if !proto.has_entry(&d.name) {
            return Err(d.error(format!("cannot require fields of unknown entry {}", d.name)));
        }
        let mut mandatory = proto
            .entry_rules()
            .get(&d.name)
            .map(|rules| rules.mandatory.clone())
            .unwrap_or_default();
        for option in &gather_lists(&d.options, &["all", "some", "one"], &[]) {
            let names = list(d, option)?;
            match option.key.as_str() {
                "all" => names.into_iter().for_each(|name| mandatory.add_all(name)),
                "some" => mandatory.add_some(names),
                "one" => mandatory.add_one(names),
                other => return Err(d.error(format!("unknown require option '{other}'"))),
            }
        }
        proto.rules_mut(&d.name).mandatory = mandatory;
        Ok(())
    }

    fn relax(proto: &mut ProtoStyle, d: &Directive) -> Result<()> {
        if !proto.has_entry(&d.name) {
            return Err(d.error(format!("cannot relax constraints of unknown entry {}", d.name)));
        }
        let names = bare_names(d)?;
        let Some(mut rules) = proto.entry_rules().get(&d.name).cloned() else {
            return Ok(());
        };
        match d.verb {
            Verb::RelaxAll => rules.mandatory.relax_all(&names),
            Verb::RelaxSome => rules.mandatory.relax_some(&names),
            _ => rules.mandatory.relax_one(&names),
        }
        proto.set_rules(&d.name, rules);
        Ok(())
    }

    fn resolve<'p>(
        &self,
        d: &Directive,
        aliases: &'p im::OrdMap<String, String>,
        name: &'p str,
    ) -> Result<&'p str> {
        resolve_alias(aliases, name, self.max_derive_depth).ok_or_else(|| {
            d.error(format!(
                "derives from {name} follows more than {} aliases",
                self.max_derive_depth
            ))
        })
    }
}

fn scalar<'o>(d: &Directive, option: &'o DirectiveOption) -> Result<&'o str> {
    option
        .value
        .as_scalar()
        .ok_or_else(|| d.error(format!("option '{}' expects a single value", option.key)))
}

fn list(d: &Directive, option: &DirectiveOption) -> Result<Vec<String>> {
    match &option.value {
        OptionValue::Flag => Err(d.error(format!("option '{}' expects a list of names", option.key))),
        value => Ok(value.as_list()),
    }
}

/// Folds csv values back into list-valued options.
///
/// The option parser ends a scalar at the first comma, so `some=a,b,c` reads
/// as `some=a` followed by bare `b` and `c`. Bare keys after a scalar in
/// `list_keys` are items of that list until a `key=` item or one of the
/// directive's other option names.
fn gather_lists(
    options: &[DirectiveOption],
    list_keys: &[&str],
    other_keys: &[&str],
) -> Vec<DirectiveOption> {
    let mut gathered: Vec<DirectiveOption> = Vec::with_capacity(options.len());
    let mut open = false;
    for option in options {
        let key = option.key.as_str();
        match &option.value {
            OptionValue::Flag
                if open && !list_keys.contains(&key) && !other_keys.contains(&key) =>
            {
                if let Some(OptionValue::List(items)) = gathered.last_mut().map(|o| &mut o.value) {
                    items.push(option.key.clone());
                }
            }
            OptionValue::Scalar(value) if list_keys.contains(&key) => {
                gathered.push(DirectiveOption::list(key, [value.as_str()]));
                open = true;
            }
            _ => {
                gathered.push(option.clone());
                open = false;
            }
        }
    }
    gathered
}

/// Option keys used as plain names: `alias title {maintitle, fulltitle}`.
fn bare_names(d: &Directive) -> Result<Vec<String>> {
    d.options
        .iter()
        .map(|o| match o.value {
            OptionValue::Flag => Ok(o.key.clone()),
            _ => Err(d.error(format!("expected a bare name, found '{o}'"))),
        })
        .collect()
}

fn with_source(d: &Directive, error: Error) -> Error {
    if d.source.is_empty() {
        error
    } else {
        error.with_context(ErrorContext::new().with_snippet(d.source.clone()))
    }
}
