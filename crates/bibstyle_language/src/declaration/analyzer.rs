//! Declaration analyzer implementation.
//!
//! Turns lexed `\DeclareDatamodel...` commands into typed declarations.
//! Problems are reported per command; a bad command never stops the others.

use bibstyle_foundation::{Diagnostics, Error, ErrorKind, Outcome};
use tracing::debug;

use super::types::{
    Condition, Constant, ConstantValue, Constraint, DataConstraint, Datatype, EntryProps,
    FieldKind, FieldProps, MandatoryConstraint, Quantifier, ResetKind,
};
use super::{Declaration, option_flag, parameter_options, split_list};
use crate::lexer::{Command, Node};

/// Analyzes lexed commands and extracts typed declarations.
pub struct DeclarationAnalyzer;

impl DeclarationAnalyzer {
    // =========================================================================
    // Unified Analysis
    // =========================================================================

    /// Analyzes every top-level command in order.
    ///
    /// Text between commands and unrecognised commands are skipped.
    #[must_use]
    pub fn analyze_all(nodes: &[Node]) -> Outcome<Vec<Declaration>> {
        let mut declarations = Vec::new();
        let mut diagnostics = Diagnostics::new();
        for cmd in nodes.iter().filter_map(Node::as_command) {
            if let Some(decl) = Self::analyze(cmd).collect_into(&mut diagnostics) {
                declarations.push(decl);
            }
        }
        Outcome::new(declarations, diagnostics)
    }

    /// Analyzes one top-level command.
    ///
    /// Returns `None` for commands that are not data-model declarations and
    /// for declarations too malformed to keep.
    #[must_use]
    pub fn analyze(cmd: &Command) -> Outcome<Option<Declaration>> {
        let mut diags = Diagnostics::new();
        let decl = match cmd.name.as_str() {
            "DeclareDatamodelConstant" => Self::analyze_constant(cmd, &mut diags),
            "DeclareDatamodelEntrytypes" => Self::analyze_entrytypes(cmd, &mut diags),
            "DeclareDatamodelFields" => Self::analyze_fields(cmd, &mut diags),
            "DeclareDatamodelEntryfields" => Self::analyze_entryfields(cmd, &mut diags),
            "DeclareDatamodelConstraints" => Self::analyze_constraints(cmd, &mut diags),
            "ResetDatamodelEntrytypes" => Some(Declaration::Reset(ResetKind::Entrytypes)),
            "ResetDatamodelFields" => Some(Declaration::Reset(ResetKind::Fields)),
            "ResetDatamodelEntryfields" => Some(Declaration::Reset(ResetKind::Entryfields)),
            "ResetDatamodelConstraints" => Some(Declaration::Reset(ResetKind::Constraints)),
            other => {
                debug!(command = other, line = cmd.span.line, "ignoring command");
                None
            }
        };
        Outcome::new(decl, diags)
    }

    // =========================================================================
    // Simple Declarations
    // =========================================================================

    fn analyze_constant(cmd: &Command, diags: &mut Diagnostics) -> Option<Declaration> {
        let Some(name) = cmd.body().map(str::trim).filter(|n| !n.is_empty()) else {
            diags.push(failure(cmd, "constant declaration requires a name"));
            return None;
        };
        let Some(raw) = cmd.argument(1) else {
            diags.push(failure(cmd, format!("constant {name} has no value")));
            return None;
        };

        let options = cmd.options.as_deref().map(parameter_options).unwrap_or_default();
        let is_list = options
            .iter()
            .any(|(k, v)| k == "type" && v.as_deref() == Some("list"));
        let value = if is_list {
            ConstantValue::List(split_list(raw))
        } else {
            ConstantValue::String(raw.trim().to_string())
        };

        Some(Declaration::Constant(Constant {
            name: name.to_string(),
            value,
        }))
    }

    fn analyze_entrytypes(cmd: &Command, diags: &mut Diagnostics) -> Option<Declaration> {
        let Some(body) = cmd.body() else {
            diags.push(failure(cmd, "entry type declaration requires a body"));
            return None;
        };

        let mut props = EntryProps::default();
        for (key, value) in cmd.options.as_deref().map(parameter_options).unwrap_or_default() {
            if key == "skipout" {
                props.skipout = option_flag(value.as_deref());
            }
        }

        Some(Declaration::Entrytypes {
            names: split_list(body),
            props,
        })
    }

    fn analyze_fields(cmd: &Command, diags: &mut Diagnostics) -> Option<Declaration> {
        let Some(body) = cmd.body() else {
            diags.push(failure(cmd, "field declaration requires a body"));
            return None;
        };
        let Some(options) = cmd.options.as_deref() else {
            diags.push(failure(cmd, "field declaration requires options"));
            return None;
        };

        let mut props = FieldProps::default();
        let (mut has_type, mut has_datatype) = (false, false);
        for (key, value) in parameter_options(options) {
            match key.as_str() {
                "type" => {
                    has_type = true;
                    props.kind = value.as_deref().and_then(FieldKind::parse);
                    if props.kind.is_none() {
                        diags.push(failure(cmd, format!("unknown field type {value:?}")));
                    }
                }
                "datatype" => {
                    has_datatype = true;
                    props.datatype = value.as_deref().and_then(Datatype::parse);
                    if props.datatype.is_none() {
                        diags.push(failure(cmd, format!("unknown datatype {value:?}")));
                    }
                }
                "format" => props.format = value,
                "nullok" => props.nullok = option_flag(value.as_deref()),
                "skipout" => props.skipout = option_flag(value.as_deref()),
                "label" => props.label = option_flag(value.as_deref()),
                other => debug!(option = other, "ignoring field option"),
            }
        }

        let names = split_list(body);
        if !has_type || !has_datatype {
            diags.push(failure(
                cmd,
                format!("missing field type or datatype for {}", names.join(", ")),
            ));
        }

        Some(Declaration::Fields { names, props })
    }

    fn analyze_entryfields(cmd: &Command, diags: &mut Diagnostics) -> Option<Declaration> {
        let Some(body) = cmd.body() else {
            diags.push(failure(cmd, "entry-field declaration requires a body"));
            return None;
        };
        Some(Declaration::Entryfields {
            entries: cmd.options.as_deref().map(split_list).unwrap_or_default(),
            fields: split_list(body),
        })
    }

    // =========================================================================
    // Constraint Blocks
    // =========================================================================

    fn analyze_constraints(cmd: &Command, diags: &mut Diagnostics) -> Option<Declaration> {
        if cmd.body().is_none() {
            diags.push(failure(cmd, "constraint declaration requires a body"));
            return None;
        }

        let mut constraints = Vec::new();
        for child in cmd.child_commands() {
            if child.name == "constraint" {
                if let Some(constraint) = Self::analyze_constraint(child, diags) {
                    constraints.push(constraint);
                }
            } else {
                debug!(command = %child.name, "ignoring command in constraint block");
            }
        }

        Some(Declaration::Constraints {
            entries: cmd.options.as_deref().map(split_list).unwrap_or_default(),
            constraints,
        })
    }

    /// Analyzes one `\constraint[type=...]{...}` command.
    fn analyze_constraint(cmd: &Command, diags: &mut Diagnostics) -> Option<Constraint> {
        let options = cmd.options.as_deref().map(parameter_options).unwrap_or_default();
        let option = |name: &str| {
            options
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.clone())
        };

        match option("type").as_deref() {
            Some("mandatory") => Some(Constraint::Mandatory(Self::analyze_mandatory(cmd, diags))),
            Some("conditional") => Self::analyze_conditional(cmd, diags),
            Some("data") => {
                let rangemin = parse_bound(cmd, "rangemin", option("rangemin"), diags);
                let rangemax = parse_bound(cmd, "rangemax", option("rangemax"), diags);
                Some(Constraint::Data(DataConstraint {
                    fields: constraint_fields(cmd),
                    datatype: option("datatype"),
                    rangemin,
                    rangemax,
                    pattern: option("pattern"),
                }))
            }
            Some(other) => {
                diags.push(failure(cmd, format!("unknown constraint type {other}")));
                None
            }
            None => {
                diags.push(failure(cmd, "constraint without a type"));
                None
            }
        }
    }

    fn analyze_mandatory(cmd: &Command, diags: &mut Diagnostics) -> MandatoryConstraint {
        let mut mandatory = MandatoryConstraint::new();
        for child in cmd.child_commands() {
            match child.name.as_str() {
                "constraintfield" => {
                    if let Some(field) = child.body().map(str::trim).filter(|f| !f.is_empty()) {
                        mandatory.add_all(field);
                    }
                }
                "constraintfieldsor" => mandatory.add_some(constraint_fields(child)),
                "constraintfieldsxor" => mandatory.add_one(constraint_fields(child)),
                other => diags.push(failure(
                    child,
                    format!("unexpected {other} in mandatory constraint"),
                )),
            }
        }
        mandatory
    }

    fn analyze_conditional(cmd: &Command, diags: &mut Diagnostics) -> Option<Constraint> {
        let mut antecedent = None;
        let mut consequent = None;

        for child in cmd.child_commands() {
            let slot = match child.name.as_str() {
                "antecedent" => &mut antecedent,
                "consequent" => &mut consequent,
                other => {
                    debug!(command = other, "ignoring command in conditional constraint");
                    continue;
                }
            };
            let quantifier = child
                .options
                .as_deref()
                .map(parameter_options)
                .unwrap_or_default()
                .into_iter()
                .find(|(k, _)| k == "quantifier")
                .and_then(|(_, v)| v);
            match quantifier.as_deref().and_then(Quantifier::parse) {
                Some(q) => *slot = Some(Condition::new(q, constraint_fields(child))),
                None => diags.push(failure(
                    child,
                    format!("invalid quantifier {quantifier:?}"),
                )),
            }
        }

        match (antecedent, consequent) {
            (Some(antecedent), Some(consequent)) => Some(Constraint::Conditional {
                antecedent,
                consequent,
            }),
            _ => {
                diags.push(failure(
                    cmd,
                    "conditional constraint needs an antecedent and a consequent",
                ));
                None
            }
        }
    }
}

/// Collects the bodies of `\constraintfield` children.
fn constraint_fields(cmd: &Command) -> Vec<String> {
    cmd.child_commands()
        .filter(|c| c.name == "constraintfield")
        .filter_map(Command::body)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bound(
    cmd: &Command,
    name: &str,
    value: Option<String>,
    diags: &mut Diagnostics,
) -> Option<i64> {
    let value = value?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            diags.push(failure(cmd, format!("{name} is not an integer: {value}")));
            None
        }
    }
}

fn failure(cmd: &Command, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::ParseFailure {
        message: message.into(),
        line: cmd.span.line,
        column: cmd.span.column,
        context: cmd.name.clone(),
    })
}
