//! Integration tests for declaration analysis
//!
//! Each test lexes a small source and checks the typed declarations that
//! come out of the analyzer.

use bibstyle_foundation::{Diagnostics, ErrorKind};
use bibstyle_language::{
    ConstantValue, Constraint, Datatype, Declaration, DeclarationAnalyzer, FieldKind, Lexer,
    Quantifier, ResetKind, option_flag, parameter_options, split_list, strip_comments,
};

fn analyze(source: &str) -> (Vec<Declaration>, Diagnostics) {
    let (nodes, mut diags) = Lexer::tokenize(&strip_comments(source)).into_parts();
    let decls = DeclarationAnalyzer::analyze_all(&nodes).collect_into(&mut diags);
    (decls, diags)
}

fn single(source: &str) -> Declaration {
    let (mut decls, diags) = analyze(source);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(decls.len(), 1);
    decls.remove(0)
}

// =============================================================================
// Option Helpers
// =============================================================================

#[test]
fn split_list_ignores_nested_commas() {
    assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
    assert_eq!(split_list(r"x=\regexp{[0-9]{1,3}}, y"), vec![r"x=\regexp{[0-9]{1,3}}", "y"]);
}

#[test]
fn parameter_options_split_on_first_equals() {
    let options = parameter_options("type=field, nullok, pattern=a=b");
    assert_eq!(options[0], ("type".to_string(), Some("field".to_string())));
    assert_eq!(options[1], ("nullok".to_string(), None));
    assert_eq!(options[2], ("pattern".to_string(), Some("a=b".to_string())));
}

#[test]
fn option_flag_coercion() {
    assert!(option_flag(None));
    assert!(option_flag(Some("true")));
    assert!(!option_flag(Some("false")));
    assert!(!option_flag(Some("yes")));
}

// =============================================================================
// Simple Declarations
// =============================================================================

#[test]
fn list_constant() {
    let decl = single(r"\DeclareDatamodelConstant[type=list]{nameparts}{prefix,family,given}");
    let Declaration::Constant(constant) = decl else {
        panic!("expected a constant");
    };
    assert_eq!(constant.name, "nameparts");
    assert_eq!(
        constant.value,
        ConstantValue::List(vec!["prefix".into(), "family".into(), "given".into()])
    );
}

#[test]
fn string_constant() {
    let decl = single(r"\DeclareDatamodelConstant{multiscriptforms}{ default }");
    assert!(matches!(
        decl,
        Declaration::Constant(c) if c.value == ConstantValue::String("default".into())
    ));
}

#[test]
fn constant_without_value_is_a_failure() {
    let (decls, diags) = analyze(r"\DeclareDatamodelConstant{lonely}");
    assert!(decls.is_empty());
    assert_eq!(diags.len(), 1);
}

#[test]
fn entry_types_with_skipout() {
    let decl = single(r"\DeclareDatamodelEntrytypes[skipout]{set, xdata}");
    let Declaration::Entrytypes { names, props } = decl else {
        panic!("expected entry types");
    };
    assert_eq!(names, vec!["set", "xdata"]);
    assert!(props.skipout);
}

#[test]
fn fields_with_flags() {
    let decl = single(
        r"\DeclareDatamodelFields[type=field,datatype=literal,format=xsv,nullok,skipout=false,label=true]{shorthand}",
    );
    let Declaration::Fields { names, props } = decl else {
        panic!("expected fields");
    };
    assert_eq!(names, vec!["shorthand"]);
    assert_eq!(props.kind, Some(FieldKind::Field));
    assert_eq!(props.datatype, Some(Datatype::Literal));
    assert_eq!(props.format.as_deref(), Some("xsv"));
    assert!(props.nullok);
    assert!(!props.skipout);
    assert!(props.label);
}

#[test]
fn fields_missing_datatype_still_recorded() {
    let (decls, diags) = analyze(r"\DeclareDatamodelFields[type=list]{keywords}");
    assert_eq!(decls.len(), 1);
    assert_eq!(diags.len(), 1);
    assert!(matches!(
        &decls[0],
        Declaration::Fields { props, .. } if props.kind == Some(FieldKind::List) && props.datatype.is_none()
    ));
}

#[test]
fn unknown_datatype_is_reported() {
    let (_, diags) = analyze(r"\DeclareDatamodelFields[type=field,datatype=shape]{x}");
    assert!(diags.iter().any(|e| matches!(e.kind, ErrorKind::ParseFailure { .. })));
}

#[test]
fn entry_fields_scoped_and_universal() {
    let (decls, diags) = analyze(
        r"\DeclareDatamodelEntryfields{title, note}
          \DeclareDatamodelEntryfields[article, book]{author}",
    );
    assert!(diags.is_empty());
    assert!(matches!(
        &decls[0],
        Declaration::Entryfields { entries, fields } if entries.is_empty() && fields.len() == 2
    ));
    assert!(matches!(
        &decls[1],
        Declaration::Entryfields { entries, .. } if entries == &["article".to_string(), "book".to_string()]
    ));
}

#[test]
fn resets() {
    let (decls, _) = analyze(r"\ResetDatamodelEntrytypes \ResetDatamodelConstraints");
    assert_eq!(
        decls,
        vec![
            Declaration::Reset(ResetKind::Entrytypes),
            Declaration::Reset(ResetKind::Constraints),
        ]
    );
}

#[test]
fn unknown_commands_are_ignored() {
    let (decls, diags) = analyze(r"\newcommand{x} \DeclareDatamodelEntrytypes{misc}");
    assert!(diags.is_empty());
    assert_eq!(decls.len(), 1);
}

// =============================================================================
// Constraints
// =============================================================================

#[test]
fn mandatory_constraint_clauses() {
    let decl = single(
        r"\DeclareDatamodelConstraints[online]{
            \constraint[type=mandatory]{
                \constraintfield{title}
                \constraintfieldsor{\constraintfield{date}\constraintfield{year}}
                \constraintfieldsxor{\constraintfield{url}\constraintfield{doi}\constraintfield{eprint}}
            }
        }",
    );
    let Declaration::Constraints { entries, constraints } = decl else {
        panic!("expected constraints");
    };
    assert_eq!(entries, vec!["online"]);
    let [Constraint::Mandatory(m)] = constraints.as_slice() else {
        panic!("expected one mandatory constraint");
    };
    assert_eq!(m.all, vec!["title"]);
    assert_eq!(m.some, vec![vec!["date".to_string(), "year".to_string()]]);
    assert_eq!(m.one.len(), 1);
    assert_eq!(m.one[0].len(), 3);
}

#[test]
fn conditional_constraint() {
    let decl = single(
        r"\DeclareDatamodelConstraints{
            \constraint[type=conditional]{
                \antecedent[quantifier=one]{\constraintfield{urldate}}
                \consequent[quantifier=all]{\constraintfield{url}}
            }
        }",
    );
    let Declaration::Constraints { entries, constraints } = decl else {
        panic!("expected constraints");
    };
    assert!(entries.is_empty());
    let [Constraint::Conditional { antecedent, consequent }] = constraints.as_slice() else {
        panic!("expected one conditional");
    };
    assert_eq!(antecedent.quantifier, Quantifier::One);
    assert_eq!(antecedent.fields, vec!["urldate"]);
    assert_eq!(consequent.quantifier, Quantifier::All);
}

#[test]
fn conditional_without_consequent_is_dropped() {
    let (decls, diags) = analyze(
        r"\DeclareDatamodelConstraints{
            \constraint[type=conditional]{\antecedent[quantifier=all]{\constraintfield{a}}}
        }",
    );
    assert!(matches!(&decls[0], Declaration::Constraints { constraints, .. } if constraints.is_empty()));
    assert_eq!(diags.len(), 1);
}

#[test]
fn data_constraint_options() {
    let decl = single(
        r"\DeclareDatamodelConstraints{
            \constraint[type=data,datatype=integer,rangemin=1,rangemax=12]{\constraintfield{month}}
            \constraint[type=data,datatype=pattern,pattern=\regexp{[a-z]{2}}]{\constraintfield{gender}}
        }",
    );
    let Declaration::Constraints { constraints, .. } = decl else {
        panic!("expected constraints");
    };
    let [Constraint::Data(month), Constraint::Data(gender)] = constraints.as_slice() else {
        panic!("expected two data constraints");
    };
    assert_eq!(month.fields, vec!["month"]);
    assert_eq!(month.datatype.as_deref(), Some("integer"));
    assert_eq!((month.rangemin, month.rangemax), (Some(1), Some(12)));
    assert_eq!(gender.pattern.as_deref(), Some(r"\regexp{[a-z]{2}}"));
}

#[test]
fn bad_bound_is_reported() {
    let (decls, diags) = analyze(
        r"\DeclareDatamodelConstraints{\constraint[type=data,rangemin=low]{\constraintfield{x}}}",
    );
    assert_eq!(diags.len(), 1);
    assert!(matches!(
        &decls[0],
        Declaration::Constraints { constraints, .. }
            if matches!(constraints.as_slice(), [Constraint::Data(d)] if d.rangemin.is_none())
    ));
}

#[test]
fn constraint_type_names() {
    let (decls, diags) = analyze(
        r"\DeclareDatamodelConstraints{
            \constraint[type=mandatory]{\constraintfield{a}}
            \constraint[type=odd]{\constraintfield{b}}
            \constraint{\constraintfield{c}}
        }",
    );
    assert_eq!(diags.len(), 2);
    let Declaration::Constraints { constraints, .. } = &decls[0] else {
        panic!("expected constraints");
    };
    let names: Vec<&str> = constraints.iter().map(Constraint::type_name).collect();
    assert_eq!(names, vec!["mandatory"]);
}
