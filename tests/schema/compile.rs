//! Integration tests for Style compilation

use bibstyle_foundation::{ErrorKind, Severity};
use bibstyle_language::{ConstantValue, Datatype, FieldKind, Template};
use bibstyle_schema::{CompileOptions, ProtoStyle, Style};

const MODEL: &str = r"
\DeclareDatamodelConstant[type=list]{gender}{sf,sm,sn}
\DeclareDatamodelEntrytypes{article, book}
\DeclareDatamodelEntrytypes[skipout]{set}
\DeclareDatamodelFields[type=list,datatype=name]{author}
\DeclareDatamodelFields[type=field,datatype=literal]{title, journaltitle, year}
\DeclareDatamodelFields[type=field,datatype=date]{date}
\DeclareDatamodelFields[type=field,datatype=literal]{month}
\DeclareDatamodelFields[type=field,datatype=literal,skipout]{sortkey}
\DeclareDatamodelFields[type=field,datatype=pattern]{gender}
\DeclareDatamodelEntryfields{title, sortkey}
\DeclareDatamodelEntryfields[article]{author, journaltitle, date, year, month, gender}
\DeclareDatamodelConstraints[article]{
  \constraint[type=mandatory]{
    \constraintfield{author}
    \constraintfield{title}
    \constraintfield{journaltitle}
    \constraintfieldsor{\constraintfield{date}\constraintfield{year}}
  }
}
\DeclareDatamodelConstraints{
  \constraint[type=data,datatype=integer,rangemin=1,rangemax=12]{\constraintfield{month}}
  \constraint[type=data,pattern=\regexp{^[sp][fmn]$}]{\constraintfield{gender}}
}
";

fn compile_sources(sources: &[&str]) -> (Style, bibstyle_foundation::Diagnostics) {
    let templates: Vec<Template> = sources
        .iter()
        .map(|s| {
            let outcome = Template::from_source(s);
            assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
            outcome.value
        })
        .collect();
    let proto = ProtoStyle::aggregate(&templates);
    Style::compile("test", &proto, &CompileOptions::default()).into_parts()
}

fn model() -> Style {
    let (style, diags) = compile_sources(&[MODEL]);
    assert!(diags.is_empty(), "{diags:?}");
    style
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn entries_resolve_explicit_and_universal_fields() {
    let style = model();
    assert_eq!(style.name(), "test");

    let article = style.entry("article").unwrap();
    for field in ["author", "journaltitle", "date", "title", "sortkey"] {
        assert!(article.has_field(field), "{field}");
    }
    let book = style.entry("book").unwrap();
    let book_fields: Vec<&str> = book.fields.keys().map(String::as_str).collect();
    assert_eq!(book_fields, vec!["sortkey", "title"]);
    assert!(style.entry("set").is_some_and(|e| e.skipout));
    assert!(style.entry("thesis").is_none());
}

#[test]
fn entry_constraints_are_attached() {
    let style = model();
    let mandatory = &style.entry("article").unwrap().constraints.mandatory;
    assert_eq!(mandatory.all, vec!["author", "title", "journaltitle"]);
    assert_eq!(mandatory.some, vec![vec!["date".to_string(), "year".to_string()]]);
    assert!(style.entry("book").unwrap().constraints.is_empty());
}

#[test]
fn data_constraints_refine_fields() {
    let style = model();
    let month = style.field("month").unwrap();
    assert_eq!(month.datatype, Some(Datatype::Integer));
    assert_eq!((month.rangemin, month.rangemax), (Some(1), Some(12)));

    let gender = style.field("gender").unwrap();
    let pattern = gender.pattern.as_ref().unwrap();
    assert_eq!(pattern.source(), "^[sp][fmn]$");
    assert!(pattern.is_match("sf"));
    assert!(!pattern.is_match("xx"));
}

#[test]
fn style_indexes() {
    let style = model();
    assert!(style.is_universal("title"));
    assert!(!style.is_universal("author"));
    assert_eq!(style.universal_fields().collect::<Vec<_>>(), vec!["sortkey", "title"]);
    assert!(style.skipout_fields().contains("sortkey"));
    assert!(style.untyped_fields().is_empty());
    assert_eq!(
        style.constant("gender"),
        Some(&ConstantValue::List(vec!["sf".into(), "sm".into(), "sn".into()]))
    );
    assert!(style.fields().any(|f| f.name == "author" && f.kind == Some(FieldKind::List)));
    assert_eq!(style.entries().count(), 3);
}

#[test]
fn unseen_fields_default_without_mutation() {
    let style = model();
    let unseen = style.field_or_default("shoesize");
    assert_eq!(unseen.name, "shoesize");
    assert!(!unseen.is_typed());
    assert!(style.field("shoesize").is_none());
    assert_eq!(style.field_or_default("title").datatype, Some(Datatype::Literal));
}

// =============================================================================
// Aliases
// =============================================================================

#[test]
fn aliases_compile_to_their_own_records() {
    let templates = [Template::from_source(MODEL).value];
    let mut proto = ProtoStyle::aggregate(&templates);
    proto.alias_field("journaltitle", &["journal".to_string()]).unwrap();
    proto.alias_entry("article", &["periodicalarticle".to_string()]).unwrap();
    let (style, diags) = Style::compile("alias", &proto, &CompileOptions::default()).into_parts();
    assert!(diags.is_empty(), "{diags:?}");

    let journal = style.field("journal").unwrap();
    assert_eq!(journal.alias_of.as_deref(), Some("journaltitle"));
    assert_eq!(journal.datatype, Some(Datatype::Literal));

    let alias = style.entry("periodicalarticle").unwrap();
    assert_eq!(alias.alias_of.as_deref(), Some("article"));
    assert!(alias.has_field("journal"));
    assert!(
        alias
            .constraints
            .mandatory
            .some
            .contains(&vec!["journaltitle".to_string(), "journal".to_string()])
    );
}

#[test]
fn overlong_alias_chain_is_a_compile_error() {
    let templates = [Template::from_source(MODEL).value];
    let mut proto = ProtoStyle::aggregate(&templates);
    proto.alias_field("title", &["x".to_string()]).unwrap();
    proto.alias_field("x", &["y".to_string()]).unwrap();
    let (style, diags) =
        Style::compile("chain", &proto, &CompileOptions::new().with_max_alias_depth(1)).into_parts();
    assert!(diags.iter().any(|e| matches!(e.kind, ErrorKind::Compile(_))));
    assert_eq!(style.field("x").unwrap().alias_of.as_deref(), Some("title"));
    assert!(style.field("y").unwrap().alias_of.is_none());
    assert!(style.field("title").is_some());
}

#[test]
fn self_alias_cannot_erase_a_field_type() {
    let templates = [Template::from_source(MODEL).value];
    let mut proto = ProtoStyle::aggregate(&templates);
    let err = proto.alias_field("title", &["title".to_string()]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Directive(_)));

    let (style, diags) = Style::compile("self", &proto, &CompileOptions::default()).into_parts();
    assert!(diags.is_empty(), "{diags:?}");
    assert!(style.field("title").unwrap().is_typed());
    assert!(!style.untyped_fields().contains("title"));
}

#[test]
fn edits_to_an_alias_are_kept() {
    let templates = [Template::from_source(MODEL).value];
    let mut proto = ProtoStyle::aggregate(&templates);
    proto.alias_field("journaltitle", &["journal".to_string()]).unwrap();
    if let Some(props) = proto.field_mut("journal") {
        props.nullok = true;
    }
    let style = Style::compile("edited", &proto, &CompileOptions::default()).value;
    let journal = style.field("journal").unwrap();
    assert!(journal.nullok);
    assert_eq!(journal.alias_of.as_deref(), Some("journaltitle"));
    assert!(!style.field("journaltitle").unwrap().nullok);
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn undeclared_names_are_integrity_warnings() {
    let (style, diags) = compile_sources(&[
        MODEL,
        r"\DeclareDatamodelEntryfields[article]{note}
          \DeclareDatamodelEntryfields[ghost]{title}",
    ]);
    assert!(!diags.is_empty());
    assert!(!diags.has_errors());
    assert!(diags.iter().all(|e| e.severity() == Severity::Warning));
    assert!(style.untyped_fields().contains("note"));
    assert!(style.entry("article").unwrap().has_field("note"));
    assert!(style.entry("ghost").is_none());
}

#[test]
fn misplaced_constraints_are_compile_errors() {
    let (_, diags) = compile_sources(&[
        MODEL,
        r"\DeclareDatamodelConstraints{
            \constraint[type=mandatory]{\constraintfield{title}}
          }
          \DeclareDatamodelConstraints[article]{
            \constraint[type=data,datatype=integer]{\constraintfield{year}}
          }",
    ]);
    let compile_errors = diags
        .iter()
        .filter(|e| matches!(e.kind, ErrorKind::Compile(_)))
        .count();
    assert_eq!(compile_errors, 2);
}

#[test]
fn invalid_pattern_is_reported() {
    let (style, diags) = compile_sources(&[
        MODEL,
        r"\DeclareDatamodelConstraints{
            \constraint[type=data,pattern=\regexp{(}]{\constraintfield{title}}
          }",
    ]);
    assert!(
        diags
            .iter()
            .any(|e| matches!(&e.kind, ErrorKind::InvalidPattern { field, .. } if field == "title"))
    );
    assert!(style.field("title").is_some_and(|f| f.pattern.is_none()));
}

#[test]
fn unknown_checker_names_are_ignored() {
    let (style, diags) = compile_sources(&[
        MODEL,
        r"\DeclareDatamodelFields[type=field,datatype=literal]{isbn}
          \DeclareDatamodelConstraints{
            \constraint[type=data,datatype=isbn]{\constraintfield{isbn}}
          }",
    ]);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(style.field("isbn").unwrap().datatype, Some(Datatype::Literal));
}
