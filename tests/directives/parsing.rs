//! Integration tests for directive and option parsing

use bibstyle_directives::{Directive, DirectiveOption, OptionValue, Target, Verb, parse_options};
use bibstyle_foundation::ErrorKind;

// =============================================================================
// Directives
// =============================================================================

#[test]
fn verb_aliases() {
    assert_eq!(Verb::parse("a"), Some(Verb::Add));
    assert_eq!(Verb::parse("ADD"), Some(Verb::Add));
    assert_eq!(Verb::parse("r"), Some(Verb::Remove));
    assert_eq!(Verb::parse("s"), Some(Verb::Set));
    assert_eq!(Verb::parse("rsome"), Some(Verb::RelaxSome));
    assert_eq!(Verb::parse("relax"), None);
}

#[test]
fn parse_with_options() {
    let d = Directive::parse(Target::Field, "add DOI {type=field, datatype=verbatim, nullok}").unwrap();
    assert_eq!(d.target, Target::Field);
    assert_eq!(d.verb, Verb::Add);
    assert_eq!(d.name, "doi");
    assert_eq!(d.options.len(), 3);
    assert_eq!(d.option("datatype").and_then(|o| o.value.as_scalar()), Some("verbatim"));
    assert!(d.option("nullok").is_some_and(|o| o.value.as_flag()));
    assert_eq!(d.source, "add DOI {type=field, datatype=verbatim, nullok}");
}

#[test]
fn parse_without_braces() {
    let d = Directive::parse(Target::Entry, "  remove xdata  ").unwrap();
    assert_eq!(d.verb, Verb::Remove);
    assert_eq!(d.name, "xdata");
    assert!(d.options.is_empty());
}

#[test]
fn names_may_contain_digits_and_dashes() {
    let d = Directive::parse(Target::Field, "add field-2_b").unwrap();
    assert_eq!(d.name, "field-2_b");
}

#[test]
fn malformed_directives() {
    for text in ["", "add", "add {x}", "add 2doi", "add doi {x", "add doi extra"] {
        let err = Directive::parse(Target::Field, text).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Directive(_)), "{text}");
    }
}

#[test]
fn unknown_verb() {
    let err = Directive::parse(Target::Entry, "frobnicate article").unwrap_err();
    assert!(format!("{err}").contains("frobnicate"));
    assert!(err.context.is_some_and(|c| c.snippet.as_deref() == Some("frobnicate article")));
}

#[test]
fn entry_only_verbs_are_rejected_for_fields() {
    assert!(Directive::parse(Target::Field, "require title {all=[x]}").is_err());
    assert!(Directive::parse(Target::Field, "rall title {x}").is_err());
    assert!(Directive::parse(Target::Entry, "require article {all=[x]}").is_ok());
}

#[test]
fn display_and_builder() {
    let d = Directive::new(Target::Entry, Verb::Require, "Article")
        .with_option(DirectiveOption::list("some", ["date", "year"]));
    assert_eq!(d.name, "article");
    assert_eq!(d.options[0].to_string(), "some=[date, year]");
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn option_shapes() {
    let opts = parse_options("all=[author, title], one=url, skipout").unwrap();
    assert_eq!(
        opts,
        vec![
            DirectiveOption::list("all", ["author", "title"]),
            DirectiveOption::scalar("one", "url"),
            DirectiveOption::flag("skipout"),
        ]
    );
}

#[test]
fn scalar_is_a_one_element_list() {
    assert_eq!(OptionValue::Scalar("url".into()).as_list(), vec!["url"]);
    assert!(OptionValue::Flag.as_list().is_empty());
    assert!(!OptionValue::Scalar("false".into()).as_flag());
    assert!(OptionValue::Scalar("yes".into()).as_flag());
}

#[test]
fn keys_are_lowercased() {
    let opts = parse_options("NullOK").unwrap();
    assert_eq!(opts, vec![DirectiveOption::flag("nullok")]);
}

#[test]
fn invalid_option_lists() {
    assert!(parse_options("some=[a, b").is_err());
    assert!(parse_options("9lives").is_err());
    assert!(parse_options("key=]").is_err());
}
