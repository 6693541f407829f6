//! Integration tests for ProtoStyle aggregation

use bibstyle_language::{Datatype, Template};
use bibstyle_schema::{ProtoStyle, resolve_alias};

fn template(source: &str) -> Template {
    let outcome = Template::from_source(source);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    outcome.value
}

fn base() -> Template {
    template(
        r"\DeclareDatamodelEntrytypes{article, book}
          \DeclareDatamodelFields[type=list,datatype=name]{author}
          \DeclareDatamodelFields[type=field,datatype=literal]{title, journaltitle}
          \DeclareDatamodelFields[type=field,datatype=date]{date}
          \DeclareDatamodelFields[type=field,datatype=literal]{year}
          \DeclareDatamodelEntryfields{title}
          \DeclareDatamodelEntryfields[article]{author, journaltitle, date, year}
          \DeclareDatamodelEntryfields[book]{author}
          \DeclareDatamodelConstraints[article]{
            \constraint[type=mandatory]{
              \constraintfield{author}
              \constraintfield{journaltitle}
              \constraintfieldsor{\constraintfield{date}\constraintfield{year}}
            }
          }",
    )
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn later_templates_extend_earlier_ones() {
    let overlay = template(
        r"\DeclareDatamodelEntrytypes{dataset}
          \DeclareDatamodelFields[type=field,datatype=uri]{url}
          \DeclareDatamodelEntryfields[article]{url}",
    );
    let proto = ProtoStyle::aggregate([&base(), &overlay]);
    assert!(proto.has_entry("article"));
    assert!(proto.has_entry("dataset"));
    assert!(proto.entry_fields()["article"].contains("author"));
    assert!(proto.entry_fields()["article"].contains("url"));
    assert!(proto.universal_fields().contains("title"));
}

#[test]
fn later_field_declarations_win() {
    let overlay = template(r"\DeclareDatamodelFields[type=field,datatype=verbatim,nullok]{title}");
    let proto = ProtoStyle::aggregate([&base(), &overlay]);
    let title = &proto.fields()["title"];
    assert_eq!(title.datatype, Some(Datatype::Verbatim));
    assert!(title.nullok);
}

#[test]
fn reset_clears_only_its_category() {
    let overlay = template(
        r"\ResetDatamodelEntrytypes
          \DeclareDatamodelEntrytypes{report}",
    );
    let proto = ProtoStyle::aggregate([&base(), &overlay]);
    assert!(!proto.has_entry("article"));
    assert!(proto.has_entry("report"));
    // Fields and associations survive an entry-type reset.
    assert!(proto.has_field("author"));
    assert!(proto.entry_fields().contains_key("article"));
}

#[test]
fn reset_constraints() {
    let overlay = template(r"\ResetDatamodelConstraints");
    let proto = ProtoStyle::aggregate([&base(), &overlay]);
    assert!(proto.entry_rules().is_empty());
    assert!(proto.universal_constraints().is_empty());
}

#[test]
fn mandatory_groups_collapse_across_templates() {
    let overlay = template(
        r"\DeclareDatamodelConstraints[article]{
            \constraint[type=mandatory]{
              \constraintfield{title}
              \constraintfieldsor{\constraintfield{date}\constraintfield{year}\constraintfield{eventdate}}
            }
          }",
    );
    let proto = ProtoStyle::aggregate([&base(), &overlay]);
    let mandatory = &proto.entry_rules()["article"].mandatory;
    assert_eq!(mandatory.all, names(&["author", "journaltitle", "title"]));
    assert_eq!(mandatory.some, vec![names(&["date", "year", "eventdate"])]);
}

#[test]
fn conditional_rules_are_not_duplicated() {
    let rule = r"\DeclareDatamodelConstraints[article]{
        \constraint[type=conditional]{
          \antecedent[quantifier=all]{\constraintfield{urldate}}
          \consequent[quantifier=all]{\constraintfield{url}}
        }
      }";
    let proto = ProtoStyle::aggregate([&template(rule), &template(rule)]);
    assert_eq!(proto.entry_rules()["article"].conditional.len(), 1);
}

// =============================================================================
// Aliases
// =============================================================================

#[test]
fn field_alias_joins_entry_sets_and_relaxes_all() {
    let mut proto = ProtoStyle::aggregate([&base()]);
    proto.alias_field("journaltitle", &names(&["journal"])).unwrap();

    assert!(proto.entry_fields()["article"].contains("journal"));
    assert_eq!(proto.fields()["journal"], proto.fields()["journaltitle"]);
    let mandatory = &proto.entry_rules()["article"].mandatory;
    assert!(!mandatory.all.contains(&"journaltitle".to_string()));
    assert!(mandatory.some.contains(&names(&["journaltitle", "journal"])));
    assert_eq!(proto.field_aliases().get("journal").map(String::as_str), Some("journaltitle"));
}

#[test]
fn alias_of_unknown_field_fails() {
    let mut proto = ProtoStyle::aggregate([&base()]);
    assert!(proto.alias_field("nothing", &names(&["x"])).is_err());
    assert!(proto.alias_entry("nothing", &names(&["x"])).is_err());
}

#[test]
fn alias_chains_resolve() {
    let mut proto = ProtoStyle::aggregate([&base()]);
    proto.alias_field("title", &names(&["maintitle"])).unwrap();
    proto.alias_field("maintitle", &names(&["fulltitle"])).unwrap();
    let aliases = proto.field_aliases();
    assert_eq!(resolve_alias(aliases, "fulltitle", 8), Some("title"));
    assert_eq!(resolve_alias(aliases, "title", 8), Some("title"));
    assert_eq!(resolve_alias(aliases, "fulltitle", 1), None);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn removing_a_field_clears_it_everywhere() {
    let mut proto = ProtoStyle::aggregate([&base()]);
    proto.remove_field("author");
    assert!(!proto.has_field("author"));
    assert!(!proto.entry_fields()["article"].contains("author"));
    assert!(!proto.entry_fields().contains_key("book"));
}

#[test]
fn removing_an_entry_drops_its_rules() {
    let mut proto = ProtoStyle::aggregate([&base()]);
    proto.remove_entry("article");
    assert!(!proto.has_entry("article"));
    assert!(!proto.entry_fields().contains_key("article"));
    assert!(!proto.entry_rules().contains_key("article"));
}
