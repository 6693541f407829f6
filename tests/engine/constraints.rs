//! Integration tests for presence constraint evaluation

use std::collections::{BTreeMap, BTreeSet, HashSet};

use bibstyle_engine::{ViolationKind, check_constraints, condition_holds};
use bibstyle_language::{Condition, Quantifier};
use bibstyle_schema::{ConditionalRule, EntrySchema};
use proptest::prelude::*;

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn article() -> EntrySchema {
    let mut entry = EntrySchema::new("article", false);
    let mandatory = &mut entry.constraints.mandatory;
    for field in ["author", "title", "journaltitle"] {
        mandatory.add_all(field);
    }
    mandatory.add_some(names(&["year", "date"]));
    entry
}

fn online() -> EntrySchema {
    let mut entry = EntrySchema::new("online", false);
    entry.constraints.mandatory.add_one(names(&["url", "doi", "eprint"]));
    entry.constraints.add_conditional(ConditionalRule {
        antecedent: Condition::new(Quantifier::All, ["urldate"]),
        consequent: Condition::new(Quantifier::All, ["url"]),
    });
    entry
}

// =============================================================================
// Mandatory Clauses
// =============================================================================

#[test]
fn complete_article_is_clean() {
    let observed = ["author", "title", "journaltitle", "date"];
    let report = check_constraints(&article(), observed.as_slice());
    assert!(report.is_empty());
    assert_eq!(report.len(), 0);
}

#[test]
fn incomplete_article() {
    let observed: BTreeSet<&str> = ["author", "title"].into_iter().collect();
    let report = check_constraints(&article(), &observed);
    assert_eq!(report.missing_all_fields, names(&["journaltitle"]));
    assert_eq!(report.missing_some_fields, vec![names(&["year", "date"])]);
    assert!(report.missing_one_field.is_empty());
    assert!(report.too_many_fields.is_empty());
    assert_eq!(report.len(), 2);
}

#[test]
fn any_member_satisfies_a_some_group() {
    let observed = ["author", "title", "journaltitle", "year"];
    assert!(check_constraints(&article(), observed.as_slice()).is_empty());
}

#[test]
fn one_group_counts() {
    let entry = online();
    let none: [&str; 0] = [];
    let report = check_constraints(&entry, none.as_slice());
    assert_eq!(report.missing_one_field, vec![names(&["url", "doi", "eprint"])]);

    assert!(check_constraints(&entry, ["doi"].as_slice()).is_empty());

    let report = check_constraints(&entry, ["url", "eprint"].as_slice());
    assert!(report.missing_one_field.is_empty());
    assert_eq!(report.too_many_fields, vec![names(&["url", "doi", "eprint"])]);

    let report = check_constraints(&entry, ["url", "doi", "eprint"].as_slice());
    assert_eq!(report.too_many_fields.len(), 1);
}

proptest! {
    #[test]
    fn one_group_reports_by_count(mask in 0u8..8) {
        let group = ["url", "doi", "eprint"];
        let present: Vec<&str> = group
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, f)| *f)
            .collect();
        let report = check_constraints(&online(), present.as_slice());
        prop_assert_eq!(report.missing_one_field.len(), usize::from(present.is_empty()));
        prop_assert_eq!(report.too_many_fields.len(), usize::from(present.len() > 1));
    }
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn conditional_is_vacuous_without_antecedent() {
    let report = check_constraints(&online(), ["doi"].as_slice());
    assert!(report.failed_conditionals.is_empty());
}

#[test]
fn conditional_failure_is_reported_as_a_pair() {
    let report = check_constraints(&online(), ["urldate", "doi"].as_slice());
    assert_eq!(report.failed_conditionals.len(), 1);
    let rule = &report.failed_conditionals[0];
    assert_eq!(rule.antecedent.fields, names(&["urldate"]));
    assert_eq!(rule.consequent.fields, names(&["url"]));

    let flat = report.violations();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].kind, ViolationKind::FailedConditional);
    assert_eq!(flat[0].fields, names(&["urldate", "url"]));
}

#[test]
fn quantifiers() {
    let observed: HashSet<&str> = ["a", "b"].into_iter().collect();
    assert!(condition_holds(&Condition::new(Quantifier::All, ["a", "b"]), &observed));
    assert!(!condition_holds(&Condition::new(Quantifier::All, ["a", "c"]), &observed));
    assert!(condition_holds(&Condition::new(Quantifier::One, ["c", "b"]), &observed));
    assert!(!condition_holds(&Condition::new(Quantifier::One, ["c", "d"]), &observed));
    assert!(condition_holds(&Condition::new(Quantifier::None, ["c", "d"]), &observed));
    assert!(!condition_holds(&Condition::new(Quantifier::None, ["c", "a"]), &observed));
}

#[test]
fn none_consequent() {
    let mut entry = EntrySchema::new("patent", false);
    entry.constraints.add_conditional(ConditionalRule {
        antecedent: Condition::new(Quantifier::One, ["number"]),
        consequent: Condition::new(Quantifier::None, ["isbn", "issn"]),
    });
    assert!(check_constraints(&entry, ["number"].as_slice()).is_empty());
    assert!(!check_constraints(&entry, ["number", "isbn"].as_slice()).is_empty());
    assert!(check_constraints(&entry, ["isbn"].as_slice()).is_empty());
}

// =============================================================================
// Observed Field Shapes
// =============================================================================

#[test]
fn maps_and_sets_are_interchangeable() {
    let entry = article();
    let mut map = BTreeMap::new();
    map.insert("author".to_string(), "Jane Doe");
    map.insert("title".to_string(), "On Things");
    let from_map = check_constraints(&entry, &map);
    let from_slice = check_constraints(&entry, ["title", "author"].as_slice());
    assert_eq!(from_map, from_slice);
}
