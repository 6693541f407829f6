//! Integration tests for configured styles, from registry to validation

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use bibstyle_directives::StyleConfig;
use bibstyle_engine::{EntryValidator, ValidationConfig};
use bibstyle_foundation::{ErrorKind, LintCode};
use bibstyle_language::Template;
use bibstyle_runtime::{StyleRegistry, config_from_json};
use bibstyle_stdlib::DEFAULT_STYLE_NAME;

const CONFIG: &str = r#"{
    "global": {
        "lints": ["ignore 7"],
        "fields": ["add pmid {type=field, datatype=verbatim}"],
        "entries": ["set article {add=pmid}"]
    },
    "styles": {
        "journal": {
            "lints": ["watch 7"],
            "entries": ["require article {all=[doi]}", "rsome article {year}"]
        },
        "broken": {
            "fields": ["set shoesize {nullok}"]
        }
    }
}"#;

fn registry() -> StyleRegistry {
    let (mut registry, diagnostics) = StyleRegistry::with_builtin_default().into_parts();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let config = StyleConfig::from_raw(&config_from_json(CONFIG).unwrap());
    assert!(config.diagnostics.is_empty(), "{:?}", config.diagnostics);
    registry.set_config(config.value);
    registry
}

fn entry(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

fn codes(validator: &EntryValidator<'_>, entry_type: &str, fields: &BTreeMap<String, String>) -> Vec<String> {
    validator
        .validate(entry_type, fields)
        .violations
        .iter()
        .map(|v| v.code().to_string())
        .collect()
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn builtin_default_is_active() {
    let (registry, diagnostics) = StyleRegistry::with_builtin_default().into_parts();
    assert!(diagnostics.is_empty());
    let style = registry.active();
    assert_eq!(style.name(), DEFAULT_STYLE_NAME);
    assert!(style.entry("article").is_some());
    assert!(style.field("pmid").is_none());
}

#[test]
fn configured_names_are_known() {
    let registry = registry();
    let names: Vec<String> = registry.style_names().into_iter().collect();
    assert_eq!(names, vec!["broken", DEFAULT_STYLE_NAME, "journal"]);
    assert!(registry.knows("journal"));
    assert!(!registry.knows("chicago"));

    let err = registry.style("chicago").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownStyle(ref name) if name == "chicago"));
}

#[test]
fn global_directives_reach_every_style() {
    let registry = registry();
    for name in [DEFAULT_STYLE_NAME, "journal"] {
        let style = registry.style(name).unwrap().value;
        assert!(style.entry("article").is_some_and(|e| e.has_field("pmid")), "{name}");
        assert!(style.entry("book").is_some_and(|e| !e.has_field("pmid")), "{name}");
    }
}

#[test]
fn style_directives_stay_with_their_style() {
    let registry = registry();
    let journal = registry.style("journal").unwrap().value;
    let article = journal.entry("article").unwrap();
    assert!(article.constraints.mandatory.all.contains(&"doi".to_string()));
    assert_eq!(article.constraints.mandatory.some, vec![vec!["date".to_string()]]);

    let default = registry.style(DEFAULT_STYLE_NAME).unwrap().value;
    assert!(!default.entry("article").unwrap().constraints.mandatory.all.contains(&"doi".to_string()));
}

#[test]
fn failed_directives_are_reported_and_cached() {
    let registry = registry();
    let first = registry.style("broken").unwrap();
    assert_eq!(first.diagnostics.len(), 1);
    assert!(first.diagnostics.iter().all(|e| matches!(e.kind, ErrorKind::Directive(_))));
    assert!(first.value.entry("article").is_some());

    let second = registry.style("broken").unwrap();
    assert!(Arc::ptr_eq(&first.value, &second.value));
    assert_eq!(second.diagnostics.len(), 1);
}

#[test]
fn activation_swaps_the_published_style() {
    let registry = registry();
    let before = registry.active();
    registry.activate("journal").unwrap();
    assert_eq!(registry.active().name(), "journal");
    assert_eq!(before.name(), DEFAULT_STYLE_NAME);

    assert!(registry.activate("chicago").is_err());
    assert_eq!(registry.active().name(), "journal");
}

#[test]
fn overlays_add_to_the_default_model() {
    let mut registry = registry();
    let overlay = Template::from_source(
        r"\DeclareDatamodelEntrytypes{letter}
          \DeclareDatamodelEntryfields[letter]{author, title, location}
          \DeclareDatamodelConstraints[letter]{
            \constraint[type=mandatory]{\constraintfield{author}}
          }",
    );
    assert!(overlay.diagnostics.is_empty());
    registry.add_overlay("letters", overlay.value);
    assert!(registry.knows("letters"));

    let style = registry.style("letters").unwrap().value;
    let letter = style.entry("letter").unwrap();
    assert!(letter.has_field("location"));
    assert!(letter.has_field("url"));
    assert!(style.entry("article").is_some_and(|e| e.has_field("pmid")));

    let validator = EntryValidator::new(&style);
    assert_eq!(codes(&validator, "letter", &entry(&[("title", "Dear Sir")])), vec!["008"]);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn lints_follow_the_style() {
    let registry = registry();
    let fields = entry(&[
        ("author", "Doe, Jane"),
        ("title", "On Things"),
        ("journaltitle", "Journal"),
        ("year", "2020"),
        ("pmid", "31452104"),
        ("booktitle", "Stray"),
    ]);

    let default = registry.style(DEFAULT_STYLE_NAME).unwrap().value;
    let config = ValidationConfig::new().with_lints(registry.lints_for(DEFAULT_STYLE_NAME));
    let validator = EntryValidator::with_config(&default, config);
    assert!(codes(&validator, "article", &fields).is_empty());

    let journal = registry.style("journal").unwrap().value;
    let config = ValidationConfig::new().with_lints(registry.lints_for("journal"));
    let validator = EntryValidator::with_config(&journal, config);
    assert_eq!(codes(&validator, "article", &fields), vec!["008", "019", "007"]);
    assert!(!registry.lints_for(DEFAULT_STYLE_NAME).is_enabled(LintCode::new(7)));
}

#[test]
fn a_shared_style_validates_from_many_threads() {
    let registry = registry();
    let style = registry.activate("journal").unwrap().value;
    let fields = entry(&[("author", "a"), ("title", "t"), ("journaltitle", "j")]);

    let counts: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let style = Arc::clone(&style);
                let fields = &fields;
                scope.spawn(move || EntryValidator::new(&style).validate("article", fields).violations.len())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![2; 4]);
}
