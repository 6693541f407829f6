//! Integration tests for comment stripping and the command lexer

use bibstyle_foundation::ErrorKind;
use bibstyle_language::{Command, Lexer, Node, strip_comments};

fn commands(source: &str) -> Vec<Command> {
    Lexer::tokenize(source)
        .value
        .into_iter()
        .filter_map(|node| match node {
            Node::Command(cmd) => Some(cmd),
            Node::Text { .. } => None,
        })
        .collect()
}

// =============================================================================
// Comments
// =============================================================================

#[test]
fn comments_run_to_end_of_line() {
    let stripped = strip_comments("\\DeclareDatamodelEntrytypes{article} % core types\n\\foo");
    assert_eq!(stripped, "\\DeclareDatamodelEntrytypes{article} \n\\foo");
}

#[test]
fn escaped_percent_is_text() {
    assert_eq!(strip_comments(r"100\% sure % not this"), r"100\% sure ");
}

#[test]
fn line_count_is_preserved() {
    let source = "% header\n% more\n\\DeclareDatamodelFields[type=field]{a}\n";
    assert_eq!(strip_comments(source).lines().count(), source.lines().count());
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn text_between_commands_is_kept() {
    let nodes = Lexer::tokenize(r"lead \foo{a} tail").value;
    assert_eq!(nodes.len(), 3);
    assert!(matches!(&nodes[0], Node::Text { body, .. } if body == "lead"));
    assert_eq!(nodes[1].as_command().map(|c| c.name.as_str()), Some("foo"));
    assert!(matches!(&nodes[2], Node::Text { body, .. } if body == "tail"));
}

#[test]
fn nested_braces_in_options_and_arguments() {
    let cmds = commands(r"\constraint[type=data,pattern=\regexp{[a-z]{2}}]{\constraintfield{gender}}");
    assert_eq!(cmds.len(), 1);
    assert_eq!(
        cmds[0].options.as_deref(),
        Some(r"type=data,pattern=\regexp{[a-z]{2}}")
    );
    assert_eq!(cmds[0].child_commands().count(), 1);
}

#[test]
fn bodies_are_lexed_recursively() {
    let cmds = commands(
        r"\DeclareDatamodelConstraints[article]{
            \constraint[type=mandatory]{
                \constraintfield{author}
                \constraintfieldsor{\constraintfield{date}\constraintfield{year}}
            }
        }",
    );
    let block = &cmds[0];
    let constraint: Vec<&Command> = block.child_commands().collect();
    assert_eq!(constraint.len(), 1);
    let clauses: Vec<&str> = constraint[0].child_commands().map(|c| c.name.as_str()).collect();
    assert_eq!(clauses, vec!["constraintfield", "constraintfieldsor"]);
}

#[test]
fn spans_point_at_the_backslash() {
    let cmds = commands("\n  \\DeclareDatamodelEntrytypes{a}");
    assert_eq!(cmds[0].span.line, 2);
    assert_eq!(cmds[0].span.column, 3);
}

#[test]
fn escaped_characters_are_not_commands() {
    let cmds = commands(r"\{ \} \\ \foo{x}");
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].name, "foo");
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn unterminated_argument_is_reported_and_skipped() {
    let outcome = Lexer::tokenize(
        "\\DeclareDatamodelEntrytypes{article\n\\DeclareDatamodelFields[type=field,datatype=literal]{title}",
    );
    assert_eq!(outcome.diagnostics.len(), 1);
    let err = outcome.diagnostics.iter().next().map(|e| e.kind.clone());
    assert!(matches!(err, Some(ErrorKind::ParseFailure { line: 1, .. })));

    let names: Vec<String> = outcome
        .value
        .iter()
        .filter_map(Node::as_command)
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(names, vec!["DeclareDatamodelFields".to_string()]);
}

#[test]
fn unterminated_options_are_reported() {
    let outcome = Lexer::tokenize(r"\DeclareDatamodelFields[type=field{title}");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics.has_errors());
}
