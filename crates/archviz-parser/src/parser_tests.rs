//! Tests for the whole pipeline, from source text to diagram.
//!
//! These cover how the phases hand off to each other: which phase reports a
//! given mistake and that a failing phase stops the ones after it.

use archviz_core::{
    identifier::Id,
    model::{Direction, Member, OutputFormat},
};

use crate::{error::ErrorCode, lexer, parse, parser};

/// Helper function to parse a source string and return success/failure
fn parse_source(source: &str) -> Result<(), String> {
    let tokens = lexer::tokenize(source).map_err(|err| format!("Lexer error: {err}"))?;
    let _ast = parser::build_diagram(&tokens).map_err(|err| format!("Parser error: {err}"))?;
    Ok(())
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) {
    if let Err(e) = parse_source(source) {
        panic!("Expected parsing to succeed, but got error: {e}");
    }
}

/// Helper to get the error codes of a failed pipeline run
fn error_codes(source: &str) -> Vec<ErrorCode> {
    match parse(source) {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(err) => err.diagnostics().iter().filter_map(|d| d.code()).collect(),
    }
}

#[test]
fn test_full_example() {
    let source = r##"
        // Three-tier web application
        diagram "Web Service" [direction="LR", formats=[png, pdf], filename="web"];

        dns as "Route 53";
        cluster frontend as "Frontend" {
            lb as "ELB" [shape="box3d"];
            cluster workers as "Web Workers" [bgcolor="#ECE8F6"] {
                w1 as "Worker 1";
                w2 as "Worker 2";
                w3 as "Worker 3";
            };
        };
        db as "RDS" [shape="cylinder"];

        dns -> lb;
        lb -> workers: "round robin";
        workers -> [style="dotted"] db;
    "##;

    let diagram = parse(source).expect("pipeline should succeed");
    assert_eq!(diagram.title(), "Web Service");
    assert_eq!(diagram.basename(), "web");
    assert_eq!(diagram.direction(), Direction::LR);
    assert_eq!(diagram.formats(), &[OutputFormat::Png, OutputFormat::Pdf]);
    assert_eq!(diagram.node_count(), 6);
    assert_eq!(diagram.edges().len(), 3);

    let workers = diagram.find_cluster(Id::new("workers")).unwrap();
    assert_eq!(workers.members().len(), 3);
    assert!(matches!(&diagram.members()[2], Member::Node(n) if n.id() == "db"));
}

#[test]
fn test_whitespace_insensitive() {
    assert_parses_successfully("diagram\"T\";a;b;a->b;cluster c{d;};");
    assert_parses_successfully("diagram \"T\" ;\n\n  a\n  ;\n  a\n  ->\n  a\n  :\n  \"loop\"\n  ;\n");
}

#[test]
fn test_empty_cluster() {
    let diagram = parse(r#"diagram "T"; cluster empty as "Nothing here" {}; "#).unwrap();
    assert_eq!(diagram.node_count(), 0);
    assert!(diagram.find_cluster(Id::new("empty")).is_some());
}

#[test]
fn test_defaults_without_header_attributes() {
    let diagram = parse(r#"diagram "Default Look"; a;"#).unwrap();
    assert_eq!(diagram.formats(), &[OutputFormat::Png]);
    assert_eq!(diagram.basename(), "default_look");
    assert_eq!(diagram.direction(), Direction::default());
}

#[test]
fn test_lexer_errors_stop_pipeline() {
    // The undefined reference would be E200, but lexing fails first.
    assert_eq!(
        error_codes("diagram \"T\";\na -> ghost: \"unterminated;\n"),
        [ErrorCode::E001]
    );
}

#[test]
fn test_parse_errors_stop_pipeline() {
    assert_eq!(
        error_codes("diagram \"T\" [bogus=\"x\"];\na -> ;\n"),
        [ErrorCode::E100]
    );
}

#[test]
fn test_validation_before_elaboration() {
    // Both an unknown attribute and an undefined identifier; validation wins.
    assert_eq!(
        error_codes("diagram \"T\" [bogus=\"x\"];\na -> ghost;\na;\n"),
        [ErrorCode::E200]
    );
}

#[test]
fn test_validation_reports_every_problem() {
    let source = r#"diagram "T";
        a; a;
        cluster a { b; };
        a -> x;
        y -> b;"#;
    assert_eq!(
        error_codes(source),
        [
            ErrorCode::E201,
            ErrorCode::E201,
            ErrorCode::E200,
            ErrorCode::E200,
        ]
    );
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(parse_source("diagram \"T\";\ncluster;\n").is_err());
    assert!(parse_source("diagram \"T\";\nas;\n").is_err());
}

#[test]
fn test_error_display_includes_code() {
    let err = parse("diagram \"T\";\na -> b;\n").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("error[E200]"), "got: {rendered}");
    assert!(rendered.contains("(+1 more)"), "got: {rendered}");
}
