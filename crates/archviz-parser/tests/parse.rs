use archviz_core::{
    identifier::Id,
    model::{CurveStyle, Direction, EdgeDirection, LineStyle, Member, OutputFormat},
};
use archviz_parser::{error::ErrorCode, parse};

#[test]
fn test_flat_diagram() {
    let source = r#"
        diagram "Servers";
        a as "Server A";
        b as "Server B";
        a -> b: "calls";
    "#;

    let diagram = parse(source).expect("Failed to parse");

    assert_eq!(diagram.title(), "Servers");
    assert_eq!(diagram.basename(), "servers");
    assert_eq!(diagram.formats(), &[OutputFormat::Png]);

    let members = diagram.members();
    assert_eq!(members.len(), 2);
    match &members[0] {
        Member::Node(node) => {
            assert_eq!(node.id(), Id::new("a"));
            assert_eq!(node.label(), "Server A");
        }
        _ => panic!("Expected Node member"),
    }

    let edge = &diagram.edges()[0];
    assert_eq!(edge.source(), Id::new("a"));
    assert_eq!(edge.target(), Id::new("b"));
    assert_eq!(edge.label(), Some("calls"));
    assert_eq!(edge.direction(), EdgeDirection::Forward);
}

#[test]
fn test_nested_clusters() {
    let source = r#"
        diagram "Layers" [direction="TB", curve_style="polyline"];
        cluster layer1 as "Layer1" {
            a;
            cluster layer2 as "Layer2" {
                b;
            };
        };
        a -> b;
    "#;

    let diagram = parse(source).expect("Failed to parse");
    assert_eq!(diagram.direction(), Direction::TB);
    assert_eq!(diagram.curve_style(), CurveStyle::Polyline);

    let layer1 = diagram.find_cluster(Id::new("layer1")).unwrap();
    assert_eq!(layer1.label(), "Layer1");
    match &layer1.members()[1] {
        Member::Cluster(layer2) => {
            assert_eq!(layer2.label(), "Layer2");
            assert_eq!(layer2.first_node().map(|n| n.id()), Some(Id::new("b")));
        }
        _ => panic!("Expected nested cluster"),
    }
}

#[test]
fn test_edge_to_cluster() {
    let source = r#"
        diagram "Pipeline";
        source as "Kafka";
        cluster processing as "Processing" { w1; w2; };
        source -> processing;
    "#;

    let diagram = parse(source).expect("Failed to parse");
    assert_eq!(diagram.edges()[0].target(), Id::new("processing"));
}

#[test]
fn test_edge_styles() {
    let source = r#"
        diagram "Styles";
        a; b;
        a <- [style="bold", color="firebrick"] b;
        a -- [style="dotted"] b;
    "#;

    let diagram = parse(source).expect("Failed to parse");
    let edges = diagram.edges();
    assert_eq!(edges[0].direction(), EdgeDirection::Backward);
    assert_eq!(edges[0].style(), LineStyle::Bold);
    assert_eq!(edges[0].color().map(|c| c.to_hex()), Some("#b22222".to_string()));
    assert_eq!(edges[1].direction(), EdgeDirection::Plain);
    assert_eq!(edges[1].style(), LineStyle::Dotted);
}

#[test]
fn test_undefined_edge_target() {
    let source = "diagram \"T\";\na;\na -> z;\n";
    let err = parse(source).unwrap_err();

    let diag = &err.diagnostics()[0];
    assert_eq!(diag.code(), Some(ErrorCode::E200));
    let span = diag.primary_span().unwrap();
    assert_eq!(&source[span.start()..span.end()], "z");
    assert!(diag.help().is_some());
}

#[test]
fn test_duplicate_node_in_two_clusters() {
    let source = r#"
        diagram "Orders";
        cluster left { purchase_orders; };
        cluster right { purchase_orders; };
    "#;

    let err = parse(source).unwrap_err();
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E201));
}

#[test]
fn test_unsupported_format() {
    let err = parse("diagram \"T\" [formats=[png, gif]];").unwrap_err();
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E302));
}
