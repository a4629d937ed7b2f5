//! Integration tests for the public builder and declaration APIs.

use archviz_core::{
    SpecError,
    builder::DiagramBuilder,
    decl::DiagramDecl,
    identifier::Id,
    model::{Direction, Member, OutputFormat},
};

#[test]
fn test_servers_scenario() {
    let mut builder = DiagramBuilder::new("Servers").with_formats(["png"]);
    builder
        .node("a", "Server A")
        .node("b", "Server B")
        .edge_labeled("a", "b", "calls");

    let diagram = builder.build().unwrap();

    assert_eq!(diagram.formats(), &[OutputFormat::Png]);
    assert_eq!(diagram.node_count(), 2);
    assert_eq!(diagram.edges()[0].label(), Some("calls"));
}

#[test]
fn test_undeclared_endpoint_names_identifier() {
    let mut builder = DiagramBuilder::new("Servers");
    builder.node("a", "Server A").edge("a", "z");

    let err = builder.build().unwrap_err();

    assert_eq!(
        err,
        SpecError::InvalidReference {
            identifier: Id::new("z"),
            edge_index: 0,
        }
    );
}

#[test]
fn test_nested_layers_from_toml() {
    let decl: DiagramDecl = toml::from_str(
        r#"
        title = "Layers"
        direction = "LR"

        [nodes]
        a = "A"
        b = "B"

        [clusters.Layer1]
        nodes = ["a"]

        [clusters.Layer1.children.Layer2]
        nodes = ["b"]

        [[edges]]
        from = "a"
        to = "b"
        "#,
    )
    .unwrap();

    let diagram = decl.into_diagram().unwrap();

    assert_eq!(diagram.direction(), Direction::LR);
    let [Member::Cluster(layer1)] = diagram.members() else {
        panic!("expected a single root cluster, got {:?}", diagram.members());
    };
    assert_eq!(layer1.id(), "Layer1");
    assert!(matches!(&layer1.members()[0], Member::Node(node) if node.id() == "a"));
    assert!(matches!(&layer1.members()[1], Member::Cluster(layer2) if layer2.id() == "Layer2"));
    assert_eq!(diagram.edges().len(), 1);
}

#[test]
fn test_same_node_in_two_clusters_is_rejected() {
    let decl: DiagramDecl = toml::from_str(
        r#"
        title = "Orders"

        [nodes]
        kafka_stream = "Kafka"

        [clusters.Orders]
        nodes = ["kafka_stream"]

        [clusters.Billing]
        nodes = ["kafka_stream"]
        "#,
    )
    .unwrap();

    assert_eq!(
        decl.into_diagram().unwrap_err(),
        SpecError::DuplicateIdentifier(Id::new("kafka_stream"))
    );
}
