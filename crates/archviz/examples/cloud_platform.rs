//! Example: A cloud platform built with the explicit builder
//!
//! Nested clusters, edges to whole clusters and per-edge styling. Requires
//! Graphviz on PATH; pass `dot` as the first argument to only emit DOT.

use std::path::Path;

use archviz::{
    DiagramRenderer,
    builder::DiagramBuilder,
    color::Color,
    model::{Direction, Edge, EdgeDirection, LineStyle, Node},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let format = std::env::args().nth(1).unwrap_or_else(|| "png".to_string());

    let mut builder = DiagramBuilder::new("Cloud Platform")
        .with_basename("cloud_platform")
        .with_formats([format.as_str()])
        .with_direction(Direction::LR);

    builder
        .node("users", "Users")
        .node_with(Node::new("dns", "DNS").with_shape("ellipse"))
        .cluster("edge", "Edge", |edge| {
            edge.node("cdn", "CDN").node("lb", "Load Balancer");
        })
        .cluster("compute", "Compute", |compute| {
            compute
                .cluster("web", "Web Tier", |web| {
                    web.node("web1", "web-1").node("web2", "web-2").node("web3", "web-3");
                })
                .cluster("services", "Services", |services| {
                    services
                        .node("auth", "Auth")
                        .node("orders", "Orders")
                        .node("billing", "Billing");
                });
        })
        .cluster("data", "Data", |data| {
            data.node_with(Node::new("db", "PostgreSQL\nprimary + replica").with_shape("cylinder"))
                .node_with(Node::new("cache", "Redis").with_shape("cylinder"))
                .node("queue", "Message Queue");
        });

    builder
        .edge("users", "dns")
        .edge_labeled("users", "cdn", "HTTPS")
        .edge("cdn", "lb")
        .edge_labeled("lb", "web", "round robin")
        .edge_labeled("web", "services", "gRPC")
        .edge("orders", "db")
        .edge_with(
            Edge::new("auth", "cache")
                .with_direction(EdgeDirection::Bidirectional)
                .with_style(LineStyle::Dashed),
        )
        .edge_with(
            Edge::new("billing", "queue")
                .with_label("invoices")
                .with_color(Color::new("firebrick")?),
        );

    let diagram = builder.build()?;
    let paths = DiagramRenderer::default().render(&diagram, Path::new("out"))?;
    for path in paths {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
