//! Example: A big data pipeline declared as plain data
//!
//! Builds a [`DiagramDecl`] in code, the same shape a TOML file deserializes
//! into, and renders it with [`build_and_render`].

use std::path::Path;

use archviz::{
    GraphvizBackend, build_and_render,
    decl::{ClusterDecl, DiagramDecl, EdgeDecl},
    model::Direction,
};

fn cluster(nodes: &[&str]) -> ClusterDecl {
    ClusterDecl {
        nodes: nodes.iter().map(|id| id.to_string()).collect(),
        ..ClusterDecl::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut decl = DiagramDecl {
        title: "Big Data Platform".to_string(),
        basename: Some("big_data".to_string()),
        formats: vec!["png".to_string(), "pdf".to_string()],
        direction: Direction::LR,
        ..DiagramDecl::default()
    };

    for (id, label) in [
        ("apps", "Applications"),
        ("logs", "Log Collectors"),
        ("kafka", "Kafka"),
        ("flink", "Flink"),
        ("spark", "Spark"),
        ("hdfs", "HDFS"),
        ("hive", "Hive"),
        ("warehouse", "Data Warehouse"),
        ("bi", "BI Dashboards"),
    ] {
        decl.nodes.insert(id.to_string(), label.to_string());
    }

    let mut processing = cluster(&[]);
    processing
        .children
        .insert("Streaming".to_string(), cluster(&["flink"]));
    processing
        .children
        .insert("Batch".to_string(), cluster(&["spark"]));

    decl.clusters
        .insert("Ingestion".to_string(), cluster(&["logs", "kafka"]));
    decl.clusters.insert("Processing".to_string(), processing);
    decl.clusters
        .insert("Storage".to_string(), cluster(&["hdfs", "hive", "warehouse"]));

    decl.edges = vec![
        EdgeDecl::new("apps", "logs", Some("events")),
        EdgeDecl::new("logs", "kafka", None),
        EdgeDecl::new("kafka", "Streaming", Some("real time")),
        EdgeDecl::new("kafka", "hdfs", Some("raw dump")),
        EdgeDecl::new("hdfs", "Batch", None),
        EdgeDecl::new("Batch", "hive", None),
        EdgeDecl::new("Streaming", "warehouse", None),
        EdgeDecl::new("hive", "warehouse", Some("ETL")),
        EdgeDecl::new("warehouse", "bi", None),
    ];

    let paths = build_and_render(decl, Path::new("out"), GraphvizBackend::default())?;
    for path in paths {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
