//! Declarative diagram descriptions.
//!
//! A [`DiagramDecl`] is the plain-data form of a diagram: a node table, a
//! recursive cluster tree that places node ids, and an edge list. It derives
//! [`serde::Deserialize`], so the same description can be written by hand in
//! TOML:
//!
//! ```toml
//! title = "Ingest"
//! formats = ["png"]
//! direction = "LR"
//!
//! [nodes]
//! a = "Server A"
//! b = "Server B"
//!
//! [clusters.Layer1]
//! nodes = ["a"]
//!
//! [clusters.Layer1.children.Layer2]
//! nodes = ["b"]
//!
//! [[edges]]
//! from = "a"
//! to = "b"
//! label = "calls"
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    builder::{ClusterBuilder, DiagramBuilder},
    color::Color,
    error::SpecError,
    identifier::Id,
    model::{CurveStyle, Diagram, Direction, Edge, Node},
};

/// Plain-data description of a whole diagram.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramDecl {
    /// Display title.
    pub title: String,

    /// Output file stem; derived from the title when absent.
    #[serde(default)]
    pub basename: Option<String>,

    /// Requested output formats by name.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    pub curve_style: CurveStyle,

    /// Node id to display label, in declaration order.
    #[serde(default)]
    pub nodes: IndexMap<String, String>,

    /// Root clusters by name.
    #[serde(default)]
    pub clusters: IndexMap<String, ClusterDecl>,

    #[serde(default)]
    pub edges: Vec<EdgeDecl>,
}

/// One cluster of a [`DiagramDecl`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterDecl {
    /// Display label; the cluster name is used when absent.
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub bgcolor: Option<String>,

    /// Ids of nodes placed directly in this cluster.
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Nested clusters by name.
    #[serde(default)]
    pub children: IndexMap<String, ClusterDecl>,
}

/// One edge of a [`DiagramDecl`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDecl {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_formats() -> Vec<String> {
    vec!["png".to_string()]
}

impl EdgeDecl {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.map(str::to_string),
        }
    }
}

impl DiagramDecl {
    /// Converts the description into a validated [`Diagram`].
    ///
    /// Nodes that no cluster places end up at the root, in `nodes` order.
    ///
    /// # Errors
    ///
    /// Besides every error of [`DiagramBuilder::build`], returns
    /// [`SpecError::UndeclaredMember`] when a cluster lists an id missing
    /// from `nodes`, and [`SpecError::DuplicateIdentifier`] when two clusters
    /// place the same node.
    pub fn into_diagram(self) -> Result<Diagram, SpecError> {
        let mut builder = DiagramBuilder::new(self.title)
            .with_formats(&self.formats)
            .with_direction(self.direction)
            .with_curve_style(self.curve_style);
        if let Some(basename) = self.basename {
            builder = builder.with_basename(basename);
        }

        let mut placement = Placement::new(&self.nodes);
        let mut clustered = Vec::with_capacity(self.clusters.len());
        for (name, cluster) in &self.clusters {
            let mut content = ClusterBuilder::default();
            placement.fill(name, cluster, &mut content)?;
            clustered.push((name, cluster, content));
        }

        for (id, label) in &self.nodes {
            if !placement.is_placed(id) {
                builder.node(id, label.as_str());
            }
        }
        for (name, cluster, content) in clustered {
            let label = cluster.label.clone().unwrap_or_else(|| name.clone());
            builder.cluster(name, label, |target| *target = content);
        }

        for edge in self.edges {
            let mut built = Edge::new(edge.from, edge.to);
            if let Some(label) = edge.label {
                built = built.with_label(label);
            }
            builder.edge_with(built);
        }

        builder.build()
    }
}

/// Tracks which declared nodes have already been placed in a cluster.
struct Placement<'a> {
    nodes: &'a IndexMap<String, String>,
    placed: HashSet<&'a str>,
}

impl<'a> Placement<'a> {
    fn new(nodes: &'a IndexMap<String, String>) -> Self {
        Self {
            nodes,
            placed: HashSet::new(),
        }
    }

    fn is_placed(&self, id: &str) -> bool {
        self.placed.contains(id)
    }

    fn fill(
        &mut self,
        name: &str,
        cluster: &ClusterDecl,
        target: &mut ClusterBuilder,
    ) -> Result<(), SpecError> {
        if let Some(color) = &cluster.bgcolor {
            let color = Color::new(color).map_err(|reason| SpecError::InvalidAttribute {
                attribute: "bgcolor".to_string(),
                reason,
            })?;
            target.background(color);
        }

        for id in &cluster.nodes {
            let Some((key, label)) = self.nodes.get_key_value(id.as_str()) else {
                return Err(SpecError::UndeclaredMember {
                    identifier: Id::new(id),
                    cluster: Id::new(name),
                });
            };
            if !self.placed.insert(key.as_str()) {
                return Err(SpecError::DuplicateIdentifier(Id::new(id)));
            }
            target.node_with(Node::new(key, label.as_str()));
        }

        for (child_name, child) in &cluster.children {
            let label = child.label.clone().unwrap_or_else(|| child_name.clone());
            let mut nested = ClusterBuilder::default();
            self.fill(child_name, child, &mut nested)?;
            target.cluster(child_name, label, |content| *content = nested);
        }

        Ok(())
    }
}
