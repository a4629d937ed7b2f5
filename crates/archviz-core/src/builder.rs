//! Explicit construction of diagrams.
//!
//! [`DiagramBuilder`] collects nodes, clusters and edges and checks the whole
//! description in [`DiagramBuilder::build`]. Clusters are built by passing a
//! closure that receives a [`ClusterBuilder`] for the nested scope, so the
//! containment tree is expressed by ordinary recursion rather than by a
//! "current diagram" registered somewhere globally.
//!
//! # Examples
//!
//! ```
//! use archviz_core::builder::DiagramBuilder;
//!
//! let mut builder = DiagramBuilder::new("Web Service").with_formats(["png", "pdf"]);
//! builder
//!     .node("lb", "Load Balancer")
//!     .cluster("workers", "Workers", |workers| {
//!         workers.node("w1", "Worker 1").node("w2", "Worker 2");
//!     })
//!     .edge_labeled("lb", "workers", "dispatch");
//!
//! let diagram = builder.build().unwrap();
//! assert_eq!(diagram.basename(), "web_service");
//! assert_eq!(diagram.node_count(), 3);
//! ```

use std::collections::HashSet;

use log::debug;

use crate::{
    color::Color,
    error::SpecError,
    identifier::Id,
    model::{Cluster, CurveStyle, Diagram, Direction, Edge, Member, Node, OutputFormat},
};

/// Builder for a [`Diagram`].
#[derive(Debug, Clone)]
pub struct DiagramBuilder {
    title: String,
    basename: Option<String>,
    formats: Vec<String>,
    direction: Direction,
    curve_style: CurveStyle,
    root: ClusterBuilder,
    edges: Vec<Edge>,
}

impl DiagramBuilder {
    /// Starts a diagram with the given title.
    ///
    /// Unless overridden, the output basename is derived from the title and
    /// the diagram renders to PNG only.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            basename: None,
            formats: vec![OutputFormat::Png.extension().to_string()],
            direction: Direction::default(),
            curve_style: CurveStyle::default(),
            root: ClusterBuilder::default(),
            edges: Vec::new(),
        }
    }

    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = Some(basename.into());
        self
    }

    /// Replaces the requested formats. Names are checked in [`Self::build`].
    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.formats = formats
            .into_iter()
            .map(|format| format.as_ref().to_string())
            .collect();
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_curve_style(mut self, curve_style: CurveStyle) -> Self {
        self.curve_style = curve_style;
        self
    }

    /// Adds a root-level node.
    pub fn node(&mut self, id: impl Into<Id>, label: impl Into<String>) -> &mut Self {
        self.root.node(id, label);
        self
    }

    /// Adds a fully configured root-level node.
    pub fn node_with(&mut self, node: Node) -> &mut Self {
        self.root.node_with(node);
        self
    }

    /// Adds a root-level cluster whose content is filled in by `fill`.
    pub fn cluster<F>(&mut self, id: impl Into<Id>, label: impl Into<String>, fill: F) -> &mut Self
    where
        F: FnOnce(&mut ClusterBuilder),
    {
        self.root.cluster(id, label, fill);
        self
    }

    /// The root-level scope, for callers that fill the root and nested
    /// clusters through the same code path.
    pub fn root(&mut self) -> &mut ClusterBuilder {
        &mut self.root
    }

    /// Adds an unlabeled forward edge.
    pub fn edge(&mut self, source: impl Into<Id>, target: impl Into<Id>) -> &mut Self {
        self.edges.push(Edge::new(source, target));
        self
    }

    /// Adds a labeled forward edge.
    pub fn edge_labeled(
        &mut self,
        source: impl Into<Id>,
        target: impl Into<Id>,
        label: impl Into<String>,
    ) -> &mut Self {
        self.edges.push(Edge::new(source, target).with_label(label));
        self
    }

    /// Adds a fully configured edge.
    pub fn edge_with(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Validates the description and produces the [`Diagram`].
    ///
    /// # Errors
    ///
    /// - [`SpecError::InvalidBasename`] if the basename is not a single file name.
    /// - [`SpecError::EmptyFormats`] / [`SpecError::UnsupportedFormat`] for bad formats.
    /// - [`SpecError::DuplicateIdentifier`] if a node or cluster id repeats.
    /// - [`SpecError::InvalidReference`] if an edge names an undeclared id.
    pub fn build(self) -> Result<Diagram, SpecError> {
        let basename = match self.basename {
            Some(basename) => basename,
            None => basename_from_title(&self.title),
        };
        validate_basename(&basename)?;

        let formats = parse_formats(&self.formats)?;

        let members = self.root.members;
        let mut declared = HashSet::new();
        collect_ids(&members, &mut declared)?;

        for (edge_index, edge) in self.edges.iter().enumerate() {
            for identifier in [edge.source(), edge.target()] {
                if !declared.contains(&identifier) {
                    return Err(SpecError::InvalidReference {
                        identifier,
                        edge_index,
                    });
                }
            }
        }

        debug!(
            title = self.title,
            identifiers = declared.len(),
            edges = self.edges.len();
            "Diagram description validated"
        );

        Ok(Diagram::new(
            self.title,
            basename,
            formats,
            self.direction,
            self.curve_style,
            members,
            self.edges,
        ))
    }
}

/// Builder for the content of one cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterBuilder {
    members: Vec<Member>,
    background_color: Option<Color>,
}

impl ClusterBuilder {
    pub fn node(&mut self, id: impl Into<Id>, label: impl Into<String>) -> &mut Self {
        self.members.push(Member::Node(Node::new(id, label)));
        self
    }

    pub fn node_with(&mut self, node: Node) -> &mut Self {
        self.members.push(Member::Node(node));
        self
    }

    /// Adds a nested cluster whose content is filled in by `fill`.
    pub fn cluster<F>(&mut self, id: impl Into<Id>, label: impl Into<String>, fill: F) -> &mut Self
    where
        F: FnOnce(&mut ClusterBuilder),
    {
        let mut nested = ClusterBuilder::default();
        fill(&mut nested);
        self.members.push(Member::Cluster(Cluster::new(
            id.into(),
            label.into(),
            nested.background_color,
            nested.members,
        )));
        self
    }

    /// Overrides the background color of the cluster being built.
    pub fn background(&mut self, color: Color) -> &mut Self {
        self.background_color = Some(color);
        self
    }
}

/// Derives a file stem from a title: whitespace runs become `_`, path
/// separators become `-`, letters are lowercased.
pub fn basename_from_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\', '\0'], "-")
        .to_lowercase()
}

/// Checks that `basename` can be used as a file stem inside the output directory.
pub fn validate_basename(basename: &str) -> Result<(), SpecError> {
    let invalid = basename.is_empty()
        || basename == "."
        || basename == ".."
        || basename.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SpecError::InvalidBasename(basename.to_string()));
    }
    Ok(())
}

fn parse_formats(names: &[String]) -> Result<Vec<OutputFormat>, SpecError> {
    if names.is_empty() {
        return Err(SpecError::EmptyFormats);
    }
    let mut formats = Vec::with_capacity(names.len());
    for name in names {
        let format: OutputFormat = name.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

fn collect_ids(members: &[Member], declared: &mut HashSet<Id>) -> Result<(), SpecError> {
    for member in members {
        if !declared.insert(member.id()) {
            return Err(SpecError::DuplicateIdentifier(member.id()));
        }
        if let Member::Cluster(cluster) = member {
            collect_ids(cluster.members(), declared)?;
        }
    }
    Ok(())
}
