//! The diagram model.
//!
//! A [`Diagram`] owns a tree of [`Member`]s (nodes and nested clusters) and an
//! ordered list of [`Edge`]s between members. Values of these types are
//! produced by [`DiagramBuilder`](crate::builder::DiagramBuilder), which
//! validates references before handing out a `Diagram`, so code consuming a
//! `Diagram` may assume every edge endpoint resolves.
//!
//! ```text
//! Diagram
//! ├── Member::Node(web)
//! ├── Member::Cluster(backend)
//! │   ├── Member::Node(api)
//! │   └── Member::Cluster(storage)
//! │       └── Member::Node(db)
//! └── edges: web -> api, api -> storage
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::{color::Color, error::SpecError, identifier::Id};

/// Layout direction hint for the rendering engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
    /// Top to bottom.
    #[default]
    #[serde(alias = "tb")]
    TB,
    /// Bottom to top.
    #[serde(alias = "bt")]
    BT,
    /// Left to right.
    #[serde(alias = "lr")]
    LR,
    /// Right to left.
    #[serde(alias = "rl")]
    RL,
}

impl Direction {
    /// Returns the Graphviz `rankdir` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TB => "TB",
            Self::BT => "BT",
            Self::LR => "LR",
            Self::RL => "RL",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TB" => Ok(Self::TB),
            "BT" => Ok(Self::BT),
            "LR" => Ok(Self::LR),
            "RL" => Ok(Self::RL),
            _ => Err(format!(
                "invalid direction `{s}`, expected one of TB, BT, LR, RL"
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How edges are routed between nodes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveStyle {
    /// Right-angled segments.
    #[default]
    Ortho,
    /// Curved splines.
    Curved,
    /// Graphviz default splines.
    Spline,
    /// Straight polyline segments.
    Polyline,
}

impl CurveStyle {
    /// Returns the Graphviz `splines` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ortho => "ortho",
            Self::Curved => "curved",
            Self::Spline => "spline",
            Self::Polyline => "polyline",
        }
    }
}

impl FromStr for CurveStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ortho" => Ok(Self::Ortho),
            "curved" => Ok(Self::Curved),
            "spline" => Ok(Self::Spline),
            "polyline" => Ok(Self::Polyline),
            _ => Err(format!(
                "invalid curve style `{s}`, expected one of ortho, curved, spline, polyline"
            )),
        }
    }
}

/// File format a diagram is rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Pdf,
    Svg,
    Jpg,
    /// The generated Graphviz source, before layout.
    Dot,
}

impl OutputFormat {
    /// All supported formats, in a stable order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Png,
        OutputFormat::Pdf,
        OutputFormat::Svg,
        OutputFormat::Jpg,
        OutputFormat::Dot,
    ];

    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Jpg => "jpg",
            Self::Dot => "dot",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SpecError;

    /// Parses a format name. Matching ignores ASCII case and accepts the
    /// common `jpeg` and `gv` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "dot" | "gv" => Ok(Self::Dot),
            _ => Err(SpecError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which ends of an edge carry an arrowhead.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDirection {
    #[default]
    Forward, // ->
    Backward,      // <-
    Bidirectional, // <->
    Plain,         // --
}

impl EdgeDirection {
    /// Returns the Graphviz `dir` value.
    pub fn as_dot_dir(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "back",
            Self::Bidirectional => "both",
            Self::Plain => "none",
        }
    }
}

impl FromStr for EdgeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "->" => Ok(Self::Forward),
            "<-" => Ok(Self::Backward),
            "<->" => Ok(Self::Bidirectional),
            "--" => Ok(Self::Plain),
            _ => Err(format!("invalid edge direction `{s}`")),
        }
    }
}

/// Stroke style of an edge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Bold,
}

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Bold => "bold",
        }
    }
}

impl FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            "bold" => Ok(Self::Bold),
            _ => Err(format!(
                "invalid line style `{s}`, expected one of solid, dashed, dotted, bold"
            )),
        }
    }
}

/// A labeled box in the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    label: String,
    shape: Option<String>,
    fill_color: Option<Color>,
    font_color: Option<Color>,
}

impl Node {
    /// Creates a node with the default shape and colors.
    pub fn new(id: impl Into<Id>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape: None,
            fill_color: None,
            font_color: None,
        }
    }

    /// Overrides the Graphviz shape (`box`, `ellipse`, `cylinder`, ...).
    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn with_font_color(mut self, color: Color) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> Option<&str> {
        self.shape.as_deref()
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.fill_color
    }

    pub fn font_color(&self) -> Option<Color> {
        self.font_color
    }
}

/// A named visual grouping of nodes and nested clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    id: Id,
    label: String,
    background_color: Option<Color>,
    members: Vec<Member>,
}

impl Cluster {
    pub(crate) fn new(
        id: Id,
        label: String,
        background_color: Option<Color>,
        members: Vec<Member>,
    ) -> Self {
        Self {
            id,
            label,
            background_color,
            members,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    /// Direct children in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Returns the first node found by a depth-first walk of this cluster.
    pub fn first_node(&self) -> Option<&Node> {
        self.members.iter().find_map(|member| match member {
            Member::Node(node) => Some(node),
            Member::Cluster(cluster) => cluster.first_node(),
        })
    }
}

/// A child of a diagram or cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Node(Node),
    Cluster(Cluster),
}

impl Member {
    pub fn id(&self) -> Id {
        match self {
            Member::Node(node) => node.id(),
            Member::Cluster(cluster) => cluster.id(),
        }
    }
}

/// A directed, optionally labeled connection between two members.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    source: Id,
    target: Id,
    label: Option<String>,
    direction: EdgeDirection,
    color: Option<Color>,
    style: LineStyle,
}

impl Edge {
    /// Creates a forward edge with no label.
    pub fn new(source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            direction: EdgeDirection::Forward,
            color: None,
            style: LineStyle::Solid,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }
}

/// A validated diagram, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    title: String,
    basename: String,
    formats: Vec<OutputFormat>,
    direction: Direction,
    curve_style: CurveStyle,
    members: Vec<Member>,
    edges: Vec<Edge>,
}

impl Diagram {
    pub(crate) fn new(
        title: String,
        basename: String,
        formats: Vec<OutputFormat>,
        direction: Direction,
        curve_style: CurveStyle,
        members: Vec<Member>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            title,
            basename,
            formats,
            direction,
            curve_style,
            members,
            edges,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// File stem shared by every rendered output.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Requested formats, without duplicates, in request order.
    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn curve_style(&self) -> CurveStyle {
        self.curve_style
    }

    /// Root-level members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns a copy of this diagram rendering to `formats` instead.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::EmptyFormats`] if `formats` is empty.
    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Result<Self, SpecError> {
        if formats.is_empty() {
            return Err(SpecError::EmptyFormats);
        }
        let mut unique = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique.contains(&format) {
                unique.push(format);
            }
        }
        self.formats = unique;
        Ok(self)
    }

    /// Counts every node in the tree.
    pub fn node_count(&self) -> usize {
        fn count(members: &[Member]) -> usize {
            members
                .iter()
                .map(|member| match member {
                    Member::Node(_) => 1,
                    Member::Cluster(cluster) => count(cluster.members()),
                })
                .sum()
        }
        count(&self.members)
    }

    /// Looks up a cluster anywhere in the tree.
    pub fn find_cluster(&self, id: Id) -> Option<&Cluster> {
        fn find(members: &[Member], id: Id) -> Option<&Cluster> {
            members.iter().find_map(|member| match member {
                Member::Node(_) => None,
                Member::Cluster(cluster) if cluster.id() == id => Some(cluster),
                Member::Cluster(cluster) => find(cluster.members(), id),
            })
        }
        find(&self.members, id)
    }
}
