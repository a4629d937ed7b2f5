//! Lowering of a [`Diagram`] into a Graphviz graph.
//!
//! The diagram becomes a `digraph` whose clusters are `cluster_<id>`
//! subgraphs, so Graphviz draws them as nested boxes. Graphviz has no edges
//! that end on a subgraph, so every cluster used as an edge endpoint gets an
//! invisible `__anchor_<id>` point node of its own. Edges attach there and
//! are clipped at the cluster border with `lhead`/`ltail` (which requires
//! `compound=true`). The anchor never coincides with a member node, so an
//! edge between a cluster and something nested inside it stays a real edge.

use std::collections::{HashMap, HashSet};

use dot_structures::{
    Attribute, Edge as DotEdge, EdgeTy, Graph, GraphAttributes, Id as DotId, Node as DotNode,
    NodeId, Stmt, Subgraph, Vertex,
};
use graphviz_rust::printer::{DotPrinter, PrinterContext};
use log::trace;

use archviz_core::{
    color::Color,
    identifier::Id,
    model::{Cluster, Diagram, Edge, EdgeDirection, LineStyle, Member, Node},
};

use crate::config::StyleConfig;

/// Style values resolved from a [`StyleConfig`].
struct Palette {
    font_name: String,
    font_size: f32,
    font_color: String,
    background_color: Option<String>,
    node_shape: String,
    node_fill_color: String,
    edge_color: String,
    cluster_colors: Vec<String>,
    pad: f32,
    node_sep: f32,
    rank_sep: f32,
}

impl Palette {
    fn from_style(style: &StyleConfig) -> Result<Self, String> {
        style.validate()?;
        Ok(Self {
            font_name: style.font_name().to_string(),
            font_size: style.font_size(),
            font_color: style.font_color()?.to_hex(),
            background_color: style.background_color()?.map(|color| color.to_hex()),
            node_shape: style.node_shape().to_string(),
            node_fill_color: style.node_fill_color()?.to_hex(),
            edge_color: style.edge_color()?.to_hex(),
            cluster_colors: style
                .cluster_colors()?
                .iter()
                .map(Color::to_hex)
                .collect(),
            pad: style.pad(),
            node_sep: style.node_sep(),
            rank_sep: style.rank_sep(),
        })
    }

    /// Label size for nodes and edges.
    fn label_size(&self) -> f32 {
        (self.font_size - 2.0).max(1.0)
    }

    fn cluster_color(&self, depth: usize) -> &str {
        &self.cluster_colors[depth % self.cluster_colors.len()]
    }
}

/// Where edges touching a cluster attach.
struct ClusterAnchor {
    /// Invisible node the edge is drawn to.
    node: String,
    /// Every node and cluster nested inside, at any depth.
    descendants: HashSet<Id>,
}

/// Quotes and escapes `value` as a DOT string.
///
/// Line breaks become `\n` so that multi-line labels survive.
pub(crate) fn quote(value: &str) -> DotId {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped.push('"');
    DotId::Escaped(escaped)
}

fn attr(name: &str, value: impl AsRef<str>) -> Attribute {
    Attribute(DotId::Plain(name.to_string()), quote(value.as_ref()))
}

fn cluster_name(id: Id) -> String {
    format!("cluster_{id}")
}

fn anchor_name(id: Id) -> String {
    format!("__anchor_{id}")
}

fn node_id(name: &str) -> NodeId {
    NodeId(quote(name), None)
}

/// Converts diagrams into Graphviz graphs using one style.
pub struct DotLowering {
    palette: Palette,
}

impl DotLowering {
    /// Creates a lowering for `style`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid style setting.
    pub fn new(style: &StyleConfig) -> Result<Self, String> {
        Ok(Self {
            palette: Palette::from_style(style)?,
        })
    }

    /// Builds the Graphviz graph for `diagram`.
    pub fn to_graph(&self, diagram: &Diagram) -> Graph {
        let mut anchors = HashMap::new();
        collect_anchors(diagram.members(), &mut anchors);
        let endpoints: HashSet<Id> = diagram
            .edges()
            .iter()
            .flat_map(|edge| [edge.source(), edge.target()])
            .collect();
        anchors.retain(|id, _| endpoints.contains(id));

        let compound = !anchors.is_empty();

        let mut stmts = vec![
            Stmt::GAttribute(GraphAttributes::Graph(self.graph_attributes(diagram, compound))),
            Stmt::GAttribute(GraphAttributes::Node(self.node_defaults())),
            Stmt::GAttribute(GraphAttributes::Edge(self.edge_defaults())),
        ];

        for member in diagram.members() {
            stmts.push(self.member(member, 0, &anchors));
        }
        for edge in diagram.edges() {
            stmts.push(Stmt::Edge(self.edge(edge, &anchors)));
        }

        Graph::DiGraph {
            id: quote(diagram.basename()),
            strict: false,
            stmts,
        }
    }

    /// Builds the DOT source text for `diagram`.
    pub fn to_dot(&self, diagram: &Diagram) -> String {
        let graph = self.to_graph(diagram);
        let source = graph.print(&mut PrinterContext::default());
        trace!(source = source.as_str(); "DOT source generated");
        source
    }

    fn graph_attributes(&self, diagram: &Diagram, compound: bool) -> Vec<Attribute> {
        let palette = &self.palette;
        let mut attributes = vec![
            attr("label", diagram.title()),
            attr("labelloc", "t"),
            attr("rankdir", diagram.direction().as_str()),
            attr("splines", diagram.curve_style().as_str()),
            attr("pad", palette.pad.to_string()),
            attr("nodesep", palette.node_sep.to_string()),
            attr("ranksep", palette.rank_sep.to_string()),
            attr("fontname", &palette.font_name),
            attr("fontsize", palette.font_size.to_string()),
            attr("fontcolor", &palette.font_color),
        ];
        if let Some(background) = &palette.background_color {
            attributes.push(attr("bgcolor", background));
        }
        if compound {
            attributes.push(attr("compound", "true"));
        }
        attributes
    }

    fn node_defaults(&self) -> Vec<Attribute> {
        let palette = &self.palette;
        vec![
            attr("shape", &palette.node_shape),
            attr("style", "rounded,filled"),
            attr("fillcolor", &palette.node_fill_color),
            attr("fontname", &palette.font_name),
            attr("fontsize", palette.label_size().to_string()),
            attr("fontcolor", &palette.font_color),
        ]
    }

    fn edge_defaults(&self) -> Vec<Attribute> {
        let palette = &self.palette;
        vec![
            attr("color", &palette.edge_color),
            attr("fontname", &palette.font_name),
            attr("fontsize", palette.label_size().to_string()),
            attr("fontcolor", &palette.font_color),
        ]
    }

    fn member(
        &self,
        member: &Member,
        depth: usize,
        anchors: &HashMap<Id, ClusterAnchor>,
    ) -> Stmt {
        match member {
            Member::Node(node) => Stmt::Node(self.node(node)),
            Member::Cluster(cluster) => Stmt::Subgraph(self.cluster(cluster, depth, anchors)),
        }
    }

    fn node(&self, node: &Node) -> DotNode {
        let mut attributes = vec![attr("label", node.label())];
        if let Some(shape) = node.shape() {
            attributes.push(attr("shape", shape));
        }
        if let Some(color) = node.fill_color() {
            attributes.push(attr("fillcolor", color.to_hex()));
        }
        if let Some(color) = node.font_color() {
            attributes.push(attr("fontcolor", color.to_hex()));
        }
        DotNode {
            id: node_id(&node.id().as_string()),
            attributes,
        }
    }

    fn cluster(
        &self,
        cluster: &Cluster,
        depth: usize,
        anchors: &HashMap<Id, ClusterAnchor>,
    ) -> Subgraph {
        let background = cluster
            .background_color()
            .map(|color| color.to_hex())
            .unwrap_or_else(|| self.palette.cluster_color(depth).to_string());

        let mut stmts = vec![
            Stmt::Attribute(attr("label", cluster.label())),
            Stmt::Attribute(attr("style", "rounded")),
            Stmt::Attribute(attr("labeljust", "l")),
            Stmt::Attribute(attr("pencolor", "#AEB6BE")),
            Stmt::Attribute(attr("fontsize", "12")),
            Stmt::Attribute(attr("bgcolor", background)),
        ];

        // Graphviz drops clusters without nodes.
        if cluster.first_node().is_none() || anchors.contains_key(&cluster.id()) {
            stmts.push(Stmt::Node(DotNode {
                id: node_id(&anchor_name(cluster.id())),
                attributes: vec![
                    attr("shape", "point"),
                    attr("style", "invis"),
                    attr("width", "0"),
                    attr("label", ""),
                ],
            }));
        }

        for member in cluster.members() {
            stmts.push(self.member(member, depth + 1, anchors));
        }

        Subgraph {
            id: quote(&cluster_name(cluster.id())),
            stmts,
        }
    }

    fn edge(&self, edge: &Edge, anchors: &HashMap<Id, ClusterAnchor>) -> DotEdge {
        let source = edge.source();
        let target = edge.target();
        let mut attributes = Vec::new();

        let source_node = match anchors.get(&source) {
            Some(anchor) => {
                // Clipping at a cluster that contains the other end is meaningless.
                if !anchor.descendants.contains(&target) {
                    attributes.push(attr("ltail", cluster_name(source)));
                }
                anchor.node.clone()
            }
            None => source.as_string(),
        };
        let target_node = match anchors.get(&target) {
            Some(anchor) => {
                if !anchor.descendants.contains(&source) {
                    attributes.push(attr("lhead", cluster_name(target)));
                }
                anchor.node.clone()
            }
            None => target.as_string(),
        };

        if let Some(label) = edge.label() {
            attributes.push(attr("label", label));
        }
        if edge.direction() != EdgeDirection::Forward {
            attributes.push(attr("dir", edge.direction().as_dot_dir()));
        }
        if let Some(color) = edge.color() {
            attributes.push(attr("color", color.to_hex()));
        }
        if edge.style() != LineStyle::Solid {
            attributes.push(attr("style", edge.style().as_str()));
        }

        DotEdge {
            ty: EdgeTy::Pair(
                Vertex::N(node_id(&source_node)),
                Vertex::N(node_id(&target_node)),
            ),
            attributes,
        }
    }
}

/// Records an anchor for every cluster in `members`, at any depth.
///
/// Returns the ids declared in `members`, including nested ones.
fn collect_anchors(members: &[Member], anchors: &mut HashMap<Id, ClusterAnchor>) -> HashSet<Id> {
    let mut declared = HashSet::new();
    for member in members {
        declared.insert(member.id());
        if let Member::Cluster(cluster) = member {
            let descendants = collect_anchors(cluster.members(), anchors);
            declared.extend(descendants.iter().copied());
            anchors.insert(
                cluster.id(),
                ClusterAnchor {
                    node: anchor_name(cluster.id()),
                    descendants,
                },
            );
        }
    }
    declared
}

#[cfg(test)]
mod tests {
    use archviz_core::builder::DiagramBuilder;

    use super::*;

    fn lowering() -> DotLowering {
        DotLowering::new(&StyleConfig::default()).unwrap()
    }

    fn attribute_value<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a DotId> {
        attributes
            .iter()
            .find(|Attribute(key, _)| *key == DotId::Plain(name.to_string()))
            .map(|Attribute(_, value)| value)
    }

    fn graph_stmts(graph: &Graph) -> &[Stmt] {
        match graph {
            Graph::DiGraph { stmts, .. } | Graph::Graph { stmts, .. } => stmts,
        }
    }

    fn edges(graph: &Graph) -> Vec<&DotEdge> {
        graph_stmts(graph)
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Edge(edge) => Some(edge),
                _ => None,
            })
            .collect()
    }

    fn endpoints(edge: &DotEdge) -> (DotId, DotId) {
        match &edge.ty {
            EdgeTy::Pair(Vertex::N(NodeId(a, _)), Vertex::N(NodeId(b, _))) => (a.clone(), b.clone()),
            other => panic!("unexpected edge shape {other:?}"),
        }
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(
            quote("users\nid: int \"pk\" C:\\data"),
            DotId::Escaped(r#""users\nid: int \"pk\" C:\\data""#.to_string())
        );
    }

    #[test]
    fn test_flat_diagram() {
        let mut builder = DiagramBuilder::new("Servers");
        builder
            .node("a", "Server A")
            .node("b", "Server B")
            .edge_labeled("a", "b", "calls");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let stmts = graph_stmts(&graph);

        let Stmt::GAttribute(GraphAttributes::Graph(graph_attrs)) = &stmts[0] else {
            panic!("expected graph attributes first");
        };
        assert_eq!(attribute_value(graph_attrs, "label"), Some(&quote("Servers")));
        assert_eq!(attribute_value(graph_attrs, "rankdir"), Some(&quote("TB")));
        assert!(attribute_value(graph_attrs, "compound").is_none());

        let edges = edges(&graph);
        assert_eq!(edges.len(), 1);
        assert_eq!(endpoints(edges[0]), (quote("a"), quote("b")));
        assert_eq!(attribute_value(&edges[0].attributes, "label"), Some(&quote("calls")));
        assert!(attribute_value(&edges[0].attributes, "dir").is_none());
    }

    #[test]
    fn test_nested_clusters_cycle_colors() {
        let mut builder = DiagramBuilder::new("Layers");
        builder.cluster("layer1", "Layer1", |layer1| {
            layer1.node("a", "A").cluster("layer2", "Layer2", |layer2| {
                layer2.node("b", "B");
            });
        });
        builder.edge("a", "b");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let Stmt::Subgraph(outer) = &graph_stmts(&graph)[3] else {
            panic!("expected cluster subgraph");
        };
        assert_eq!(outer.id, quote("cluster_layer1"));
        assert!(outer
            .stmts
            .contains(&Stmt::Attribute(attr("bgcolor", "#e5f5fd"))));

        let inner = outer
            .stmts
            .iter()
            .find_map(|stmt| match stmt {
                Stmt::Subgraph(sub) => Some(sub),
                _ => None,
            })
            .unwrap();
        assert_eq!(inner.id, quote("cluster_layer2"));
        assert!(inner
            .stmts
            .contains(&Stmt::Attribute(attr("bgcolor", "#ebf3e7"))));

        // Node-to-node edges need no clipping.
        let edges = edges(&graph);
        assert!(attribute_value(&edges[0].attributes, "lhead").is_none());
    }

    #[test]
    fn test_edge_to_cluster_uses_anchor() {
        let mut builder = DiagramBuilder::new("Pipeline");
        builder
            .node("source", "Kafka")
            .cluster("workers", "Workers", |workers| {
                workers.node("w1", "Worker 1").node("w2", "Worker 2");
            })
            .edge("source", "workers")
            .edge("workers", "source");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let Stmt::GAttribute(GraphAttributes::Graph(graph_attrs)) = &graph_stmts(&graph)[0] else {
            panic!("expected graph attributes first");
        };
        assert_eq!(attribute_value(graph_attrs, "compound"), Some(&quote("true")));

        let edges = edges(&graph);
        assert_eq!(endpoints(edges[0]), (quote("source"), quote("__anchor_workers")));
        assert_eq!(
            attribute_value(&edges[0].attributes, "lhead"),
            Some(&quote("cluster_workers"))
        );
        assert_eq!(endpoints(edges[1]), (quote("__anchor_workers"), quote("source")));
        assert_eq!(
            attribute_value(&edges[1].attributes, "ltail"),
            Some(&quote("cluster_workers"))
        );
    }

    #[test]
    fn test_empty_cluster_gets_invisible_anchor() {
        let mut builder = DiagramBuilder::new("Empty");
        builder
            .node("a", "A")
            .cluster("later", "Coming soon", |_| {})
            .edge("a", "later");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let edges = edges(&graph);
        assert_eq!(endpoints(edges[0]).1, quote("__anchor_later"));

        let dot = lowering().to_dot(&diagram);
        assert!(dot.contains("__anchor_later"));
        assert!(dot.contains("invis"));
    }

    #[test]
    fn test_edge_into_containing_cluster_is_not_clipped() {
        let mut builder = DiagramBuilder::new("Inner");
        builder
            .cluster("outer", "Outer", |outer| {
                outer.node("inner", "Inner");
            })
            .edge("outer", "inner");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let edges = edges(&graph);
        let (source, target) = endpoints(edges[0]);
        assert_ne!(source, target);
        assert_eq!((source, target), (quote("__anchor_outer"), quote("inner")));
        assert!(attribute_value(&edges[0].attributes, "ltail").is_none());
    }

    #[test]
    fn test_edge_between_nested_clusters_keeps_both_anchors() {
        let mut builder = DiagramBuilder::new("Layers");
        builder
            .cluster("Layer1", "Layer 1", |layer1| {
                layer1.cluster("Layer2", "Layer 2", |layer2| {
                    layer2.node("b", "B");
                });
            })
            .edge("Layer1", "Layer2")
            .edge("Layer1", "b");
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let edges = edges(&graph);
        assert_eq!(
            endpoints(edges[0]),
            (quote("__anchor_Layer1"), quote("__anchor_Layer2"))
        );
        // The outer cluster contains the inner one, so only the head is clipped.
        assert!(attribute_value(&edges[0].attributes, "ltail").is_none());
        assert_eq!(
            attribute_value(&edges[0].attributes, "lhead"),
            Some(&quote("cluster_Layer2"))
        );
        assert_eq!(endpoints(edges[1]), (quote("__anchor_Layer1"), quote("b")));
        assert!(attribute_value(&edges[1].attributes, "lhead").is_none());

        let dot = lowering().to_dot(&diagram);
        assert!(!dot.contains(r#""b" -> "b""#));
    }

    #[test]
    fn test_cluster_without_edges_has_no_anchor() {
        let mut builder = DiagramBuilder::new("Plain");
        builder
            .cluster("c", "C", |c| {
                c.node("a", "A").node("b", "B");
            })
            .edge("a", "b");
        let diagram = builder.build().unwrap();

        let dot = lowering().to_dot(&diagram);
        assert!(!dot.contains("__anchor_c"));
    }

    #[test]
    fn test_edge_styling() {
        let mut builder = DiagramBuilder::new("Styles");
        builder.node("a", "A").node("b", "B").edge_with(
            Edge::new("a", "b")
                .with_direction(EdgeDirection::Bidirectional)
                .with_style(LineStyle::Dashed)
                .with_color(Color::new("firebrick").unwrap()),
        );
        let diagram = builder.build().unwrap();

        let graph = lowering().to_graph(&diagram);
        let edge = edges(&graph)[0];
        assert_eq!(attribute_value(&edge.attributes, "dir"), Some(&quote("both")));
        assert_eq!(attribute_value(&edge.attributes, "style"), Some(&quote("dashed")));
        assert_eq!(attribute_value(&edge.attributes, "color"), Some(&quote("#b22222")));
    }

    #[test]
    fn test_dot_text_is_deterministic() {
        let mut builder = DiagramBuilder::new("Repeat");
        builder
            .node("a", "A")
            .cluster("c", "C", |c| {
                c.node("b", "B\nsecond line");
            })
            .edge("a", "c");
        let diagram = builder.build().unwrap();

        let first = lowering().to_dot(&diagram);
        let second = lowering().to_dot(&diagram);
        assert_eq!(first, second);
        assert!(first.starts_with("digraph"));
        assert!(first.contains(r#"label="B\nsecond line""#));
        assert!(first.contains(r#"lhead="cluster_c""#));
    }

    #[test]
    fn test_invalid_style_rejected() {
        let style: StyleConfig = toml::from_str("cluster_colors = [\"nope\"]").unwrap();
        assert!(DotLowering::new(&style).is_err());
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn unescape(quoted: &str) -> String {
            let inner = &quoted[1..quoted.len() - 1];
            let mut out = String::new();
            let mut chars = inner.chars();
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    match chars.next() {
                        Some('n') => out.push('\n'),
                        Some(other) => out.push(other),
                        None => panic!("dangling escape in {quoted}"),
                    }
                } else {
                    out.push(ch);
                }
            }
            out
        }

        proptest! {
            #[test]
            fn quoted_labels_stay_on_one_line(label in "[a-zA-Z0-9 \"\\\\\n\r:_-]{0,40}") {
                let DotId::Escaped(quoted) = quote(&label) else {
                    panic!("labels are always escaped");
                };
                prop_assert!(!quoted.contains('\n'));
                prop_assert!(!quoted.contains('\r'));
                prop_assert_eq!(unescape(&quoted), label.replace('\r', ""));
            }
        }
    }
}
