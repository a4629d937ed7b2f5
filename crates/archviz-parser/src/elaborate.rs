//! Elaboration of a validated syntax tree into a [`Diagram`].
//!
//! Attributes are interpreted here: each statement kind accepts a fixed set of
//! attribute names, and every value is converted into its model type. All
//! attribute problems in the file are collected before giving up.

use std::{collections::HashMap, str::FromStr};

use log::debug;

use archviz_core::{
    SpecError,
    builder::{ClusterBuilder, DiagramBuilder, validate_basename},
    color::Color,
    model::{CurveStyle, Diagram, Direction, Edge, LineStyle, Node, OutputFormat},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{self as types, Attribute, AttributeValue},
    span::{Span, Spanned},
};

const DIAGRAM_ATTRIBUTES: &[&str] = &["direction", "formats", "filename", "curve_style"];
const NODE_ATTRIBUTES: &[&str] = &["shape", "fill_color", "font_color"];
const CLUSTER_ATTRIBUTES: &[&str] = &["bgcolor"];
const EDGE_ATTRIBUTES: &[&str] = &["color", "style"];

/// Converts `diagram` into a validated [`Diagram`].
pub fn elaborate(diagram: types::Diagram<'_>) -> Result<Diagram, ParseError> {
    let mut elaborator = Elaborator::default();
    let title_span = diagram.title.span();

    let mut builder = DiagramBuilder::new(diagram.title.into_inner());
    let header = elaborator.statement_attributes(&diagram.attributes, DIAGRAM_ATTRIBUTES);
    for (name, value) in header {
        builder = match name {
            "direction" => match elaborator.parse_string::<Direction>(value) {
                Some(direction) => builder.with_direction(direction),
                None => builder,
            },
            "curve_style" => match elaborator.parse_string::<CurveStyle>(value) {
                Some(curve_style) => builder.with_curve_style(curve_style),
                None => builder,
            },
            "formats" => match elaborator.formats(value) {
                Some(formats) => builder.with_formats(formats),
                None => builder,
            },
            "filename" => match elaborator.filename(value) {
                Some(filename) => builder.with_basename(filename),
                None => builder,
            },
            _ => builder,
        };
    }

    let mut edges = Vec::new();
    elaborator.elements(diagram.elements, builder.root(), &mut edges);
    for edge in edges {
        builder.edge_with(edge);
    }

    elaborator.collector.finish()?;

    let diagram = builder
        .build()
        .map_err(|err| spec_error_diagnostic(err, title_span))?;

    debug!(
        title = diagram.title(),
        nodes = diagram.node_count(),
        edges = diagram.edges().len();
        "Diagram elaborated"
    );
    Ok(diagram)
}

#[derive(Default)]
struct Elaborator {
    collector: DiagnosticCollector,
}

impl Elaborator {
    fn elements(
        &mut self,
        elements: Vec<types::Element<'_>>,
        scope: &mut ClusterBuilder,
        edges: &mut Vec<Edge>,
    ) {
        for element in elements {
            match element {
                types::Element::Node {
                    name,
                    label,
                    attributes,
                } => {
                    let label = label.map_or_else(|| name.to_string(), Spanned::into_inner);
                    let mut node = Node::new(*name.inner(), label);
                    for (attr, value) in self.statement_attributes(&attributes, NODE_ATTRIBUTES) {
                        node = match attr {
                            "shape" => match self.string(value) {
                                Some(shape) => node.with_shape(shape),
                                None => node,
                            },
                            "fill_color" => match self.color(value) {
                                Some(color) => node.with_fill_color(color),
                                None => node,
                            },
                            "font_color" => match self.color(value) {
                                Some(color) => node.with_font_color(color),
                                None => node,
                            },
                            _ => node,
                        };
                    }
                    scope.node_with(node);
                }
                types::Element::Cluster {
                    name,
                    label,
                    attributes,
                    elements,
                } => {
                    let label = label.map_or_else(|| name.to_string(), Spanned::into_inner);
                    let mut content = ClusterBuilder::default();
                    for (attr, value) in self.statement_attributes(&attributes, CLUSTER_ATTRIBUTES)
                    {
                        if attr == "bgcolor" {
                            if let Some(color) = self.color(value) {
                                content.background(color);
                            }
                        }
                    }
                    self.elements(elements, &mut content, edges);
                    scope.cluster(*name.inner(), label, |target| *target = content);
                }
                types::Element::Edge {
                    source,
                    direction,
                    attributes,
                    target,
                    label,
                } => {
                    let mut edge =
                        Edge::new(*source.inner(), *target.inner()).with_direction(*direction.inner());
                    if let Some(label) = label {
                        edge = edge.with_label(label.into_inner());
                    }
                    for (attr, value) in self.statement_attributes(&attributes, EDGE_ATTRIBUTES) {
                        edge = match attr {
                            "color" => match self.color(value) {
                                Some(color) => edge.with_color(color),
                                None => edge,
                            },
                            "style" => match self.parse_string::<LineStyle>(value) {
                                Some(style) => edge.with_style(style),
                                None => edge,
                            },
                            _ => edge,
                        };
                    }
                    edges.push(edge);
                }
            }
        }
    }

    /// Returns the known, non-repeated attributes of one statement.
    ///
    /// Unknown names (E300) and repeats (E303) are reported and skipped.
    fn statement_attributes<'a, 'src>(
        &mut self,
        attributes: &'a [Attribute<'src>],
        allowed: &[&str],
    ) -> Vec<(&'src str, &'a AttributeValue<'src>)> {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        let mut accepted = Vec::with_capacity(attributes.len());

        for attribute in attributes {
            let name = *attribute.name.inner();
            let span = attribute.name.span();

            if !allowed.contains(&name) {
                self.collector.emit(
                    Diagnostic::error(format!("unknown attribute `{name}`"))
                        .with_code(ErrorCode::E300)
                        .with_label(span, "unknown attribute")
                        .with_help(format!("valid attributes are: {}", allowed.join(", "))),
                );
                continue;
            }

            if let Some(first) = seen.get(name) {
                self.collector.emit(
                    Diagnostic::error(format!("duplicate attribute `{name}`"))
                        .with_code(ErrorCode::E303)
                        .with_label(span, "repeated here")
                        .with_secondary_label(*first, "first given here"),
                );
                continue;
            }
            seen.insert(name, span);
            accepted.push((name, &attribute.value));
        }

        accepted
    }

    fn invalid_value(&mut self, span: Span, message: String, help: Option<String>) {
        let diagnostic = Diagnostic::error(message)
            .with_code(ErrorCode::E301)
            .with_label(span, ErrorCode::E301.description());
        self.collector.emit(match help {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        });
    }

    fn string(&mut self, value: &AttributeValue<'_>) -> Option<String> {
        match value {
            AttributeValue::String(s) => Some(s.inner().clone()),
            other => {
                self.invalid_value(
                    other.span(),
                    format!("expected a string, found a {}", other.kind()),
                    Some("wrap the value in double quotes".to_string()),
                );
                None
            }
        }
    }

    fn parse_string<T>(&mut self, value: &AttributeValue<'_>) -> Option<T>
    where
        T: FromStr<Err = String>,
    {
        let text = self.string(value)?;
        match text.parse() {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                self.invalid_value(value.span(), reason, None);
                None
            }
        }
    }

    fn color(&mut self, value: &AttributeValue<'_>) -> Option<Color> {
        let text = self.string(value)?;
        match Color::new(&text) {
            Ok(color) => Some(color),
            Err(reason) => {
                self.invalid_value(
                    value.span(),
                    reason,
                    Some("use a CSS color name or a hex value such as `#E5F5FD`".to_string()),
                );
                None
            }
        }
    }

    /// A format list `[png, pdf]`, or a single format as a string.
    fn formats(&mut self, value: &AttributeValue<'_>) -> Option<Vec<String>> {
        let names: Vec<Spanned<String>> = match value {
            AttributeValue::Identifiers(ids) => ids.iter().map(|id| id.map(|s| s.to_string())).collect(),
            AttributeValue::String(s) => vec![s.clone()],
            AttributeValue::Float(f) => {
                self.invalid_value(
                    f.span(),
                    "expected a list of formats, found a number".to_string(),
                    Some("write formats as `formats=[png, svg]`".to_string()),
                );
                return None;
            }
        };

        if names.is_empty() {
            self.invalid_value(
                value.span(),
                "at least one output format is required".to_string(),
                Some("remove the attribute to render PNG only".to_string()),
            );
            return None;
        }

        let mut valid = true;
        for name in &names {
            if OutputFormat::from_str(name.inner()).is_err() {
                valid = false;
                self.collector.emit(
                    Diagnostic::error(format!("unsupported output format `{name}`"))
                        .with_code(ErrorCode::E302)
                        .with_label(name.span(), ErrorCode::E302.description())
                        .with_help("supported formats are: png, pdf, svg, jpg, dot"),
                );
            }
        }

        valid.then(|| names.into_iter().map(Spanned::into_inner).collect())
    }

    fn filename(&mut self, value: &AttributeValue<'_>) -> Option<String> {
        let filename = self.string(value)?;
        if validate_basename(&filename).is_err() {
            self.collector.emit(
                Diagnostic::error(format!("invalid output filename `{filename}`"))
                    .with_code(ErrorCode::E304)
                    .with_label(value.span(), ErrorCode::E304.description())
                    .with_help("give a bare file stem without directories, e.g. `filename=\"overview\"`"),
            );
            return None;
        }
        Some(filename)
    }
}

/// Builder errors left after validation are attributed to the header.
fn spec_error_diagnostic(err: SpecError, span: Span) -> Diagnostic {
    let code = match &err {
        SpecError::InvalidReference { .. } | SpecError::UndeclaredMember { .. } => ErrorCode::E200,
        SpecError::DuplicateIdentifier(_) => ErrorCode::E201,
        SpecError::UnsupportedFormat(_) => ErrorCode::E302,
        SpecError::InvalidBasename(_) => ErrorCode::E304,
        SpecError::EmptyFormats | SpecError::InvalidAttribute { .. } => ErrorCode::E301,
    };
    Diagnostic::error(err.to_string())
        .with_code(code)
        .with_label(span, code.description())
}

#[cfg(test)]
mod tests {
    use archviz_core::{
        identifier::Id,
        model::{EdgeDirection, Member},
    };

    use super::*;
    use crate::{lexer::tokenize, parser::build_diagram};

    fn elaborate_source(source: &'static str) -> Result<Diagram, ParseError> {
        let tokens = Box::leak(tokenize(source).unwrap().into_boxed_slice());
        elaborate(build_diagram(tokens).unwrap())
    }

    fn codes(err: &ParseError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(|d| d.code()).collect()
    }

    #[test]
    fn test_header_attributes() {
        let diagram = elaborate_source(
            r#"diagram "Event Processing" [direction="TB", formats=[png, svg, png], curve_style="curved"];"#,
        )
        .unwrap();
        assert_eq!(diagram.title(), "Event Processing");
        assert_eq!(diagram.basename(), "event_processing");
        assert_eq!(diagram.direction(), Direction::TB);
        assert_eq!(diagram.curve_style(), CurveStyle::Curved);
        assert_eq!(diagram.formats(), &[OutputFormat::Png, OutputFormat::Svg]);
    }

    #[test]
    fn test_filename_and_single_format_string() {
        let diagram =
            elaborate_source(r#"diagram "T" [filename="overview", formats="pdf"];"#).unwrap();
        assert_eq!(diagram.basename(), "overview");
        assert_eq!(diagram.formats(), &[OutputFormat::Pdf]);
    }

    #[test]
    fn test_members_and_edges() {
        let diagram = elaborate_source(
            r##"diagram "T";
            web as "Web Server" [shape="box", fill_color="#dfe6e9"];
            cluster backend as "Backend" [bgcolor="#E5F5FD"] {
                api;
                cluster storage as "Storage" { db as "Postgres"; };
            };
            web -> api: "HTTPS";
            api <-> [color="firebrick", style="dashed"] storage;"##,
        )
        .unwrap();

        assert_eq!(diagram.node_count(), 3);
        let Member::Node(web) = &diagram.members()[0] else {
            panic!("expected node");
        };
        assert_eq!(web.label(), "Web Server");
        assert_eq!(web.shape(), Some("box"));

        let backend = diagram.find_cluster(Id::new("backend")).unwrap();
        assert_eq!(backend.label(), "Backend");
        assert_eq!(backend.background_color().unwrap().to_hex(), "#e5f5fd");
        // Unlabeled node falls back to its identifier.
        assert_eq!(backend.first_node().unwrap().label(), "api");

        let edges = diagram.edges();
        assert_eq!(edges[0].label(), Some("HTTPS"));
        assert_eq!(edges[1].direction(), EdgeDirection::Bidirectional);
        assert_eq!(edges[1].style(), LineStyle::Dashed);
        assert!(edges[1].color().is_some());
    }

    #[test]
    fn test_unknown_attributes_all_reported() {
        let err = elaborate_source(
            r#"diagram "T" [colour="red"];
            web [size=3];"#,
        )
        .unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E300, ErrorCode::E300]);
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = elaborate_source(r#"diagram "T" [direction="LR", direction="TB"];"#).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E303]);
        assert_eq!(err.diagnostics()[0].labels().len(), 2);
    }

    #[test]
    fn test_unsupported_format_points_at_format() {
        let source = r#"diagram "T" [formats=[png, bmp]];"#;
        let err = elaborate_source(source).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E302]);
        let span = err.diagnostics()[0].primary_span().unwrap();
        assert_eq!(&source[span.start()..span.end()], "bmp");
    }

    #[test]
    fn test_empty_formats() {
        let err = elaborate_source(r#"diagram "T" [formats=[]];"#).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E301]);
    }

    #[test]
    fn test_invalid_values() {
        let err = elaborate_source(
            r#"diagram "T" [direction="diagonal"];
            web [fill_color="not-a-color"];
            db [shape=2];"#,
        )
        .unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E301, ErrorCode::E301, ErrorCode::E301]);
    }

    #[test]
    fn test_filename_with_directory() {
        let err = elaborate_source(r#"diagram "T" [filename="../out"];"#).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E304]);
    }

    #[test]
    fn test_empty_title_needs_filename() {
        let err = elaborate_source(r#"diagram "";"#).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E304]);

        let diagram = elaborate_source(r#"diagram "" [filename="untitled"];"#).unwrap();
        assert_eq!(diagram.basename(), "untitled");
    }

    #[test]
    fn test_title_separators_become_dashes() {
        let diagram = elaborate_source(r#"diagram "a/b";"#).unwrap();
        assert_eq!(diagram.basename(), "a-b");
    }
}
