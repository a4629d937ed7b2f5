//! Name resolution over the syntax tree.
//!
//! Nodes and clusters share one namespace for the whole diagram. Every
//! duplicate declaration (E201) and every edge endpoint that names nothing
//! (E200) is reported in a single pass.

use std::collections::HashMap;

use archviz_core::identifier::Id;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{Diagram, Element},
    span::{Span, Spanned},
};

/// Checks identifier declarations and references in `diagram`.
pub fn validate(diagram: &Diagram<'_>) -> Result<(), ParseError> {
    let mut collector = DiagnosticCollector::new();
    let mut declared: HashMap<Id, Span> = HashMap::new();

    declare_all(&diagram.elements, &mut declared, &mut collector);
    check_references(&diagram.elements, &declared, &mut collector);

    collector.finish()
}

fn declare_all(
    elements: &[Element<'_>],
    declared: &mut HashMap<Id, Span>,
    collector: &mut DiagnosticCollector,
) {
    for element in elements {
        match element {
            Element::Node { name, .. } => declare(name, declared, collector),
            Element::Cluster { name, elements, .. } => {
                declare(name, declared, collector);
                declare_all(elements, declared, collector);
            }
            Element::Edge { .. } => {}
        }
    }
}

fn declare(
    name: &Spanned<Id>,
    declared: &mut HashMap<Id, Span>,
    collector: &mut DiagnosticCollector,
) {
    if let Some(first) = declared.get(name.inner()) {
        collector.emit(
            Diagnostic::error(format!("identifier `{name}` is declared more than once"))
                .with_code(ErrorCode::E201)
                .with_label(name.span(), "redeclared here")
                .with_secondary_label(*first, "first declared here")
                .with_help("node and cluster identifiers must be unique in the whole diagram"),
        );
    } else {
        declared.insert(*name.inner(), name.span());
    }
}

fn check_references(
    elements: &[Element<'_>],
    declared: &HashMap<Id, Span>,
    collector: &mut DiagnosticCollector,
) {
    for element in elements {
        match element {
            Element::Edge { source, target, .. } => {
                for endpoint in [source, target] {
                    if !declared.contains_key(endpoint.inner()) {
                        collector.emit(
                            Diagnostic::error(format!("undefined identifier `{endpoint}`"))
                                .with_code(ErrorCode::E200)
                                .with_label(endpoint.span(), "not declared")
                                .with_help(format!(
                                    "declare `{endpoint}` as a node or cluster before using it in an edge"
                                )),
                        );
                    }
                }
            }
            Element::Cluster { elements, .. } => check_references(elements, declared, collector),
            Element::Node { .. } => {}
        }
    }
}
