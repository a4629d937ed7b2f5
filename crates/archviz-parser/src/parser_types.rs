//! Syntax tree produced by the [`parser`](super::parser).
//!
//! Every name and literal keeps its source [`Span`] so that later phases can
//! point diagnostics at the offending text.

use archviz_core::{identifier::Id, model::EdgeDirection};

use crate::span::{Span, Spanned};

/// A whole source file: the `diagram` header and the statements after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram<'src> {
    pub title: Spanned<String>,
    pub attributes: Vec<Attribute<'src>>,
    pub elements: Vec<Element<'src>>,
}

/// A statement in the diagram body or inside a cluster block.
#[derive(Debug, Clone, PartialEq)]
pub enum Element<'src> {
    /// `id [as "Label"] [attrs];`
    Node {
        name: Spanned<Id>,
        label: Option<Spanned<String>>,
        attributes: Vec<Attribute<'src>>,
    },
    /// `cluster id [as "Label"] [attrs] { ... };`
    Cluster {
        name: Spanned<Id>,
        label: Option<Spanned<String>>,
        attributes: Vec<Attribute<'src>>,
        elements: Vec<Element<'src>>,
    },
    /// `source -> [attrs] target [: "label"];`
    Edge {
        source: Spanned<Id>,
        direction: Spanned<EdgeDirection>,
        attributes: Vec<Attribute<'src>>,
        target: Spanned<Id>,
        label: Option<Spanned<String>>,
    },
}

impl Element<'_> {
    /// Span of the element's leading name.
    pub fn span(&self) -> Span {
        match self {
            Element::Node { name, .. } | Element::Cluster { name, .. } => name.span(),
            Element::Edge { source, target, .. } => source.span().union(target.span()),
        }
    }
}

/// A `name=value` pair inside square brackets.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'src> {
    pub name: Spanned<&'src str>,
    pub value: AttributeValue<'src>,
}

/// The right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue<'src> {
    String(Spanned<String>),
    Float(Spanned<f32>),
    /// A bracketed list of bare words, e.g. `[png, pdf]`.
    Identifiers(Vec<Spanned<&'src str>>),
}

impl AttributeValue<'_> {
    pub fn span(&self) -> Span {
        match self {
            AttributeValue::String(s) => s.span(),
            AttributeValue::Float(f) => f.span(),
            AttributeValue::Identifiers(ids) => ids
                .iter()
                .map(|id| id.span())
                .reduce(|acc, span| acc.union(span))
                .unwrap_or_default(),
        }
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Float(_) => "number",
            AttributeValue::Identifiers(_) => "list",
        }
    }
}
