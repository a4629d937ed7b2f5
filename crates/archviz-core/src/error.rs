//! Errors raised while assembling a diagram.
//!
//! Every variant of [`SpecError`] is detected before a renderer is invoked
//! and names the offending identifier or value so the call site can be fixed.

use thiserror::Error;

use crate::identifier::Id;

/// A mistake in the diagram description itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    /// An edge endpoint names no declared node or cluster.
    #[error("edge #{edge_index} references unknown identifier `{identifier}`")]
    InvalidReference { identifier: Id, edge_index: usize },

    /// A cluster lists a node that was never declared.
    #[error("cluster `{cluster}` contains undeclared node `{identifier}`")]
    UndeclaredMember { identifier: Id, cluster: Id },

    /// The same identifier was declared more than once.
    #[error("identifier `{0}` is declared more than once")]
    DuplicateIdentifier(Id),

    /// A format string the renderer does not support.
    #[error("unsupported output format `{0}`")]
    UnsupportedFormat(String),

    /// No output formats were requested.
    #[error("at least one output format is required")]
    EmptyFormats,

    /// The output basename is not a single path component.
    #[error("invalid output basename `{0}`: must be a single file name component")]
    InvalidBasename(String),

    /// An attribute value could not be interpreted.
    #[error("invalid value for `{attribute}`: {reason}")]
    InvalidAttribute { attribute: String, reason: String },
}

impl SpecError {
    /// The identifier this error is about, if any.
    pub fn identifier(&self) -> Option<Id> {
        match self {
            Self::InvalidReference { identifier, .. }
            | Self::UndeclaredMember { identifier, .. }
            | Self::DuplicateIdentifier(identifier) => Some(*identifier),
            _ => None,
        }
    }
}
