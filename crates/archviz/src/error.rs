//! Error types for diagram operations.
//!
//! This module provides the main error type [`ArchvizError`] which wraps
//! the error conditions that can occur while parsing, checking and
//! rendering a diagram.

use std::{io, path::PathBuf};

use thiserror::Error;

use archviz_core::SpecError;
use archviz_parser::error::ParseError;

use crate::backend::BackendError;

/// The main error type for diagram operations.
///
/// Specification problems ([`ArchvizError::Parse`], [`ArchvizError::Spec`]
/// and [`ArchvizError::Declaration`]) are always reported before the render
/// backend is invoked. Backend failures surface unchanged as
/// [`ArchvizError::RenderBackend`].
#[derive(Debug, Error)]
pub enum ArchvizError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writing one output file failed.
    #[error("failed to write `{}`: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Diagram source text did not parse. Carries the source for snippets.
    #[error("{err}")]
    Parse { err: ParseError, src: String },

    /// The diagram description is inconsistent.
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("render backend error: {0}")]
    RenderBackend(#[from] BackendError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A TOML diagram declaration could not be read.
    #[error("invalid diagram declaration: {0}")]
    Declaration(String),
}

impl ArchvizError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Returns `true` for errors detected before any rendering was attempted.
    pub fn is_specification_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Spec(_) | Self::Declaration(_)
        )
    }
}
