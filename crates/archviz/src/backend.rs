//! Render backends turning DOT source into output bytes.
//!
//! [`RenderBackend`] is the seam between the diagram model and the external
//! layout engine. [`GraphvizBackend`] runs the Graphviz executables through
//! `graphviz-rust`; tests substitute their own implementation.

use std::{io, rc::Rc, sync::Arc};

use graphviz_rust::cmd::{CommandArg, Format, Layout};
use log::{debug, info};
use thiserror::Error;

use archviz_core::model::OutputFormat;

use crate::config::LayoutEngine;

/// A failure inside the rendering backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The layout executable could not be started.
    #[error("Graphviz executable `{program}` was not found; install Graphviz and make sure it is on PATH")]
    NotInstalled { program: String },

    /// The layout executable ran but failed.
    #[error("Graphviz failed to render {format}: {source}")]
    Failed {
        format: OutputFormat,
        #[source]
        source: io::Error,
    },

    /// The layout executable produced no bytes.
    #[error("Graphviz produced no output for {format}")]
    EmptyOutput { format: OutputFormat },
}

/// Turns DOT source into the bytes of one output format.
pub trait RenderBackend {
    /// Renders `dot_source` as `format`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the engine is unavailable or fails.
    fn render(&self, dot_source: &str, format: OutputFormat) -> Result<Vec<u8>, BackendError>;
}

impl<T: RenderBackend + ?Sized> RenderBackend for Box<T> {
    fn render(&self, dot_source: &str, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        (**self).render(dot_source, format)
    }
}

impl<T: RenderBackend + ?Sized> RenderBackend for Rc<T> {
    fn render(&self, dot_source: &str, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        (**self).render(dot_source, format)
    }
}

impl<T: RenderBackend + ?Sized> RenderBackend for Arc<T> {
    fn render(&self, dot_source: &str, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        (**self).render(dot_source, format)
    }
}

/// Renders through the Graphviz command line tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphvizBackend {
    layout: LayoutEngine,
}

impl GraphvizBackend {
    pub fn new(layout: LayoutEngine) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> LayoutEngine {
        self.layout
    }
}

fn graphviz_layout(engine: LayoutEngine) -> Layout {
    match engine {
        LayoutEngine::Dot => Layout::Dot,
        LayoutEngine::Neato => Layout::Neato,
        LayoutEngine::Fdp => Layout::Fdp,
        LayoutEngine::Sfdp => Layout::Sfdp,
        LayoutEngine::Circo => Layout::Circo,
        LayoutEngine::Twopi => Layout::Twopi,
    }
}

fn graphviz_format(format: OutputFormat) -> Option<Format> {
    match format {
        OutputFormat::Png => Some(Format::Png),
        OutputFormat::Pdf => Some(Format::Pdf),
        OutputFormat::Svg => Some(Format::Svg),
        OutputFormat::Jpg => Some(Format::Jpg),
        OutputFormat::Dot => None,
    }
}

impl RenderBackend for GraphvizBackend {
    fn render(&self, dot_source: &str, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        // DOT output is the input itself; no external program is involved.
        let Some(graphviz_format) = graphviz_format(format) else {
            return Ok(dot_source.as_bytes().to_vec());
        };

        info!(format:% = format, layout:? = self.layout; "Running Graphviz");
        let args = vec![
            CommandArg::Layout(graphviz_layout(self.layout)),
            CommandArg::Format(graphviz_format),
        ];

        let bytes = graphviz_rust::exec_dot(dot_source.to_string(), args).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                BackendError::NotInstalled {
                    program: "dot".to_string(),
                }
            } else {
                BackendError::Failed {
                    format,
                    source: err,
                }
            }
        })?;

        if bytes.is_empty() {
            return Err(BackendError::EmptyOutput { format });
        }
        debug!(format:% = format, bytes = bytes.len(); "Graphviz output received");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_format_is_passthrough() {
        let backend = GraphvizBackend::default();
        let bytes = backend.render("digraph {}", OutputFormat::Dot).unwrap();
        assert_eq!(bytes, b"digraph {}");
    }

    #[test]
    fn test_every_raster_and_vector_format_maps_to_graphviz() {
        for format in OutputFormat::ALL {
            assert_eq!(graphviz_format(format).is_none(), format == OutputFormat::Dot);
        }
    }

    #[test]
    fn test_backend_error_messages() {
        let err = BackendError::NotInstalled {
            program: "dot".to_string(),
        };
        assert!(err.to_string().contains("install Graphviz"));

        let err = BackendError::EmptyOutput {
            format: OutputFormat::Pdf,
        };
        assert_eq!(err.to_string(), "Graphviz produced no output for pdf");
    }

    #[test]
    #[ignore = "requires the Graphviz `dot` executable"]
    fn test_graphviz_renders_png() {
        let backend = GraphvizBackend::default();
        let bytes = backend
            .render("digraph { a -> b }", OutputFormat::Png)
            .unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
