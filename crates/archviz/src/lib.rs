//! Archviz - Architecture diagrams from nodes, clusters and edges.
//!
//! Parsing, DOT lowering and rendering for Archviz diagrams. A diagram is
//! built with [`builder::DiagramBuilder`], declared as a
//! [`decl::DiagramDecl`] or parsed from `.arch` text, and rendered to files
//! through a [`RenderBackend`] (Graphviz by default).

pub mod backend;
pub mod config;

mod error;
mod export;

pub use archviz_core::{builder, color, decl, identifier, model, SpecError};

pub use backend::{BackendError, GraphvizBackend, RenderBackend};
pub use error::ArchvizError;

use std::path::{Path, PathBuf};

use log::{debug, info, trace};

use archviz_core::{
    decl::DiagramDecl,
    model::{Diagram, OutputFormat},
};

use config::AppConfig;
use export::dot::DotLowering;

/// Parses, lowers and renders Archviz diagrams.
///
/// # Examples
///
/// ```rust,no_run
/// use archviz::{DiagramRenderer, config::AppConfig};
///
/// let source = r#"diagram "Web"; lb; web; lb -> web;"#;
///
/// let renderer = DiagramRenderer::new(AppConfig::default());
///
/// // Parse source to the diagram model
/// let diagram = renderer.parse(source)
///     .expect("Failed to parse");
///
/// // Render every requested format into `out/`
/// let paths = renderer.render(&diagram, "out".as_ref())
///     .expect("Failed to render");
/// println!("{paths:?}");
/// ```
pub struct DiagramRenderer {
    config: AppConfig,
    backend: Box<dyn RenderBackend>,
}

impl Default for DiagramRenderer {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl DiagramRenderer {
    /// Create a renderer using Graphviz with the layout engine from `config`.
    pub fn new(config: AppConfig) -> Self {
        let backend = GraphvizBackend::new(config.backend().layout());
        Self {
            config,
            backend: Box::new(backend),
        }
    }

    /// Replace the render backend.
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse `.arch` source text into a [`Diagram`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchvizError::Parse`] carrying the source, so diagnostics
    /// can be printed with snippets.
    pub fn parse(&self, source: &str) -> Result<Diagram, ArchvizError> {
        info!("Parsing diagram");

        let diagram = archviz_parser::parse(source)
            .map_err(|err| ArchvizError::new_parse_error(err, source))?;

        debug!(
            title = diagram.title(),
            nodes = diagram.node_count(),
            edges = diagram.edges().len();
            "Diagram parsed successfully"
        );
        trace!(diagram:?; "Parsed diagram");

        Ok(diagram)
    }

    /// Generate the Graphviz DOT source for `diagram`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchvizError::Config`] if the style configuration is invalid.
    pub fn to_dot(&self, diagram: &Diagram) -> Result<String, ArchvizError> {
        let lowering = DotLowering::new(self.config.style()).map_err(ArchvizError::Config)?;
        Ok(lowering.to_dot(diagram))
    }

    /// Render every format `diagram` requests and write the files to `out_dir`.
    ///
    /// All formats are rendered in memory before anything is written, so a
    /// backend failure for one format leaves no file behind. Returns the
    /// paths `{out_dir}/{basename}.{extension}` in format order.
    ///
    /// # Errors
    ///
    /// Returns [`ArchvizError::RenderBackend`] unchanged from the backend, or
    /// [`ArchvizError::Write`] if an output file cannot be written.
    pub fn render(&self, diagram: &Diagram, out_dir: &Path) -> Result<Vec<PathBuf>, ArchvizError> {
        info!(
            title = diagram.title(),
            formats:? = diagram.formats();
            "Rendering diagram"
        );
        let dot_source = self.to_dot(diagram)?;

        let mut outputs = Vec::with_capacity(diagram.formats().len());
        for &format in diagram.formats() {
            let bytes = match format {
                OutputFormat::Dot => dot_source.clone().into_bytes(),
                _ => self.backend.render(&dot_source, format)?,
            };
            debug!(format:% = format, bytes = bytes.len(); "Format rendered");
            outputs.push((format, bytes));
        }

        let paths = export::write_outputs(out_dir, diagram.basename(), &outputs)?;
        info!(files = paths.len(); "Diagram rendered successfully");
        Ok(paths)
    }
}

/// Build a diagram from its declaration and render every requested format.
///
/// Specification errors are reported before `backend` is called, and no file
/// is written unless every format renders. Uses the default style.
///
/// # Errors
///
/// Returns [`ArchvizError::Spec`] for an invalid declaration (for example
/// [`SpecError::InvalidReference`] or [`SpecError::UnsupportedFormat`]),
/// [`ArchvizError::RenderBackend`] when the backend fails, and
/// [`ArchvizError::Write`] when writing fails.
///
/// # Examples
///
/// ```rust,no_run
/// use archviz::{build_and_render, GraphvizBackend, decl::{DiagramDecl, EdgeDecl}};
///
/// let mut decl = DiagramDecl {
///     title: "Servers".to_string(),
///     ..DiagramDecl::default()
/// };
/// decl.formats = vec!["png".to_string()];
/// decl.nodes.insert("a".to_string(), "Server A".to_string());
/// decl.nodes.insert("b".to_string(), "Server B".to_string());
/// decl.edges.push(EdgeDecl::new("a", "b", Some("calls")));
///
/// let paths = build_and_render(decl, "out".as_ref(), GraphvizBackend::default())
///     .expect("Failed to render");
/// assert_eq!(paths.len(), 1);
/// ```
pub fn build_and_render(
    decl: DiagramDecl,
    out_dir: &Path,
    backend: impl RenderBackend + 'static,
) -> Result<Vec<PathBuf>, ArchvizError> {
    let diagram = decl.into_diagram()?;
    DiagramRenderer::default()
        .with_backend(backend)
        .render(&diagram, out_dir)
}
