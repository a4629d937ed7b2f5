//! CLI logic for the Archviz diagram tool.
//!
//! Reads a diagram from `.arch` text or a `.toml` declaration, then checks
//! it or renders every requested format.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use archviz::{
    ArchvizError, DiagramRenderer,
    decl::DiagramDecl,
    model::{Diagram, OutputFormat},
};

/// Run the Archviz CLI application
///
/// Returns the written file paths, or nothing in `--check` mode.
///
/// # Errors
///
/// Returns `ArchvizError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing and specification errors
/// - Rendering backend errors
pub fn run(args: &Args) -> Result<Vec<PathBuf>, ArchvizError> {
    info!(
        input_path = args.input,
        output_dir = args.output_dir;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let renderer = DiagramRenderer::new(app_config);

    let source = fs::read_to_string(&args.input)?;
    let mut diagram = if is_declaration(Path::new(&args.input)) {
        read_declaration(&source)?
    } else {
        renderer.parse(&source)?
    };

    if !args.formats.is_empty() {
        let formats = args
            .formats
            .iter()
            .map(|format| format.parse::<OutputFormat>())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(formats:?; "Overriding output formats");
        diagram = diagram.with_formats(formats)?;
    }

    if args.check {
        info!(
            title = diagram.title(),
            nodes = diagram.node_count(),
            edges = diagram.edges().len();
            "Diagram is valid"
        );
        return Ok(Vec::new());
    }

    let paths = renderer.render(&diagram, Path::new(&args.output_dir))?;
    for path in &paths {
        info!(output_file = path.display().to_string(); "Diagram exported successfully");
    }

    Ok(paths)
}

fn is_declaration(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

fn read_declaration(source: &str) -> Result<Diagram, ArchvizError> {
    let decl: DiagramDecl =
        toml::from_str(source).map_err(|err| ArchvizError::Declaration(err.to_string()))?;
    Ok(decl.into_diagram()?)
}
