//! Command-line argument definitions for the Archviz CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input file, the output directory and
//! formats, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Archviz diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram (`.arch` text or `.toml` declaration)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Directory the rendered files are written to
    #[arg(short, long = "output-dir", default_value = ".")]
    pub output_dir: String,

    /// Output format (png, pdf, svg, jpg, dot); repeat for several.
    /// Overrides the formats requested by the input.
    #[arg(short, long = "format")]
    pub formats: Vec<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only check the input, without rendering
    #[arg(long)]
    pub check: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
