//! # Archviz Parser
//!
//! Parser for the `.arch` diagram description language. This crate provides
//! the pipeline from source text to a validated [`Diagram`].
//!
//! ## Usage
//!
//! ```
//! # use archviz_parser::{parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         diagram "Web Service" [direction="LR"];
//!         lb as "Load Balancer";
//!         cluster workers as "Workers" { w1; w2; };
//!         lb -> workers: "dispatch";
//!     "#;
//!
//!     let diagram = parse(source)?;
//!     assert_eq!(diagram.node_count(), 3);
//!     Ok(())
//! }
//! ```

pub mod error;
mod elaborate;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod parser_types;
mod span;
mod tokens;
mod validate;

pub use error::ParseError;
pub use span::Span;

use archviz_core::model::Diagram;
use log::trace;

/// Parse source text into a [`Diagram`].
///
/// The pipeline runs four phases, stopping at the first one that fails:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the syntax tree from tokens
/// 3. **Validate** - Resolve identifiers (E200, E201)
/// 4. **Elaborate** - Interpret attributes and build the diagram (E3xx)
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every diagnostic of the failing phase.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let tokens = lexer::tokenize(source)?;
    trace!(tokens = tokens.len(); "Source tokenized");

    let ast = parser::build_diagram(&tokens)?;
    trace!(elements = ast.elements.len(); "Syntax tree built");

    validate::validate(&ast)?;

    elaborate::elaborate(ast)
}
