//! Export of diagrams to files.
//!
//! [`dot`] lowers a diagram into Graphviz DOT. The writer stores the rendered
//! outputs of one diagram, all of them or none.

pub mod dot;
mod writer;

pub(crate) use writer::write_outputs;
