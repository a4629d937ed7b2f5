//! Archviz Core Types and Definitions
//!
//! This crate provides the model shared by every Archviz crate:
//!
//! - **Identifiers**: interned node and cluster identifiers ([`identifier::Id`])
//! - **Colors**: CSS color parsing for styling ([`color::Color`])
//! - **Model**: nodes, clusters, edges and the validated [`model::Diagram`]
//! - **Builder**: explicit, closure-nested construction ([`builder::DiagramBuilder`])
//! - **Declarations**: the plain-data, deserializable form ([`decl::DiagramDecl`])

pub mod builder;
pub mod color;
pub mod decl;
pub mod error;
pub mod identifier;
pub mod model;

pub use error::SpecError;
