//! Diagnostics reported while reading diagram source.
//!
//! Each problem is a [`Diagnostic`]: a severity, an optional [`ErrorCode`],
//! a message, labeled source spans and optional help text. A failed parse
//! returns a [`ParseError`] holding every diagnostic of the failing phase.
//!
//! ```
//! # use archviz_parser::error::{Diagnostic, ErrorCode};
//! # use archviz_parser::Span;
//! let diag = Diagnostic::error("identifier `db` is declared more than once")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(40..42), "duplicate declaration")
//!     .with_secondary_label(Span::new(10..12), "first declared here")
//!     .with_help("rename one of the declarations");
//! assert_eq!(diag.to_string(), "error[E201]: identifier `db` is declared more than once");
//! ```

mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use parse_error::DiagnosticCollector;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
