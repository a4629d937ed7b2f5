//! Error codes for diagram source diagnostics.
//!
//! Codes are grouped by the phase that reports them:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Validation errors
//! - `E3xx` - Elaboration errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// A character that starts no token.
    E002,

    /// An unrecognized escape sequence in a string literal.
    ///
    /// Valid escapes are: `\n`, `\r`, `\t`, `\\`, `\/`, `\'`, `\"`, `\0`, `\u{...}`.
    E003,

    /// A unicode escape not of the form `\u{XXXX}` with 1-6 hex digits.
    E004,

    /// A unicode escape naming a surrogate or out-of-range codepoint.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// A token the grammar does not allow at this position.
    E100,

    /// The input ended in the middle of a statement.
    E101,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// An edge endpoint names no declared node or cluster.
    E200,

    /// A node or cluster identifier is declared more than once.
    E201,

    // =========================================================================
    // Elaboration Errors (E3xx)
    // =========================================================================
    /// An attribute name that the statement does not accept.
    E300,

    /// An attribute value of the wrong kind or with an invalid value.
    E301,

    /// An output format the renderer does not support.
    E302,

    /// The same attribute given twice on one statement.
    E303,

    /// An output filename that is not a single path component.
    E304,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
        }
    }

    /// Returns a short description used as the default label text.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "invalid unicode codepoint",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E200 => "undefined identifier",
            ErrorCode::E201 => "duplicate identifier",
            ErrorCode::E300 => "unknown attribute",
            ErrorCode::E301 => "invalid attribute value",
            ErrorCode::E302 => "unsupported output format",
            ErrorCode::E303 => "duplicate attribute",
            ErrorCode::E304 => "invalid output filename",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
