//! Tokens of the diagram description language.

use std::fmt;

use crate::span::Span;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Diagram,
    Cluster,
    As,

    // Literals
    StringLiteral(String),
    FloatLiteral(f32),
    Identifier(&'src str),

    // Operators
    Arrow,       // ->
    LeftArrow,   // <-
    DoubleArrow, // <->
    Plain,       // --
    Equals,      // =
    Colon,       // :

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Semicolon,    // ;
    Comma,        // ,

    LineComment(&'src str), // // comment

    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Returns `true` for tokens the parser skips between meaningful tokens.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Diagram => write!(f, "diagram"),
            Token::Cluster => write!(f, "cluster"),
            Token::As => write!(f, "as"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::FloatLiteral(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Arrow => write!(f, "->"),
            Token::LeftArrow => write!(f, "<-"),
            Token::DoubleArrow => write!(f, "<->"),
            Token::Plain => write!(f, "--"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LineComment(text) => write!(f, "//{text}"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => writeln!(f),
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}
