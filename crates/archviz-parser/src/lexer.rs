//! Lexical analysis of diagram source.
//!
//! [`tokenize`] turns source text into [`PositionedToken`]s. It keeps going
//! after an error so that every lexical problem in the file is reported in a
//! single pass.

use winnow::{
    Parser as _,
    ascii::float,
    combinator::{alt, cut_err, delimited, not, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to a lexer failure through `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// Byte offset where the failing construct began.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = Result<O, ErrMode<ContextError<LexerDiagnostic>>>;

/// `\u{XXXX}`, starting at the `u`.
fn unicode_escape(input: &mut Input<'_>, escape_start: usize) -> IResult<char> {
    preceded(
        'u',
        cut_err(
            delimited('{', take_while(1..=6, |c: char| c.is_ascii_hexdigit()), '}')
                .context(LexerDiagnostic {
                    code: ErrorCode::E004,
                    message: "invalid unicode escape",
                    help: Some("use `\\u{XXXX}` with 1-6 hex digits"),
                    start: escape_start,
                })
                .verify_map(|hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32))
                .context(LexerDiagnostic {
                    code: ErrorCode::E005,
                    message: "invalid unicode codepoint",
                    help: Some("valid range: `0x0000`-`0xD7FF` or `0xE000`-`0x10FFFF`"),
                    start: escape_start,
                }),
        ),
    )
    .parse_next(input)
}

/// A backslash escape inside a string literal.
fn escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    match unicode_escape(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {}
        Err(err) => return Err(err),
    }

    let simple: IResult<char> = one_of(['n', 'r', 't', '\\', '/', '\'', '"', '0'])
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        })
        .parse_next(input);
    if let Ok(ch) = simple {
        return Ok(ch);
    }

    let mut err = ContextError::new();
    err.push(LexerDiagnostic {
        code: ErrorCode::E003,
        message: "invalid escape sequence",
        help: Some(
            "valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\/`, `\\'`, `\\\"`, `\\0`, `\\u{}`",
        ),
        start: escape_start,
    });
    Err(ErrMode::Cut(err))
}

/// A double-quoted string on a single line.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    let content = repeat(0.., alt((escape, none_of(['"', '\\', '\n', '\r'])))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    cut_err(terminated(content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add a closing `\"` before the end of the line"),
            start,
        })
        .map(Token::StringLiteral)
        .parse_next(input)
}

/// A number such as `2`, `0.75` or `.5`.
fn float_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded(
        peek(one_of(|c: char| c.is_ascii_digit() || c == '.')),
        terminated(
            float,
            peek(not(one_of(|c: char| c.is_alphanumeric() || c == '_'))),
        ),
    )
    .map(Token::FloatLiteral)
    .parse_next(input)
}

fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// `diagram`, `cluster` or `as`, not followed by an identifier character.
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("diagram").value(Token::Diagram),
            literal("cluster").value(Token::Cluster),
            literal("as").value(Token::As),
        )),
        peek(not(one_of(|c: char| c.is_ascii_alphanumeric() || c == '_'))),
    )
    .parse_next(input)
}

/// A letter or underscore followed by letters, digits or underscores.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
        .verify(|s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
        .map(Token::Identifier)
        .parse_next(input)
}

/// Operators longer than one character, longest first.
fn operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("<->").value(Token::DoubleArrow),
        literal("->").value(Token::Arrow),
        literal("<-").value(Token::LeftArrow),
        literal("--").value(Token::Plain),
    ))
    .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '='.value(Token::Equals),
        ':'.value(Token::Colon),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt(("\r\n", "\n")).value(Token::Newline).parse_next(input)
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n' && c != '\r')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        operator,
        keyword,
        float_literal,
        identifier,
        punctuation,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start..end)))
}

/// Converts a failed token into a diagnostic.
///
/// Falls back to E002 when the failure carries no [`LexerDiagnostic`].
fn to_diagnostic(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
    let context = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    match context.context().next() {
        Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) => {
            let end = error_pos.max(*start + 1);
            let diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..end), code.description());
            match help {
                Some(help) => diag.with_help(*help),
                None => diag,
            }
        }
        None => Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(
                Span::new(error_pos..error_pos + 1),
                ErrorCode::E002.description(),
            ),
    }
}

/// Tokenizes `source`, collecting every lexical error.
///
/// After an error the lexer skips one character and resumes, except inside
/// an unterminated string where it resumes at the next line.
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();
    let mut diagnostics = DiagnosticCollector::new();

    while !input.is_empty() {
        let checkpoint = input.checkpoint();
        match positioned_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(err) => {
                let error_pos = input.current_token_start();
                let diagnostic = to_diagnostic(err, error_pos);
                let unterminated = diagnostic.code() == Some(ErrorCode::E001);
                diagnostics.emit(diagnostic);

                input.reset(&checkpoint);
                if unterminated {
                    while let Some(c) = input.next_token() {
                        if c == '\n' {
                            break;
                        }
                    }
                } else {
                    input.next_token();
                }
            }
        }
    }

    diagnostics.finish().map(|()| tokens)
}
