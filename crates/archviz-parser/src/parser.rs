//! Parser for diagram source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the syntax tree defined in [`parser_types`](super::parser_types). The public
//! entry point is [`build_diagram`].

use winnow::{
    Parser,
    combinator::{alt, delimited, opt, preceded, repeat, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use archviz_core::{identifier::Id, model::EdgeDirection};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = ArchTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
type ArchTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Runs `f`, turning any failure into a Cut error that remembers where `f` began.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

fn error_from_offset(start_offset: usize, cut: bool) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::StartOffset(start_offset));
    if cut {
        ErrMode::Cut(e)
    } else {
        ErrMode::Backtrack(e)
    }
}

/// Matches exactly one token equal to `expected`.
fn punct<'src>(
    expected: Token<'static>,
) -> impl Parser<Input<'src>, (), ErrMode<ContextError<Context>>> {
    any.verify(move |token: &PositionedToken<'_>| token.token == expected)
        .void()
}

/// Parse whitespace and comments
fn ws_comment<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.is_trivia())
        .void()
        .parse_next(input)
}

/// Parse zero or more whitespace/comments
fn ws_comments0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parse one or more whitespace/comments
fn ws_comments1<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(1.., ws_comment).parse_next(input)
}

/// Parse semicolon with optional whitespace
fn semicolon<'src>(input: &mut Input<'src>) -> IResult<()> {
    preceded(ws_comments0, punct(Token::Semicolon))
        .context(Context::Label("semicolon"))
        .parse_next(input)
}

fn raw_identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// Parse an identifier, interning it.
fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<Id>> {
    let raw = raw_identifier.parse_next(input)?;
    Ok(raw.map(|name| Id::new(name)))
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

/// Parse a bracketed list of bare words: `[png, pdf]` or `[]`.
fn identifier_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Spanned<&'src str>>> {
    delimited(
        (punct(Token::LeftBracket), ws_comments0),
        separated(
            0..,
            raw_identifier,
            (ws_comments0, punct(Token::Comma), ws_comments0),
        ),
        (ws_comments0, punct(Token::RightBracket)),
    )
    .context(Context::Label("identifier list"))
    .parse_next(input)
}

/// Parse an attribute value: a string, a number, or a list of bare words.
fn attribute_value<'src>(input: &mut Input<'src>) -> IResult<types::AttributeValue<'src>> {
    alt((
        identifier_list.map(types::AttributeValue::Identifiers),
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::StringLiteral(s) => Some(types::AttributeValue::String(Spanned::new(
                s.clone(),
                token.span,
            ))),
            Token::FloatLiteral(f) => {
                Some(types::AttributeValue::Float(Spanned::new(*f, token.span)))
            }
            _ => None,
        }),
    ))
    .context(Context::Label("attribute value"))
    .parse_next(input)
}

/// Parse a single `name=value` attribute
fn attribute<'src>(input: &mut Input<'src>) -> IResult<types::Attribute<'src>> {
    let name = raw_identifier.parse_next(input)?;

    preceded(ws_comments0, punct(Token::Equals))
        .context(Context::Label("`=` after attribute name"))
        .parse_next(input)?;

    ws_comments0.parse_next(input)?;

    let value = attribute_value.parse_next(input)?;

    Ok(types::Attribute { name, value })
}

/// Parse attributes wrapped in brackets: `[a="x", b=1]`
fn wrapped_attributes<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Attribute<'src>>> {
    delimited(
        (punct(Token::LeftBracket), ws_comments0),
        separated(
            0..,
            attribute,
            (ws_comments0, punct(Token::Comma), ws_comments0),
        ),
        (ws_comments0, punct(Token::RightBracket)),
    )
    .context(Context::Label("attributes"))
    .parse_next(input)
}

fn optional_attributes<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Attribute<'src>>> {
    opt(wrapped_attributes)
        .map(|attrs| attrs.unwrap_or_default())
        .parse_next(input)
}

/// Parse an optional `as "Label"` suffix
fn display_label<'src>(input: &mut Input<'src>) -> IResult<Option<Spanned<String>>> {
    opt(preceded(
        (punct(Token::As), ws_comments0),
        string_literal.context(Context::Label("label string after `as`")),
    ))
    .parse_next(input)
}

fn edge_direction<'src>(input: &mut Input<'src>) -> IResult<Spanned<EdgeDirection>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let direction = match &token.token {
            Token::Arrow => EdgeDirection::Forward,
            Token::LeftArrow => EdgeDirection::Backward,
            Token::DoubleArrow => EdgeDirection::Bidirectional,
            Token::Plain => EdgeDirection::Plain,
            _ => return None,
        };
        Some(Spanned::new(direction, token.span))
    })
    .context(Context::Label("arrow"))
    .parse_next(input)
}

/// Parse a node declaration
///
/// Syntax: `identifier [as "Label"] [[attributes]];`
///
/// Examples:
/// - `db;`
/// - `web as "Web Server";`
/// - `queue as "Kafka" [shape="cylinder", fill_color="#dfe6e9"];`
fn node<'src>(input: &mut Input<'src>) -> IResult<types::Element<'src>> {
    let name = identifier.parse_next(input)?;
    ws_comments0.parse_next(input)?;
    let label = display_label.parse_next(input)?;
    ws_comments0.parse_next(input)?;
    let attributes = optional_attributes.parse_next(input)?;
    semicolon.parse_next(input)?;

    Ok(types::Element::Node {
        name,
        label,
        attributes,
    })
}

/// Parse a cluster block
///
/// Syntax: `cluster identifier [as "Label"] [[attributes]] { elements };`
fn cluster<'src>(input: &mut Input<'src>) -> IResult<types::Element<'src>> {
    punct(Token::Cluster).parse_next(input)?;

    // After the keyword, commit to parsing a cluster
    cut_err(input, |input| {
        ws_comments1.parse_next(input)?;
        let name = identifier
            .context(Context::Label("cluster name"))
            .parse_next(input)?;
        ws_comments0.parse_next(input)?;
        let label = display_label.parse_next(input)?;
        ws_comments0.parse_next(input)?;
        let attributes = optional_attributes.parse_next(input)?;
        ws_comments0.parse_next(input)?;

        let elements = delimited(
            (punct(Token::LeftBrace), ws_comments0),
            elements,
            (ws_comments0, punct(Token::RightBrace)),
        )
        .context(Context::Label("cluster body in braces"))
        .parse_next(input)?;

        semicolon
            .context(Context::Label("semicolon after cluster"))
            .parse_next(input)?;

        Ok(types::Element::Cluster {
            name,
            label,
            attributes,
            elements,
        })
    })
}

/// Parse an edge statement
///
/// Syntax: `source -> [[attributes]] target [: "label"];`
///
/// Examples:
/// - `web -> api;`
/// - `api -> db: "SQL";`
/// - `api <-> [color="firebrick", style="dashed"] cache: "read-through";`
fn edge<'src>(input: &mut Input<'src>) -> IResult<types::Element<'src>> {
    let source = identifier.parse_next(input)?;

    ws_comments0.parse_next(input)?;
    let direction = edge_direction.parse_next(input)?;

    // After parsing the arrow, commit to parsing an edge
    cut_err(input, |input| {
        ws_comments0.parse_next(input)?;
        let attributes = optional_attributes.parse_next(input)?;
        ws_comments0.parse_next(input)?;

        let target = identifier
            .context(Context::Label("target identifier after arrow"))
            .parse_next(input)?;

        ws_comments0.parse_next(input)?;

        let label = opt(preceded(
            punct(Token::Colon),
            preceded(ws_comments0, string_literal),
        ))
        .parse_next(input)?;

        semicolon
            .context(Context::Label("semicolon after edge"))
            .parse_next(input)?;

        Ok(types::Element::Edge {
            source,
            direction,
            attributes,
            target,
            label,
        })
    })
}

fn elements<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Element<'src>>> {
    repeat(
        0..,
        preceded(
            ws_comments0,
            alt((cluster, edge, node, invalid_statement_with_semicolon)),
        ),
    )
    .parse_next(input)
}

/// Catch-all parser for invalid syntax.
///
/// Consumes tokens up to a semicolon or a closing brace. Fails with a Cut
/// error pointing at the consumed statement when it found something that is
/// not a valid statement, and backtracks otherwise so that the enclosing
/// block can close.
fn invalid_statement_with_semicolon<'src>(
    input: &mut Input<'src>,
) -> IResult<types::Element<'src>> {
    let mut consumed_meaningful_tokens = false;
    let start_offset = input.eof_offset();

    loop {
        let checkpoint = input.checkpoint();
        match any::<_, ErrMode<ContextError>>.parse_next(input) {
            Ok(token) => {
                if matches!(token.token, Token::RightBrace) {
                    input.reset(&checkpoint);
                    if consumed_meaningful_tokens {
                        return Err(error_from_offset(start_offset, true));
                    }
                    break;
                }

                if matches!(token.token, Token::Semicolon) {
                    return Err(error_from_offset(start_offset, true));
                }

                if !token.is_trivia() {
                    consumed_meaningful_tokens = true;
                }
            }
            Err(_) => {
                input.reset(&checkpoint);
                break;
            }
        }
    }

    if consumed_meaningful_tokens {
        return Err(error_from_offset(start_offset, true));
    }
    Err(error_from_offset(start_offset, false))
}

/// Parse the header: `diagram "Title" [[attributes]];`
fn diagram_header<'src>(
    input: &mut Input<'src>,
) -> IResult<(Spanned<String>, Vec<types::Attribute<'src>>)> {
    punct(Token::Diagram)
        .context(Context::Label("`diagram` header"))
        .parse_next(input)?;

    cut_err(input, |input| {
        ws_comments0.parse_next(input)?;
        let title = string_literal
            .context(Context::Label("diagram title"))
            .parse_next(input)?;
        ws_comments0.parse_next(input)?;
        let attributes = optional_attributes.parse_next(input)?;
        semicolon.parse_next(input)?;
        Ok((title, attributes))
    })
}

/// Parse complete diagram
fn diagram<'src>(input: &mut Input<'src>) -> IResult<types::Diagram<'src>> {
    ws_comments0.parse_next(input)?;
    let (title, attributes) = diagram_header.parse_next(input)?;
    let elements = elements.parse_next(input)?;
    ws_comments0.parse_next(input)?;

    if !input.is_empty() {
        return Err(error_from_offset(input.eof_offset(), true));
    }

    Ok(types::Diagram {
        title,
        attributes,
        elements,
    })
}

/// Spans of the non-trivia tokens in `tokens`, unioned.
fn meaningful_span(tokens: &[PositionedToken<'_>]) -> Option<Span> {
    let mut meaningful = tokens.iter().filter(|t| !t.is_trivia()).map(|t| t.span);
    let first = meaningful.next()?;
    Some(meaningful.fold(first, |acc, span| acc.union(span)))
}

/// The label describing what the innermost committed construct expected.
///
/// Contexts are ordered innermost first and a `cut_err` boundary pushes its
/// `StartOffset` after the labels raised inside it. The last label before
/// that boundary is the one attached at the commit point, which names the
/// expectation more precisely than the generic token label beneath it.
fn expectation(e: &ContextError<Context>) -> Option<&'static str> {
    let mut expected = None;
    for ctx in e.context() {
        match ctx {
            Context::Label(label) => expected = Some(*label),
            Context::StartOffset(_) => {
                if expected.is_some() {
                    break;
                }
            }
        }
    }
    expected
}

/// Converts a winnow error into a [`Diagnostic`].
///
/// Extracts position information from error context (StartOffset) and
/// calculates the error span from the token array. `E101` is reserved for
/// input that ends while a construct still expects something; everything
/// else is `E100` pointing at the offending tokens.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining;
    let last_span = || {
        meaningful_span(tokens)
            .map(|span| Span::new(span.end()..span.end()))
            .unwrap_or_default()
    };

    let e = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => {
            return Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(last_span(), "incomplete")
                .with_help("ensure input is complete");
        }
    };

    let start_offset = e
        .context()
        .find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(tokens.len() - *n),
            _ => None,
        })
        .unwrap_or(end_offset);

    let expected = expectation(&e);
    let next_span = tokens[end_offset..]
        .iter()
        .find(|t| !t.is_trivia())
        .map(|t| t.span);

    match (expected, next_span) {
        (Some(expected), None) => Diagnostic::error(format!(
            "unexpected end of input, expected {expected}"
        ))
        .with_code(ErrorCode::E101)
        .with_label(last_span(), "input ends here")
        .with_help("the statement is incomplete; check for a missing `;` or `}`"),
        (Some(expected), Some(next_span)) => Diagnostic::error(format!("expected {expected}"))
            .with_code(ErrorCode::E100)
            .with_label(next_span, "unexpected token")
            .with_help("check the statement syntax and that it ends with `;`"),
        (None, next_span) => {
            // Without an expectation the failing construct is a whole
            // statement the grammar does not know; point at all of it.
            let consumed = (start_offset < end_offset)
                .then(|| meaningful_span(&tokens[start_offset..end_offset]))
                .flatten();
            let error_span = consumed.or(next_span).unwrap_or_else(last_span);
            Diagnostic::error("invalid statement")
                .with_code(ErrorCode::E100)
                .with_label(error_span, "unexpected tokens")
                .with_help("statements are nodes, clusters or edges, each ending with `;`")
        }
    }
}

/// Build a syntax tree from tokens
pub fn build_diagram<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<types::Diagram<'src>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    match diagram.parse_next(&mut token_slice) {
        Ok(diagram) => Ok(diagram),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &'static str) -> Result<types::Diagram<'static>, Diagnostic> {
        let tokens = tokenize(source).expect("Failed to tokenize input");
        build_diagram(Box::leak(tokens.into_boxed_slice()))
    }

    fn parse_ok(source: &'static str) -> types::Diagram<'static> {
        parse(source).expect("parse failed")
    }

    #[test]
    fn test_header_only() {
        let diagram = parse_ok(r#"diagram "Empty";"#);
        assert_eq!(diagram.title.inner(), "Empty");
        assert!(diagram.attributes.is_empty());
        assert!(diagram.elements.is_empty());
    }

    #[test]
    fn test_header_attributes() {
        let diagram = parse_ok(r#"diagram "T" [direction="LR", formats=[png, pdf], pad=0.5];"#);
        assert_eq!(diagram.attributes.len(), 3);
        assert_eq!(*diagram.attributes[0].name.inner(), "direction");
        match &diagram.attributes[1].value {
            types::AttributeValue::Identifiers(ids) => {
                let names: Vec<&str> = ids.iter().map(|id| *id.inner()).collect();
                assert_eq!(names, ["png", "pdf"]);
            }
            other => panic!("expected identifier list, got {other:?}"),
        }
        assert!(matches!(
            diagram.attributes[2].value,
            types::AttributeValue::Float(ref f) if *f.inner() == 0.5
        ));
    }

    #[test]
    fn test_nodes() {
        let diagram = parse_ok(
            r#"diagram "T";
            db;
            web as "Web Server" [shape="box"];"#,
        );
        assert_eq!(diagram.elements.len(), 2);
        match &diagram.elements[1] {
            types::Element::Node {
                name,
                label,
                attributes,
            } => {
                assert_eq!(*name.inner(), "web");
                assert_eq!(label.as_ref().map(|l| l.inner().as_str()), Some("Web Server"));
                assert_eq!(attributes.len(), 1);
            }
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_clusters() {
        let diagram = parse_ok(
            r##"diagram "T";
            cluster backend as "Backend" [bgcolor="#E5F5FD"] {
                api;
                cluster storage { db; };
            };"##,
        );
        let types::Element::Cluster { name, elements, .. } = &diagram.elements[0] else {
            panic!("expected cluster");
        };
        assert_eq!(*name.inner(), "backend");
        assert_eq!(elements.len(), 2);
        assert!(matches!(&elements[1], types::Element::Cluster { elements, .. } if elements.len() == 1));
    }

    #[test]
    fn test_edges() {
        let diagram = parse_ok(
            r#"diagram "T";
            a; b;
            a -> b: "calls";
            a <- b;
            a <-> [color="red", style="dashed"] b;
            a -- b;"#,
        );
        let directions: Vec<EdgeDirection> = diagram
            .elements
            .iter()
            .filter_map(|e| match e {
                types::Element::Edge { direction, .. } => Some(*direction.inner()),
                _ => None,
            })
            .collect();
        assert_eq!(
            directions,
            [
                EdgeDirection::Forward,
                EdgeDirection::Backward,
                EdgeDirection::Bidirectional,
                EdgeDirection::Plain,
            ]
        );
        let types::Element::Edge { label, .. } = &diagram.elements[2] else {
            panic!("expected edge");
        };
        assert_eq!(label.as_ref().map(|l| l.inner().as_str()), Some("calls"));
    }

    #[test]
    fn test_comments_between_statements() {
        let diagram = parse_ok(
            "// header\ndiagram \"T\"; // trailing\n// before node\nweb; // after\n",
        );
        assert_eq!(diagram.elements.len(), 1);
    }

    #[test]
    fn test_missing_header() {
        let err = parse("web;").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_empty_input() {
        let err = parse("").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_missing_semicolon_after_edge() {
        let err = parse("diagram \"T\";\na -> b\n").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert!(err.message().contains("semicolon"));
    }

    #[test]
    fn test_missing_edge_target() {
        let source = "diagram \"T\";\na -> ;\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert!(err.message().contains("target identifier"));
        let span = err.primary_span().unwrap();
        assert_eq!(&source[span.start()..span.end()], ";");
    }

    #[test]
    fn test_garbage_statement() {
        let source = "diagram \"T\";\nweb = 1;\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        let span = err.primary_span().unwrap();
        assert_eq!(&source[span.start()..span.end()], "web = 1;");
        assert!(!err.message().contains("end of input"));
    }

    #[test]
    fn test_error_inside_cluster_names_innermost_expectation() {
        let source = "diagram \"T\";\ncluster c { a; a -> ; };\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.message(), "expected target identifier after arrow");
        let span = err.primary_span().unwrap();
        assert_eq!(&source[span.start()..span.end()], ";");
    }

    #[test]
    fn test_missing_header_title_at_end_of_input() {
        let err = parse("diagram ").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert!(err.message().contains("diagram title"));
    }

    #[test]
    fn test_unclosed_cluster() {
        let err = parse("diagram \"T\";\ncluster c { web;\n").unwrap_err();
        assert!(matches!(err.code(), Some(ErrorCode::E100 | ErrorCode::E101)));
    }
}
