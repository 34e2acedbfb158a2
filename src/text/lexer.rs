//! Line tokenizer: classifies each input line into one token.
//!
//! Lines are pulled lazily from any iterator of `io::Result<String>`, so
//! the same tokenizer serves in-memory text and buffered readers. Blank
//! and comment-only lines are consumed without producing a token.

use std::io;

use tracing::{debug, trace};

use super::grammar::{self, Dialect, ASSIGN, LABEL_SEP, REF_CLOSE, REF_OPEN, VALUE_CLOSE, VALUE_OPEN};
use super::reference::Reference;
use crate::properties::PropertyType;
use crate::{Error, Result};

/// Source position, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Node,
    Edge,
    Property,
}

/// The classified content of a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    /// `label` or `label:name`
    Node { label: String, name: Option<String> },
    /// `[start] label[:name] [end]`
    Edge { start: Reference, label: String, name: Option<String>, end: Reference },
    /// `key = Type(raw)`; `raw` is the unparsed literal body.
    Property { key: String, ty: PropertyType, raw: String },
}

/// A token from the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: Lexeme,
    pub span: Span,
    /// Leading whitespace characters; meaningful in nested dialects only.
    pub depth: usize,
    pub text: String,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self.lexeme {
            Lexeme::Node { .. } => TokenKind::Node,
            Lexeme::Edge { .. } => TokenKind::Edge,
            Lexeme::Property { .. } => TokenKind::Property,
        }
    }
}

/// Lines of an in-memory document in the form the tokenizer consumes.
pub fn lines_of(text: &str) -> impl Iterator<Item = io::Result<String>> + '_ {
    text.lines().map(|l| Ok(l.to_string()))
}

/// Forward-only token stream over one source.
///
/// The dialect is either fixed up front or read from the header line.
/// With a fixed dialect the header is optional unless `require_header`
/// is set, and a header naming a different dialect is rejected.
pub struct Tokenizer<L> {
    lines: L,
    line_no: usize,
    dialect: Option<Dialect>,
    require_header: bool,
    header_done: bool,
    /// First content line read while looking for a header.
    pending: Option<(usize, String)>,
    previous_depth: usize,
    after_edge: bool,
}

impl<L> Tokenizer<L>
where
    L: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: L, dialect: Option<Dialect>, require_header: bool) -> Self {
        Self {
            lines,
            line_no: 0,
            dialect,
            require_header,
            header_done: false,
            pending: None,
            previous_depth: 0,
            after_edge: false,
        }
    }

    /// The session dialect, once known.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Next raw line that carries content after comment stripping.
    fn next_content_line(&mut self) -> Result<Option<(usize, String)>> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if grammar::strip_comment(&line).trim().is_empty() {
                trace!(line = self.line_no, "skip");
                continue;
            }
            return Ok(Some((self.line_no, line)));
        }
        Ok(None)
    }

    /// Settle the dialect by reading the optional header line.
    pub fn read_header(&mut self) -> Result<Dialect> {
        if self.header_done {
            return self.dialect.ok_or(Error::MissingHeader);
        }
        self.header_done = true;
        let first = self.next_content_line()?;
        let header = first.as_ref().and_then(|(line, text)| {
            let word = grammar::strip_comment(text).trim();
            Dialect::from_header(word).map(|d| (*line, d))
        });
        let dialect = match (header, self.dialect) {
            (Some((line, found)), Some(expected)) if found != expected => {
                return Err(Error::DialectMismatch {
                    line,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
            (Some((_, found)), _) => found,
            (None, Some(expected)) if !self.require_header => {
                self.pending = first;
                expected
            }
            (None, _) => return Err(Error::MissingHeader),
        };
        self.dialect = Some(dialect);
        debug!(%dialect, "tokenizer session started");
        Ok(dialect)
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let dialect = self.read_header()?;
        let Some((line, text)) = self.next_content_line()? else {
            return Ok(None);
        };
        let token = self.classify(dialect, line, &text)?;
        trace!(line, kind = ?token.kind(), depth = token.depth, "token");
        Ok(Some(token))
    }

    fn classify(&mut self, dialect: Dialect, line: usize, text: &str) -> Result<Token> {
        let content = grammar::strip_comment(text);
        let depth = content.chars().take_while(|c| *c == ' ' || *c == '\t').count();
        let body = content.trim();
        let column = depth + 1;
        let span = Span { line, column };

        let lexeme = if body.starts_with(REF_OPEN) {
            if !dialect.has_edges() {
                return Err(unrecognized(span, body));
            }
            self.after_edge = true;
            lex_edge(span, body)?
        } else if grammar::find_unquoted(body, ASSIGN).is_some() {
            if dialect.is_nested() && !self.after_edge {
                self.check_depth(span, depth)?;
            }
            lex_property(span, body)?
        } else {
            if dialect.is_nested() {
                self.check_depth(span, depth)?;
            }
            self.after_edge = false;
            lex_node(span, body)?
        };
        Ok(Token { lexeme, span, depth, text: text.to_string() })
    }

    /// Depth may drop by any amount but rise by one at most.
    fn check_depth(&mut self, span: Span, depth: usize) -> Result<()> {
        if depth > self.previous_depth + 1 {
            return Err(Error::Indentation {
                line: span.line,
                column: span.column,
                previous: self.previous_depth,
                found: depth,
            });
        }
        self.previous_depth = depth;
        Ok(())
    }
}

impl<L> Iterator for Tokenizer<L>
where
    L: Iterator<Item = io::Result<String>>,
{
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn unrecognized(span: Span, text: &str) -> Error {
    Error::UnrecognizedToken { line: span.line, column: span.column, text: text.to_string() }
}

/// `label` or `label:name`, both plain words.
fn split_label(span: Span, text: &str) -> Result<(String, Option<String>)> {
    let (label, name) = match text.split_once(LABEL_SEP) {
        Some((label, name)) => (label.trim(), Some(name.trim())),
        None => (text.trim(), None),
    };
    if !grammar::is_word(label) || name.is_some_and(|n| !grammar::is_word(n)) {
        return Err(unrecognized(span, text));
    }
    Ok((label.to_string(), name.map(str::to_string)))
}

fn lex_node(span: Span, body: &str) -> Result<Lexeme> {
    let (label, name) = split_label(span, body)?;
    Ok(Lexeme::Node { label, name })
}

fn lex_edge(span: Span, body: &str) -> Result<Lexeme> {
    let reference = |text: &str| {
        Reference::parse(text).map_err(|message| Error::ValueFormat {
            line: span.line,
            column: span.column,
            message: format!("bad reference '{text}': {message}"),
        })
    };
    let after_open = &body[REF_OPEN.len_utf8()..];
    let close = grammar::find_unquoted(after_open, REF_CLOSE).ok_or_else(|| unrecognized(span, body))?;
    let start = reference(&after_open[..close])?;

    let rest = &after_open[close + REF_CLOSE.len_utf8()..];
    let open = grammar::find_unquoted(rest, REF_OPEN).ok_or_else(|| unrecognized(span, body))?;
    let (label, name) = split_label(span, &rest[..open])?;

    let end_text = rest[open + REF_OPEN.len_utf8()..]
        .trim_end()
        .strip_suffix(REF_CLOSE)
        .ok_or_else(|| unrecognized(span, body))?;
    let end = reference(end_text)?;
    Ok(Lexeme::Edge { start, label, name, end })
}

fn lex_property(span: Span, body: &str) -> Result<Lexeme> {
    let eq = grammar::find_unquoted(body, ASSIGN).ok_or_else(|| unrecognized(span, body))?;
    let key = body[..eq].trim();
    if !grammar::is_word(key) {
        return Err(unrecognized(span, body));
    }
    let rhs = body[eq + ASSIGN.len_utf8()..].trim();
    let open = rhs.find(VALUE_OPEN).ok_or_else(|| Error::ValueFormat {
        line: span.line,
        column: span.column,
        message: format!("expected Type(value) after '{key} =', got '{rhs}'"),
    })?;
    let type_name = rhs[..open].trim();
    let ty = grammar::parse_type_name(type_name).ok_or_else(|| Error::UnknownType {
        line: span.line,
        column: span.column,
        type_name: type_name.to_string(),
    })?;
    let raw = rhs[open + VALUE_OPEN.len_utf8()..]
        .strip_suffix(VALUE_CLOSE)
        .ok_or_else(|| Error::ValueFormat {
            line: span.line,
            column: span.column,
            message: format!("unclosed value for '{key}'"),
        })?;
    Ok(Lexeme::Property { key: key.to_string(), ty, raw: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ScalarType;
    use pretty_assertions::assert_eq;

    fn tokens(text: &str, dialect: Option<Dialect>) -> Result<Vec<Token>> {
        Tokenizer::new(lines_of(text), dialect, false).collect()
    }

    #[test]
    fn test_header_detection() {
        let mut t = Tokenizer::new(lines_of("// saved\n\ntree // c\na"), None, false);
        assert_eq!(t.read_header().unwrap(), Dialect::Tree);
        let tok = t.next_token().unwrap().unwrap();
        assert_eq!(tok.span, Span { line: 4, column: 1 });
        assert!(t.next_token().unwrap().is_none());
    }

    #[test]
    fn test_missing_header() {
        let err = tokens("a:b", None).unwrap_err();
        assert!(matches!(err, Error::MissingHeader));
        let err = Tokenizer::new(lines_of("a:b"), Some(Dialect::Graph), true)
            .next_token()
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader));
    }

    #[test]
    fn test_header_optional_with_explicit_dialect() {
        let toks = tokens("a:b", Some(Dialect::Graph)).unwrap();
        assert_eq!(toks[0].lexeme, Lexeme::Node { label: "a".into(), name: Some("b".into()) });
    }

    #[test]
    fn test_dialect_mismatch() {
        let err = tokens("\ngraph\na", Some(Dialect::Tree)).unwrap_err();
        assert!(matches!(err, Error::DialectMismatch { line: 2, .. }));
    }

    #[test]
    fn test_edge_line() {
        let toks = tokens("graph\n[a:x] knows:k1 [b:y] // note", None).unwrap();
        let Lexeme::Edge { start, label, name, end } = &toks[0].lexeme else {
            panic!("Expected edge, got {:?}", toks[0].lexeme);
        };
        assert_eq!(start.text(), "a:x");
        assert_eq!(label, "knows");
        assert_eq!(name.as_deref(), Some("k1"));
        assert_eq!(end.text(), "b:y");
    }

    #[test]
    fn test_edge_rejected_in_tree() {
        let err = tokens("tree\n[a:x] e [b:y]", None).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedToken { line: 2, .. }));
    }

    #[test]
    fn test_property_line() {
        let toks = tokens("graph\na\n\tsize = IntTable(([2]1,2))", None).unwrap();
        assert_eq!(toks[1].kind(), TokenKind::Property);
        assert_eq!(
            toks[1].lexeme,
            Lexeme::Property {
                key: "size".into(),
                ty: PropertyType::Table(ScalarType::Int),
                raw: "([2]1,2)".into(),
            }
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = tokens("graph\na\n k = Decimal(1)", None).unwrap_err();
        assert!(matches!(err, Error::UnknownType { line: 3, ref type_name, .. } if type_name == "Decimal"));
    }

    #[test]
    fn test_missing_value_parens() {
        let err = tokens("graph\na\n k = 5", None).unwrap_err();
        assert!(matches!(err, Error::ValueFormat { line: 3, .. }));
    }

    #[test]
    fn test_depth_jump_of_two_rejected() {
        let err = tokens("tree\na\n b\n   c", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Indentation { line: 4, column: 4, previous: 1, found: 3 }
        ));
    }

    #[test]
    fn test_depth_drop_accepted() {
        let toks = tokens("tree\na\n b\n  c\n   d\n x", None).unwrap();
        let depths: Vec<_> = toks.iter().map(|t| t.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 1]);
    }

    #[test]
    fn test_graph_ignores_depth() {
        assert!(tokens("graph\na\n     b", None).is_ok());
    }

    #[test]
    fn test_unrecognized_node_line() {
        let err = tokens("graph\na b c", None).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedToken { line: 2, column: 1, .. }));
    }
}
