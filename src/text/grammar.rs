//! Grammar tables and literal rules shared by the tokenizer, the parser
//! and the exporter.
//!
//! The literal type set is closed. Anything outside [`parse_type_name`] is
//! an unknown type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::{PropertyType, ScalarType, Table, Value};

// ============================================================================
// Punctuation
// ============================================================================

pub const COMMENT: &str = "//";
pub const LABEL_SEP: char = ':';
pub const ASSIGN: char = '=';
pub const REF_OPEN: char = '[';
pub const REF_CLOSE: char = ']';
pub const PATH_SEP: char = '/';
pub const FILTER_SEP: char = '+';
pub const VALUE_OPEN: char = '(';
pub const VALUE_CLOSE: char = ')';
pub const CELL_SEP: char = ',';

/// Characters that may not appear in a label, name or key.
const RESERVED: &[char] = &[
    LABEL_SEP, ASSIGN, REF_OPEN, REF_CLOSE, PATH_SEP, FILTER_SEP,
    VALUE_OPEN, VALUE_CLOSE, CELL_SEP, '"', '\'',
];

/// Whether `s` can be written as a bare label, name or key.
pub fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| !c.is_whitespace() && !RESERVED.contains(&c))
}

// ============================================================================
// Dialect
// ============================================================================

/// One of the three grammar variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Graph,
    Tree,
    TreeGraph,
}

impl Dialect {
    /// The header word that selects this dialect.
    pub fn header(self) -> &'static str {
        match self {
            Dialect::Graph => "graph",
            Dialect::Tree => "tree",
            Dialect::TreeGraph => "treegraph",
        }
    }

    pub fn from_header(word: &str) -> Option<Dialect> {
        match word {
            "graph" => Some(Dialect::Graph),
            "tree" => Some(Dialect::Tree),
            "treegraph" => Some(Dialect::TreeGraph),
            _ => None,
        }
    }

    /// Indentation encodes parent/child links.
    pub fn is_nested(self) -> bool {
        matches!(self, Dialect::Tree | Dialect::TreeGraph)
    }

    pub fn has_edges(self) -> bool {
        matches!(self, Dialect::Graph | Dialect::TreeGraph)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ============================================================================
// Type names
// ============================================================================

/// Resolve a type token. Both the capitalised and the short lowercase
/// spelling are accepted for scalars.
pub fn parse_type_name(name: &str) -> Option<PropertyType> {
    let ty = match name {
        "Boolean" | "boolean" => PropertyType::Boolean,
        "Byte" | "byte" => PropertyType::Byte,
        "Char" | "char" => PropertyType::Char,
        "Short" | "short" => PropertyType::Short,
        "Integer" | "int" => PropertyType::Int,
        "Long" | "long" => PropertyType::Long,
        "Float" | "float" => PropertyType::Float,
        "Double" | "double" => PropertyType::Double,
        "String" | "string" => PropertyType::String,
        "Ref" => PropertyType::NodeRef,
        other => {
            let element = other.strip_suffix("Table")?;
            PropertyType::Table(match element {
                "Boolean" => ScalarType::Boolean,
                "Byte" => ScalarType::Byte,
                "Char" => ScalarType::Char,
                "Short" => ScalarType::Short,
                "Int" | "Integer" => ScalarType::Int,
                "Long" => ScalarType::Long,
                "Float" => ScalarType::Float,
                "Double" => ScalarType::Double,
                "String" => ScalarType::String,
                _ => return None,
            })
        }
    };
    Some(ty)
}

/// The spelling the exporter writes.
pub fn type_name(ty: PropertyType) -> String {
    match ty {
        PropertyType::Int => "Integer".to_string(),
        PropertyType::NodeRef => "Ref".to_string(),
        PropertyType::Table(element) => format!("{element:?}Table"),
        scalar => format!("{scalar:?}"),
    }
}

// ============================================================================
// Quote-aware scanning
// ============================================================================

/// Byte offsets of every char in `s` that sits outside a quoted literal.
///
/// A double quote always opens a string. A single quote opens a char
/// literal only at the start of a value or cell, so apostrophes inside an
/// unquoted string body stay plain text.
fn unquoted_positions(s: &str) -> Vec<(usize, char)> {
    let mut out = Vec::with_capacity(s.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut last_plain: Option<char> = None;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                last_plain = Some(c);
            }
            continue;
        }
        let opens_char = c == '\''
            && matches!(last_plain, None | Some(VALUE_OPEN) | Some(CELL_SEP) | Some(REF_CLOSE));
        if c == '"' || opens_char {
            quote = Some(c);
            continue;
        }
        out.push((i, c));
        if !c.is_whitespace() {
            last_plain = Some(c);
        }
    }
    out
}

/// Offset of the first `pat` outside quotes.
pub fn find_unquoted(s: &str, pat: char) -> Option<usize> {
    unquoted_positions(s).into_iter().find(|(_, c)| *c == pat).map(|(i, _)| i)
}

/// Strip a trailing `//` comment that is not inside a quoted literal.
pub fn strip_comment(line: &str) -> &str {
    let plain = unquoted_positions(line);
    for pair in plain.windows(2) {
        let ((i, a), (j, b)) = (pair[0], pair[1]);
        if a == '/' && b == '/' && j == i + 1 {
            return &line[..i];
        }
    }
    line
}

/// Split on `sep` outside quotes.
pub fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in unquoted_positions(s) {
        if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

// ============================================================================
// Literals
// ============================================================================

/// Coerce a literal body (the text between the value parentheses) to a
/// value of `ty`. Node references are resolved elsewhere.
pub fn parse_literal(ty: PropertyType, body: &str) -> Result<Value, String> {
    match ty {
        PropertyType::NodeRef => Err("node references are resolved after parsing".to_string()),
        PropertyType::Table(element) => parse_table(element, body).map(Value::Table),
        scalar => match scalar.scalar() {
            Some(s) => parse_scalar(s, body),
            None => Err(format!("no literal form for {ty}")),
        },
    }
}

pub fn parse_scalar(ty: ScalarType, body: &str) -> Result<Value, String> {
    let text = body.trim();
    let bad = |what: &str| format!("'{text}' is not a valid {what}");
    match ty {
        ScalarType::Boolean => match text {
            t if t.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
            _ => Err(bad("boolean")),
        },
        ScalarType::Byte => text.parse().map(Value::Byte).map_err(|_| bad("byte")),
        ScalarType::Short => text.parse().map(Value::Short).map_err(|_| bad("short")),
        ScalarType::Int => text.parse().map(Value::Int).map_err(|_| bad("integer")),
        ScalarType::Long => text.parse().map(Value::Long).map_err(|_| bad("long")),
        ScalarType::Float => text.parse().map(Value::Float).map_err(|_| bad("float")),
        ScalarType::Double => text.parse().map(Value::Double).map_err(|_| bad("double")),
        ScalarType::Char => parse_char(text).map(Value::Char),
        ScalarType::String => parse_string(text).map(Value::String),
    }
}

fn parse_char(text: &str) -> Result<char, String> {
    let inner = match text.strip_prefix('\'') {
        Some(rest) => rest
            .strip_suffix('\'')
            .ok_or_else(|| format!("unterminated char literal {text}"))?,
        None => text,
    };
    let unescaped = unescape(inner)?;
    let mut chars = unescaped.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("'{text}' is not a single character")),
    }
}

fn parse_string(text: &str) -> Result<String, String> {
    match text.strip_prefix('"') {
        Some(rest) => {
            let inner = rest
                .strip_suffix('"')
                .filter(|inner| !inner.ends_with('\\') || inner.ends_with("\\\\"))
                .ok_or_else(|| format!("unterminated string literal {text}"))?;
            unescape(inner)
        }
        None => Ok(text.to_string()),
    }
}

fn unescape(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(e @ ('"' | '\'' | '\\')) => out.push(e),
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}

fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// `([d1,d2,...]c1,c2,...)` with cells in row-major order.
fn parse_table(element: ScalarType, body: &str) -> Result<Table, String> {
    let inner = body
        .trim()
        .strip_prefix(VALUE_OPEN)
        .and_then(|b| b.strip_suffix(VALUE_CLOSE))
        .ok_or_else(|| format!("table literal must be wrapped in parentheses: {body}"))?
        .trim();
    let rest = inner
        .strip_prefix(REF_OPEN)
        .ok_or_else(|| "table literal must start with [dimensions]".to_string())?;
    let close = rest
        .find(REF_CLOSE)
        .ok_or_else(|| "unterminated table dimensions".to_string())?;
    let dims = rest[..close]
        .split(CELL_SEP)
        .map(|d| d.trim().parse::<usize>().map_err(|_| format!("bad table dimension '{}'", d.trim())))
        .collect::<Result<Vec<_>, _>>()?;
    let cells_text = rest[close + 1..].trim();
    let cells = if cells_text.is_empty() {
        Vec::new()
    } else {
        split_unquoted(cells_text, CELL_SEP)
            .into_iter()
            .map(|cell| parse_scalar(element, cell))
            .collect::<Result<Vec<_>, _>>()?
    };
    Table::from_cells(element, &dims, cells).map_err(|e| e.to_string())
}

/// Literal body for `value`, the inverse of [`parse_literal`].
/// Node references are written by the exporter, which knows their names.
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::String(s) => escape(s, '"'),
        Value::Char(c) => escape(&c.to_string(), '\''),
        Value::Table(t) => {
            let dims: Vec<String> = t.dims().iter().map(usize::to_string).collect();
            let cells: Vec<String> = t.cells().iter().map(format_literal).collect();
            format!("([{}]{})", dims.join(","), cells.join(","))
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
