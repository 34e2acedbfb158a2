//! # Text Grammar
//!
//! Line-oriented format for graphs, trees and tree-graphs.
//!
//! ```text
//! treegraph                       // header: graph | tree | treegraph
//! title = String("project")       // container property
//! dir:root
//!     size = Long(4096)           // property of dir:root
//!     file:main
//!     file:lib
//! [file:main] imports [dir:root/file:lib]
//!     weight = Float(0.5)         // property of the edge above
//! ```
//!
//! Parsing is a single synchronous pass over the lines followed by a
//! reference-resolution pass. A parse either succeeds completely or
//! returns the first error; no partial structure is handed back.

pub mod grammar;
pub mod lexer;
pub mod reference;
pub mod parser;

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::identity::ScopeConfig;
use crate::model::{Elements, Graph, Tree, TreeGraph};
use crate::{Error, Result};

pub use grammar::Dialect;
pub use lexer::{lines_of, Lexeme, Span, Token, TokenKind, Tokenizer};
pub use parser::ParseState;
pub use reference::{Reference, Segment};

// ============================================================================
// Configuration
// ============================================================================

/// Session settings for [`parse_with`] and [`parse_reader`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Fixed dialect, or `None` to read it from the header line.
    pub dialect: Option<Dialect>,
    /// Scope for the session's factory. `None` gives a counter scope named
    /// after the dialect.
    pub scope: Option<ScopeConfig>,
    /// Demand a header even when the dialect is fixed.
    pub require_header: bool,
}

impl ParseConfig {
    pub fn dialect(dialect: Dialect) -> Self {
        Self { dialect: Some(dialect), ..Self::default() }
    }

    pub fn with_scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Load from JSON, e.g. `{"dialect": "tree", "require_header": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ValueFormat {
            line: e.line(),
            column: e.column(),
            message: format!("parse config: {e}"),
        })
    }

    fn scope_for(&self, dialect: Dialect) -> ScopeConfig {
        self.scope.clone().unwrap_or_else(|| ScopeConfig::counter(dialect.header()))
    }
}

// ============================================================================
// Documents
// ============================================================================

/// The container produced by a header-driven parse.
#[derive(Debug)]
pub enum Document {
    Graph(Graph),
    Tree(Tree),
    TreeGraph(TreeGraph),
}

impl Document {
    pub fn dialect(&self) -> Dialect {
        match self {
            Document::Graph(_) => Dialect::Graph,
            Document::Tree(_) => Dialect::Tree,
            Document::TreeGraph(_) => Dialect::TreeGraph,
        }
    }

    pub fn elements(&self) -> &Elements {
        match self {
            Document::Graph(g) => g,
            Document::Tree(t) => t,
            Document::TreeGraph(tg) => tg,
        }
    }

    pub fn into_graph(self) -> Option<Graph> {
        match self {
            Document::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Document::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_tree_graph(self) -> Option<TreeGraph> {
        match self {
            Document::TreeGraph(tg) => Some(tg),
            _ => None,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse text whose first content line is a dialect header.
pub fn parse(text: &str) -> Result<Document> {
    parse_with(text, &ParseConfig::default())
}

pub fn parse_with(text: &str, config: &ParseConfig) -> Result<Document> {
    let tokens = Tokenizer::new(lines_of(text), config.dialect, config.require_header);
    parse_tokens(tokens, config)
}

/// Parse from any buffered reader, one line at a time.
pub fn parse_reader<R: BufRead>(reader: R, config: &ParseConfig) -> Result<Document> {
    let tokens = Tokenizer::new(reader.lines(), config.dialect, config.require_header);
    parse_tokens(tokens, config)
}

fn parse_tokens<L>(mut tokens: Tokenizer<L>, config: &ParseConfig) -> Result<Document>
where
    L: Iterator<Item = std::io::Result<String>>,
{
    let dialect = tokens.read_header()?;
    let scope = config.scope_for(dialect);
    Ok(match dialect {
        Dialect::Graph => Document::Graph(parser::parse_into(Graph::with_config(&scope), tokens)?),
        Dialect::Tree => Document::Tree(parser::parse_into(Tree::with_config(&scope), tokens)?),
        Dialect::TreeGraph => {
            Document::TreeGraph(parser::parse_into(TreeGraph::with_config(&scope), tokens)?)
        }
    })
}

/// Parse graph-dialect text. The header is optional.
pub fn parse_graph(text: &str) -> Result<Graph> {
    let tokens = Tokenizer::new(lines_of(text), Some(Dialect::Graph), false);
    parser::parse_into(Graph::default(), tokens)
}

/// Parse tree-dialect text. The header is optional.
pub fn parse_tree(text: &str) -> Result<Tree> {
    let tokens = Tokenizer::new(lines_of(text), Some(Dialect::Tree), false);
    parser::parse_into(Tree::default(), tokens)
}

/// Parse tree-graph-dialect text. The header is optional.
pub fn parse_tree_graph(text: &str) -> Result<TreeGraph> {
    let tokens = Tokenizer::new(lines_of(text), Some(Dialect::TreeGraph), false);
    parser::parse_into(TreeGraph::default(), tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scope;

    #[test]
    fn test_parse_detects_dialect() {
        let doc = parse("tree\nr\n c").unwrap();
        assert_eq!(doc.dialect(), Dialect::Tree);
        assert_eq!(doc.elements().node_count(), 2);
        assert!(doc.into_tree().is_some());
    }

    #[test]
    fn test_parse_requires_header() {
        assert!(matches!(parse("r\n c"), Err(Error::MissingHeader)));
    }

    #[test]
    fn test_explicit_entry_point_checks_header() {
        let err = parse_graph("tree\na").unwrap_err();
        assert!(matches!(err, Error::DialectMismatch { line: 1, .. }));
        assert_eq!(parse_graph("graph\na").unwrap().node_count(), 1);
    }

    #[test]
    fn test_config_from_json() {
        let config = ParseConfig::from_json(
            r#"{"dialect": "tree_graph", "scope": {"kind": "guid", "name": "ids"}}"#,
        )
        .unwrap();
        assert_eq!(config.dialect, Some(Dialect::TreeGraph));
        assert!(!config.require_header);
        let doc = parse_with("r", &config).unwrap();
        assert_eq!(doc.elements().scope().name(), "ids");
    }

    #[test]
    fn test_config_json_error_has_position() {
        let err = ParseConfig::from_json("{\n  \"dialect\": 5\n}").unwrap_err();
        assert!(matches!(err, Error::ValueFormat { line: 2, .. }));
    }

    #[test]
    fn test_default_scope_named_after_dialect() {
        let doc = parse("graph\na").unwrap();
        assert_eq!(doc.elements().scope().name(), "graph");
    }

    #[test]
    fn test_parse_reader() {
        let input = std::io::Cursor::new("graph\na:x\nb:y\n[a:x] e [b:y]\n");
        let doc = parse_reader(input, &ParseConfig::default()).unwrap();
        assert_eq!(doc.elements().edge_count(), 1);
    }
}
