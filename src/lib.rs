//! # treegraph — Graphs, Trees and Tree-Graphs with a Text Grammar
//!
//! An in-memory element model (nodes, edges, tree nodes) paired with a
//! line-oriented text format that can describe a plain graph, a plain tree,
//! or a tree with additional cross-links.
//!
//! ## Design Principles
//!
//! 1. **Factories own elements**: `Node` and `Edge` have no public
//!    constructors; every element is minted by the factory of its container.
//! 2. **Scopes are injected**: identities come from an explicit `Scope`, never
//!    from hidden global state.
//! 3. **Two relation sets, one node**: parent/children and incident edges live
//!    side by side on the same node; the tree relation is optional.
//! 4. **Two-pass parsing**: references are collected first and resolved once
//!    every node exists, so the grammar allows forward references.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treegraph::text;
//!
//! # fn example() -> treegraph::Result<()> {
//! let tree = text::parse_tree("a:root\n b:child1\n b:child2")?;
//! let root = tree.root().expect("non-empty tree");
//! assert_eq!(tree.children(root)?.len(), 2);
//!
//! let text = treegraph::export::tree_to_text(&tree)?;
//! let again = text::parse_tree(&text)?;
//! assert_eq!(again.node_count(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Dialects
//!
//! | Dialect | Header | Structure |
//! |---------|--------|-----------|
//! | Graph | `graph` | nodes, `[a:x] label [b:y]` edges |
//! | Tree | `tree` | indentation-nested nodes |
//! | TreeGraph | `treegraph` | indentation-nested nodes plus edges |

// ============================================================================
// Modules
// ============================================================================

pub mod identity;
pub mod properties;
pub mod model;
pub mod text;
pub mod export;

// ============================================================================
// Re-exports: Identity
// ============================================================================

pub use identity::{
    Identity, Scope, ScopeConfig,
    CounterScope, ResettableScope, GuidScope, ProcessScope, PairScope,
};

// ============================================================================
// Re-exports: Properties
// ============================================================================

pub use properties::{PropertyList, PropertyType, SharedSchema, Table, Value};

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Node, Edge, NodeId, EdgeId, FactoryId, Direction,
    Graph, Tree, TreeGraph,
    GraphFactory, TreeFactory, TreeGraphFactory,
};

// ============================================================================
// Re-exports: Text grammar
// ============================================================================

pub use text::{Dialect, ParseConfig};

// ============================================================================
// Error Types
// ============================================================================

/// Broad failure families. Every [`Error`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Violated graph or tree invariant.
    Structural,
    /// Identity issuance conflict.
    Identity,
    /// Malformed input text.
    Grammar,
    /// Reference that could not be bound to exactly one node.
    Reference,
    /// Property list misuse.
    Schema,
    /// Underlying reader or writer failure.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cycle: node '{node}' cannot be attached under its own descendant '{parent}'")]
    Cycle { node: String, parent: String },

    #[error("Multiple roots: tree already rooted at '{existing}'")]
    MultipleRoots { existing: String },

    #[error("Dangling endpoint: {0} does not belong to this container")]
    DanglingEndpoint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Identity collision: '{id}' already issued by scope '{scope}'")]
    Collision { id: String, scope: String },

    #[error("Unrecognized token at line {line}, column {column}: '{text}'")]
    UnrecognizedToken { line: usize, column: usize, text: String },

    #[error("Indentation error at line {line}: depth {found} follows depth {previous}")]
    Indentation { line: usize, column: usize, previous: usize, found: usize },

    #[error("Value format error at line {line}, column {column}: {message}")]
    ValueFormat { line: usize, column: usize, message: String },

    #[error("Unknown property type at line {line}, column {column}: '{type_name}'")]
    UnknownType { line: usize, column: usize, type_name: String },

    #[error("Missing dialect header: first line must be one of graph, tree, treegraph")]
    MissingHeader,

    #[error("Dialect mismatch at line {line}: header '{found}' in a {expected} session")]
    DialectMismatch { line: usize, expected: String, found: String },

    #[error("Unresolved reference '{reference}' (line {line})")]
    UnresolvedReference { reference: String, line: usize },

    #[error("Ambiguous reference '{reference}' (line {line}) matches {matches} nodes")]
    AmbiguousReference { reference: String, line: usize, matches: usize },

    #[error("Unknown property key: {0}")]
    UnknownKey(String),

    #[error("Type mismatch for '{key}': expected {expected}, got {got}")]
    TypeMismatch { key: String, expected: String, got: String },

    #[error("Property list is read-only: cannot write '{0}'")]
    ReadOnly(String),

    #[error("Duplicate property key: {0}")]
    DuplicateKey(String),

    #[error("Property list schema is fixed: cannot change key '{0}'")]
    FixedSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Cycle { .. }
            | Error::MultipleRoots { .. }
            | Error::DanglingEndpoint(_)
            | Error::NotFound(_) => ErrorCategory::Structural,
            Error::Collision { .. } => ErrorCategory::Identity,
            Error::UnrecognizedToken { .. }
            | Error::Indentation { .. }
            | Error::ValueFormat { .. }
            | Error::UnknownType { .. }
            | Error::MissingHeader
            | Error::DialectMismatch { .. } => ErrorCategory::Grammar,
            Error::UnresolvedReference { .. }
            | Error::AmbiguousReference { .. } => ErrorCategory::Reference,
            Error::UnknownKey(_)
            | Error::TypeMismatch { .. }
            | Error::ReadOnly(_)
            | Error::DuplicateKey(_)
            | Error::FixedSchema(_) => ErrorCategory::Schema,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Line number for grammar and reference failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::UnrecognizedToken { line, .. }
            | Error::Indentation { line, .. }
            | Error::ValueFormat { line, .. }
            | Error::UnknownType { line, .. }
            | Error::DialectMismatch { line, .. }
            | Error::UnresolvedReference { line, .. }
            | Error::AmbiguousReference { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::Cycle { node: "a".into(), parent: "b".into() }.category(),
            ErrorCategory::Structural
        );
        assert_eq!(Error::MissingHeader.category(), ErrorCategory::Grammar);
        assert_eq!(Error::UnknownKey("x".into()).category(), ErrorCategory::Schema);
        assert_eq!(
            Error::UnresolvedReference { reference: "a:b".into(), line: 3 }.category(),
            ErrorCategory::Reference
        );
    }

    #[test]
    fn test_error_line() {
        let err = Error::Indentation { line: 4, column: 1, previous: 0, found: 2 };
        assert_eq!(err.line(), Some(4));
        assert_eq!(Error::ReadOnly("k".into()).line(), None);
    }
}
