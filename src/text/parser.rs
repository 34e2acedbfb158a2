//! Parser: drives a container's factory from the token stream.
//!
//! Edges and node-reference property values may name nodes declared
//! further down, so both are queued while the stream is read and bound in
//! a second pass once every node exists. An edge needs both endpoints to
//! be created, so its properties are collected on the side until then.
//!
//! Explicit element names are reserved before any element is created, so a
//! minted name never takes a name declared further down.

use std::io;

use tracing::{debug, trace};

use super::grammar::{self, Dialect};
use super::lexer::{Lexeme, Span, Token, Tokenizer};
use super::reference::Reference;
use crate::model::{EdgeId, Elements, Graph, NodeId, Tree, TreeGraph};
use crate::properties::{PropertyList, PropertyType, Value};
use crate::{Error, Result};

/// Parser states. Transitions are traced at `trace` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Nested dialect, no node yet.
    ExpectRoot,
    /// Graph dialect, no element yet.
    ExpectNodeOrEdge,
    /// Nested dialect after a node: a child, a sibling or a property.
    ExpectTreeChild,
    /// After a graph element or any edge: properties attach to it.
    ExpectProperty,
    ResolvingReferences,
    Done,
}

// ============================================================================
// Sink: the factory operations the parser needs
// ============================================================================

pub(crate) trait Sink {
    fn elements(&self) -> &Elements;

    fn reserve_name(&mut self, name: &str) -> Result<()>;

    fn add_node(&mut self, parent: Option<NodeId>, label: &str, name: Option<&str>) -> Result<NodeId>;

    fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList>;

    fn properties_mut(&mut self) -> &mut PropertyList;

    fn add_edge(
        &mut self,
        _start: NodeId,
        _end: NodeId,
        _label: &str,
        _name: Option<&str>,
        _properties: PropertyList,
    ) -> Result<EdgeId> {
        Err(Error::NotFound("edge support in this container".into()))
    }

    fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut PropertyList> {
        Err(Error::NotFound(format!("edge {id}")))
    }
}

impl Sink for Graph {
    fn elements(&self) -> &Elements {
        self
    }

    fn reserve_name(&mut self, name: &str) -> Result<()> {
        self.elements_mut().reserve(name)
    }

    fn add_node(&mut self, _parent: Option<NodeId>, label: &str, name: Option<&str>) -> Result<NodeId> {
        self.factory().add_node(label, name, None)
    }

    fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.elements_mut().node_mut(id)?.properties)
    }

    fn properties_mut(&mut self) -> &mut PropertyList {
        self.elements_mut().properties_mut()
    }

    fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        label: &str,
        name: Option<&str>,
        properties: PropertyList,
    ) -> Result<EdgeId> {
        self.factory().add_edge(start, end, label, name, Some(properties))
    }

    fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut PropertyList> {
        Ok(&mut self.elements_mut().edge_mut(id)?.properties)
    }
}

impl Sink for Tree {
    fn elements(&self) -> &Elements {
        self
    }

    fn reserve_name(&mut self, name: &str) -> Result<()> {
        self.hierarchy_mut().elements_mut().reserve(name)
    }

    fn add_node(&mut self, parent: Option<NodeId>, label: &str, name: Option<&str>) -> Result<NodeId> {
        self.factory().add_tree_node(parent, label, name, None)
    }

    fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy_mut().elements_mut().node_mut(id)?.properties)
    }

    fn properties_mut(&mut self) -> &mut PropertyList {
        self.hierarchy_mut().elements_mut().properties_mut()
    }
}

impl Sink for TreeGraph {
    fn elements(&self) -> &Elements {
        self
    }

    fn reserve_name(&mut self, name: &str) -> Result<()> {
        self.hierarchy_mut().elements_mut().reserve(name)
    }

    fn add_node(&mut self, parent: Option<NodeId>, label: &str, name: Option<&str>) -> Result<NodeId> {
        self.factory().add_tree_node(parent, label, name, None)
    }

    fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy_mut().elements_mut().node_mut(id)?.properties)
    }

    fn properties_mut(&mut self) -> &mut PropertyList {
        self.hierarchy_mut().elements_mut().properties_mut()
    }

    fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        label: &str,
        name: Option<&str>,
        properties: PropertyList,
    ) -> Result<EdgeId> {
        self.factory().add_edge(start, end, label, name, Some(properties))
    }

    fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy_mut().elements_mut().edge_mut(id)?.properties)
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Element receiving property lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Container,
    Node(NodeId),
    /// Index into the queued edges.
    Edge(usize),
}

#[derive(Debug)]
struct PendingEdge {
    span: Span,
    start: Reference,
    end: Reference,
    label: String,
    name: Option<String>,
    properties: PropertyList,
}

/// A node-reference property waiting for its target.
#[derive(Debug)]
struct Deferred {
    owner: Owner,
    key: String,
    reference: Reference,
    line: usize,
}

struct Parser<S, L> {
    sink: S,
    tokens: Tokenizer<L>,
    dialect: Dialect,
    state: ParseState,
    /// Nested dialects: the most recent node at each open depth.
    stack: Vec<NodeId>,
    owner: Owner,
    pending_edges: Vec<PendingEdge>,
    deferred: Vec<Deferred>,
}

/// Read every token from `tokens` into `sink`, then resolve references.
pub(crate) fn parse_into<S, L>(sink: S, mut tokens: Tokenizer<L>) -> Result<S>
where
    S: Sink,
    L: Iterator<Item = io::Result<String>>,
{
    let dialect = tokens.read_header()?;
    let state = if dialect.is_nested() {
        ParseState::ExpectRoot
    } else {
        ParseState::ExpectNodeOrEdge
    };
    let parser = Parser {
        sink,
        tokens,
        dialect,
        state,
        stack: Vec::new(),
        owner: Owner::Container,
        pending_edges: Vec::new(),
        deferred: Vec::new(),
    };
    parser.run()
}

impl<S, L> Parser<S, L>
where
    S: Sink,
    L: Iterator<Item = io::Result<String>>,
{
    fn run(mut self) -> Result<S> {
        let mut tokens = Vec::new();
        while let Some(token) = self.tokens.next_token()? {
            tokens.push(token);
        }
        self.reserve_names(&tokens)?;
        for token in tokens {
            self.accept(token)?;
        }
        self.transition(ParseState::ResolvingReferences);
        self.resolve()?;
        self.transition(ParseState::Done);
        Ok(self.sink)
    }

    fn reserve_names(&mut self, tokens: &[Token]) -> Result<()> {
        for token in tokens {
            let name = match &token.lexeme {
                Lexeme::Node { name, .. } | Lexeme::Edge { name, .. } => name.as_deref(),
                Lexeme::Property { .. } => None,
            };
            if let Some(name) = name {
                self.sink.reserve_name(name)?;
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: ParseState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "parser state");
            self.state = next;
        }
    }

    fn accept(&mut self, token: Token) -> Result<()> {
        let Token { lexeme, span, depth, .. } = token;
        match lexeme {
            Lexeme::Node { label, name } => self.on_node(span, depth, &label, name.as_deref()),
            Lexeme::Edge { start, label, name, end } => {
                self.pending_edges.push(PendingEdge { span, start, end, label, name, properties: PropertyList::extendable() });
                self.owner = Owner::Edge(self.pending_edges.len() - 1);
                self.transition(ParseState::ExpectProperty);
                Ok(())
            }
            Lexeme::Property { key, ty, raw } => self.on_property(span, depth, &key, ty, &raw),
        }
    }

    fn on_node(&mut self, span: Span, depth: usize, label: &str, name: Option<&str>) -> Result<()> {
        if !self.dialect.is_nested() {
            let id = self.sink.add_node(None, label, name)?;
            self.owner = Owner::Node(id);
            self.transition(ParseState::ExpectProperty);
            return Ok(());
        }

        // A node at depth d hangs under the most recent node at depth d - 1.
        let open = self.stack.len();
        if depth > open || (self.state == ParseState::ExpectRoot && depth != 0) {
            return Err(Error::Indentation {
                line: span.line,
                column: span.column,
                previous: open.saturating_sub(1),
                found: depth,
            });
        }
        self.stack.truncate(depth);
        let parent = depth.checked_sub(1).and_then(|d| self.stack.get(d).copied());
        let id = self.sink.add_node(parent, label, name)?;
        self.stack.push(id);
        self.owner = Owner::Node(id);
        self.transition(ParseState::ExpectTreeChild);
        Ok(())
    }

    /// Who a property line at `depth` belongs to.
    fn property_owner(&self, span: Span, depth: usize) -> Result<Owner> {
        if !self.dialect.is_nested() || matches!(self.owner, Owner::Edge(_)) {
            return Ok(self.owner);
        }
        if depth == 0 {
            return Ok(Owner::Container);
        }
        self.stack.get(depth - 1).map(|id| Owner::Node(*id)).ok_or(Error::Indentation {
            line: span.line,
            column: span.column,
            previous: self.stack.len().saturating_sub(1),
            found: depth,
        })
    }

    fn on_property(&mut self, span: Span, depth: usize, key: &str, ty: PropertyType, raw: &str) -> Result<()> {
        let owner = self.property_owner(span, depth)?;
        let list = self.properties_of(owner)?;

        if ty == PropertyType::NodeRef {
            list.add_key(key, ty).map_err(|e| at_line(e, span))?;
            let body = raw.trim();
            if !body.is_empty() {
                let reference = Reference::parse(body).map_err(|message| Error::ValueFormat {
                    line: span.line,
                    column: span.column,
                    message: format!("bad reference '{body}': {message}"),
                })?;
                self.deferred.push(Deferred { owner, key: key.to_string(), reference, line: span.line });
            }
            return Ok(());
        }

        let value = grammar::parse_literal(ty, raw).map_err(|message| Error::ValueFormat {
            line: span.line,
            column: span.column,
            message: format!("{key}: {message}"),
        })?;
        list.insert(key, value).map_err(|e| at_line(e, span))
    }

    fn properties_of(&mut self, owner: Owner) -> Result<&mut PropertyList> {
        match owner {
            Owner::Container => Ok(self.sink.properties_mut()),
            Owner::Node(id) => self.sink.node_properties_mut(id),
            Owner::Edge(index) => self
                .pending_edges
                .get_mut(index)
                .map(|e| &mut e.properties)
                .ok_or_else(|| Error::NotFound(format!("queued edge {index}"))),
        }
    }

    fn resolve_one(&self, reference: &Reference, line: usize) -> Result<NodeId> {
        let matches = reference.resolve(self.sink.elements());
        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(Error::UnresolvedReference { reference: reference.text().to_string(), line }),
            several => Err(Error::AmbiguousReference {
                reference: reference.text().to_string(),
                line,
                matches: several.len(),
            }),
        }
    }

    /// Second pass: create queued edges, then bind reference properties.
    fn resolve(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_edges);
        let mut edge_ids = Vec::with_capacity(pending.len());
        for edge in pending {
            let start = self.resolve_one(&edge.start, edge.span.line)?;
            let end = self.resolve_one(&edge.end, edge.span.line)?;
            edge_ids.push(self.sink.add_edge(start, end, &edge.label, edge.name.as_deref(), edge.properties)?);
        }

        let deferred = std::mem::take(&mut self.deferred);
        let references = deferred.len();
        for d in deferred {
            let target = self.resolve_one(&d.reference, d.line)?;
            let list = match d.owner {
                Owner::Container => self.sink.properties_mut(),
                Owner::Node(id) => self.sink.node_properties_mut(id)?,
                Owner::Edge(index) => {
                    let id = edge_ids
                        .get(index)
                        .copied()
                        .ok_or_else(|| Error::NotFound(format!("queued edge {index}")))?;
                    self.sink.edge_properties_mut(id)?
                }
            };
            list.set(&d.key, Value::Node(target))?;
        }
        debug!(
            dialect = %self.dialect,
            nodes = self.sink.elements().node_count(),
            edges = edge_ids.len(),
            references,
            "resolved deferred references"
        );
        Ok(())
    }
}

/// Attach the source line to a duplicate key.
fn at_line(err: Error, span: Span) -> Error {
    match err {
        Error::DuplicateKey(key) => Error::DuplicateKey(format!("{key} (line {})", span.line)),
        other => other,
    }
}
