//! Element arena shared by every container type.
//!
//! Slots are never reused: a removed element leaves a hole, so a stale
//! handle reads as missing rather than as some newer element.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use tracing::debug;

use super::{Direction, Edge, EdgeId, FactoryId, Node, NodeId};
use crate::identity::{Identity, Scope};
use crate::properties::{PropertyList, SharedSchema};
use crate::{Error, Result};

/// Nodes, edges and indexes of one container.
#[derive(Debug)]
pub struct Elements {
    factory: FactoryId,
    scope: Box<dyn Scope>,
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    node_count: usize,
    edge_count: usize,
    /// identity → node
    node_names: HashMap<String, NodeId>,
    /// identity → edge
    edge_names: HashMap<String, EdgeId>,
    /// label → nodes in insertion order (poor man's label index)
    label_index: HashMap<String, Vec<NodeId>>,
    schemas: IndexMap<String, SharedSchema>,
    properties: PropertyList,
    /// Names claimed ahead of the element that will carry them.
    reserved: HashSet<String>,
}

impl Elements {
    pub(crate) fn new(scope: Box<dyn Scope>) -> Self {
        Self {
            factory: FactoryId::next(),
            scope,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_count: 0,
            edge_count: 0,
            node_names: HashMap::new(),
            edge_names: HashMap::new(),
            label_index: HashMap::new(),
            schemas: IndexMap::new(),
            properties: PropertyList::extendable(),
            reserved: HashSet::new(),
        }
    }

    // ========================================================================
    // Read API
    // ========================================================================

    /// The factory every element of this container was created by.
    pub fn factory_id(&self) -> FactoryId {
        self.factory
    }

    pub fn scope(&self) -> &dyn Scope {
        self.scope.as_ref()
    }

    /// Container-level properties.
    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.try_node(id).is_some()
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.try_edge(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.try_node(id).ok_or_else(|| Error::NotFound(format!("node {id}")))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.try_edge(id).ok_or_else(|| Error::NotFound(format!("edge {id}")))
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter_map(Option::as_ref)
    }

    /// Incident edges of `node` filtered by direction, in attachment order.
    ///
    /// A self-loop appears once even for `Direction::Both`.
    pub fn edges_of(&self, node: NodeId, dir: Direction) -> Result<Vec<&Edge>> {
        let n = self.node(node)?;
        let ids: Vec<EdgeId> = match dir {
            Direction::Outgoing => n.outgoing.to_vec(),
            Direction::Incoming => n.incoming.to_vec(),
            Direction::Both => {
                let mut all = n.outgoing.to_vec();
                all.extend(n.incoming.iter().filter(|e| !n.outgoing.contains(*e)));
                all
            }
        };
        Ok(ids.into_iter().filter_map(|e| self.try_edge(e)).collect())
    }

    pub fn out_edges(&self, node: NodeId) -> Result<Vec<&Edge>> {
        self.edges_of(node, Direction::Outgoing)
    }

    pub fn in_edges(&self, node: NodeId) -> Result<Vec<&Edge>> {
        self.edges_of(node, Direction::Incoming)
    }

    /// Distinct nodes one edge away, in first-seen order.
    pub fn neighbours(&self, node: NodeId, dir: Direction) -> Result<Vec<NodeId>> {
        let mut seen = Vec::new();
        for edge in self.edges_of(node, dir)? {
            let next = edge.other_end(node).unwrap_or(edge.end);
            if !seen.contains(&next) {
                seen.push(next);
            }
        }
        Ok(seen)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.node_names.get(name).and_then(|id| self.try_node(*id))
    }

    pub fn find_edge_by_name(&self, name: &str) -> Option<&Edge> {
        self.edge_names.get(name).and_then(|id| self.try_edge(*id))
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.try_node(*id)).collect())
            .unwrap_or_default()
    }

    /// Shared schema registered for `label`, if any.
    pub fn schema(&self, label: &str) -> Option<&SharedSchema> {
        self.schemas.get(label)
    }

    fn try_node(&self, id: NodeId) -> Option<&Node> {
        if id.factory != self.factory {
            return None;
        }
        self.nodes.get(id.slot as usize).and_then(Option::as_ref)
    }

    fn try_edge(&self, id: EdgeId) -> Option<&Edge> {
        if id.factory != self.factory {
            return None;
        }
        self.edges.get(id.slot as usize).and_then(Option::as_ref)
    }

    // ========================================================================
    // Mutation (factories only)
    // ========================================================================

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if id.factory != self.factory {
            return Err(Error::NotFound(format!("node {id}")));
        }
        self.nodes
            .get_mut(id.slot as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::NotFound(format!("node {id}")))
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge> {
        if id.factory != self.factory {
            return Err(Error::NotFound(format!("edge {id}")));
        }
        self.edges
            .get_mut(id.slot as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::NotFound(format!("edge {id}")))
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }

    pub(crate) fn schema_for(&mut self, label: &str) -> SharedSchema {
        self.schemas.entry(label.to_string()).or_default().clone()
    }

    /// Claim `name` now for an element inserted later. Minted names skip it
    /// from then on; the first insert proposing it takes it over.
    pub(crate) fn reserve(&mut self, name: &str) -> Result<()> {
        self.scope.claim(name)?;
        self.reserved.insert(name.to_string());
        Ok(())
    }

    /// A proposed name is claimed (or taken from the reservations);
    /// otherwise the scope mints one from the label.
    fn mint(&mut self, label: &str, name: Option<&str>) -> Result<Identity> {
        match name {
            Some(name) if self.reserved.remove(name) => Ok(Identity::new(name)),
            Some(name) => self.scope.claim(name),
            None => Ok(self.scope.new_identity(Some(label))),
        }
    }

    pub(crate) fn insert_node(
        &mut self,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<NodeId> {
        let identity = self.mint(label, name)?;
        let slot = u32::try_from(self.nodes.len())
            .map_err(|_| Error::NotFound(format!("free node slot in factory {}", self.factory)))?;
        let id = NodeId { factory: self.factory, slot };
        self.node_names.insert(identity.as_str().to_string(), id);
        self.label_index.entry(label.to_string()).or_default().push(id);
        let node = Node::new(id, identity, label.to_string(), properties.unwrap_or_default());
        self.nodes.push(Some(node));
        self.node_count += 1;
        Ok(id)
    }

    pub(crate) fn insert_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<EdgeId> {
        for endpoint in [start, end] {
            if !self.contains_node(endpoint) {
                return Err(Error::DanglingEndpoint(format!("node {endpoint}")));
            }
        }
        let identity = self.mint(label, name)?;
        let slot = u32::try_from(self.edges.len())
            .map_err(|_| Error::NotFound(format!("free edge slot in factory {}", self.factory)))?;
        let id = EdgeId { factory: self.factory, slot };
        self.edge_names.insert(identity.as_str().to_string(), id);
        self.edges.push(Some(Edge {
            id,
            identity,
            label: label.to_string(),
            properties: properties.unwrap_or_default(),
            start,
            end,
        }));
        self.node_mut(start)?.outgoing.push(id);
        self.node_mut(end)?.incoming.push(id);
        self.edge_count += 1;
        Ok(id)
    }

    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Result<Edge> {
        self.edge(id)?;
        let slot = id.slot as usize;
        let edge = self.edges[slot]
            .take()
            .ok_or_else(|| Error::NotFound(format!("edge {id}")))?;
        if let Ok(start) = self.node_mut(edge.start) {
            start.outgoing.retain(|e| *e != id);
        }
        if let Ok(end) = self.node_mut(edge.end) {
            end.incoming.retain(|e| *e != id);
        }
        self.edge_names.remove(edge.identity.as_str());
        self.edge_count -= 1;
        Ok(edge)
    }

    /// Remove a node and every edge incident to it. Tree links are left
    /// to the caller.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let incident: Vec<EdgeId> = self
            .edges_of(id, Direction::Both)?
            .into_iter()
            .map(Edge::id)
            .collect();
        for edge in &incident {
            self.remove_edge(*edge)?;
        }
        let node = self.nodes[id.slot as usize]
            .take()
            .ok_or_else(|| Error::NotFound(format!("node {id}")))?;
        self.node_names.remove(node.identity.as_str());
        if let Some(ids) = self.label_index.get_mut(&node.label) {
            ids.retain(|n| *n != id);
        }
        self.node_count -= 1;
        debug!(node = %node.identity, detached = incident.len(), "removed node");
        Ok(node)
    }
}
