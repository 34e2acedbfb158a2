//! Node: a graph participant that may also be a tree member.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Direction, EdgeId, FactoryId};
use crate::identity::Identity;
use crate::properties::{PropertyList, Value};

/// Opaque node handle. Embeds the factory that created the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) factory: FactoryId,
    pub(crate) slot: u32,
}

impl NodeId {
    pub fn factory(&self) -> FactoryId {
        self.factory
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}@{}", self.slot, self.factory)
    }
}

/// A node. Constructed only by the factory of its container.
///
/// Carries two independent relation sets: incident edges (both directions)
/// and, in tree containers, one parent and an ordered child list.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) identity: Identity,
    pub(crate) label: String,
    pub(crate) properties: PropertyList,
    pub(crate) incoming: SmallVec<[EdgeId; 4]>,
    pub(crate) outgoing: SmallVec<[EdgeId; 4]>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, identity: Identity, label: String, properties: PropertyList) -> Self {
        Self {
            id,
            identity,
            label,
            properties,
            incoming: SmallVec::new(),
            outgoing: SmallVec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The identity string; also the node's name in the text grammar.
    pub fn name(&self) -> &str {
        self.identity.as_str()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The factory that created this node.
    pub fn factory(&self) -> FactoryId {
        self.id.factory
    }

    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Shorthand for `properties().get(key).ok()`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.get(key).ok()
    }

    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    pub fn degree(&self, direction: Direction) -> usize {
        match direction {
            Direction::Outgoing => self.outgoing.len(),
            Direction::Incoming => self.incoming.len(),
            Direction::Both => self.outgoing.len() + self.incoming.len(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
