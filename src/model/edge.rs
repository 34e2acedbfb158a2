//! Edge: directed link between two nodes of the same container.

use serde::{Deserialize, Serialize};

use super::{FactoryId, NodeId};
use crate::identity::Identity;
use crate::properties::{PropertyList, Value};

/// Opaque edge handle. Embeds the factory that created the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId {
    pub(crate) factory: FactoryId,
    pub(crate) slot: u32,
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}@{}", self.slot, self.factory)
    }
}

/// A directed edge. Start and end are handles, not owners.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) identity: Identity,
    pub(crate) label: String,
    pub(crate) properties: PropertyList,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.as_str()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn factory(&self) -> FactoryId {
        self.id.factory
    }

    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.get(key).ok()
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// The "other" end of the edge from the given node.
    pub fn other_end(&self, from: NodeId) -> Option<NodeId> {
        if from == self.start { Some(self.end) }
        else if from == self.end { Some(self.start) }
        else { None }
    }
}
