//! # Element Model
//!
//! Nodes and edges live in an arena owned by their container (`Graph`,
//! `Tree`, `TreeGraph`). Each container hands out exactly one kind of
//! factory, the only way to create or destroy elements.
//!
//! Handles (`NodeId`, `EdgeId`) are plain copyable values that embed the
//! `FactoryId` of their creator, so a handle from another container is
//! recognised instead of silently aliasing a local slot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub mod node;
pub mod edge;
pub mod store;
pub mod hierarchy;
pub mod graph;
pub mod tree;
pub mod tree_graph;

pub use node::{Node, NodeId};
pub use edge::{Edge, EdgeId};
pub use store::Elements;
pub use hierarchy::Hierarchy;
pub use graph::{Graph, GraphFactory};
pub use tree::{Tree, TreeFactory};
pub use tree_graph::{TreeGraph, TreeGraphFactory};

static NEXT_FACTORY: AtomicU64 = AtomicU64::new(1);

/// Identifies the factory (and so the container) that created an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactoryId(u64);

impl FactoryId {
    pub(crate) fn next() -> Self {
        FactoryId(NEXT_FACTORY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FactoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Direction for incident-edge queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}
