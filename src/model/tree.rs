//! Single-rooted tree and its factory.

use std::ops::Deref;

use super::{FactoryId, Hierarchy, NodeId};
use crate::identity::{Scope, ScopeConfig};
use crate::model::Elements;
use crate::properties::{PropertyList, SharedSchema};
use crate::Result;

/// Nodes linked only by parent/child relations. Every node is reachable
/// from the single root.
#[derive(Debug)]
pub struct Tree {
    hierarchy: Hierarchy,
}

impl Tree {
    pub fn new(scope: Box<dyn Scope>) -> Self {
        Self { hierarchy: Hierarchy::new(Elements::new(scope)) }
    }

    pub fn with_config(config: &ScopeConfig) -> Self {
        Self::new(config.build())
    }

    pub fn factory(&mut self) -> TreeFactory<'_> {
        TreeFactory { hierarchy: &mut self.hierarchy }
    }

    pub(crate) fn hierarchy_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::with_config(&ScopeConfig::counter("tree"))
    }
}

impl Deref for Tree {
    type Target = Hierarchy;

    fn deref(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

/// Sole creator and destroyer of a [`Tree`]'s nodes.
pub struct TreeFactory<'t> {
    hierarchy: &'t mut Hierarchy,
}

impl TreeFactory<'_> {
    pub fn id(&self) -> FactoryId {
        self.hierarchy.factory_id()
    }

    /// Create a node under `parent`, or the root when `parent` is `None`.
    ///
    /// Fails with `MultipleRoots` when asked for a second root and with
    /// `NotFound` when `parent` is not a node of this tree.
    pub fn add_tree_node(
        &mut self,
        parent: Option<NodeId>,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<NodeId> {
        self.hierarchy.attach(parent, label, name, properties)
    }

    /// Move `node` under `new_parent`, appended after its existing children.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.hierarchy.reparent(node, new_parent)
    }

    /// Remove `node` with its whole subtree; returns the number of nodes removed.
    pub fn remove_node(&mut self, node: NodeId) -> Result<usize> {
        self.hierarchy.remove_subtree(node)
    }

    pub fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy.elements_mut().node_mut(id)?.properties)
    }

    /// Tree-level properties.
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        self.hierarchy.elements_mut().properties_mut()
    }

    pub fn schema_for(&mut self, label: &str) -> SharedSchema {
        self.hierarchy.elements_mut().schema_for(label)
    }
}
