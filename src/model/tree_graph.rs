//! Tree with additional cross-links.
//!
//! Every node is a tree node. Edges are independent of the parent/child
//! relation: removing an edge never touches the hierarchy, and removing a
//! subtree drops every edge incident to any removed node.

use std::ops::Deref;

use super::{EdgeId, Elements, FactoryId, Hierarchy, NodeId};
use crate::identity::{Scope, ScopeConfig};
use crate::properties::{PropertyList, SharedSchema};
use crate::Result;

#[derive(Debug)]
pub struct TreeGraph {
    hierarchy: Hierarchy,
}

impl TreeGraph {
    pub fn new(scope: Box<dyn Scope>) -> Self {
        Self { hierarchy: Hierarchy::new(Elements::new(scope)) }
    }

    pub fn with_config(config: &ScopeConfig) -> Self {
        Self::new(config.build())
    }

    pub fn factory(&mut self) -> TreeGraphFactory<'_> {
        TreeGraphFactory { hierarchy: &mut self.hierarchy }
    }

    pub(crate) fn hierarchy_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }
}

impl Default for TreeGraph {
    fn default() -> Self {
        Self::with_config(&ScopeConfig::counter("treegraph"))
    }
}

impl Deref for TreeGraph {
    type Target = Hierarchy;

    fn deref(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

/// Sole creator and destroyer of a [`TreeGraph`]'s elements.
pub struct TreeGraphFactory<'t> {
    hierarchy: &'t mut Hierarchy,
}

impl TreeGraphFactory<'_> {
    pub fn id(&self) -> FactoryId {
        self.hierarchy.factory_id()
    }

    pub fn add_tree_node(
        &mut self,
        parent: Option<NodeId>,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<NodeId> {
        self.hierarchy.attach(parent, label, name, properties)
    }

    pub fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<EdgeId> {
        self.hierarchy.elements_mut().insert_edge(start, end, label, name, properties)
    }

    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.hierarchy.reparent(node, new_parent)
    }

    /// Remove `node` with its subtree and all their edges.
    pub fn remove_node(&mut self, node: NodeId) -> Result<usize> {
        self.hierarchy.remove_subtree(node)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        self.hierarchy.elements_mut().remove_edge(id).map(|_| ())
    }

    pub fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy.elements_mut().node_mut(id)?.properties)
    }

    pub fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut PropertyList> {
        Ok(&mut self.hierarchy.elements_mut().edge_mut(id)?.properties)
    }

    pub fn properties_mut(&mut self) -> &mut PropertyList {
        self.hierarchy.elements_mut().properties_mut()
    }

    pub fn schema_for(&mut self, label: &str) -> SharedSchema {
        self.hierarchy.elements_mut().schema_for(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    #[test]
    fn test_edges_independent_of_hierarchy() {
        let mut tg = TreeGraph::default();
        let mut f = tg.factory();
        let root = f.add_tree_node(None, "dir", Some("root"), None).unwrap();
        let a = f.add_tree_node(Some(root), "file", Some("a"), None).unwrap();
        let b = f.add_tree_node(Some(root), "file", Some("b"), None).unwrap();
        let link = f.add_edge(a, b, "symlink", None, None).unwrap();

        f.remove_edge(link).unwrap();
        assert_eq!(tg.children(root).unwrap(), &[a, b]);
        assert_eq!(tg.edge_count(), 0);
    }

    #[test]
    fn test_subtree_removal_drops_edges() {
        let mut tg = TreeGraph::default();
        let mut f = tg.factory();
        let root = f.add_tree_node(None, "n", None, None).unwrap();
        let a = f.add_tree_node(Some(root), "n", None, None).unwrap();
        let a1 = f.add_tree_node(Some(a), "n", None, None).unwrap();
        let b = f.add_tree_node(Some(root), "n", None, None).unwrap();
        f.add_edge(b, a1, "ref", None, None).unwrap();
        f.add_edge(root, b, "ref", None, None).unwrap();

        assert_eq!(f.remove_node(a).unwrap(), 2);
        assert_eq!(tg.node_count(), 2);
        assert_eq!(tg.edge_count(), 1);
        assert_eq!(tg.neighbours(b, Direction::Both).unwrap(), vec![root]);
    }

    #[test]
    fn test_edge_may_point_up_the_tree() {
        let mut tg = TreeGraph::default();
        let mut f = tg.factory();
        let root = f.add_tree_node(None, "n", None, None).unwrap();
        let leaf = f.add_tree_node(Some(root), "n", None, None).unwrap();
        f.add_edge(leaf, root, "up", None, None).unwrap();
        assert_eq!(tg.pre_order(), vec![root, leaf]);
        assert_eq!(tg.depth(leaf).unwrap(), 1);
    }
}
