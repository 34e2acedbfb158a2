//! Parent/child relation layered over an element arena.
//!
//! Shared by `Tree` and `TreeGraph`. Orderings follow child insertion
//! order, so walking the same hierarchy twice gives the same sequence.

use std::collections::VecDeque;
use std::ops::Deref;

use tracing::debug;

use super::{Elements, NodeId};
use crate::properties::PropertyList;
use crate::{Error, Result};

#[derive(Debug)]
pub struct Hierarchy {
    elements: Elements,
    root: Option<NodeId>,
}

impl Hierarchy {
    pub(crate) fn new(elements: Elements) -> Self {
        Self { elements, root: None }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.elements.node(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> Result<&[NodeId]> {
        Ok(self.elements.node(node)?.children())
    }

    /// Number of parent steps from `node` to the root.
    pub fn depth(&self, node: NodeId) -> Result<usize> {
        let mut depth = 0;
        let mut current = self.elements.node(node)?.parent;
        while let Some(p) = current {
            depth += 1;
            current = self.elements.node(p)?.parent;
        }
        Ok(depth)
    }

    /// Whether `ancestor` lies on the parent chain of `node` (or is `node`).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return Ok(true);
            }
            current = self.elements.node(n)?.parent;
        }
        Ok(false)
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.elements.node(node)?.parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.elements.node(p)?.parent;
        }
        Ok(chain)
    }

    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_with_depth().into_iter().map(|(n, _)| n).collect()
    }

    /// Pre-order walk from the root, each node paired with its depth.
    pub fn pre_order_with_depth(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.elements.node_count());
        let mut stack: Vec<(NodeId, usize)> = self.root.into_iter().map(|r| (r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            if let Ok(node) = self.elements.node(id) {
                stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
            }
        }
        out
    }

    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.elements.node_count());
        let mut stack: Vec<(NodeId, bool)> = self.root.into_iter().map(|r| (r, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            if let Ok(node) = self.elements.node(id) {
                stack.extend(node.children.iter().rev().map(|c| (*c, false)));
            }
        }
        out
    }

    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.elements.node_count());
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            out.push(id);
            if let Ok(node) = self.elements.node(id) {
                queue.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// Post-order walk of the subtree under `node`, `node` last.
    fn subtree_post_order(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.elements.node(node)?;
        let mut out = Vec::new();
        let mut stack = vec![(node, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.elements.node(id)?.children.iter().rev().map(|c| (*c, false)));
        }
        Ok(out)
    }

    // ========================================================================
    // Mutation (factories only)
    // ========================================================================

    pub(crate) fn elements_mut(&mut self) -> &mut Elements {
        &mut self.elements
    }

    fn check_acyclic(&self, node: NodeId, parent: NodeId) -> Result<()> {
        if self.is_ancestor(node, parent)? {
            return Err(Error::Cycle {
                node: self.elements.node(node)?.name().to_string(),
                parent: self.elements.node(parent)?.name().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn attach(
        &mut self,
        parent: Option<NodeId>,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<NodeId> {
        match parent {
            None => {
                if let Some(existing) = self.root {
                    return Err(Error::MultipleRoots {
                        existing: self.elements.node(existing)?.name().to_string(),
                    });
                }
            }
            Some(p) => {
                self.elements.node(p)?;
            }
        }
        let id = self.elements.insert_node(label, name, properties)?;
        match parent {
            None => self.root = Some(id),
            Some(p) => {
                self.check_acyclic(id, p)?;
                self.elements.node_mut(id)?.parent = Some(p);
                self.elements.node_mut(p)?.children.push(id);
            }
        }
        Ok(id)
    }

    pub(crate) fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.elements.node(new_parent)?;
        self.check_acyclic(node, new_parent)?;
        if let Some(old) = self.elements.node(node)?.parent {
            self.elements.node_mut(old)?.children.retain(|c| *c != node);
        }
        self.elements.node_mut(node)?.parent = Some(new_parent);
        self.elements.node_mut(new_parent)?.children.push(node);
        Ok(())
    }

    /// Remove `node` and its whole subtree, with every incident edge.
    pub(crate) fn remove_subtree(&mut self, node: NodeId) -> Result<usize> {
        let doomed = self.subtree_post_order(node)?;
        if let Some(parent) = self.elements.node(node)?.parent {
            self.elements.node_mut(parent)?.children.retain(|c| *c != node);
        }
        if self.root == Some(node) {
            self.root = None;
        }
        for id in &doomed {
            self.elements.remove_node(*id)?;
        }
        debug!(removed = doomed.len(), "removed subtree");
        Ok(doomed.len())
    }
}

impl Deref for Hierarchy {
    type Target = Elements;

    fn deref(&self) -> &Elements {
        &self.elements
    }
}
