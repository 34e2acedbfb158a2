//! Plain directed graph and its factory.

use std::ops::Deref;

use super::{EdgeId, Elements, FactoryId, NodeId};
use crate::identity::{Scope, ScopeConfig};
use crate::properties::{PropertyList, SharedSchema};
use crate::Result;

/// A set of nodes and the edges between them.
///
/// Read access goes through `Deref<Target = Elements>`; every change goes
/// through [`Graph::factory`].
#[derive(Debug)]
pub struct Graph {
    elements: Elements,
}

impl Graph {
    pub fn new(scope: Box<dyn Scope>) -> Self {
        Self { elements: Elements::new(scope) }
    }

    pub fn with_config(config: &ScopeConfig) -> Self {
        Self::new(config.build())
    }

    pub fn factory(&mut self) -> GraphFactory<'_> {
        GraphFactory { elements: &mut self.elements }
    }

    pub(crate) fn elements_mut(&mut self) -> &mut Elements {
        &mut self.elements
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::with_config(&ScopeConfig::counter("graph"))
    }
}

impl Deref for Graph {
    type Target = Elements;

    fn deref(&self) -> &Elements {
        &self.elements
    }
}

/// Sole creator and destroyer of a [`Graph`]'s elements.
pub struct GraphFactory<'g> {
    elements: &'g mut Elements,
}

impl GraphFactory<'_> {
    pub fn id(&self) -> FactoryId {
        self.elements.factory_id()
    }

    /// Create a node. A given `name` is claimed from the scope as is;
    /// otherwise one is minted with the label as hint.
    pub fn add_node(
        &mut self,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<NodeId> {
        self.elements.insert_node(label, name, properties)
    }

    /// Create an edge. Fails with `DanglingEndpoint` when either endpoint
    /// is not a live node of this graph.
    pub fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        label: &str,
        name: Option<&str>,
        properties: Option<PropertyList>,
    ) -> Result<EdgeId> {
        self.elements.insert_edge(start, end, label, name, properties)
    }

    /// Remove a node along with its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.elements.remove_node(id).map(|_| ())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        self.elements.remove_edge(id).map(|_| ())
    }

    pub fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut PropertyList> {
        Ok(&mut self.elements.node_mut(id)?.properties)
    }

    pub fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut PropertyList> {
        Ok(&mut self.elements.edge_mut(id)?.properties)
    }

    /// Graph-level properties.
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        self.elements.properties_mut()
    }

    /// The shared schema registered for `label`, created empty on first use.
    pub fn schema_for(&mut self, label: &str) -> SharedSchema {
        self.elements.schema_for(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::GuidScope;
    use crate::model::Direction;
    use crate::properties::{PropertyType, Value};
    use crate::Error;

    #[test]
    fn test_build_small_graph() {
        let mut g = Graph::default();
        let mut f = g.factory();
        let a = f.add_node("city", Some("paris"), None).unwrap();
        let b = f.add_node("city", Some("lyon"), None).unwrap();
        let e = f.add_edge(a, b, "road", None, None).unwrap();
        f.edge_properties_mut(e).unwrap().insert("km", 465).unwrap();

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        let edge = g.edge(e).unwrap();
        assert_eq!((edge.start(), edge.end()), (a, b));
        assert_eq!(edge.get("km"), Some(Value::Int(465)));
        assert_eq!(edge.factory(), g.factory_id());
        assert_eq!(g.neighbours(a, Direction::Outgoing).unwrap(), vec![b]);
        assert!(g.neighbours(a, Direction::Incoming).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_endpoint_is_dangling() {
        let mut g1 = Graph::default();
        let mut g2 = Graph::new(Box::new(GuidScope::new("other")));
        let a = g1.factory().add_node("x", None, None).unwrap();
        let b = g2.factory().add_node("x", None, None).unwrap();
        let err = g1.factory().add_edge(a, b, "bad", None, None).unwrap_err();
        assert!(matches!(err, Error::DanglingEndpoint(_)));
        assert!(matches!(g1.node(b), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_removed_node_is_dangling() {
        let mut g = Graph::default();
        let mut f = g.factory();
        let a = f.add_node("x", None, None).unwrap();
        let b = f.add_node("x", None, None).unwrap();
        f.remove_node(b).unwrap();
        assert!(matches!(f.add_edge(a, b, "e", None, None), Err(Error::DanglingEndpoint(_))));
        assert!(matches!(f.remove_node(b), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_graph_level_properties() {
        let mut g = Graph::default();
        g.factory().properties_mut().insert("title", "map").unwrap();
        assert_eq!(g.properties().get("title").unwrap(), Value::from("map"));
    }

    #[test]
    fn test_shared_schema_via_factory() {
        let mut g = Graph::default();
        let mut f = g.factory();
        let schema = f.schema_for("point");
        schema.add_key("x", PropertyType::Int).unwrap();
        let p = f.add_node("point", None, Some(PropertyList::shared(&schema))).unwrap();
        f.schema_for("point").add_key("y", PropertyType::Int).unwrap();
        assert_eq!(g.node(p).unwrap().get("y"), Some(Value::Int(0)));
        assert!(g.schema("point").is_some());
    }
}
