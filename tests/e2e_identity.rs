//! Identity issuance across scopes and factories, and shared schemas across
//! large node populations.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use treegraph::properties::Schema;
use treegraph::{
    CounterScope, Error, ErrorCategory, GuidScope, Graph, PairScope, ProcessScope, PropertyList,
    PropertyType, ResettableScope, Scope, ScopeConfig, TreeGraph, Value,
};

fn all_scopes() -> Vec<Box<dyn Scope>> {
    vec![
        Box::new(CounterScope::new("counter")),
        Box::new(ResettableScope::new("resettable")),
        Box::new(GuidScope::new("guid")),
        Box::new(ProcessScope::new("process")),
        Box::new(PairScope::new(
            "pair",
            Box::new(CounterScope::new("left")),
            Box::new(CounterScope::new("right")),
        )),
    ]
}

// ============================================================================
// 1. Scopes
// ============================================================================

proptest! {
    #[test]
    fn prop_identities_pairwise_distinct(hints in prop::collection::vec(prop::option::of("[a-z]{0,3}[0-9]?"), 1..60)) {
        for mut scope in all_scopes() {
            let mut seen = HashSet::new();
            for hint in &hints {
                let id = scope.new_identity(hint.as_deref());
                prop_assert!(scope.contains(id.as_str()));
                prop_assert!(seen.insert(id.to_string()), "{} reissued {}", scope.name(), id);
            }
        }
    }

    #[test]
    fn prop_claims_never_reissued(claims in prop::collection::hash_set("n[0-9]{1,2}", 1..20)) {
        let mut scope = CounterScope::new("c");
        for claim in &claims {
            scope.claim(claim).unwrap();
        }
        for _ in 0..120 {
            let id = scope.new_identity(Some("n"));
            prop_assert!(!claims.contains(id.as_str()));
        }
    }
}

#[test]
fn test_collision_on_every_scope() {
    for mut scope in all_scopes() {
        let id = scope.new_identity(Some("x"));
        let err = scope.claim(id.as_str()).unwrap_err();
        assert!(matches!(err, Error::Collision { .. }), "{}", scope.name());
        assert_eq!(err.category(), ErrorCategory::Identity);
    }
}

#[test]
fn test_reset_allows_reissue() {
    let mut scope = ResettableScope::new("session");
    let first = scope.new_identity(Some("n"));
    scope.reset();
    assert!(!scope.contains(first.as_str()));
    assert_eq!(scope.new_identity(Some("n")), first);
}

// ============================================================================
// 2. Factories
// ============================================================================

#[test]
fn test_names_unique_across_nodes_and_edges() {
    let mut tg = TreeGraph::with_config(&ScopeConfig::counter("ids"));
    let mut f = tg.factory();
    let root = f.add_tree_node(None, "x", None, None).unwrap();
    let child = f.add_tree_node(Some(root), "x", None, None).unwrap();
    f.add_edge(root, child, "x", None, None).unwrap();

    let err = f.add_tree_node(Some(root), "y", Some("x0"), None).unwrap_err();
    assert!(matches!(err, Error::Collision { .. }));

    let mut names: Vec<String> = tg.nodes().map(|n| n.name().to_string()).collect();
    names.extend(tg.edges().map(|e| e.name().to_string()));
    assert_eq!(names, vec!["x0", "x1", "x2"]);
}

#[test]
fn test_factories_are_independent() {
    let mut a = Graph::default();
    let mut b = Graph::default();
    let na = a.factory().add_node("n", None, None).unwrap();
    let nb = b.factory().add_node("n", None, None).unwrap();

    assert_ne!(a.factory_id(), b.factory_id());
    assert_eq!(a.node(na).unwrap().name(), b.node(nb).unwrap().name());
    assert_eq!(a.node(na).unwrap().factory(), a.factory_id());
    assert!(matches!(a.node(nb), Err(Error::NotFound(_))));
}

// ============================================================================
// 3. Shared schemas
// ============================================================================

#[test]
fn test_shared_schema_population_update() {
    let mut g = Graph::default();
    let mut f = g.factory();
    let schema = f.schema_for("point");
    schema.add_key("x", PropertyType::Int).unwrap();
    schema.add_key("y", PropertyType::Double).unwrap();

    let ids: Vec<_> = (0..1000)
        .map(|_| f.add_node("point", None, Some(PropertyList::shared(&schema))).unwrap())
        .collect();
    f.node_properties_mut(ids[10]).unwrap().set("x", 42).unwrap();

    schema.add_key("z", PropertyType::String).unwrap();

    for id in &ids {
        let node = g.node(*id).unwrap();
        assert_eq!(node.get("z"), Some(Value::from("")));
        assert_eq!(node.properties().keys(), vec!["x", "y", "z"]);
    }
    assert_eq!(g.node(ids[10]).unwrap().get("x"), Some(Value::Int(42)));
    assert_eq!(g.node(ids[11]).unwrap().get("y"), Some(Value::Double(0.0)));
    assert!(schema.holders() > 1000);
}

#[test]
fn test_fixed_list_rejects_new_keys() {
    let mut g = Graph::default();
    let schema = Schema::new().with_key("x", PropertyType::Int);
    let mut f = g.factory();
    let id = f.add_node("p", None, Some(PropertyList::fixed(schema))).unwrap();
    let list = f.node_properties_mut(id).unwrap();
    assert!(matches!(list.add_key("y", PropertyType::Int), Err(Error::FixedSchema(_))));
    assert!(matches!(list.set("x", "text"), Err(Error::TypeMismatch { .. })));
    list.seal();
    assert!(matches!(list.set("x", 1), Err(Error::ReadOnly(_))));
}
