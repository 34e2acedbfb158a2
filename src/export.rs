//! Text export: write a container back in the line grammar.
//!
//! Produces text that parses back into an equivalent structure:
//!
//! ```text
//! Tree → export_tree() → "tree // saved by …" → text::parse_tree() → Tree
//! ```
//!
//! Graph nodes come out in insertion order, tree nodes in pre-order, and
//! edges after all nodes so every reference they carry is already defined.
//! Labels, names and keys must be plain words; anything else is refused
//! with `ValueFormat` rather than written ambiguously.

use std::io::Write;

use crate::model::{Edge, Elements, Graph, Hierarchy, Node, NodeId, Tree, TreeGraph};
use crate::properties::{PropertyList, Value};
use crate::text::grammar::{self, Dialect};
use crate::text::Document;
use crate::{Error, Result};

/// Export a graph in the `graph` dialect.
pub fn export_graph(graph: &Graph, writer: &mut dyn Write) -> Result<()> {
    write_header(writer, Dialect::Graph, graph)?;
    write_properties(writer, graph, graph.properties(), 0)?;
    for node in graph.nodes() {
        writeln!(writer, "{}", node_line(node)?)?;
        write_properties(writer, graph, node.properties(), 1)?;
    }
    write_edges(writer, graph)
}

/// Export a tree in the `tree` dialect, one tab per level.
pub fn export_tree(tree: &Tree, writer: &mut dyn Write) -> Result<()> {
    write_header(writer, Dialect::Tree, tree)?;
    write_hierarchy(writer, tree)
}

/// Export a tree-graph: the nested nodes first, then every edge unindented.
pub fn export_tree_graph(tree_graph: &TreeGraph, writer: &mut dyn Write) -> Result<()> {
    write_header(writer, Dialect::TreeGraph, tree_graph)?;
    write_hierarchy(writer, tree_graph)?;
    write_edges(writer, tree_graph)
}

pub fn export_document(document: &Document, writer: &mut dyn Write) -> Result<()> {
    match document {
        Document::Graph(g) => export_graph(g, writer),
        Document::Tree(t) => export_tree(t, writer),
        Document::TreeGraph(tg) => export_tree_graph(tg, writer),
    }
}

pub fn graph_to_text(graph: &Graph) -> Result<String> {
    to_text(|w| export_graph(graph, w))
}

pub fn tree_to_text(tree: &Tree) -> Result<String> {
    to_text(|w| export_tree(tree, w))
}

pub fn tree_graph_to_text(tree_graph: &TreeGraph) -> Result<String> {
    to_text(|w| export_tree_graph(tree_graph, w))
}

fn to_text(export: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<String> {
    let mut buf = Vec::new();
    export(&mut buf)?;
    String::from_utf8(buf).map_err(|e| invalid(format!("exported text is not UTF-8: {e}")))
}

// ============================================================================
// Sections
// ============================================================================

fn write_header(writer: &mut dyn Write, dialect: Dialect, elements: &Elements) -> Result<()> {
    writeln!(
        writer,
        "{dialect} // saved by treegraph on {}",
        chrono::Utc::now().to_rfc3339()
    )?;
    writeln!(writer, "// {} NODES", elements.node_count())?;
    if dialect.has_edges() {
        writeln!(writer, "// {} EDGES", elements.edge_count())?;
    }
    Ok(())
}

fn write_hierarchy(writer: &mut dyn Write, hierarchy: &Hierarchy) -> Result<()> {
    write_properties(writer, hierarchy, hierarchy.properties(), 0)?;
    for (id, depth) in hierarchy.pre_order_with_depth() {
        let node = hierarchy.node(id)?;
        writeln!(writer, "{}{}", indent(depth), node_line(node)?)?;
        write_properties(writer, hierarchy, node.properties(), depth + 1)?;
    }
    Ok(())
}

fn write_edges(writer: &mut dyn Write, elements: &Elements) -> Result<()> {
    for edge in elements.edges() {
        writeln!(writer, "{}", edge_line(elements, edge)?)?;
        write_properties(writer, elements, edge.properties(), 1)?;
    }
    Ok(())
}

fn write_properties(
    writer: &mut dyn Write,
    elements: &Elements,
    properties: &PropertyList,
    depth: usize,
) -> Result<()> {
    for (key, ty, value) in properties.iter() {
        let body = match &value {
            Value::Node(id) => reference_to(elements, *id)?,
            other => grammar::format_literal(other),
        };
        writeln!(
            writer,
            "{}{} {} {}({body})",
            indent(depth),
            word(&key)?,
            grammar::ASSIGN,
            grammar::type_name(ty),
        )?;
    }
    Ok(())
}

// ============================================================================
// Lines
// ============================================================================

fn node_line(node: &Node) -> Result<String> {
    Ok(format!("{}{}{}", word(node.label())?, grammar::LABEL_SEP, word(node.name())?))
}

fn edge_line(elements: &Elements, edge: &Edge) -> Result<String> {
    Ok(format!(
        "{} {}{}{} {}",
        bracketed(elements, edge.start())?,
        word(edge.label())?,
        grammar::LABEL_SEP,
        word(edge.name())?,
        bracketed(elements, edge.end())?,
    ))
}

fn bracketed(elements: &Elements, id: NodeId) -> Result<String> {
    Ok(format!("{}{}{}", grammar::REF_OPEN, reference_to(elements, id)?, grammar::REF_CLOSE))
}

/// Names are unique per factory, so `label:name` resolves to one node.
fn reference_to(elements: &Elements, id: NodeId) -> Result<String> {
    node_line(elements.node(id)?)
}

fn word(s: &str) -> Result<&str> {
    if grammar::is_word(s) {
        Ok(s)
    } else {
        Err(invalid(format!("'{s}' cannot be written as a bare word")))
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

fn invalid(message: String) -> Error {
    Error::ValueFormat { line: 0, column: 0, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PairScope;
    use crate::properties::{PropertyType, ScalarType, Table};
    use crate::text;
    use crate::ScopeConfig;
    use pretty_assertions::assert_eq;

    fn body(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.starts_with("//")).skip(1).collect()
    }

    #[test]
    fn test_graph_layout() {
        let mut g = Graph::default();
        let mut f = g.factory();
        f.properties_mut().insert("title", "map").unwrap();
        let a = f.add_node("city", Some("paris"), None).unwrap();
        let b = f.add_node("city", Some("lyon"), None).unwrap();
        f.node_properties_mut(a).unwrap().insert("pop", 2_100_000i64).unwrap();
        let e = f.add_edge(a, b, "road", Some("a6"), None).unwrap();
        f.edge_properties_mut(e).unwrap().insert("km", 465).unwrap();

        let out = graph_to_text(&g).unwrap();
        assert!(out.starts_with("graph // saved by treegraph on "));
        assert!(out.contains("// 2 NODES\n// 1 EDGES\n"));
        assert_eq!(
            body(&out),
            vec![
                "title = String(\"map\")",
                "city:paris",
                "\tpop = Long(2100000)",
                "city:lyon",
                "[city:paris] road:a6 [city:lyon]",
                "\tkm = Integer(465)",
            ]
        );
    }

    #[test]
    fn test_tree_layout() {
        let mut t = Tree::default();
        let mut f = t.factory();
        let root = f.add_tree_node(None, "dir", Some("root"), None).unwrap();
        let src = f.add_tree_node(Some(root), "dir", Some("src"), None).unwrap();
        f.add_tree_node(Some(src), "file", Some("lib"), None).unwrap();
        f.add_tree_node(Some(root), "file", Some("readme"), None).unwrap();
        f.node_properties_mut(src).unwrap().insert("hidden", false).unwrap();

        let out = tree_to_text(&t).unwrap();
        assert!(!out.contains("EDGES"));
        assert_eq!(
            body(&out),
            vec![
                "dir:root",
                "\tdir:src",
                "\t\thidden = Boolean(false)",
                "\t\tfile:lib",
                "\tfile:readme",
            ]
        );
    }

    #[test]
    fn test_ref_and_table_values() {
        let mut tg = TreeGraph::default();
        let mut f = tg.factory();
        let root = f.add_tree_node(None, "n", Some("r"), None).unwrap();
        let leaf = f.add_tree_node(Some(root), "n", Some("l"), None).unwrap();
        let props = f.node_properties_mut(root).unwrap();
        props.insert("first", Value::Node(leaf)).unwrap();
        props.add_key("none", PropertyType::NodeRef).unwrap();
        let table = Table::from_cells(ScalarType::Int, &[2], vec![Value::Int(1), Value::Int(2)]).unwrap();
        props.insert("cells", Value::Table(table)).unwrap();

        let out = tree_graph_to_text(&tg).unwrap();
        let lines = body(&out);
        assert_eq!(lines[1], "\tfirst = Ref(n:l)");
        assert_eq!(lines[2], "\tnone = Ref()");
        assert_eq!(lines[3], "\tcells = IntTable(([2]1,2))");
    }

    #[test]
    fn test_non_word_name_is_refused() {
        let scope = PairScope::new(
            "pairs",
            ScopeConfig::counter("a").build(),
            ScopeConfig::counter("b").build(),
        );
        let mut g = Graph::new(Box::new(scope));
        g.factory().add_node("x", None, None).unwrap();
        assert!(matches!(graph_to_text(&g), Err(Error::ValueFormat { .. })));
    }

    #[test]
    fn test_document_dispatch() {
        let doc = text::parse("treegraph\nr:root\n\tc:child\n[c:child] up [r:root]").unwrap();
        let mut buf = Vec::new();
        export_document(&doc, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("treegraph "));
        assert!(out.contains("[c:child] up:up0 [r:root]"));
    }
}
