//! Reference tokenizer and matcher.
//!
//! A reference is a path of segments, outermost ancestor first:
//!
//! ```text
//! dir:root/dir:src/file:main+lang=rust
//! ```
//!
//! Each segment is `[label]:[name]` followed by any number of
//! `+key=value` filters. An empty label or name matches anything; a
//! segment without a colon is a bare name. The last segment names the
//! target, and every earlier segment must match the parent of the node
//! matched by the segment after it.

use std::fmt;

use smallvec::SmallVec;

use super::grammar::{FILTER_SEP, LABEL_SEP, PATH_SEP};
use crate::model::{Elements, Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTokenKind {
    Word,
    Colon,
    Slash,
    Plus,
    Eq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefToken {
    pub kind: RefTokenKind,
    /// Byte offset in the reference text.
    pub offset: usize,
    pub text: String,
}

fn punct(kind: RefTokenKind, offset: usize, text: &str) -> RefToken {
    RefToken { kind, offset, text: text.to_string() }
}

/// Split reference text into tokens. Double-quoted words may contain
/// punctuation and spaces.
pub fn tokenize(input: &str) -> Result<Vec<RefToken>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }
            ':' => { chars.next(); tokens.push(punct(RefTokenKind::Colon, pos, ":")); }
            PATH_SEP => { chars.next(); tokens.push(punct(RefTokenKind::Slash, pos, "/")); }
            '+' => { chars.next(); tokens.push(punct(RefTokenKind::Plus, pos, "+")); }
            '=' => { chars.next(); tokens.push(punct(RefTokenKind::Eq, pos, "=")); }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = chars.next() {
                                s.push(escaped);
                            }
                        }
                        Some((_, '"')) => break,
                        Some((_, c)) => s.push(c),
                        None => return Err(format!("unterminated quote at offset {pos}")),
                    }
                }
                tokens.push(RefToken { kind: RefTokenKind::Word, offset: pos, text: s });
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ':' | '/' | '+' | '=' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(RefToken { kind: RefTokenKind::Word, offset: pos, text: word });
            }
        }
    }
    Ok(tokens)
}

/// One step of a reference path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub label: Option<String>,
    pub name: Option<String>,
    pub filters: SmallVec<[(String, String); 2]>,
}

impl Segment {
    pub fn matches(&self, node: &Node) -> bool {
        if self.label.as_deref().is_some_and(|l| l != node.label()) {
            return false;
        }
        if self.name.as_deref().is_some_and(|n| n != node.name()) {
            return false;
        }
        self.filters.iter().all(|(key, expected)| {
            node.get(key).is_some_and(|v| v.to_string() == *expected)
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{LABEL_SEP}{}",
            self.label.as_deref().unwrap_or(""),
            self.name.as_deref().unwrap_or("")
        )?;
        for (key, value) in &self.filters {
            write!(f, "{FILTER_SEP}{key}={value}")?;
        }
        Ok(())
    }
}

/// A parsed pointer to a node, kept with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    text: String,
    segments: SmallVec<[Segment; 4]>,
}

impl Reference {
    pub fn parse(text: &str) -> Result<Self, String> {
        let tokens = tokenize(text)?;
        let mut segments = SmallVec::new();
        let mut pos = 0;
        loop {
            let (segment, next) = parse_segment(&tokens, pos)?;
            segments.push(segment);
            pos = next;
            match tokens.get(pos) {
                None => break,
                Some(t) if t.kind == RefTokenKind::Slash => pos += 1,
                Some(t) => return Err(format!("unexpected '{}' at offset {}", t.text, t.offset)),
            }
        }
        Ok(Self { text: text.trim().to_string(), segments })
    }

    /// Reference to a node by label and name, as the exporter writes it.
    pub fn to_node(label: &str, name: &str) -> Self {
        let segment = Segment {
            label: Some(label.to_string()),
            name: Some(name.to_string()),
            filters: SmallVec::new(),
        };
        Self { text: segment.to_string(), segments: smallvec::smallvec![segment] }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment naming the target node.
    pub fn target(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Every node the reference matches, in insertion order.
    pub fn resolve(&self, elements: &Elements) -> Vec<NodeId> {
        let Some(target) = self.target() else {
            return Vec::new();
        };
        let candidates: Vec<&Node> = match (&target.name, &target.label) {
            (Some(name), _) => elements.find_by_name(name).into_iter().collect(),
            (None, Some(label)) => elements.nodes_with_label(label),
            (None, None) => elements.nodes().collect(),
        };
        candidates
            .into_iter()
            .filter(|node| target.matches(node) && self.ancestors_match(elements, node))
            .map(Node::id)
            .collect()
    }

    fn ancestors_match(&self, elements: &Elements, node: &Node) -> bool {
        let mut current = node.parent();
        for segment in self.segments.iter().rev().skip(1) {
            let Some(parent) = current.and_then(|p| elements.node(p).ok()) else {
                return false;
            };
            if !segment.matches(parent) {
                return false;
            }
            current = parent.parent();
        }
        true
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn parse_segment(tokens: &[RefToken], mut pos: usize) -> Result<(Segment, usize), String> {
    let word_at = |pos: usize| {
        tokens
            .get(pos)
            .filter(|t| t.kind == RefTokenKind::Word)
            .map(|t| t.text.clone())
    };
    let mut segment = Segment::default();

    let first = word_at(pos);
    if first.is_some() {
        pos += 1;
    }
    if tokens.get(pos).is_some_and(|t| t.kind == RefTokenKind::Colon) {
        pos += 1;
        segment.label = first;
        segment.name = word_at(pos);
        if segment.name.is_some() {
            pos += 1;
        }
    } else {
        segment.name = Some(first.ok_or_else(|| match tokens.get(pos) {
            Some(t) => format!("expected a segment at offset {}, found '{}'", t.offset, t.text),
            None => "empty reference segment".to_string(),
        })?);
    }

    while tokens.get(pos).is_some_and(|t| t.kind == RefTokenKind::Plus) {
        let key = word_at(pos + 1).ok_or("expected a filter key after '+'")?;
        if !tokens.get(pos + 2).is_some_and(|t| t.kind == RefTokenKind::Eq) {
            return Err(format!("expected '=' after filter key '{key}'"));
        }
        let value = word_at(pos + 3).ok_or_else(|| format!("expected a value for filter '{key}'"))?;
        segment.filters.push((key, value));
        pos += 4;
    }
    Ok((segment, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize() {
        let kinds: Vec<_> = tokenize("a:b/:c+k=\"x y\"").unwrap().into_iter().map(|t| t.kind).collect();
        use RefTokenKind::*;
        assert_eq!(kinds, vec![Word, Colon, Word, Slash, Colon, Word, Plus, Word, Eq, Word]);
    }

    #[test]
    fn test_parse_segments() {
        let r = Reference::parse("dir:root/:src/main+lang=rust").unwrap();
        assert_eq!(r.segments().len(), 3);
        assert_eq!(r.segments()[0].label.as_deref(), Some("dir"));
        assert_eq!(r.segments()[1].label, None);
        assert_eq!(r.segments()[1].name.as_deref(), Some("src"));
        let target = r.target().unwrap();
        assert_eq!(target.name.as_deref(), Some("main"));
        assert_eq!(target.filters.as_slice(), &[("lang".to_string(), "rust".to_string())]);
    }

    #[test]
    fn test_wildcards() {
        let r = Reference::parse("file:").unwrap();
        assert_eq!(r.target().unwrap().label.as_deref(), Some("file"));
        assert_eq!(r.target().unwrap().name, None);
        let any = Reference::parse(":").unwrap();
        assert_eq!(any.target().unwrap(), &Segment::default());
    }

    #[test]
    fn test_malformed() {
        assert!(Reference::parse("").is_err());
        assert!(Reference::parse("a:b/").is_err());
        assert!(Reference::parse("a:b+k").is_err());
        assert!(Reference::parse("a:b c").is_err());
        assert!(Reference::parse("a:\"open").is_err());
    }

    #[test]
    fn test_resolve_through_ancestors() {
        let mut t = Tree::default();
        let mut f = t.factory();
        let root = f.add_tree_node(None, "dir", Some("root"), None).unwrap();
        let a = f.add_tree_node(Some(root), "dir", Some("a"), None).unwrap();
        let b = f.add_tree_node(Some(root), "dir", Some("b"), None).unwrap();
        let fa = f.add_tree_node(Some(a), "file", Some("x"), None).unwrap();
        let fb = f.add_tree_node(Some(b), "file", Some("y"), None).unwrap();
        f.node_properties_mut(fb).unwrap().insert("size", 3).unwrap();

        assert_eq!(Reference::parse("file:").unwrap().resolve(&t), vec![fa, fb]);
        assert_eq!(Reference::parse(":a/file:").unwrap().resolve(&t), vec![fa]);
        assert_eq!(Reference::parse("dir:root/:b/:").unwrap().resolve(&t), vec![fb]);
        assert_eq!(Reference::parse("file:+size=3").unwrap().resolve(&t), vec![fb]);
        assert!(Reference::parse(":b/file:x").unwrap().resolve(&t).is_empty());
        assert_eq!(Reference::to_node("dir", "b").resolve(&t), vec![b]);
    }
}
