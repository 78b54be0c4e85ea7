//! Read-only YAML node tree consumed by the converter.
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`]. Aliases
//! refer to their anchor by id, so identity (not structural equality) decides whether
//! two nodes are the same, and a tree may legally contain cycles.

use std::ops::Index;

use crate::error::Error;
use crate::location::Location;

/// Identity of a node inside one [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

// NodeId hashes as its plain index.
impl nohash_hasher::IsEnabled for NodeId {}

/// Presentation style of a scalar in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl From<saphyr_parser::ScalarStyle> for ScalarStyle {
    #[allow(unreachable_patterns)]
    fn from(style: saphyr_parser::ScalarStyle) -> Self {
        match style {
            saphyr_parser::ScalarStyle::Plain => ScalarStyle::Plain,
            saphyr_parser::ScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            saphyr_parser::ScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            saphyr_parser::ScalarStyle::Literal => ScalarStyle::Literal,
            saphyr_parser::ScalarStyle::Folded => ScalarStyle::Folded,
            _ => ScalarStyle::Plain,
        }
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A node with no kind and no content.
    Empty,
    /// A document root; valid documents wrap exactly one child.
    Document(Vec<NodeId>),
    /// Reference to an anchored node. `name` is the anchor name used for diagnostics.
    Alias { name: String, target: NodeId },
    Scalar { value: String, style: ScalarStyle },
    /// Flat key/value children: even positions are keys, odd positions are values.
    Mapping(Vec<NodeId>),
    Sequence(Vec<NodeId>),
}

/// One node of the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Tag as written or resolved by the parser (`!!int`, `tag:yaml.org,2002:int`, `!custom`).
    pub tag: Option<String>,
    /// Anchor name defined on this node, if any.
    pub anchor: Option<String>,
    pub location: Location,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            anchor: None,
            location: Location::UNKNOWN,
        }
    }

    /// True for an [`NodeKind::Empty`] node that carries neither tag nor anchor.
    pub fn is_zero(&self) -> bool {
        matches!(self.kind, NodeKind::Empty) && self.tag.is_none() && self.anchor.is_none()
    }

    fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Document(children) | NodeKind::Mapping(children) | NodeKind::Sequence(children) => {
                children
            }
            _ => &[],
        }
    }
}

/// Immutable arena of nodes with a designated root.
///
/// A `Tree` is plain data: it can be shared between threads and converted by several
/// independent calls at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn builder() -> TreeBuilder {
        TreeBuilder::new()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Build a tree from an arena the composer has already validated.
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

/// Builds a [`Tree`] by hand, for callers that bring their own parser.
///
/// ```rust
/// use saphyr_json::{Tree, Value};
///
/// let mut b = Tree::builder();
/// let key = b.scalar("answer");
/// let value = b.scalar("42");
/// let map = b.mapping(vec![key, value]);
/// let doc = b.document(vec![map]);
/// let tree = b.build(doc).unwrap();
///
/// let value = saphyr_json::jsonify(&tree, &saphyr_json::Options::default()).unwrap();
/// assert_eq!(value.get("answer"), Some(&Value::from(42i64)));
/// ```
///
/// Cycles are built by creating the container first and filling its children later
/// through [`TreeBuilder::node_mut`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Untagged plain scalar.
    pub fn scalar(&mut self, value: impl Into<String>) -> NodeId {
        self.scalar_with(value, ScalarStyle::Plain, None)
    }

    pub fn scalar_with(&mut self, value: impl Into<String>, style: ScalarStyle, tag: Option<&str>) -> NodeId {
        let mut node = Node::new(NodeKind::Scalar {
            value: value.into(),
            style,
        });
        node.tag = tag.map(str::to_owned);
        self.push(node)
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::new(NodeKind::Sequence(items)))
    }

    /// Mapping from flat `[key, value, key, value, ..]` children.
    pub fn mapping(&mut self, entries: Vec<NodeId>) -> NodeId {
        self.push(Node::new(NodeKind::Mapping(entries)))
    }

    pub fn document(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(Node::new(NodeKind::Document(children)))
    }

    pub fn alias(&mut self, name: impl Into<String>, target: NodeId) -> NodeId {
        self.push(Node::new(NodeKind::Alias {
            name: name.into(),
            target,
        }))
    }

    pub fn empty(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::Empty))
    }

    /// Mutable access to an already pushed node.
    ///
    /// # Panics
    /// If `id` was not produced by this builder.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Record `name` as the anchor of `id`.
    pub fn anchor(&mut self, id: NodeId, name: impl Into<String>) -> &mut Self {
        self.node_mut(id).anchor = Some(name.into());
        self
    }

    /// Finish the tree. Fails if the root or any child/alias reference is out of range.
    pub fn build(self, root: NodeId) -> Result<Tree, Error> {
        let len = self.nodes.len();
        let in_range = |id: &NodeId| id.0 < len;
        if !in_range(&root) {
            return Err(Error::msg(format!("root node {} does not exist", root.0)));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let bad_child = node.children().iter().find(|id| !in_range(*id));
            let bad_alias = match &node.kind {
                NodeKind::Alias { target, .. } if !in_range(target) => Some(target),
                _ => None,
            };
            if let Some(bad) = bad_child.or(bad_alias) {
                return Err(Error::msg(format!(
                    "node {index} references missing node {}",
                    bad.0
                ))
                .with_location(node.location));
            }
        }
        Ok(Tree {
            nodes: self.nodes,
            root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_dangling_references() {
        let mut b = TreeBuilder::new();
        let seq = b.sequence(vec![NodeId(7)]);
        assert!(b.build(seq).is_err());

        let mut b = TreeBuilder::new();
        let alias = b.alias("a", NodeId(3));
        assert!(b.build(alias).is_err());

        let b = TreeBuilder::new();
        assert!(b.build(NodeId(0)).is_err());
    }

    #[test]
    fn cycles_can_be_built() {
        let mut b = TreeBuilder::new();
        let seq = b.sequence(Vec::new());
        b.anchor(seq, "loop");
        let alias = b.alias("loop", seq);
        b.node_mut(seq).kind = NodeKind::Sequence(vec![alias]);
        let tree = b.build(seq).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[tree.root()].anchor.as_deref(), Some("loop"));
    }

    #[test]
    fn zero_node_requires_no_tag_and_no_anchor() {
        let mut node = Node::new(NodeKind::Empty);
        assert!(node.is_zero());
        node.tag = Some("!!str".into());
        assert!(!node.is_zero());
    }
}
