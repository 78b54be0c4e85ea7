//! Node tree to [`Value`] conversion.
//!
//! A [`Session`] is created per call and walks the tree recursively. Every visited
//! node passes through the alias guard first, so the counters see alias expansions
//! exactly as often as they are materialized.

use serde::Serialize;

use crate::alias_guard::AliasGuard;
use crate::error::Error;
use crate::merge::is_merge_key;
use crate::node::{Node, NodeId, NodeKind, Tree};
use crate::normalize::scalar_to_value;
use crate::options::{DuplicateKeyPolicy, Options};
use crate::ordered_map::OrderedMap;
use crate::parse_scalars::resolve_scalar;
use crate::value::Value;

/// Statistics of one conversion call, handed to [`Options::decode_report`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    /// Nodes visited, alias expansions included.
    pub decodes: usize,
    /// Nodes visited while at least one alias was being expanded.
    pub alias_decodes: usize,
    /// Deepest alias nesting reached.
    pub max_alias_depth: usize,
    /// Number of `<<` merge keys applied.
    pub merges: usize,
    /// `true` when the conversion returned an error.
    pub failed: bool,
}

/// Convert the root of `tree` into a JSON-safe [`Value`].
///
/// Mapping order is preserved, `<<` merges are applied, aliases are expanded (and
/// rejected when cyclic or excessive) and non-finite floats are replaced by the
/// sentinels configured in `options`.
///
/// ```rust
/// use saphyr_json::{Options, Tree, jsonify, to_string};
///
/// let mut b = Tree::builder();
/// let (k1, v1) = (b.scalar("z"), b.scalar("1"));
/// let (k2, v2) = (b.scalar("a"), b.scalar("two"));
/// let map = b.mapping(vec![k1, v1, k2, v2]);
/// let tree = b.build(map).unwrap();
///
/// let value = jsonify(&tree, &Options::default()).unwrap();
/// assert_eq!(to_string(&value).unwrap(), r#"{"z":1,"a":"two"}"#);
/// ```
pub fn jsonify(tree: &Tree, options: &Options) -> Result<Value, Error> {
    let mut session = Session::new(tree, options);
    let result = session.convert(tree.root());
    if let Some(report) = options.decode_report {
        report(&session.report(result.is_err()));
    }
    result
}

/// State of one conversion call.
pub(crate) struct Session<'a> {
    pub(crate) tree: &'a Tree,
    options: &'a Options,
    guard: AliasGuard,
    /// Open mappings, sequences and aliases on the current path.
    nesting: usize,
    pub(crate) merges: usize,
}

impl<'a> Session<'a> {
    pub(crate) fn new(tree: &'a Tree, options: &'a Options) -> Self {
        Self {
            tree,
            options,
            guard: AliasGuard::new(options.alias_limits),
            nesting: 0,
            merges: 0,
        }
    }

    pub(crate) fn convert(&mut self, id: NodeId) -> Result<Value, Error> {
        let tree = self.tree;
        let node = &tree[id];
        self.guard.visit(node.location)?;

        if !matches!(
            node.kind,
            NodeKind::Mapping(_) | NodeKind::Sequence(_) | NodeKind::Alias { .. }
        ) {
            return self.convert_node(node);
        }
        self.nesting += 1;
        if self.nesting > self.options.alias_limits.max_nesting_depth {
            let depth = self.nesting;
            self.nesting -= 1;
            return Err(Error::NestingDepth {
                depth,
                location: node.location,
            });
        }
        let result = self.convert_node(node);
        self.nesting -= 1;
        result
    }

    fn convert_node(&mut self, node: &'a Node) -> Result<Value, Error> {
        match &node.kind {
            NodeKind::Document(children) => match children.as_slice() {
                [child] => self.convert(*child),
                _ => Err(Error::InvalidDocument {
                    children: children.len(),
                    location: node.location,
                }),
            },
            NodeKind::Alias { name, target } => self.alias(node, name, *target),
            NodeKind::Scalar { value, style } => {
                let scalar = resolve_scalar(value, *style, node.tag.as_deref(), self.options.scalar_config())
                    .map_err(|err| err.with_location(node.location))?;
                Ok(scalar_to_value(scalar, self.options))
            }
            NodeKind::Mapping(children) => self.mapping(node, children),
            NodeKind::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for &item in items {
                    out.push(self.convert(item)?);
                }
                Ok(Value::Sequence(out))
            }
            NodeKind::Empty if node.is_zero() => Ok(Value::Null),
            NodeKind::Empty => Err(Error::UnknownNodeKind {
                location: node.location,
            }),
        }
    }

    fn alias(&mut self, node: &Node, name: &str, target: NodeId) -> Result<Value, Error> {
        let tree = self.tree;
        let name = if name.is_empty() {
            tree[target].anchor.as_deref().unwrap_or_default()
        } else {
            name
        };
        self.guard.enter(target, name, node.location)?;
        let result = self.convert(target);
        self.guard.leave(target);
        result
    }

    fn mapping(&mut self, node: &Node, children: &[NodeId]) -> Result<Value, Error> {
        if children.len() % 2 != 0 {
            return Err(Error::msg("mapping key has no value").with_location(node.location));
        }
        let tree = self.tree;
        let mut map = OrderedMap::with_capacity(children.len() / 2);
        for pair in children.chunks_exact(2) {
            let (key_id, value_id) = (pair[0], pair[1]);
            let key_node = &tree[key_id];
            if is_merge_key(key_node) {
                self.merge_into(&mut map, value_id)?;
                continue;
            }
            let key = self.key(key_id)?;
            let duplicate = map.contains_explicit(&key);
            if duplicate && self.options.duplicate_keys == DuplicateKeyPolicy::Error {
                return Err(Error::DuplicateKey {
                    key,
                    location: key_node.location,
                });
            }
            let value = self.convert(value_id)?;
            if !(duplicate && self.options.duplicate_keys == DuplicateKeyPolicy::FirstWins) {
                map.insert(key, value);
            }
        }
        Ok(Value::Mapping(map))
    }

    /// Convert a mapping key and turn it into a string.
    fn key(&mut self, id: NodeId) -> Result<String, Error> {
        match self.convert(id)? {
            Value::String(s) => Ok(s),
            other => {
                let marshaled = match &self.options.key_marshal {
                    Some(marshal) => marshal(&other),
                    None => crate::json::marshal_key(&other),
                };
                marshaled.map_err(|msg| Error::KeyMarshal {
                    msg,
                    location: self.tree[id].location,
                })
            }
        }
    }

    fn report(&self, failed: bool) -> DecodeReport {
        DecodeReport {
            decodes: self.guard.decodes(),
            alias_decodes: self.guard.alias_decodes(),
            max_alias_depth: self.guard.max_depth(),
            merges: self.merges,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeBuilder;

    fn convert(b: TreeBuilder, root: NodeId) -> Result<Value, Error> {
        jsonify(&b.build(root).unwrap(), &Options::default())
    }

    #[test]
    fn document_must_wrap_one_child() {
        let mut b = TreeBuilder::new();
        let doc = b.document(Vec::new());
        let err = convert(b, doc).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { children: 0, .. }));
        assert_eq!(err.to_string(), "invalid document");
    }

    #[test]
    fn empty_nodes() {
        let mut b = TreeBuilder::new();
        let empty = b.empty();
        assert_eq!(convert(b, empty).unwrap(), Value::Null);

        let mut b = TreeBuilder::new();
        let empty = b.empty();
        b.anchor(empty, "a");
        let err = convert(b, empty).unwrap_err();
        assert_eq!(err.to_string(), "cannot decode node with unknown kind");
    }

    #[test]
    fn odd_mapping_is_rejected() {
        let mut b = TreeBuilder::new();
        let k = b.scalar("k");
        let map = b.mapping(vec![k]);
        assert!(matches!(convert(b, map), Err(Error::Message { .. })));
    }

    #[test]
    fn alias_to_self_is_recursive() {
        let mut b = TreeBuilder::new();
        let seq = b.sequence(Vec::new());
        b.anchor(seq, "me");
        let alias = b.alias("me", seq);
        b.node_mut(seq).kind = NodeKind::Sequence(vec![alias]);
        let err = convert(b, seq).unwrap_err();
        assert_eq!(err.to_string(), "anchor 'me' value contains itself");
    }

    #[test]
    fn shared_non_cyclic_aliases_expand() {
        let mut b = TreeBuilder::new();
        let shared = b.scalar("x");
        let a1 = b.alias("s", shared);
        let a2 = b.alias("s", shared);
        let seq = b.sequence(vec![shared, a1, a2]);
        let value = convert(b, seq).unwrap();
        assert_eq!(value, Value::from(vec![Value::from("x"); 3]));
    }

    #[test]
    fn default_key_marshal_uses_json_text() {
        let mut b = TreeBuilder::new();
        let k1 = b.scalar("1");
        let v1 = b.scalar("a");
        let k2 = b.scalar("true");
        let v2 = b.scalar("b");
        let k3 = b.scalar("~");
        let v3 = b.scalar("c");
        let map = b.mapping(vec![k1, v1, k2, v2, k3, v3]);
        let value = convert(b, map).unwrap();
        let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["1", "true", "null"]);
    }

    #[test]
    fn failing_key_marshal_is_reported() {
        let mut b = TreeBuilder::new();
        let k = b.scalar("1");
        let v = b.scalar("a");
        let map = b.mapping(vec![k, v]);
        let tree = b.build(map).unwrap();
        let options = Options::default().with_key_marshal(|_| Err("nope".into()));
        let err = jsonify(&tree, &options).unwrap_err();
        assert_eq!(err.to_string(), "cannot marshal mapping key: nope");
    }

    #[test]
    fn nesting_counts_through_aliases() {
        use crate::options::AliasLimits;

        let mut b = TreeBuilder::new();
        let leaf = b.scalar("x");
        let inner = b.sequence(vec![leaf]);
        let alias = b.alias("inner", inner);
        let outer = b.sequence(vec![alias]);
        let tree = b.build(outer).unwrap();

        // outer, alias, inner
        let limit = |max_nesting_depth: usize| crate::options! {
            alias_limits: AliasLimits { max_nesting_depth, ..AliasLimits::default() },
        };
        assert!(jsonify(&tree, &limit(3)).is_ok());
        let err = jsonify(&tree, &limit(2)).unwrap_err();
        assert!(matches!(err, Error::NestingDepth { depth: 3, .. }), "{err:?}");
        assert_eq!(err.to_string(), "value nested too deeply (depth 3)");
    }

    #[test]
    fn report_counts_visits() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DECODES: AtomicUsize = AtomicUsize::new(0);
        fn check(r: &DecodeReport) {
            assert_eq!(r.alias_decodes, 1);
            assert_eq!(r.max_alias_depth, 1);
            assert!(!r.failed);
            DECODES.store(r.decodes, Ordering::SeqCst);
        }
        let mut b = TreeBuilder::new();
        let s = b.scalar("v");
        let a = b.alias("s", s);
        let seq = b.sequence(vec![s, a]);
        let tree = b.build(seq).unwrap();
        let options = crate::options! {
            decode_report: Some(check),
        };
        jsonify(&tree, &options).unwrap();
        // seq, scalar, alias, expanded scalar
        assert_eq!(DECODES.load(Ordering::SeqCst), 4);
    }
}
