//! `<<` merge keys.
//!
//! A merge key splices the entries of another mapping (or of each mapping in a
//! sequence) into the mapping that contains it. Explicit keys of the containing
//! mapping always win; within a sequence, earlier mappings win over later ones.

use crate::error::Error;
use crate::jsonify::Session;
use crate::node::{Node, NodeId, NodeKind, ScalarStyle};
use crate::ordered_map::OrderedMap;
use crate::tags::YamlTag;
use crate::value::Value;

/// True if `node` is the merge marker: `<<` that is plain and untagged, or tagged with
/// the non-specific `!` or with `!!merge`.
pub(crate) fn is_merge_key(node: &Node) -> bool {
    let NodeKind::Scalar { value, style } = &node.kind else {
        return false;
    };
    if value != "<<" {
        return false;
    }
    match YamlTag::classify(node.tag.as_deref()) {
        YamlTag::None => *style == ScalarStyle::Plain,
        YamlTag::NonSpecific | YamlTag::Merge => true,
        _ => false,
    }
}

impl Session<'_> {
    /// Fold the value of a `<<` key into `map`.
    pub(crate) fn merge_into(&mut self, map: &mut OrderedMap, value: NodeId) -> Result<(), Error> {
        let tree = self.tree;
        let node = &tree[value];
        match &node.kind {
            NodeKind::Mapping(_) | NodeKind::Alias { .. } if self.is_map_source(value) => {
                self.merge_one(map, value)?;
            }
            NodeKind::Sequence(items) => {
                // Check every element first so nothing is converted for a bad merge.
                if let Some(&bad) = items.iter().find(|&&id| !self.is_map_source(id)) {
                    return Err(Error::merge_not_mapping().with_location(tree[bad].location));
                }
                // Back to front: earlier mappings override later ones.
                for &item in items.iter().rev() {
                    self.merge_one(map, item)?;
                }
            }
            _ => return Err(Error::merge_not_mapping().with_location(node.location)),
        }
        self.merges += 1;
        Ok(())
    }

    /// A mapping, or an alias whose target is a mapping.
    fn is_map_source(&self, id: NodeId) -> bool {
        match &self.tree[id].kind {
            NodeKind::Mapping(_) => true,
            NodeKind::Alias { target, .. } => {
                matches!(self.tree[*target].kind, NodeKind::Mapping(_))
            }
            _ => false,
        }
    }

    fn merge_one(&mut self, map: &mut OrderedMap, id: NodeId) -> Result<(), Error> {
        match self.convert(id)? {
            Value::Mapping(source) => {
                map.merge(source);
                Ok(())
            }
            _ => Err(Error::merge_not_mapping().with_location(self.tree[id].location)),
        }
    }
}
