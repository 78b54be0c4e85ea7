//! Composer: assembles the `saphyr_parser` event stream into one [`Tree`] per document.
//!
//! Responsibilities
//! - Turn scalar/sequence/mapping events into arena nodes, keeping source locations.
//! - Register anchors when their node *starts*, so an alias inside its own anchored
//!   container points back at it (the converter then reports the cycle).
//! - Resolve `*alias` events to the anchored node; anchors are per document.
//! - Enforce the optional [`Budget`] and report the final [`BudgetReport`].
//!
//! The parser only hands out numeric anchor ids. Names are recovered from the source
//! text around the event spans and are used for diagnostics only.

use nohash_hasher::IntMap;
use saphyr_parser::{Event, Parser, Span as ParserSpan, StrInput};

use crate::budget::{Budget, BudgetBreach, BudgetEnforcer, BudgetReport};
use crate::error::{Error, budget_error};
use crate::location::{Location, location_from_span};
use crate::merge::is_merge_key;
use crate::node::{Node, NodeId, NodeKind, Tree};
use crate::options::Options;

/// Open container (or document) collecting its children.
#[derive(Debug)]
struct Frame {
    id: NodeId,
    children: Vec<NodeId>,
    mapping: bool,
}

pub(crate) struct Composer<'a> {
    input: &'a str,
    parser: Parser<'a, StrInput<'a>>,
    budget: Option<BudgetEnforcer>,
    breach: Option<BudgetBreach>,
    /// Arena of the document being composed.
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    /// Anchor id -> anchored node, for the current document.
    anchors: IntMap<usize, NodeId>,
    trees: Vec<Tree>,
    /// Byte offset just past the previous event.
    prev_end: usize,
}

impl<'a> Composer<'a> {
    pub(crate) fn new(input: &'a str, budget: Option<Budget>) -> Self {
        Self {
            input,
            parser: Parser::new_from_str(input),
            budget: budget.map(BudgetEnforcer::new),
            breach: None,
            nodes: Vec::new(),
            stack: Vec::new(),
            anchors: IntMap::default(),
            trees: Vec::new(),
            prev_end: 0,
        }
    }

    /// Compose the whole stream.
    pub(crate) fn run(&mut self) -> Result<Vec<Tree>, Error> {
        while let Some(item) = self.parser.next() {
            let (event, span) = item.map_err(Error::from_scan_error)?;
            let location = location_from_span(&span);
            self.event(event, &span, location)?;
            if let Some(end) = span.end.byte_offset() {
                self.prev_end = end;
            }
        }
        if !self.stack.is_empty() {
            return Err(Error::msg("unexpected end of YAML stream"));
        }
        Ok(std::mem::take(&mut self.trees))
    }

    /// Final budget report, if a budget was enforced.
    pub(crate) fn into_report(self) -> Option<BudgetReport> {
        let breach = self.breach;
        self.budget.map(|budget| budget.into_report(breach))
    }

    fn event(&mut self, event: Event<'a>, span: &ParserSpan, location: Location) -> Result<(), Error> {
        match event {
            Event::StreamStart | Event::StreamEnd | Event::Nothing => {}

            Event::DocumentStart(_) => {
                self.charge(BudgetEnforcer::document, location)?;
                self.anchors.clear();
                self.nodes.clear();
                let id = self.push_node(Node::new(NodeKind::Document(Vec::new())), location);
                self.stack.push(Frame {
                    id,
                    children: Vec::new(),
                    mapping: false,
                });
            }

            Event::DocumentEnd => {
                let mut frame = self.pop_frame(location)?;
                if frame.children.is_empty() {
                    // `---` with no content
                    frame.children.push(self.push_node(Node::new(NodeKind::Empty), location));
                }
                self.nodes[frame.id.0].kind = NodeKind::Document(frame.children);
                let nodes = std::mem::take(&mut self.nodes);
                self.trees.push(Tree::from_parts(nodes, frame.id));
                self.anchors.clear();
            }

            Event::Scalar(value, style, anchor_id, tag) => {
                self.charge(|b| b.scalar(value.len()), location)?;
                let in_key_position = self.expecting_key();
                let mut node = Node::new(NodeKind::Scalar {
                    value: value.into_owned(),
                    style: style.into(),
                });
                node.tag = tag.map(|t| t.to_string());
                let id = self.push_node(node, location);
                self.define_anchor(anchor_id, id, span, location)?;
                if in_key_position && is_merge_key(&self.nodes[id.0]) {
                    self.charge(BudgetEnforcer::merge_key, location)?;
                }
                self.attach(id, location)?;
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.open(NodeKind::Sequence(Vec::new()), false, anchor_id, tag.map(|t| t.to_string()), span, location)?;
            }
            Event::MappingStart(anchor_id, tag) => {
                self.open(NodeKind::Mapping(Vec::new()), true, anchor_id, tag.map(|t| t.to_string()), span, location)?;
            }

            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(budget) = self.budget.as_mut() {
                    budget.leave_container();
                }
                let frame = self.pop_frame(location)?;
                match &mut self.nodes[frame.id.0].kind {
                    NodeKind::Sequence(children) | NodeKind::Mapping(children) => {
                        *children = frame.children;
                    }
                    _ => return Err(Error::msg("unbalanced container end").with_location(location)),
                }
            }

            Event::Alias(anchor_id) => {
                self.charge(BudgetEnforcer::alias, location)?;
                let target = *self
                    .anchors
                    .get(&anchor_id)
                    .ok_or_else(|| Error::unknown_anchor(anchor_id).with_location(location))?;
                let written = match (span.start.byte_offset(), span.end.byte_offset()) {
                    (Some(start), Some(end)) => alias_name(self.input, start, end),
                    _ => None,
                };
                let name = alias_label(written, self.nodes[target.0].anchor.as_deref(), anchor_id);
                let anchored = &mut self.nodes[target.0];
                if anchored.anchor.is_none() {
                    anchored.anchor = Some(name.clone());
                }
                let id = self.push_node(Node::new(NodeKind::Alias { name, target }), location);
                self.attach(id, location)?;
            }
        }
        Ok(())
    }

    fn open(
        &mut self,
        kind: NodeKind,
        mapping: bool,
        anchor_id: usize,
        tag: Option<String>,
        span: &ParserSpan,
        location: Location,
    ) -> Result<(), Error> {
        self.charge(BudgetEnforcer::enter_container, location)?;
        let mut node = Node::new(kind);
        node.tag = tag;
        let id = self.push_node(node, location);
        self.define_anchor(anchor_id, id, span, location)?;
        self.attach(id, location)?;
        self.stack.push(Frame {
            id,
            children: Vec::new(),
            mapping,
        });
        Ok(())
    }

    fn push_node(&mut self, mut node: Node, location: Location) -> NodeId {
        node.location = location;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, id: NodeId, location: Location) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.children.push(id);
                Ok(())
            }
            None => Err(Error::msg("node outside of a document").with_location(location)),
        }
    }

    fn pop_frame(&mut self, location: Location) -> Result<Frame, Error> {
        self.stack
            .pop()
            .ok_or_else(|| Error::msg("unbalanced end event").with_location(location))
    }

    /// The next node attached to the open mapping would be a key.
    fn expecting_key(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|frame| frame.mapping && frame.children.len() % 2 == 0)
    }

    fn define_anchor(&mut self, anchor_id: usize, id: NodeId, span: &ParserSpan, location: Location) -> Result<(), Error> {
        if anchor_id == 0 {
            return Ok(());
        }
        self.charge(|b| b.anchor(anchor_id), location)?;
        let start = span.start.byte_offset().unwrap_or(self.prev_end);
        self.nodes[id.0].anchor = anchor_name(self.input, self.prev_end, start);
        self.anchors.insert(anchor_id, id);
        Ok(())
    }

    /// Run one budget check, remembering the breach for the final report.
    fn charge(
        &mut self,
        check: impl FnOnce(&mut BudgetEnforcer) -> Result<(), BudgetBreach>,
        location: Location,
    ) -> Result<(), Error> {
        let Some(budget) = self.budget.as_mut() else {
            return Ok(());
        };
        check(budget).map_err(|breach| {
            self.breach = Some(breach.clone());
            budget_error(breach).with_location(location)
        })
    }
}

/// Name of the anchor written between the previous event and the node at `start`
/// (`key: &name !tag value`), or at `start` itself.
fn anchor_name(input: &str, from: usize, start: usize) -> Option<String> {
    let own = input.get(start..).and_then(|rest| {
        let token = rest.split_whitespace().next()?;
        anchor_token(token)
    });
    own.or_else(|| {
        input
            .get(from.min(start)..start)?
            .split_whitespace()
            .rev()
            .find_map(anchor_token)
    })
}

fn anchor_token(token: &str) -> Option<String> {
    let token = token.trim_start_matches(['[', '{', ',']);
    let name = token.strip_prefix('&')?.split(is_flow_indicator).next()?;
    (!name.is_empty()).then(|| name.to_owned())
}

/// Anchor and alias names never contain these.
fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// `*name` text of an alias event spanning `start..end`.
fn alias_name(input: &str, start: usize, end: usize) -> Option<String> {
    let text = input.get(start..end)?.trim();
    let name = text.strip_prefix('*').unwrap_or(text);
    let name = name
        .split(|c: char| c.is_whitespace() || is_flow_indicator(c))
        .next()?;
    (!name.is_empty()).then(|| name.to_owned())
}

/// Name used in diagnostics for an alias: as written, else the anchor's recovered
/// name, else the parser's numeric anchor id.
fn alias_label(written: Option<String>, anchored: Option<&str>, anchor_id: usize) -> String {
    written
        .or_else(|| anchored.map(str::to_owned))
        .unwrap_or_else(|| anchor_id.to_string())
}

/// Compose every document of `input` into its own node tree.
///
/// Enforces [`Options::budget`] and reports through [`Options::budget_report`]. Useful
/// for callers who want to inspect the tree or convert it several times.
///
/// ```rust
/// use saphyr_json::{NodeKind, Options, compose_str};
///
/// let trees = compose_str("a: &x 1\nb: *x\n", &Options::default()).unwrap();
/// assert_eq!(trees.len(), 1);
/// let aliases = trees[0]
///     .iter()
///     .filter(|(_, node)| matches!(node.kind, NodeKind::Alias { .. }))
///     .count();
/// assert_eq!(aliases, 1);
/// ```
pub fn compose_str(input: &str, options: &Options) -> Result<Vec<Tree>, Error> {
    let mut composer = Composer::new(input, options.budget.clone());
    let result = composer.run();
    if let (Some(callback), Some(report)) = (options.budget_report, composer.into_report()) {
        callback(&report);
    }
    result
}

/// Compose `input` under `budget` and return what was counted.
///
/// A breached budget is not an error here: it is reported in
/// [`BudgetReport::breached`]. Parse errors are returned as errors.
///
/// ```rust
/// use saphyr_json::{Budget, BudgetBreach, check_yaml_budget};
///
/// let budget = Budget { max_aliases: 1, ..Budget::default() };
/// let report = check_yaml_budget("a: &x 1\nb: *x\nc: *x\n", &budget).unwrap();
/// assert_eq!(report.breached, Some(BudgetBreach::Aliases { aliases: 2 }));
/// ```
pub fn check_yaml_budget(input: &str, budget: &Budget) -> Result<BudgetReport, Error> {
    let mut composer = Composer::new(input, Some(budget.clone()));
    let result = composer.run();
    let report = composer.into_report().unwrap_or_default();
    match result {
        Ok(_) | Err(Error::Budget { .. }) => Ok(report),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(input: &str) -> Vec<Tree> {
        Composer::new(input, Some(Budget::default())).run().unwrap()
    }

    fn kinds(tree: &Tree) -> Vec<&'static str> {
        tree.iter()
            .map(|(_, n)| match n.kind {
                NodeKind::Empty => "empty",
                NodeKind::Document(_) => "doc",
                NodeKind::Alias { .. } => "alias",
                NodeKind::Scalar { .. } => "scalar",
                NodeKind::Mapping(_) => "map",
                NodeKind::Sequence(_) => "seq",
            })
            .collect()
    }

    #[test]
    fn builds_one_tree_per_document() {
        let trees = compose("a: 1\n---\n- x\n");
        assert_eq!(trees.len(), 2);
        assert_eq!(kinds(&trees[0]), ["doc", "map", "scalar", "scalar"]);
        assert_eq!(kinds(&trees[1]), ["doc", "seq", "scalar"]);
    }

    #[test]
    fn empty_stream_has_no_documents() {
        assert!(compose("").is_empty());
    }

    #[test]
    fn self_referencing_anchor_becomes_a_cycle() {
        let trees = compose("&loop [*loop]\n");
        let tree = &trees[0];
        let (seq_id, _) = tree
            .iter()
            .find(|(_, n)| matches!(n.kind, NodeKind::Sequence(_)))
            .unwrap();
        let alias = tree
            .iter()
            .find_map(|(_, n)| match &n.kind {
                NodeKind::Alias { name, target } => Some((name.clone(), *target)),
                _ => None,
            })
            .unwrap();
        assert_eq!(alias, ("loop".to_owned(), seq_id));
    }

    #[test]
    fn names_stop_at_flow_indicators() {
        assert_eq!(anchor_name("&x1,b: 2}", 0, 0).as_deref(), Some("x1"));
        assert_eq!(anchor_name("{a: &x1,b: 2}", 0, 7).as_deref(), Some("x1"));
        assert_eq!(anchor_name("[&first]", 0, 1).as_deref(), Some("first"));
        assert_eq!(alias_name("{a: *x1,b: 2}", 4, 13).as_deref(), Some("x1"));
        assert_eq!(alias_name("[*x1]]", 1, 6).as_deref(), Some("x1"));
    }

    #[test]
    fn unrecoverable_names_fall_back() {
        assert_eq!(anchor_name("", 0, 0), None);
        assert_eq!(anchor_name("&", 0, 0), None);
        assert_eq!(alias_name("a: 1", 7, 9), None);
        assert_eq!(alias_name("a: *", 3, 4), None);

        assert_eq!(alias_label(Some("x".into()), Some("y"), 3), "x");
        assert_eq!(alias_label(None, Some("y"), 3), "y");
        assert_eq!(alias_label(None, None, 3), "3");
    }

    #[test]
    fn flow_anchor_and_alias_names() {
        let trees = compose("{a: &x1 [*x1],b: 2}\n");
        let names: Vec<_> = trees[0]
            .iter()
            .filter_map(|(_, n)| match &n.kind {
                NodeKind::Alias { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["x1"]);
        let anchored: Vec<_> = trees[0].iter().filter_map(|(_, n)| n.anchor.as_deref()).collect();
        assert_eq!(anchored, ["x1"]);
    }

    #[test]
    fn unknown_alias_is_a_parse_error() {
        let err = Composer::new("a: *nowhere\n", None).run().unwrap_err();
        assert!(matches!(err.inner(), Error::Scan { .. } | Error::UnknownAnchor { .. }));
    }

    #[test]
    fn merge_keys_are_counted_in_key_position_only() {
        let budget = Budget {
            max_merge_keys: 1,
            ..Budget::default()
        };
        let ok = check_yaml_budget("a: &a {x: 1}\nb:\n  <<: *a\n  k: <<\n", &budget).unwrap();
        assert!(ok.breached.is_none());
        assert_eq!(ok.merge_keys, 1);

        let yaml = "a: &a {x: 1}\nb:\n  <<: *a\nc:\n  <<: *a\n";
        let report = check_yaml_budget(yaml, &budget).unwrap();
        assert_eq!(report.breached, Some(BudgetBreach::MergeKeys { merge_keys: 2 }));
    }

    #[test]
    fn depth_budget_stops_composition() {
        let budget = Budget {
            max_depth: 3,
            ..Budget::default()
        };
        let report = check_yaml_budget("[[[[1]]]]", &budget).unwrap();
        assert_eq!(report.breached, Some(BudgetBreach::Depth { depth: 4 }));
    }
}
