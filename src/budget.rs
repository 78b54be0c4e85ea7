//! Structural YAML budget enforced while the composer assembles node trees.
//!
//! The converter's alias guard bounds how much a document may *expand*. The budget
//! bounds the raw document itself: how many nodes, anchors and aliases it may declare,
//! how deep it may nest and how much scalar text it may carry. Depth matters doubly
//! here because the converter walks the tree recursively.

use nohash_hasher::IntSet;
use serde::Serialize;

/// Budgets for composing a YAML stream into node trees.
///
/// The defaults are intentionally permissive for typical configuration files
/// while stopping obvious resource-amplifying inputs. Tune these per your
/// application if you regularly process very large YAML streams.
///
/// ```rust
/// let options = saphyr_json::options! {
///     budget: Some(saphyr_json::budget! {
///         max_depth: 64,
///     }),
/// };
///
/// let value = saphyr_json::from_str_with_options("a: [1, 2, 3]\n", options).unwrap();
/// assert!(value.is_mapping());
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct Budget {
    /// Maximum number of YAML documents in the stream.
    ///
    /// Default: 1,024
    pub max_documents: usize,
    /// Maximum number of nodes (scalars, sequences, mappings and aliases).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum structural nesting depth (sequences + mappings) of the text.
    ///
    /// The parser itself refuses text nested deeper than about 255 levels and
    /// reports that first, so this only matters when set lower. Nesting that
    /// alias expansion adds is bounded separately by
    /// [`crate::AliasLimits::max_nesting_depth`].
    ///
    /// Default: 2,000
    pub max_depth: usize,
    /// Maximum number of alias (`*ref`) nodes.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximal total number of anchors (distinct `&anchor` definitions).
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum total bytes of scalar contents.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_total_scalar_bytes: usize,
    /// Maximum number of merge keys (`<<`) allowed across the stream.
    ///
    /// Default: 10,000
    pub max_merge_keys: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_documents: 1_024,                     // doc separator storms
            max_nodes: 250_000,                       // sequences + maps + scalars + aliases
            max_depth: 2_000,                         // protects stack/CPU
            max_aliases: 50_000,                      // liberal absolute cap
            max_anchors: 50_000,
            max_total_scalar_bytes: 64 * 1024 * 1024, // 64 MiB of scalar text
            max_merge_keys: 10_000,                   // generous cap for merge keys
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BudgetBreach {
    /// The number of YAML documents exceeded [`Budget::max_documents`].
    Documents { documents: usize },
    /// The number of nodes exceeded [`Budget::max_nodes`].
    Nodes { nodes: usize },
    /// The structural nesting depth exceeded [`Budget::max_depth`].
    Depth { depth: usize },
    /// The number of alias nodes exceeded [`Budget::max_aliases`].
    Aliases { aliases: usize },
    /// The number of distinct anchors exceeded [`Budget::max_anchors`].
    Anchors { anchors: usize },
    /// The cumulative size of scalar contents exceeded [`Budget::max_total_scalar_bytes`].
    ScalarBytes { total_scalar_bytes: usize },
    /// The number of merge keys exceeded [`Budget::max_merge_keys`].
    MergeKeys { merge_keys: usize },
}

/// Summary of what the composer saw, whether or not a limit was breached.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded; `None` if all budgets were respected.
    pub breached: Option<BudgetBreach>,
    pub documents: usize,
    pub nodes: usize,
    /// Maximum structural nesting depth reached at any point in the stream.
    pub max_depth: usize,
    pub aliases: usize,
    pub anchors: usize,
    /// Sum of bytes across all scalar values, saturating on overflow.
    pub total_scalar_bytes: usize,
    pub merge_keys: usize,
}

/// Stateful helper that enforces a [`Budget`] as the composer reports what it builds.
#[derive(Debug)]
pub(crate) struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    defined_anchors: IntSet<usize>,
}

impl BudgetEnforcer {
    pub(crate) fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            defined_anchors: IntSet::default(),
        }
    }

    pub(crate) fn document(&mut self) -> Result<(), BudgetBreach> {
        self.report.documents += 1;
        if self.report.documents > self.budget.max_documents {
            return Err(BudgetBreach::Documents {
                documents: self.report.documents,
            });
        }
        Ok(())
    }

    /// A scalar of `len` bytes was composed.
    pub(crate) fn scalar(&mut self, len: usize) -> Result<(), BudgetBreach> {
        self.bump_nodes()?;
        self.report.total_scalar_bytes = self.report.total_scalar_bytes.saturating_add(len);
        if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
            return Err(BudgetBreach::ScalarBytes {
                total_scalar_bytes: self.report.total_scalar_bytes,
            });
        }
        Ok(())
    }

    pub(crate) fn alias(&mut self) -> Result<(), BudgetBreach> {
        self.bump_nodes()?;
        self.report.aliases += 1;
        if self.report.aliases > self.budget.max_aliases {
            return Err(BudgetBreach::Aliases {
                aliases: self.report.aliases,
            });
        }
        Ok(())
    }

    /// A sequence or mapping was opened.
    pub(crate) fn enter_container(&mut self) -> Result<(), BudgetBreach> {
        self.bump_nodes()?;
        self.depth = self.depth.saturating_add(1);
        if self.depth > self.report.max_depth {
            self.report.max_depth = self.depth;
        }
        if self.report.max_depth > self.budget.max_depth {
            return Err(BudgetBreach::Depth {
                depth: self.report.max_depth,
            });
        }
        Ok(())
    }

    pub(crate) fn leave_container(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// An anchor with parser id `anchor_id` was defined. Id `0` means "no anchor".
    pub(crate) fn anchor(&mut self, anchor_id: usize) -> Result<(), BudgetBreach> {
        if anchor_id != 0 && self.defined_anchors.insert(anchor_id) {
            let count = self.defined_anchors.len();
            if count > self.budget.max_anchors {
                self.report.anchors = count;
                return Err(BudgetBreach::Anchors { anchors: count });
            }
        }
        self.report.anchors = self.defined_anchors.len();
        Ok(())
    }

    pub(crate) fn merge_key(&mut self) -> Result<(), BudgetBreach> {
        self.report.merge_keys += 1;
        if self.report.merge_keys > self.budget.max_merge_keys {
            return Err(BudgetBreach::MergeKeys {
                merge_keys: self.report.merge_keys,
            });
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    /// Consume the enforcer and return the accumulated [`BudgetReport`].
    pub(crate) fn into_report(mut self, breached: Option<BudgetBreach>) -> BudgetReport {
        self.report.anchors = self.defined_anchors.len();
        self.report.breached = breached;
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_tracked_and_enforced() {
        let mut enforcer = BudgetEnforcer::new(Budget {
            max_depth: 2,
            ..Budget::default()
        });
        enforcer.enter_container().unwrap();
        enforcer.enter_container().unwrap();
        enforcer.leave_container();
        enforcer.enter_container().unwrap();
        assert_eq!(
            enforcer.enter_container(),
            Err(BudgetBreach::Depth { depth: 3 })
        );
    }

    #[test]
    fn anchors_count_distinct_ids_only() {
        let mut enforcer = BudgetEnforcer::new(Budget {
            max_anchors: 2,
            ..Budget::default()
        });
        enforcer.anchor(0).unwrap();
        enforcer.anchor(1).unwrap();
        enforcer.anchor(1).unwrap();
        enforcer.anchor(2).unwrap();
        assert_eq!(enforcer.anchor(3), Err(BudgetBreach::Anchors { anchors: 3 }));
    }

    #[test]
    fn scalar_bytes_saturate_and_trip() {
        let mut enforcer = BudgetEnforcer::new(Budget {
            max_total_scalar_bytes: 10,
            ..Budget::default()
        });
        enforcer.scalar(6).unwrap();
        assert_eq!(
            enforcer.scalar(6),
            Err(BudgetBreach::ScalarBytes {
                total_scalar_bytes: 12
            })
        );
    }

    #[test]
    fn report_reflects_counts() {
        let mut enforcer = BudgetEnforcer::new(Budget::default());
        enforcer.document().unwrap();
        enforcer.enter_container().unwrap();
        enforcer.scalar(3).unwrap();
        enforcer.alias().unwrap();
        enforcer.merge_key().unwrap();
        enforcer.leave_container();
        let report = enforcer.into_report(None);
        assert!(report.breached.is_none());
        assert_eq!(report.documents, 1);
        assert_eq!(report.nodes, 3);
        assert_eq!(report.aliases, 1);
        assert_eq!(report.merge_keys, 1);
        assert_eq!(report.max_depth, 1);
        assert_eq!(report.total_scalar_bytes, 3);
    }
}
