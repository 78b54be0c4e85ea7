//! Alias expansion bookkeeping for one conversion call.
//!
//! Every node the converter visits is counted, and so is every node visited while at
//! least one alias is being expanded. A document whose values come mostly from alias
//! expansion is a "billion laughs" attack; small documents are allowed a very high
//! share (aliases are legitimately used for repetition) while the allowed share
//! shrinks linearly as the document grows.
//!
//! The guard also remembers which alias targets are being expanded right now, so an
//! alias that points into its own ancestry is rejected instead of recursing forever.

use nohash_hasher::{IntMap, IntSet};

use crate::error::Error;
use crate::location::Location;
use crate::node::NodeId;
use crate::options::AliasLimits;

/// Up to this many decodes, 99% of them may come from aliases.
const ALIAS_RATIO_RANGE_LOW: usize = 400_000;
/// From this many decodes on, only 10% may come from aliases.
const ALIAS_RATIO_RANGE_HIGH: usize = 4_000_000;
const ALIAS_RATIO_RANGE: f64 = (ALIAS_RATIO_RANGE_HIGH - ALIAS_RATIO_RANGE_LOW) as f64;

/// Below these counts the ratio is not checked at all.
const MIN_DECODES_CHECKED: usize = 1_000;
const MIN_ALIAS_DECODES_CHECKED: usize = 100;

/// Share of `decodes` that may originate from alias expansion.
///
/// ```rust
/// use saphyr_json::allowed_alias_ratio;
///
/// assert_eq!(allowed_alias_ratio(1_000), 0.99);
/// assert_eq!(allowed_alias_ratio(10_000_000), 0.10);
/// assert!((allowed_alias_ratio(2_200_000) - 0.545).abs() < 1e-9);
/// ```
pub fn allowed_alias_ratio(decodes: usize) -> f64 {
    if decodes <= ALIAS_RATIO_RANGE_LOW {
        // Small documents: almost everything may be aliased.
        0.99
    } else if decodes >= ALIAS_RATIO_RANGE_HIGH {
        0.10
    } else {
        0.99 - 0.89 * ((decodes - ALIAS_RATIO_RANGE_LOW) as f64 / ALIAS_RATIO_RANGE)
    }
}

/// True when `alias_decodes` out of `decodes` is more aliasing than allowed.
pub(crate) fn is_excessive(decodes: usize, alias_decodes: usize) -> bool {
    alias_decodes > MIN_ALIAS_DECODES_CHECKED
        && decodes > MIN_DECODES_CHECKED
        && (alias_decodes as f64 / decodes as f64) > allowed_alias_ratio(decodes)
}

/// Per-call alias state. Never shared between calls.
#[derive(Debug)]
pub(crate) struct AliasGuard {
    limits: AliasLimits,
    in_progress: IntSet<NodeId>,
    expansions: IntMap<NodeId, usize>,
    decodes: usize,
    alias_decodes: usize,
    depth: usize,
    max_depth: usize,
}

impl AliasGuard {
    pub(crate) fn new(limits: AliasLimits) -> Self {
        Self {
            limits,
            in_progress: IntSet::default(),
            expansions: IntMap::default(),
            decodes: 0,
            alias_decodes: 0,
            depth: 0,
            max_depth: 0,
        }
    }

    /// Count one visited node and run the expansion-ratio check.
    pub(crate) fn visit(&mut self, location: Location) -> Result<(), Error> {
        self.decodes += 1;
        if self.depth > 0 {
            self.alias_decodes += 1;
        }
        if self.limits.enforce_expansion_ratio && is_excessive(self.decodes, self.alias_decodes) {
            return Err(Error::ExcessiveAliasing {
                decodes: self.decodes,
                alias_decodes: self.alias_decodes,
                location,
            });
        }
        Ok(())
    }

    /// Start expanding the alias target `target`. Must be paired with [`Self::leave`]
    /// when this returns `Ok`.
    pub(crate) fn enter(&mut self, target: NodeId, name: &str, location: Location) -> Result<(), Error> {
        if self.in_progress.contains(&target) {
            return Err(Error::RecursiveAnchor {
                anchor: name.to_owned(),
                location,
            });
        }
        let next_depth = self.depth + 1;
        if next_depth > self.limits.max_alias_depth {
            return Err(Error::AliasDepth {
                depth: next_depth,
                location,
            });
        }
        let count = self
            .expansions
            .entry(target)
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if *count > self.limits.max_alias_expansions_per_anchor {
            return Err(Error::Message {
                msg: format!(
                    "alias expansion limit exceeded for anchor '{name}': {} > {}",
                    count, self.limits.max_alias_expansions_per_anchor
                ),
                location,
            });
        }
        self.in_progress.insert(target);
        self.depth = next_depth;
        self.max_depth = self.max_depth.max(next_depth);
        Ok(())
    }

    pub(crate) fn leave(&mut self, target: NodeId) {
        self.in_progress.remove(&target);
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn decodes(&self) -> usize {
        self.decodes
    }

    pub(crate) fn alias_decodes(&self) -> usize {
        self.alias_decodes
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }
}
