//! Dense lookup of fastest direct connections.
//!
//! Maps `(tail, head)` to `(road_time, distance)` with an `(∞, ∞)` fallback
//! for unknown pairs. Built from the raw arc list *before* range filtering,
//! including the per-node zero self-loops, so lookups are total: `(u, u)`
//! yields `(0, 0)` for every known node and any missing connection yields
//! infinity in both components.
//!
//! The stored values are assumed to be fastest connections; in particular
//! they satisfy the triangle inequality, which the subgraph builder's
//! endpoint pruning relies on.

use rustc_hash::FxHashMap;

use cp_core::NodeId;

use crate::tables::Arc;

const MISS: (f64, f64) = (f64::INFINITY, f64::INFINITY);

/// `(tail, head) → (road_time, distance)` with infinite fallback.
#[derive(Debug, Clone, Default)]
pub struct TimeDistMap {
    map: FxHashMap<(NodeId, NodeId), (f64, f64)>,
}

impl TimeDistMap {
    pub fn from_arcs(arcs: &[Arc]) -> TimeDistMap {
        let mut map = FxHashMap::default();
        map.reserve(arcs.len());
        for a in arcs {
            map.insert((a.tail, a.head), (a.road_time, a.distance));
        }
        TimeDistMap { map }
    }

    /// `(road_time, distance)` of the fastest direct connection, or
    /// `(∞, ∞)` when none is known.
    #[inline]
    pub fn get(&self, tail: NodeId, head: NodeId) -> (f64, f64) {
        self.map.get(&(tail, head)).copied().unwrap_or(MISS)
    }

    #[inline]
    pub fn time(&self, tail: NodeId, head: NodeId) -> f64 {
        self.get(tail, head).0
    }

    #[inline]
    pub fn distance(&self, tail: NodeId, head: NodeId) -> f64 {
        self.get(tail, head).1
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
