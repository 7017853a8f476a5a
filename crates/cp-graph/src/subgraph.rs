//! Per-pair directed graph and filtered views.
//!
//! # Data layout
//!
//! The graph stores adjacency in **both directions** (successor and
//! predecessor lists), so reverse traversal is a list swap instead of a
//! transposition. Keys are [`NodeKey`]s: after candidate splitting a
//! candidate station appears as an entry half and an auxiliary exit half.
//!
//! # Views
//!
//! Algorithms take a [`View`]: a pointer to the base graph plus an optional
//! orientation flip, node predicate and arc predicate. This mirrors how the
//! rest of the pipeline reasons about "the subgraph restricted to usable
//! stations" without ever copying the graph.

use rustc_hash::FxHashMap;

use cp_core::NodeKey;

// ── Arc attributes ────────────────────────────────────────────────────────────

/// Weights carried by every subgraph arc. Times in minutes, distance in km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcAttrs {
    pub road_time: f64,
    pub fuel_time: f64,
    pub break_time: f64,
    pub distance: f64,
}

impl ArcAttrs {
    pub const ZERO: ArcAttrs =
        ArcAttrs { road_time: 0.0, fuel_time: 0.0, break_time: 0.0, distance: 0.0 };

    /// Full traversal time: road plus recharge plus mandated breaks.
    #[inline]
    pub fn total_time(&self) -> f64 {
        self.road_time + self.fuel_time + self.break_time
    }
}

// ── Subgraph ──────────────────────────────────────────────────────────────────

/// A directed graph over [`NodeKey`]s with per-node costs.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    succ: FxHashMap<NodeKey, Vec<(NodeKey, ArcAttrs)>>,
    pred: FxHashMap<NodeKey, Vec<(NodeKey, ArcAttrs)>>,
    cost: FxHashMap<NodeKey, f64>,
}

impl Subgraph {
    pub fn new() -> Subgraph {
        Subgraph::default()
    }

    pub fn is_empty(&self) -> bool {
        self.succ.is_empty()
    }

    pub fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.succ.values().map(Vec::len).sum()
    }

    pub fn contains(&self, n: NodeKey) -> bool {
        self.succ.contains_key(&n)
    }

    /// Ensure `n` exists (with no incident arcs yet).
    pub fn add_node(&mut self, n: NodeKey) {
        self.succ.entry(n).or_default();
        self.pred.entry(n).or_default();
    }

    /// Insert or replace the arc `tail → head`.
    pub fn add_arc(&mut self, tail: NodeKey, head: NodeKey, attrs: ArcAttrs) {
        self.add_node(tail);
        self.add_node(head);
        let out = self.succ.get_mut(&tail).unwrap();
        match out.iter_mut().find(|(h, _)| *h == head) {
            Some(slot) => slot.1 = attrs,
            None => out.push((head, attrs)),
        }
        let inc = self.pred.get_mut(&head).unwrap();
        match inc.iter_mut().find(|(t, _)| *t == tail) {
            Some(slot) => slot.1 = attrs,
            None => inc.push((tail, attrs)),
        }
    }

    pub fn remove_arc(&mut self, tail: NodeKey, head: NodeKey) {
        if let Some(out) = self.succ.get_mut(&tail) {
            out.retain(|(h, _)| *h != head);
        }
        if let Some(inc) = self.pred.get_mut(&head) {
            inc.retain(|(t, _)| *t != tail);
        }
    }

    /// Remove `n` and all incident arcs.
    pub fn remove_node(&mut self, n: NodeKey) {
        if let Some(out) = self.succ.remove(&n) {
            for (head, _) in out {
                if let Some(inc) = self.pred.get_mut(&head) {
                    inc.retain(|(t, _)| *t != n);
                }
            }
        }
        if let Some(inc) = self.pred.remove(&n) {
            for (tail, _) in inc {
                if let Some(out) = self.succ.get_mut(&tail) {
                    out.retain(|(h, _)| *h != n);
                }
            }
        }
        self.cost.remove(&n);
    }

    pub fn arc(&self, tail: NodeKey, head: NodeKey) -> Option<&ArcAttrs> {
        self.succ
            .get(&tail)?
            .iter()
            .find(|(h, _)| *h == head)
            .map(|(_, a)| a)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.succ.keys().copied()
    }

    /// All arcs as `(tail, head, attrs)`.
    pub fn arcs(&self) -> impl Iterator<Item = (NodeKey, NodeKey, ArcAttrs)> + '_ {
        self.succ
            .iter()
            .flat_map(|(&t, out)| out.iter().map(move |&(h, a)| (t, h, a)))
    }

    pub fn successors(&self, n: NodeKey) -> impl Iterator<Item = (NodeKey, &ArcAttrs)> {
        self.succ.get(&n).into_iter().flatten().map(|(h, a)| (*h, a))
    }

    pub fn predecessors(&self, n: NodeKey) -> impl Iterator<Item = (NodeKey, &ArcAttrs)> {
        self.pred.get(&n).into_iter().flatten().map(|(t, a)| (*t, a))
    }

    pub fn out_degree(&self, n: NodeKey) -> usize {
        self.succ.get(&n).map_or(0, Vec::len)
    }

    pub fn in_degree(&self, n: NodeKey) -> usize {
        self.pred.get(&n).map_or(0, Vec::len)
    }

    /// Node cost; nodes without an attached cost count as free.
    #[inline]
    pub fn cost(&self, n: NodeKey) -> f64 {
        self.cost.get(&n).copied().unwrap_or(0.0)
    }

    pub fn set_cost(&mut self, n: NodeKey, cost: f64) {
        self.cost.insert(n, cost);
    }

    /// An unfiltered forward view of this graph.
    pub fn view(&self) -> View<'_> {
        View {
            graph: self,
            reversed: false,
            node_ok: None,
            arc_ok: None,
        }
    }
}

// ── View ──────────────────────────────────────────────────────────────────────

/// A borrowed, optionally reversed and filtered perspective on a [`Subgraph`].
///
/// Arc predicates receive `(tail, head)` in **view orientation**: on a
/// reversed view the tail is the original head.
#[derive(Clone, Copy)]
pub struct View<'a> {
    graph: &'a Subgraph,
    reversed: bool,
    node_ok: Option<&'a dyn Fn(NodeKey) -> bool>,
    arc_ok: Option<&'a dyn Fn(NodeKey, NodeKey) -> bool>,
}

impl<'a> View<'a> {
    /// Flip the orientation, keeping any filters.
    pub fn reverse(mut self) -> View<'a> {
        self.reversed = !self.reversed;
        self
    }

    /// Restrict to nodes satisfying `pred`.
    pub fn filter_nodes(mut self, pred: &'a dyn Fn(NodeKey) -> bool) -> View<'a> {
        self.node_ok = Some(pred);
        self
    }

    /// Restrict to arcs satisfying `pred` (view orientation).
    pub fn filter_arcs(mut self, pred: &'a dyn Fn(NodeKey, NodeKey) -> bool) -> View<'a> {
        self.arc_ok = Some(pred);
        self
    }

    pub fn graph(&self) -> &'a Subgraph {
        self.graph
    }

    #[inline]
    pub fn contains(&self, n: NodeKey) -> bool {
        self.graph.contains(n) && self.node_ok.is_none_or(|ok| ok(n))
    }

    /// Arc attributes of `tail → head` in view orientation.
    pub fn arc(&self, tail: NodeKey, head: NodeKey) -> Option<&'a ArcAttrs> {
        if self.reversed {
            self.graph.arc(head, tail)
        } else {
            self.graph.arc(tail, head)
        }
    }

    /// Outgoing arcs of `n` in view orientation, filtered.
    pub fn successors(&self, n: NodeKey) -> impl Iterator<Item = (NodeKey, &'a ArcAttrs)> + '_ {
        let list = if self.reversed {
            self.graph.pred.get(&n)
        } else {
            self.graph.succ.get(&n)
        };
        let from_ok = self.contains(n);
        list.into_iter()
            .flatten()
            .filter(move |(other, _)| {
                from_ok
                    && self.contains(*other)
                    && self.arc_ok.is_none_or(|ok| ok(n, *other))
            })
            .map(|(other, a)| (*other, a))
    }

    /// Incoming arcs of `n` in view orientation, filtered. Yields `(tail,
    /// attrs)` for each view arc `tail → n`.
    pub fn predecessors(&self, n: NodeKey) -> impl Iterator<Item = (NodeKey, &'a ArcAttrs)> + '_ {
        let list = if self.reversed {
            self.graph.succ.get(&n)
        } else {
            self.graph.pred.get(&n)
        };
        let to_ok = self.contains(n);
        list.into_iter()
            .flatten()
            .filter(move |(other, _)| {
                to_ok
                    && self.contains(*other)
                    && self.arc_ok.is_none_or(|ok| ok(*other, n))
            })
            .map(|(other, a)| (*other, a))
    }
}
