//! Search primitives over graph views.
//!
//! All weights must be non-negative; ties in the priority queues are broken
//! by node key for determinism.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use cp_core::NodeKey;

use crate::subgraph::{ArcAttrs, View};

/// Arc weight function: `(tail, head, attrs) → weight`.
pub trait Weight: Fn(NodeKey, NodeKey, &ArcAttrs) -> f64 {}
impl<F: Fn(NodeKey, NodeKey, &ArcAttrs) -> f64> Weight for F {}

// ── Priority queue entry ──────────────────────────────────────────────────────

/// Min-heap entry ordered by `(cost, node)`.
struct Entry {
    cost: f64,
    node: NodeKey,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the std max-heap behaves as a min-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

// ── Single-source Dijkstra ────────────────────────────────────────────────────

/// Shortest-path lengths from `source` to every reachable node of the view.
///
/// Returns an empty map when `source` is not in the view; unreachable nodes
/// are simply absent.
pub fn dijkstra_lengths(
    view: View<'_>,
    source: NodeKey,
    weight: impl Weight,
) -> FxHashMap<NodeKey, f64> {
    let mut dist: FxHashMap<NodeKey, f64> = FxHashMap::default();
    if !view.contains(source) {
        return dist;
    }

    let mut heap = BinaryHeap::new();
    dist.insert(source, 0.0);
    heap.push(Entry { cost: 0.0, node: source });

    while let Some(Entry { cost, node }) = heap.pop() {
        if cost > dist[&node] {
            continue; // stale entry
        }
        for (next, attrs) in view.successors(node) {
            let next_cost = cost + weight(node, next, attrs);
            if dist.get(&next).is_none_or(|&d| next_cost < d) {
                dist.insert(next, next_cost);
                heap.push(Entry { cost: next_cost, node: next });
            }
        }
    }
    dist
}

// ── Bidirectional Dijkstra ────────────────────────────────────────────────────

/// Shortest path from `source` to `target` under `weight`.
///
/// Runs Dijkstra from both endpoints in alternation and stops as soon as
/// some node is settled by both searches; the best recorded meeting point
/// then closes the optimal path. Returns `None` when either endpoint is
/// missing from the view or no path exists.
pub fn bidirectional_dijkstra(
    view: View<'_>,
    source: NodeKey,
    target: NodeKey,
    weight: impl Weight,
) -> Option<(Vec<NodeKey>, f64)> {
    if !view.contains(source) || !view.contains(target) {
        return None;
    }
    if source == target {
        return Some((vec![source], 0.0));
    }

    // Index 0: forward search from the source, 1: backward from the target.
    let mut settled = [FxHashMap::default(), FxHashMap::default()];
    let mut seen = [FxHashMap::default(), FxHashMap::default()];
    let mut prev: [FxHashMap<NodeKey, NodeKey>; 2] =
        [FxHashMap::default(), FxHashMap::default()];
    let mut fringe = [BinaryHeap::new(), BinaryHeap::new()];

    seen[0].insert(source, 0.0);
    seen[1].insert(target, 0.0);
    fringe[0].push(Entry { cost: 0.0, node: source });
    fringe[1].push(Entry { cost: 0.0, node: target });

    let mut best = f64::INFINITY;
    let mut meet: Option<NodeKey> = None;
    let mut dir = 1usize;

    while !fringe[0].is_empty() && !fringe[1].is_empty() {
        dir = 1 - dir;
        let Entry { cost, node } = fringe[dir].pop().unwrap();
        if settled[dir].contains_key(&node) {
            continue; // stale entry
        }
        settled[dir].insert(node, cost);
        if settled[1 - dir].contains_key(&node) {
            // Both frontiers passed this node: the recorded best is optimal.
            break;
        }

        let relax: Vec<(NodeKey, f64)> = if dir == 0 {
            view.successors(node)
                .map(|(n, a)| (n, weight(node, n, a)))
                .collect()
        } else {
            view.predecessors(node)
                .map(|(n, a)| (n, weight(n, node, a)))
                .collect()
        };
        for (next, w) in relax {
            if settled[dir].contains_key(&next) {
                continue;
            }
            let next_cost = cost + w;
            if seen[dir].get(&next).is_none_or(|&d| next_cost < d) {
                seen[dir].insert(next, next_cost);
                prev[dir].insert(next, node);
                fringe[dir].push(Entry { cost: next_cost, node: next });
                if let (Some(&df), Some(&db)) = (seen[0].get(&next), seen[1].get(&next)) {
                    if df + db < best {
                        best = df + db;
                        meet = Some(next);
                    }
                }
            }
        }
    }

    let meet = meet?;
    // Predecessor chains only pass through settled nodes, so they are stable
    // and reconstruct exactly the recorded best path.
    let mut path = Vec::new();
    let mut cur = meet;
    while cur != source {
        path.push(cur);
        cur = prev[0][&cur];
    }
    path.push(source);
    path.reverse();
    let mut cur = meet;
    while cur != target {
        cur = prev[1][&cur];
        path.push(cur);
    }
    Some((path, best))
}

// ── DFS and boundary ──────────────────────────────────────────────────────────

/// Nodes reachable from `source` in the view, in depth-first preorder.
///
/// Returns an empty vector when `source` is not in the view.
pub fn dfs_preorder(view: View<'_>, source: NodeKey) -> Vec<NodeKey> {
    let mut order = Vec::new();
    if !view.contains(source) {
        return order;
    }
    let mut visited: FxHashSet<NodeKey> = FxHashSet::default();
    let mut stack = vec![source];
    visited.insert(source);
    while let Some(node) = stack.pop() {
        order.push(node);
        for (next, _) in view.successors(node) {
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    order
}

/// The node boundary of `set`: nodes outside `set` with an in-arc from it
/// (in view orientation).
pub fn node_boundary(view: View<'_>, set: &FxHashSet<NodeKey>) -> FxHashSet<NodeKey> {
    let mut boundary = FxHashSet::default();
    for &n in set {
        for (next, _) in view.successors(n) {
            if !set.contains(&next) {
                boundary.insert(next);
            }
        }
    }
    boundary
}
