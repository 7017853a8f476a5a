//! Constrained shortest paths.
//!
//! Finds paths satisfying bounds on road time and total (road + fuel +
//! break) time. The two-bound problem is reduced to single-bound problems
//! solved with LARAC — Lagrange-relaxation-based aggregated cost, after
//! Jüttner et al., "Lagrange Relaxation Based Method for the QoS Routing
//! Problem" (2001). LARAC is a heuristic; exact bound checks happen wherever
//! a solution is accepted.

use cp_core::{EPS, NodeKey};

use crate::search::{Weight, bidirectional_dijkstra};
use crate::subgraph::{ArcAttrs, View};

/// Hard cap on LARAC iterations; the absolute stopping tolerance can in
/// principle chatter on inputs with huge cost magnitudes.
const MAX_LARAC_ITERS: usize = 128;

// ── Arc weight functions ──────────────────────────────────────────────────────

/// Road time of an arc.
pub fn arc_road_time(_tail: NodeKey, _head: NodeKey, attrs: &ArcAttrs) -> f64 {
    attrs.road_time
}

/// Total traversal time of an arc, including fuel and break time.
pub fn arc_total_time(_tail: NodeKey, _head: NodeKey, attrs: &ArcAttrs) -> f64 {
    attrs.total_time()
}

// ── Shortest path ─────────────────────────────────────────────────────────────

/// Shortest path w.r.t. `weight`; `(∅, ∞)` when no path exists or either
/// endpoint is missing.
pub fn shortest_path(
    view: View<'_>,
    orig: NodeKey,
    dest: NodeKey,
    weight: impl Weight,
) -> (Vec<NodeKey>, f64) {
    match bidirectional_dijkstra(view, orig, dest, weight) {
        Some((path, length)) => (path, length),
        None => (Vec::new(), f64::INFINITY),
    }
}

/// Sum of `weight` over the arcs of `path`.
pub fn path_weight(view: View<'_>, path: &[NodeKey], weight: impl Weight) -> f64 {
    path.windows(2)
        .map(|w| {
            let attrs = view.arc(w[0], w[1]).expect("path arc must exist");
            weight(w[0], w[1], attrs)
        })
        .sum()
}

// ── Time-feasible paths ───────────────────────────────────────────────────────

/// A path satisfying both the road-time and the total-time bound, or `∅`.
pub fn time_feasible_path(
    view: View<'_>,
    orig: NodeKey,
    dest: NodeKey,
    max_road_time: f64,
    max_time: f64,
) -> Vec<NodeKey> {
    // Fastest path within the road-time bound.
    let (path, path_time) = larac(view, orig, dest, max_road_time, arc_road_time, arc_total_time);
    if path_time.is_infinite() {
        return Vec::new();
    }
    if path_time > max_time {
        // Dual reduction: minimize road time within the total-time bound.
        let (path, path_road_time) =
            larac(view, orig, dest, max_time, arc_total_time, arc_road_time);
        if path_road_time > max_road_time {
            return Vec::new();
        }
        return path;
    }
    path
}

/// Approximately cheapest path (by node cost) within both time bounds.
///
/// `node_cost` is consulted for the head of every traversed arc; the pair's
/// origin never contributes. Returns the path and its cost, or `(∅, ∞)`.
pub fn time_feasible_cheapest_path(
    view: View<'_>,
    orig: NodeKey,
    dest: NodeKey,
    max_road_time: f64,
    max_time: f64,
    node_cost: &dyn Fn(NodeKey) -> f64,
) -> (Vec<NodeKey>, f64) {
    let arc_cost = |_tail: NodeKey, head: NodeKey, _attrs: &ArcAttrs| node_cost(head);

    // Cheapest within the road-time bound.
    let (path, path_cost) = larac(view, orig, dest, max_road_time, arc_road_time, &arc_cost);
    if path.is_empty() {
        return (Vec::new(), f64::INFINITY);
    }
    if path_weight(view, &path, arc_total_time) <= max_time {
        return (path, path_cost);
    }

    // Cheapest within the total-time bound; verify the road-time bound.
    let (path, path_cost) = larac(view, orig, dest, max_time, arc_total_time, &arc_cost);
    if path.is_empty() {
        return (Vec::new(), f64::INFINITY);
    }
    if path_weight(view, &path, arc_road_time) > max_road_time {
        return (Vec::new(), f64::INFINITY);
    }
    (path, path_cost)
}

// ── LARAC ─────────────────────────────────────────────────────────────────────

/// Weight-bounded shortest path: heuristically minimize `length` subject to
/// `weight(path) ≤ bound`.
///
/// Returns the path and its `length`, or `(∅, ∞)` when even the minimum-
/// weight path exceeds the bound (the reduction is then infeasible).
fn larac<W: Weight, L: Weight>(
    view: View<'_>,
    orig: NodeKey,
    dest: NodeKey,
    bound: f64,
    weight: W,
    length: L,
) -> (Vec<NodeKey>, f64) {
    let (mut spath, spath_length) = shortest_path(view, orig, dest, &length);
    if spath_length.is_infinite() {
        return (Vec::new(), f64::INFINITY);
    }
    if path_weight(view, &spath, &weight) <= bound {
        return (spath, spath_length);
    }

    let (mut wpath, wpath_weight) = shortest_path(view, orig, dest, &weight);
    if wpath_weight > bound {
        return (Vec::new(), f64::INFINITY);
    }

    for _ in 0..MAX_LARAC_ITERS {
        // Lagrange multiplier from the current bracketing pair.
        let lambda = (path_weight(view, &wpath, &length) - path_weight(view, &spath, &length))
            / (path_weight(view, &spath, &weight) - path_weight(view, &wpath, &weight));
        let combined =
            |t: NodeKey, h: NodeKey, a: &ArcAttrs| length(t, h, a) + lambda * weight(t, h, a);

        let (path, path_cost) = shortest_path(view, orig, dest, &combined);
        if path_cost.is_infinite() {
            return (Vec::new(), f64::INFINITY);
        }
        if (path_cost - path_weight(view, &spath, &combined)).abs() < EPS {
            break;
        }
        if path_weight(view, &path, &weight) <= bound {
            wpath = path;
        } else {
            spath = path;
        }
    }
    let len = path_weight(view, &wpath, &length);
    (wpath, len)
}
