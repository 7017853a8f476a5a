//! Separator (node-cut) generation.
//!
//! A separator for a pair is a set of candidate stations whose removal
//! disconnects origin from destination in the pair's subgraph; the induced
//! inequality is `Σ x_u ≥ 1` (min-cost) or `Σ x_u ≥ y_k` (max-demand).
//! Sites, pre-existing stations and auxiliary exit halves are always usable
//! and must never appear in a separator — a violation aborts with a
//! diagnostic.
//!
//! Three flavours:
//! - **connectivity separators** for integer solutions with no usable path,
//!   emitted as an origin-closest / destination-closest two-sided pair;
//! - **time separators** for integer solutions whose best usable path
//!   violates a bound, restricted to nodes that could still complete the
//!   trip within the budgets;
//! - **fractional separators** from a minimum cut over the LP values on the
//!   candidate split arcs.

use rustc_hash::FxHashSet;

use cp_core::{NodeId, NodeKey};
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;
use cp_graph::csp::{arc_road_time, arc_total_time};
use cp_graph::mincut::minimum_cut;
use cp_graph::search::{dfs_preorder, dijkstra_lengths, node_boundary};

use crate::coverage::is_candidate_key;
use crate::error::{SolveError, SolveResult};

/// A pair-coverage inequality: `Σ_{u ∈ members} x_u ≥ 1` (or `≥ y_pair`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    pub pair: usize,
    /// Candidate station ids, ascending.
    pub members: Vec<NodeId>,
}

impl Cut {
    fn from_separator(
        pair: usize,
        separator: &FxHashSet<NodeKey>,
        nodes: &Nodes,
    ) -> SolveResult<Cut> {
        if separator.is_empty() {
            return Err(SolveError::DataInconsistency(format!(
                "empty node cut for pair {pair}"
            )));
        }
        let mut members = Vec::with_capacity(separator.len());
        for &key in separator {
            if !is_candidate_key(nodes, key) {
                return Err(SolveError::DataInconsistency(format!(
                    "node {key} in a separator for pair {pair} is not a candidate station"
                )));
            }
            members.push(key.id);
        }
        members.sort_unstable();
        Ok(Cut { pair, members })
    }
}

// ── Initial seeding ───────────────────────────────────────────────────────────

/// Seed separator inequalities for one pair, in both directions.
///
/// Iteratively grows an out-component from the source over usable nodes plus
/// all previously seeded separator members; while the destination stays
/// unreachable, the destination-closest boundary behind the frontier is a
/// valid separator and is added to the growing set.
pub fn initial_separator_cuts(
    sub: &Subgraph,
    pair: &OdPair,
    pair_index: usize,
    nodes: &Nodes,
) -> SolveResult<Vec<Cut>> {
    let orig = NodeKey::entry(pair.origin);
    let dest = NodeKey::entry(pair.destination);
    let mut cuts = Vec::new();

    for (source, out, forward_reversed) in [(orig, dest, false), (dest, orig, true)] {
        let mut seeded: FxHashSet<NodeKey> = FxHashSet::default();
        loop {
            let usable = |key: NodeKey| {
                seeded.contains(&key) || !is_candidate_key(nodes, key)
            };
            let forward = if forward_reversed { sub.view().reverse() } else { sub.view() };
            let reverse = if forward_reversed { sub.view() } else { sub.view().reverse() };

            let component: FxHashSet<NodeKey> =
                dfs_preorder(forward.filter_nodes(&usable), source).into_iter().collect();
            if component.contains(&out) {
                break;
            }
            let boundary = node_boundary(forward, &component);
            let outside_boundary = |key: NodeKey| !boundary.contains(&key);
            let away: FxHashSet<NodeKey> =
                dfs_preorder(reverse.filter_nodes(&outside_boundary), out)
                    .into_iter()
                    .collect();
            let separator = node_boundary(reverse, &away);

            let cut = Cut::from_separator(pair_index, &separator, nodes)?;
            cuts.push(cut);
            seeded.extend(separator);
        }
    }
    Ok(cuts)
}

// ── Integer separation ────────────────────────────────────────────────────────

/// Connectivity separators for an integer solution with no active path:
/// origin-closest first, then destination-closest, deduplicated.
pub fn integer_separation(
    sub: &Subgraph,
    pair: &OdPair,
    pair_index: usize,
    nodes: &Nodes,
    is_active: &dyn Fn(NodeKey) -> bool,
) -> SolveResult<Vec<Cut>> {
    let orig = NodeKey::entry(pair.origin);
    let dest = NodeKey::entry(pair.destination);

    let orig_separator = integer_separator(sub, false, orig, dest, is_active);
    let dest_separator = integer_separator(sub, true, dest, orig, is_active);

    let mut cuts = vec![Cut::from_separator(pair_index, &orig_separator, nodes)?];
    if dest_separator != orig_separator {
        cuts.push(Cut::from_separator(pair_index, &dest_separator, nodes)?);
    }
    Ok(cuts)
}

/// Grow the active component from `source`, take its boundary, then walk
/// backwards from `out_source` avoiding the boundary; the boundary of that
/// far component is the separator closest to `out_source`.
fn integer_separator(
    sub: &Subgraph,
    reversed: bool,
    source: NodeKey,
    out_source: NodeKey,
    is_active: &dyn Fn(NodeKey) -> bool,
) -> FxHashSet<NodeKey> {
    let forward = if reversed { sub.view().reverse() } else { sub.view() };
    let reverse = if reversed { sub.view() } else { sub.view().reverse() };

    let component: FxHashSet<NodeKey> =
        dfs_preorder(forward.filter_nodes(is_active), source).into_iter().collect();
    let boundary = node_boundary(forward, &component);
    let outside_boundary = |key: NodeKey| !boundary.contains(&key);
    let away: FxHashSet<NodeKey> =
        dfs_preorder(reverse.filter_nodes(&outside_boundary), out_source)
            .into_iter()
            .collect();
    node_boundary(reverse, &away)
}

// ── Time separation ───────────────────────────────────────────────────────────

/// Separators for an integer solution whose best active path violates a
/// time bound: restricted to nodes that could still complete within both
/// budgets, two-sided as above.
pub fn integer_time_separation(
    sub: &Subgraph,
    pair: &OdPair,
    pair_index: usize,
    nodes: &Nodes,
    is_active: &dyn Fn(NodeKey) -> bool,
) -> SolveResult<Vec<Cut>> {
    let orig = NodeKey::entry(pair.origin);
    let dest = NodeKey::entry(pair.destination);
    // Arcs out of an inactive station are not traversable when measuring
    // reachable times from the source side.
    let tail_is_active = |tail: NodeKey, _head: NodeKey| is_active(tail);

    // Separator closest to the origin: best completion times are measured
    // on the unrestricted graph, reachable times on the active-tail graph.
    let best_time_to_dest = dijkstra_lengths(sub.view().reverse(), dest, arc_total_time);
    let best_road_to_dest = dijkstra_lengths(sub.view().reverse(), dest, arc_road_time);
    let time_from_orig =
        dijkstra_lengths(sub.view().filter_arcs(&tail_is_active), orig, arc_total_time);
    let road_from_orig =
        dijkstra_lengths(sub.view().filter_arcs(&tail_is_active), orig, arc_road_time);

    let orig_separator = time_separator(
        sub,
        false,
        orig,
        &time_from_orig,
        &road_from_orig,
        &best_time_to_dest,
        &best_road_to_dest,
        pair,
        is_active,
    );

    // Separator closest to the destination: roles swapped.
    let best_time_from_orig = dijkstra_lengths(sub.view(), orig, arc_total_time);
    let best_road_from_orig = dijkstra_lengths(sub.view(), orig, arc_road_time);
    let time_to_dest = dijkstra_lengths(
        sub.view().reverse().filter_arcs(&tail_is_active),
        dest,
        arc_total_time,
    );
    let road_to_dest = dijkstra_lengths(
        sub.view().reverse().filter_arcs(&tail_is_active),
        dest,
        arc_road_time,
    );

    let dest_separator = time_separator(
        sub,
        true,
        dest,
        &time_to_dest,
        &road_to_dest,
        &best_time_from_orig,
        &best_road_from_orig,
        pair,
        is_active,
    );

    let mut cuts = vec![Cut::from_separator(pair_index, &orig_separator, nodes)?];
    if dest_separator != orig_separator {
        cuts.push(Cut::from_separator(pair_index, &dest_separator, nodes)?);
    }
    Ok(cuts)
}

#[allow(clippy::too_many_arguments)]
fn time_separator(
    sub: &Subgraph,
    reversed: bool,
    source: NodeKey,
    source_time: &rustc_hash::FxHashMap<NodeKey, f64>,
    source_road_time: &rustc_hash::FxHashMap<NodeKey, f64>,
    best_dest_time: &rustc_hash::FxHashMap<NodeKey, f64>,
    best_dest_road_time: &rustc_hash::FxHashMap<NodeKey, f64>,
    pair: &OdPair,
    is_active: &dyn Fn(NodeKey) -> bool,
) -> FxHashSet<NodeKey> {
    // A node passes when the best-case completion through it still meets
    // both budgets.
    let within_budgets = |key: NodeKey| {
        match (
            source_time.get(&key),
            source_road_time.get(&key),
            best_dest_time.get(&key),
            best_dest_road_time.get(&key),
        ) {
            (Some(&st), Some(&srt), Some(&bt), Some(&brt)) => {
                bt + st <= pair.max_time && brt + srt <= pair.max_road_time
            }
            _ => false,
        }
    };
    let usable = |key: NodeKey| is_active(key) && within_budgets(key);

    let view = if reversed { sub.view().reverse() } else { sub.view() };
    let component: FxHashSet<NodeKey> =
        dfs_preorder(view.filter_nodes(&usable), source).into_iter().collect();
    let boundary = node_boundary(view, &component);
    boundary.into_iter().filter(|&key| within_budgets(key)).collect()
}

// ── Fractional separation ─────────────────────────────────────────────────────

/// Minimum-cut separation on the LP values: candidate split arcs carry
/// `x̃_u`, everything else is uncapacitated. Emits a cut when the cut value
/// falls short of `threshold` (1 − ε in min-cost mode, `ỹ_k` in max-demand
/// mode).
pub fn fractional_separation(
    sub: &Subgraph,
    pair: &OdPair,
    pair_index: usize,
    nodes: &Nodes,
    station_value: &dyn Fn(NodeId) -> f64,
    threshold: f64,
) -> SolveResult<Option<Cut>> {
    let orig = NodeKey::entry(pair.origin);
    let dest = NodeKey::entry(pair.destination);

    let capacity = |tail: NodeKey, head: NodeKey| {
        if !tail.is_auxiliary() && head.is_auxiliary() && head.id == tail.id {
            station_value(tail.id)
        } else {
            f64::INFINITY
        }
    };
    let (cut_value, source_side) = minimum_cut(sub, orig, dest, capacity);
    if cut_value >= threshold {
        return Ok(None);
    }

    let dest_component: FxHashSet<NodeKey> =
        sub.nodes().filter(|key| !source_side.contains(key)).collect();
    let separator = node_boundary(sub.view().reverse(), &dest_component);
    Ok(Some(Cut::from_separator(pair_index, &separator, nodes)?))
}
