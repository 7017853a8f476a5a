//! Coverage checking: which pairs admit a time-feasible route through the
//! currently usable stations.

use cp_core::NodeKey;
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;
use cp_graph::csp::time_feasible_path;

/// A node that never blocks a route: an auxiliary exit half or a
/// non-candidate (site or pre-existing station).
#[inline]
pub fn is_unconditionally_usable(nodes: &Nodes, key: NodeKey) -> bool {
    key.is_auxiliary() || !nodes.is_candidate(key.id)
}

/// A candidate station (entry half) — the only kind of node a separator may
/// contain.
#[inline]
pub fn is_candidate_key(nodes: &Nodes, key: NodeKey) -> bool {
    !is_unconditionally_usable(nodes, key)
}

/// Time-feasible path for `pair` in its subgraph restricted by `usable`.
pub fn get_feasible_path(
    sub: &Subgraph,
    pair: &OdPair,
    usable: &dyn Fn(NodeKey) -> bool,
) -> Vec<NodeKey> {
    time_feasible_path(
        sub.view().filter_nodes(usable),
        NodeKey::entry(pair.origin),
        NodeKey::entry(pair.destination),
        pair.max_road_time,
        pair.max_time,
    )
}

/// Set the `covered` flag of every pair from the current `real` selection.
pub fn check_pair_coverage(nodes: &Nodes, subgraphs: &[Subgraph], pairs: &mut [OdPair]) {
    for (pair, sub) in pairs.iter_mut().zip(subgraphs) {
        let usable =
            |key: NodeKey| is_unconditionally_usable(nodes, key) || nodes.is_real(key.id);
        pair.covered = !get_feasible_path(sub, pair, &usable).is_empty();
    }
}
