//! Redundancy reduction: shrink a station selection to a minimal subset
//! covering the same pairs.
//!
//! Greedy, not optimal: candidates are visited in ascending id order; a
//! station is dropped when every pair currently routed through it admits a
//! substitute path avoiding it. Substitutes are committed immediately so
//! later drops are evaluated against them.

use rustc_hash::FxHashSet;

use cp_core::{NodeId, NodeKey};
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;

use crate::coverage::{get_feasible_path, is_unconditionally_usable};

/// Reduce `solution` to a minimal subset covering the same OD pairs.
///
/// Pairs that are infeasible, have zero demand, or are flagged in `ignore`
/// do not constrain the reduction.
pub fn remove_redundancy(
    solution: &[NodeId],
    nodes: &Nodes,
    subgraphs: &[Subgraph],
    pairs: &[OdPair],
    ignore: Option<&[bool]>,
) -> Vec<NodeId> {
    let mut active: FxHashSet<NodeId> = solution.iter().copied().collect();
    let indices: Vec<usize> = (0..pairs.len())
        .filter(|&k| {
            pairs[k].feasible && pairs[k].is_required() && !ignore.is_some_and(|ig| ig[k])
        })
        .collect();

    // Initial path per pair under the full solution.
    let mut paths: Vec<Option<Vec<NodeKey>>> = vec![None; pairs.len()];
    for &k in &indices {
        let usable =
            |key: NodeKey| is_unconditionally_usable(nodes, key) || active.contains(&key.id);
        let path = get_feasible_path(&subgraphs[k], &pairs[k], &usable);
        if !path.is_empty() {
            paths[k] = Some(path);
        }
    }

    for node in nodes.candidate_ids() {
        if !active.contains(&node) {
            continue;
        }
        // Substitute paths for every pair currently using this station.
        let mut substitutes: Vec<(usize, Vec<NodeKey>)> = Vec::new();
        let mut removable = true;
        for &k in &indices {
            let uses_node = paths[k]
                .as_ref()
                .is_some_and(|p| p.iter().any(|key| key.id == node && !key.is_auxiliary()));
            if !uses_node {
                continue;
            }
            let usable = |key: NodeKey| {
                key.id != node
                    && (is_unconditionally_usable(nodes, key) || active.contains(&key.id))
            };
            let path = get_feasible_path(&subgraphs[k], &pairs[k], &usable);
            if path.is_empty() {
                removable = false;
                break;
            }
            substitutes.push((k, path));
        }
        if removable {
            active.remove(&node);
            for (k, path) in substitutes {
                paths[k] = Some(path);
            }
        }
    }

    nodes
        .candidate_ids()
        .into_iter()
        .filter(|id| active.contains(id))
        .collect()
}

/// Reduce the final solution marked in `nodes` and return the total cost of
/// the remaining selection.
pub fn remove_redundant_stations(
    nodes: &mut Nodes,
    subgraphs: &[Subgraph],
    pairs: &[OdPair],
) -> f64 {
    log::info!("Removing redundant stations.");
    let started = std::time::Instant::now();

    let solution: Vec<NodeId> = nodes
        .candidate_ids()
        .into_iter()
        .filter(|&id| nodes.is_real(id))
        .collect();
    let reduced = remove_redundancy(&solution, nodes, subgraphs, pairs, None);

    for id in nodes.candidate_ids() {
        nodes.set_real(id, false);
    }
    for &id in &reduced {
        nodes.set_real(id, true);
    }

    log::info!("Finished in {:.2} secs.", started.elapsed().as_secs_f64());
    nodes.selected_cost()
}
