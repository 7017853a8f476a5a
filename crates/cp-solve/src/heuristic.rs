//! Primal heuristic and start solutions.
//!
//! The primal heuristic rounds an LP-relaxed solution into a feasible
//! integer one: per pair it searches the cheapest time-feasible path under
//! *reduced* station costs `cost_u · max(0, 1 − x̃_u)` — stations the LP
//! already likes are nearly free — then pays the marginal cost of the new
//! stations on the path. Cost overrides are passed as a lookup closure, the
//! subgraphs themselves are never mutated.

use rustc_hash::{FxHashMap, FxHashSet};

use cp_core::{EPS, NodeId, NodeKey};
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;
use cp_graph::csp::time_feasible_cheapest_path;

use crate::coverage::is_candidate_key;
use crate::reduce::remove_redundancy;

/// A candidate integer solution tracked by the orchestrator.
#[derive(Debug, Clone)]
pub struct Incumbent {
    /// Selected candidate stations.
    pub stations: FxHashSet<NodeId>,
    /// Served pairs (all required pairs in min-cost mode).
    pub served: FxHashSet<usize>,
    /// Total cost of the selected stations.
    pub cost: f64,
    /// Total demand over the served pairs.
    pub demand: f64,
}

impl Incumbent {
    pub fn new(stations: FxHashSet<NodeId>, served: FxHashSet<usize>, nodes: &Nodes, pairs: &[OdPair]) -> Incumbent {
        let cost = stations.iter().map(|&id| nodes.cost(id)).sum();
        let demand = served.iter().map(|&k| pairs[k].demand).sum();
        Incumbent { stations, served, cost, demand }
    }
}

/// Construct an integer solution from LP values.
///
/// In max-demand mode pairs are visited in order of decreasing (partially)
/// covered demand and a pair is only served while the budget allows it; in
/// min-cost mode every pair with a path is served.
pub fn primal_heuristic(
    indices: &[usize],
    pairs: &[OdPair],
    subgraphs: &[Subgraph],
    nodes: &Nodes,
    station_lp: &FxHashMap<NodeId, f64>,
    demand_lp: Option<&FxHashMap<usize, f64>>,
    cost_budget: f64,
) -> (FxHashSet<NodeId>, FxHashSet<usize>) {
    let mut order: Vec<usize> = indices.to_vec();
    if let Some(demand_lp) = demand_lp {
        // Serve the most (fractionally) satisfied demand first.
        let covered = |k: usize| demand_lp.get(&k).copied().unwrap_or(0.0) * pairs[k].demand;
        order.sort_by(|&a, &b| covered(b).total_cmp(&covered(a)));
    }

    let mut chosen: FxHashSet<NodeId> = FxHashSet::default();
    let mut served: FxHashSet<usize> = FxHashSet::default();
    let mut total_cost = 0.0;

    for &k in &order {
        let sub = &subgraphs[k];
        let pair = &pairs[k];

        // Reduced node costs from the LP values.
        let reduced_cost = |key: NodeKey| {
            let cost = sub.cost(key);
            if cost > EPS {
                let lp = station_lp.get(&key.id).copied().unwrap_or(0.0);
                cost * (1.0 - lp).max(0.0)
            } else {
                cost
            }
        };
        let (path, _) = time_feasible_cheapest_path(
            sub.view(),
            NodeKey::entry(pair.origin),
            NodeKey::entry(pair.destination),
            pair.max_road_time,
            pair.max_time,
            &reduced_cost,
        );

        if path.is_empty() {
            continue;
        }
        // Marginal cost: stations already chosen for another pair are free.
        let new_stations: Vec<NodeId> = path
            .iter()
            .filter(|&&key| is_candidate_key(nodes, key) && !chosen.contains(&key.id))
            .map(|key| key.id)
            .collect();
        let path_cost: f64 = new_stations.iter().map(|&id| nodes.cost(id)).sum();

        if total_cost + path_cost <= cost_budget {
            total_cost += path_cost;
            chosen.extend(new_stations);
            served.insert(k);
        }
    }
    (chosen, served)
}

/// Start solution for min-cost mode: a cheapest path per pair with already
/// chosen stations free of charge, reduced to a minimal subset afterwards.
pub fn min_cost_initial_solution(
    indices: &[usize],
    pairs: &[OdPair],
    subgraphs: &[Subgraph],
    nodes: &Nodes,
) -> Vec<NodeId> {
    log::info!("Running heuristic for initial solution.");
    let mut chosen: FxHashSet<NodeId> = FxHashSet::default();
    for &k in indices {
        let (path, _) = cheapest_path_with_free_set(&subgraphs[k], &pairs[k], &chosen);
        chosen.extend(
            path.iter()
                .filter(|&&key| is_candidate_key(nodes, key))
                .map(|key| key.id),
        );
    }
    let solution: Vec<NodeId> = chosen.into_iter().collect();
    let reduced = remove_redundancy(&solution, nodes, subgraphs, pairs, None);
    let cost: f64 = reduced.iter().map(|&id| nodes.cost(id)).sum();
    log::info!("Constructed initial solution. Cost = {cost:.2}");
    reduced
}

/// Start solution for max-demand mode: greedily serve pairs by decreasing
/// demand while the budget allows.
pub fn max_demand_initial_solution(
    indices: &[usize],
    pairs: &[OdPair],
    subgraphs: &[Subgraph],
    nodes: &Nodes,
    cost_budget: f64,
) -> (FxHashSet<NodeId>, FxHashSet<usize>) {
    log::info!("Constructing simple initial solution.");
    let mut order: Vec<usize> = indices.to_vec();
    order.sort_by(|&a, &b| pairs[b].demand.total_cmp(&pairs[a].demand));

    let mut chosen: FxHashSet<NodeId> = FxHashSet::default();
    let mut served: FxHashSet<usize> = FxHashSet::default();
    let mut total_cost = 0.0;
    let mut total_demand = 0.0;

    for &k in &order {
        let (path, path_cost) = cheapest_path_with_free_set(&subgraphs[k], &pairs[k], &chosen);
        if path.is_empty() || total_cost + path_cost > cost_budget {
            continue;
        }
        chosen.extend(
            path.iter()
                .filter(|&&key| is_candidate_key(nodes, key))
                .map(|key| key.id),
        );
        total_cost += path_cost;
        total_demand += pairs[k].demand;
        served.insert(k);
    }
    log::info!(
        "Found initial solution: covered demand = {total_demand:.2}, cost = {total_cost:.2}"
    );
    (chosen, served)
}

/// Cheapest time-feasible path with the stations in `free` costing nothing.
/// The returned cost is therefore the marginal cost of the path.
fn cheapest_path_with_free_set(
    sub: &Subgraph,
    pair: &OdPair,
    free: &FxHashSet<NodeId>,
) -> (Vec<NodeKey>, f64) {
    let cost = |key: NodeKey| {
        if free.contains(&key.id) {
            0.0
        } else {
            sub.cost(key)
        }
    };
    let (path, path_cost) = time_feasible_cheapest_path(
        sub.view(),
        NodeKey::entry(pair.origin),
        NodeKey::entry(pair.destination),
        pair.max_road_time,
        pair.max_time,
        &cost,
    );
    if path.is_empty() {
        (path, f64::INFINITY)
    } else {
        (path, path_cost)
    }
}
