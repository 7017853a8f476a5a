//! Per-pair subgraph construction.
//!
//! For every OD pair the global arc list is reduced to a minimal
//! feasibility-preserving graph and candidate stations are split so node
//! selection becomes an arc problem:
//!
//! 1. drop arcs touching sites other than the pair's endpoints,
//! 2. drop arcs whose transit-time lower bound already violates a budget,
//! 3. prune triangles at the endpoints (the lookup values are fastest
//!    connections, so the triangle inequality holds),
//! 4. prune arcs off every within-budget path via four one-to-all Dijkstra
//!    runs, bail out early when even the best origin→destination path
//!    violates a budget,
//! 5. drop isolated interior nodes (single pass),
//! 6. attach node costs and split candidates into entry/exit halves.
//!
//! Pairs are independent, so construction runs on a rayon pool sized by
//! `num_proc`.

use rayon::prelude::*;

use cp_core::{CoreResult, EPS, NodeKey, NodeType, Parameters, battery};
use cp_data::{Arc, Nodes, OdPair, TimeDistMap};

use crate::csp::{arc_road_time, arc_total_time, time_feasible_path};
use crate::search::dijkstra_lengths;
use crate::subgraph::{ArcAttrs, Subgraph};

/// Build one subgraph per OD pair, in parallel.
pub fn build_subgraphs(
    pairs: &[OdPair],
    arcs: &[Arc],
    nodes: &Nodes,
    map: &TimeDistMap,
    params: &Parameters,
) -> CoreResult<Vec<Subgraph>> {
    // Minimum full recharge over the whole trip; together with the trip
    // distance this lower-bounds the unavoidable fuel time.
    let fuel_time_bound = battery::recharge_time(
        params.min_state,
        1.0,
        params.charger_power,
        params.battery_capacity,
        battery::DEFAULT_LEFT,
        1.0,
    )?;

    let num_proc = params.num_proc;
    log::info!(
        "Creating subgraphs for {} OD pairs with {num_proc} workers.",
        pairs.len()
    );
    let started = std::time::Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_proc)
        .build()
        .expect("failed to build subgraph worker pool");
    let subgraphs = pool.install(|| {
        pairs
            .par_iter()
            .map(|pair| build_subgraph(pair, arcs, nodes, map, params.safe_range, fuel_time_bound))
            .collect()
    });

    log::info!(
        "Finished subgraph creation in {:.2} secs.",
        started.elapsed().as_secs_f64()
    );
    Ok(subgraphs)
}

/// Check each pair for a time-feasible route in its (unfiltered) subgraph
/// and set the `feasible` flags.
pub fn check_pair_feasibility(subgraphs: &[Subgraph], pairs: &mut [OdPair]) {
    assert_eq!(subgraphs.len(), pairs.len(), "subgraph/OD pair count mismatch");
    log::info!("Checking time feasibility of OD pairs..");
    let started = std::time::Instant::now();

    for (pair, sub) in pairs.iter_mut().zip(subgraphs) {
        let path = time_feasible_path(
            sub.view(),
            NodeKey::entry(pair.origin),
            NodeKey::entry(pair.destination),
            pair.max_road_time,
            pair.max_time,
        );
        pair.feasible = !path.is_empty();
    }
    log::info!("Finished in {:.2} secs.", started.elapsed().as_secs_f64());

    let feasible = pairs.iter().filter(|p| p.feasible).count();
    log::info!(
        "Feasible OD pairs: {feasible} ({:.2} %)",
        100.0 * feasible as f64 / pairs.len().max(1) as f64
    );
    let total_demand: f64 = pairs.iter().map(|p| p.demand).sum();
    let infeasible_demand: f64 = pairs.iter().filter(|p| !p.feasible).map(|p| p.demand).sum();
    log::info!("Total demand across OD pairs: {total_demand:.2}");
    if total_demand > 0.0 {
        let feasible_demand = total_demand - infeasible_demand;
        log::info!(
            "Feasible demand: {feasible_demand:.2} ({:.2} %)",
            100.0 * feasible_demand / total_demand
        );
    }
}

// ── Single-pair pipeline ──────────────────────────────────────────────────────

fn build_subgraph(
    pair: &OdPair,
    arcs: &[Arc],
    nodes: &Nodes,
    map: &TimeDistMap,
    truck_range: f64,
    fuel_time_bound: f64,
) -> Subgraph {
    let orig = NodeKey::entry(pair.origin);
    let dest = NodeKey::entry(pair.destination);

    let mut sub = Subgraph::new();
    for a in arcs {
        if !arc_is_relevant(a, pair, nodes)
            || !arc_within_lower_bounds(a, pair, map, truck_range, fuel_time_bound)
        {
            continue;
        }
        sub.add_arc(
            NodeKey::entry(a.tail),
            NodeKey::entry(a.head),
            ArcAttrs {
                road_time: a.road_time,
                fuel_time: a.fuel_time,
                break_time: a.break_time,
                distance: a.distance,
            },
        );
    }

    if !sub.contains(orig) || !sub.contains(dest) {
        return Subgraph::new();
    }

    let Some(sub) = prune_redundant_arcs(sub, orig, dest, pair.max_road_time, pair.max_time)
    else {
        return Subgraph::new();
    };
    let mut sub = sub;

    remove_isolated_nodes(&mut sub, orig, dest);

    for key in sub.nodes().collect::<Vec<_>>() {
        sub.set_cost(key, nodes.cost(key.id));
    }

    split_candidate_nodes(&mut sub);
    sub
}

/// Arcs incident to a site other than the pair's endpoints can never lie on
/// a valid route for this pair.
fn arc_is_relevant(a: &Arc, pair: &OdPair, nodes: &Nodes) -> bool {
    !(nodes.kind(a.tail) == NodeType::Site && a.tail != pair.origin)
        && !(nodes.kind(a.head) == NodeType::Site && a.head != pair.destination)
}

/// Transit-time lower bound through this arc, using the direct connections
/// origin → tail and head → destination from the lookup map.
fn arc_within_lower_bounds(
    a: &Arc,
    pair: &OdPair,
    map: &TimeDistMap,
    truck_range: f64,
    fuel_time_bound: f64,
) -> bool {
    let (time_from_orig, dist_from_orig) = map.get(pair.origin, a.tail);
    let (time_to_dest, dist_to_dest) = map.get(a.head, pair.destination);

    let road_time = time_from_orig + a.road_time + time_to_dest;
    let distance = dist_from_orig + a.distance + dist_to_dest;
    let total_time = road_time + a.break_time + distance * (fuel_time_bound / truck_range);

    total_time <= pair.max_time && road_time <= pair.max_road_time
}

/// Remove arcs that cannot lie on any within-budget path. Returns `None`
/// when even the unconstrained best path violates a budget.
fn prune_redundant_arcs(
    mut sub: Subgraph,
    orig: NodeKey,
    dest: NodeKey,
    max_road_time: f64,
    max_time: f64,
) -> Option<Subgraph> {
    // Triangles at the endpoints: any arc into a direct successor of the
    // origin is dominated by the direct arc, and symmetrically at the
    // destination.
    let succ_of_orig: Vec<NodeKey> = sub.successors(orig).map(|(v, _)| v).collect();
    let mut redundant = Vec::new();
    for v in succ_of_orig {
        for (u, _) in sub.predecessors(v) {
            if u != orig {
                redundant.push((u, v));
            }
        }
    }
    for (u, v) in redundant.drain(..) {
        sub.remove_arc(u, v);
    }
    let pred_of_dest: Vec<NodeKey> = sub.predecessors(dest).map(|(u, _)| u).collect();
    for u in pred_of_dest {
        for (v, _) in sub.successors(u) {
            if v != dest {
                redundant.push((u, v));
            }
        }
    }
    for (u, v) in redundant.drain(..) {
        sub.remove_arc(u, v);
    }

    let road_from_orig = dijkstra_lengths(sub.view(), orig, arc_road_time);
    let road_to_dest = dijkstra_lengths(sub.view().reverse(), dest, arc_road_time);
    let time_from_orig = dijkstra_lengths(sub.view(), orig, arc_total_time);
    let time_to_dest = dijkstra_lengths(sub.view().reverse(), dest, arc_total_time);

    if road_from_orig.get(&dest).is_none_or(|&t| t > max_road_time) {
        return None;
    }
    if time_from_orig.get(&dest).is_none_or(|&t| t > max_time) {
        return None;
    }

    let redundant: Vec<(NodeKey, NodeKey)> = sub
        .arcs()
        .filter(|&(u, v, attrs)| {
            let bounded = |from: Option<&f64>, to: Option<&f64>, arc: f64, limit: f64| match (from, to)
            {
                (Some(&a), Some(&b)) => a + arc + b <= limit,
                _ => false,
            };
            let road_ok = bounded(
                road_from_orig.get(&u),
                road_to_dest.get(&v),
                attrs.road_time,
                max_road_time,
            );
            let time_ok = bounded(
                time_from_orig.get(&u),
                time_to_dest.get(&v),
                attrs.total_time(),
                max_time,
            );
            !(road_ok && time_ok)
        })
        .map(|(u, v, _)| (u, v))
        .collect();
    for (u, v) in redundant {
        sub.remove_arc(u, v);
    }

    Some(sub)
}

/// Drop interior nodes with no incoming or no outgoing arcs. A single pass:
/// removal can expose new isolates in principle, which is accepted.
fn remove_isolated_nodes(sub: &mut Subgraph, orig: NodeKey, dest: NodeKey) {
    let isolates: Vec<NodeKey> = sub
        .nodes()
        .filter(|&n| n != orig && n != dest && (sub.in_degree(n) == 0 || sub.out_degree(n) == 0))
        .collect();
    for n in isolates {
        sub.remove_node(n);
    }
}

/// Split every candidate node with both incoming and outgoing arcs into an
/// entry and an exit half.
///
/// All outgoing arcs are re-tailed onto the zero-cost exit half and a single
/// zero-weight arc connects entry to exit, so "the station is used" becomes
/// "the `(entry, exit)` arc is traversed".
fn split_candidate_nodes(sub: &mut Subgraph) {
    let candidates: Vec<NodeKey> = sub.nodes().filter(|&n| sub.cost(n) > EPS).collect();
    for node in candidates {
        if sub.in_degree(node) == 0 || sub.out_degree(node) == 0 {
            continue; // ignore isolates
        }
        let exit = NodeKey::exit(node.id);
        let outgoing: Vec<(NodeKey, ArcAttrs)> =
            sub.successors(node).map(|(v, a)| (v, *a)).collect();
        for (v, attrs) in outgoing {
            sub.remove_arc(node, v);
            sub.add_arc(exit, v, attrs);
        }
        sub.set_cost(exit, 0.0);
        sub.add_arc(node, exit, ArcAttrs::ZERO);
    }
}
