//! Post-solve solution checking.
//!
//! The orchestrator's claimed cost and demand are re-derived from the final
//! `real` flags with the exact coverage oracle; deviations beyond the
//! numeric tolerance are logged as warnings (a truncated run can legally
//! produce them, a bug-free completed run cannot).

use cp_core::EPS;
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;

use crate::coverage::check_pair_coverage;

/// Re-derive covered demand and total cost from the selection and compare
/// with the claimed values. Returns `(verified_demand, verified_cost)`.
pub fn check_solution(
    nodes: &Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
    claimed_demand: f64,
    claimed_cost: f64,
) -> (f64, f64) {
    log::info!("Performing solution check..");

    let cost = nodes.selected_cost();
    let cost_above = cost > claimed_cost + EPS;
    if cost_above || cost < claimed_cost - EPS {
        log::warn!(
            "Solution cost {} than expected (claimed / actual): {:.2} / {:.2}",
            if cost_above { "higher" } else { "lower" },
            claimed_cost,
            cost
        );
    }

    check_pair_coverage(nodes, subgraphs, pairs);
    let demand: f64 = pairs.iter().filter(|p| p.covered).map(|p| p.demand).sum();

    let demand_below = demand < claimed_demand - EPS;
    if demand_below || demand > claimed_demand + EPS {
        log::warn!(
            "Covered demand {} than expected (claimed / actual): {:.2} / {:.2}",
            if demand_below { "lower" } else { "higher" },
            claimed_demand,
            demand
        );
    }

    (demand, cost)
}

/// Verify and log the final outcome summary.
pub fn verify_model_output(
    nodes: &Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
    covered_demand: f64,
    total_cost: f64,
) {
    let (demand, cost) = check_solution(nodes, subgraphs, pairs, covered_demand, total_cost);

    let covered = pairs.iter().filter(|p| p.covered).count();
    log::info!(
        "Covered OD pairs: {covered} ({:.2} %)",
        100.0 * covered as f64 / pairs.len().max(1) as f64
    );
    log::info!("Total station cost: {cost:.2}");

    let total_demand: f64 = pairs.iter().map(|p| p.demand).sum();
    let infeasible_demand: f64 = pairs.iter().filter(|p| !p.feasible).map(|p| p.demand).sum();
    if total_demand > 0.0 {
        log::info!(
            "Final solution: covered demand = {demand:.2} ({:.2} %), cost = {cost:.2}",
            100.0 * demand / total_demand
        );
        log::info!(
            "Time-infeasible demand = {infeasible_demand:.2} ({:.2} %)",
            100.0 * infeasible_demand / total_demand
        );
    }
}
