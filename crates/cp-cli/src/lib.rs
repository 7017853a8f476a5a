//! Pipeline wiring for the `chargeplan` binary.
//!
//! Load → preprocess → per-pair subgraphs → optimize → verify → account →
//! export. Everything heavy lives in the library crates; this one only
//! sequences them and reports timings.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use cp_data::load::load_inputs;
use cp_data::prep::{preprocess_arcs, preprocess_nodes, preprocess_od_pairs};
use cp_graph::{build_subgraphs, check_pair_feasibility};
use cp_report::{calc_station_stats, write_outputs};
use cp_solve::verify::verify_model_output;
use cp_solve::{max_demand_pairs, min_cost_pairs};

/// Run the whole tool: read inputs from `input_dir`, write results into
/// `output_dir`.
pub fn run(input_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    let inputs = load_inputs(input_dir).context("loading inputs")?;
    let params = inputs.params;
    let transit = params.transit_time();
    log::info!("Parameters: {params:?}");

    // ── Preprocessing ─────────────────────────────────────────────────────
    let prep_started = Instant::now();
    log::info!("Starting preprocessing of data.");

    let mut nodes = inputs.nodes;
    let (arcs, time_dist_map) = preprocess_arcs(inputs.arcs, &nodes, &transit, &params)
        .context("preprocessing arcs")?;
    preprocess_nodes(&mut nodes);
    let (mut pairs, unknown_sites) =
        preprocess_od_pairs(inputs.od_pairs, &nodes, &time_dist_map, &transit, &params);

    let subgraphs = build_subgraphs(&pairs, &arcs, &nodes, &time_dist_map, &params)
        .context("building subgraphs")?;
    check_pair_feasibility(&subgraphs, &mut pairs);

    log::info!(
        "Total time spent on preprocessing: {:.2} secs",
        prep_started.elapsed().as_secs_f64()
    );

    // ── Optimization ──────────────────────────────────────────────────────
    log::info!("Starting optimization model");
    let algo_started = Instant::now();
    let (covered_demand, total_cost) = if params.is_max_demand() {
        max_demand_pairs(&mut nodes, &subgraphs, &mut pairs, &params)
    } else {
        min_cost_pairs(&mut nodes, &subgraphs, &mut pairs, &params)
    }
    .context("optimizing station selection")?;
    log::info!(
        "Total running time of optimization: {:.2} secs.",
        algo_started.elapsed().as_secs_f64()
    );

    verify_model_output(&nodes, &subgraphs, &mut pairs, covered_demand, total_cost);

    // ── Post-processing and export ────────────────────────────────────────
    calc_station_stats(&mut nodes, &subgraphs, &mut pairs, &params);
    write_outputs(output_dir, &nodes, &pairs, &unknown_sites).context("writing outputs")?;

    Ok(())
}
