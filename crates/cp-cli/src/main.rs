//! `chargeplan` — charging-station placement for heavy-duty truck fleets.

use std::path::PathBuf;

use clap::Parser;

/// Charging location tool execution engine.
#[derive(Parser)]
#[command(name = "chargeplan", version, about)]
struct Cli {
    /// Inputs folder (nodes.csv, arcs.csv, od_pairs.csv, parameters.json).
    #[arg(short = 'i', long = "inputs", default_value = "data/")]
    inputs: PathBuf,

    /// Outputs folder (created if missing).
    #[arg(short = 'o', long = "outputs", default_value = "output/")]
    outputs: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = cp_cli::run(&cli.inputs, &cli.outputs) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
    log::info!("Execution completed for charging location tool.");
}
