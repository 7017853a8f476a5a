//! Output CSV files.
//!
//! | File                | Contents                                        |
//! |---------------------|-------------------------------------------------|
//! | `od_coverage.csv`   | per input pair: direct metrics, feasibility and |
//! |                     | the materialized route                          |
//! | `stations.csv`      | every active station with demand and energy     |
//! | `unknown_sites.csv` | OD endpoint ids missing from `nodes.csv`        |

use std::path::Path;

use cp_core::{NodeId, NodeType};
use cp_data::{DataError, DataResult, Nodes, OdPair};

pub const OD_COVERAGE_FILE: &str = "od_coverage.csv";
pub const STATIONS_FILE: &str = "stations.csv";
pub const UNKNOWN_SITES_FILE: &str = "unknown_sites.csv";

/// Write all output files into `dir`, creating it if necessary.
pub fn write_outputs(
    dir: &Path,
    nodes: &Nodes,
    pairs: &[OdPair],
    unknown_sites: &[NodeId],
) -> DataResult<()> {
    std::fs::create_dir_all(dir)?;
    write_od_coverage(dir, pairs)?;
    write_stations(dir, nodes)?;
    write_unknown_sites(dir, unknown_sites)?;
    Ok(())
}

fn write_od_coverage(dir: &Path, pairs: &[OdPair]) -> DataResult<()> {
    log::info!("Running export of file {OD_COVERAGE_FILE}");
    let mut w = csv::Writer::from_path(dir.join(OD_COVERAGE_FILE))
        .map_err(|e| DataError::load(OD_COVERAGE_FILE, e))?;
    w.write_record([
        "ORIGIN_ID",
        "DESTINATION_ID",
        "DEMAND",
        "DIRECT_DISTANCE",
        "DIRECT_TIME",
        "FEASIBLE",
        "STATIONS",
        "FUEL_STOPS",
        "ROUTE_DISTANCE",
        "ROUTE_TIME",
    ])
    .map_err(|e| DataError::load(OD_COVERAGE_FILE, e))?;

    for p in pairs {
        let stations = p
            .stations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        w.write_record([
            p.origin.to_string(),
            p.destination.to_string(),
            p.demand.to_string(),
            p.direct_distance.to_string(),
            p.direct_time.to_string(),
            p.feasible.to_string(),
            stations,
            p.fuel_stops.to_string(),
            p.route_distance.to_string(),
            p.route_time.to_string(),
        ])
        .map_err(|e| DataError::load(OD_COVERAGE_FILE, e))?;
    }
    w.flush()?;
    Ok(())
}

fn write_stations(dir: &Path, nodes: &Nodes) -> DataResult<()> {
    log::info!("Running export of file {STATIONS_FILE}");
    let mut w = csv::Writer::from_path(dir.join(STATIONS_FILE))
        .map_err(|e| DataError::load(STATIONS_FILE, e))?;
    w.write_record(["ID", "TYPE", "DEMAND", "ENERGY"])
        .map_err(|e| DataError::load(STATIONS_FILE, e))?;

    for node in nodes.iter() {
        if !node.real || node.kind != NodeType::Station {
            continue;
        }
        w.write_record([
            node.id.to_string(),
            node.kind.to_string(),
            node.demand.to_string(),
            node.energy.to_string(),
        ])
        .map_err(|e| DataError::load(STATIONS_FILE, e))?;
    }
    w.flush()?;
    Ok(())
}

fn write_unknown_sites(dir: &Path, unknown_sites: &[NodeId]) -> DataResult<()> {
    log::info!("Running export of file {UNKNOWN_SITES_FILE}");
    let mut w = csv::Writer::from_path(dir.join(UNKNOWN_SITES_FILE))
        .map_err(|e| DataError::load(UNKNOWN_SITES_FILE, e))?;
    w.write_record(["ID"])
        .map_err(|e| DataError::load(UNKNOWN_SITES_FILE, e))?;
    for id in unknown_sites {
        w.write_record([id.to_string()])
            .map_err(|e| DataError::load(UNKNOWN_SITES_FILE, e))?;
    }
    w.flush()?;
    Ok(())
}
