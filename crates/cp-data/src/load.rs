//! CSV and JSON input loading with schema validation.
//!
//! # Input directory layout
//!
//! | File              | Columns                                              |
//! |-------------------|------------------------------------------------------|
//! | `nodes.csv`       | `ID, TYPE, COST [, LATITUDE, LONGITUDE, NAME]`       |
//! | `arcs.csv`        | `TAIL_ID, HEAD_ID, TIME, DISTANCE`                   |
//! | `od_pairs.csv`    | `ORIGIN_ID, DESTINATION_ID [, DEMAND]`               |
//! | `parameters.json` | any subset of [`InputParameters`]                    |
//!
//! Any schema violation is fatal and the error message names the file.
//! All `read_*` functions accept a generic `Read` so tests can pass a
//! `Cursor` instead of a file.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Deserialize;

use cp_core::{EPS, InputParameters, NodeId, NodeType, Parameters};

use crate::error::{DataError, DataResult};
use crate::tables::{Arc, Node, Nodes, OdPair};

pub const NODES_FILE: &str = "nodes.csv";
pub const ARCS_FILE: &str = "arcs.csv";
pub const OD_PAIRS_FILE: &str = "od_pairs.csv";
pub const PARAMETERS_FILE: &str = "parameters.json";

const DEFAULT_DEMAND: f64 = 1.0;

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    #[serde(rename = "ID")]
    id: i32,
    #[serde(rename = "TYPE")]
    kind: NodeType,
    #[serde(rename = "COST")]
    cost: f64,
    #[serde(rename = "LATITUDE", default)]
    latitude: Option<f64>,
    #[serde(rename = "LONGITUDE", default)]
    longitude: Option<f64>,
    #[serde(rename = "NAME", default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ArcRecord {
    #[serde(rename = "TAIL_ID")]
    tail: i32,
    #[serde(rename = "HEAD_ID")]
    head: i32,
    #[serde(rename = "TIME")]
    time: f64,
    #[serde(rename = "DISTANCE")]
    distance: f64,
}

#[derive(Deserialize)]
struct OdPairRecord {
    #[serde(rename = "ORIGIN_ID")]
    origin: i32,
    #[serde(rename = "DESTINATION_ID")]
    destination: i32,
    #[serde(rename = "DEMAND", default)]
    demand: Option<f64>,
}

// ── Bundled inputs ────────────────────────────────────────────────────────────

/// Everything read from the input directory.
pub struct Inputs {
    pub nodes: Nodes,
    pub arcs: Vec<Arc>,
    pub od_pairs: Vec<OdPair>,
    pub params: Parameters,
}

/// Load and validate all input files from `dir`.
pub fn load_inputs(dir: &Path) -> DataResult<Inputs> {
    let nodes = read_nodes(open(dir, NODES_FILE)?)?;
    log::info!("Loaded file: {NODES_FILE} successfully.");
    let arcs = read_arcs(open(dir, ARCS_FILE)?)?;
    log::info!("Loaded file: {ARCS_FILE} successfully.");
    let od_pairs = read_od_pairs(open(dir, OD_PAIRS_FILE)?)?;
    log::info!("Loaded file: {OD_PAIRS_FILE} successfully.");
    let params = read_parameters(open(dir, PARAMETERS_FILE)?)?;
    log::info!("Loaded file: {PARAMETERS_FILE} successfully.");
    Ok(Inputs { nodes, arcs, od_pairs, params })
}

fn open(dir: &Path, file: &str) -> DataResult<std::fs::File> {
    std::fs::File::open(dir.join(file)).map_err(|e| DataError::load(file, e))
}

// ── Readers ───────────────────────────────────────────────────────────────────

/// Read and validate the node table.
///
/// Enforced schema: strictly positive unique ids, non-negative costs, and
/// zero cost on sites (only stations can be built).
pub fn read_nodes<R: Read>(reader: R) -> DataResult<Nodes> {
    let mut rows = Vec::new();
    let mut seen: FxHashSet<NodeId> = FxHashSet::default();

    for result in csv::Reader::from_reader(reader).deserialize::<NodeRecord>() {
        let rec = result.map_err(|e| DataError::load(NODES_FILE, e))?;
        if rec.id <= 0 {
            return Err(DataError::load(
                NODES_FILE,
                format!("node ids must be strictly positive, got {}", rec.id),
            ));
        }
        let id = NodeId(rec.id);
        if !seen.insert(id) {
            return Err(DataError::load(NODES_FILE, format!("duplicate node id {id}")));
        }
        if rec.cost < 0.0 {
            return Err(DataError::load(
                NODES_FILE,
                format!("node {id} has negative cost {}", rec.cost),
            ));
        }
        if rec.kind == NodeType::Site && rec.cost > EPS {
            return Err(DataError::load(
                NODES_FILE,
                format!("site {id} carries a construction cost; only stations can be built"),
            ));
        }
        let mut node = Node::new(id, rec.kind, rec.cost);
        node.latitude = rec.latitude;
        node.longitude = rec.longitude;
        node.name = rec.name.filter(|s| !s.is_empty());
        rows.push(node);
    }
    Ok(Nodes::new(rows))
}

/// Read and validate the arc table. Arcs referencing unknown nodes are kept
/// here and dropped by preprocessing.
pub fn read_arcs<R: Read>(reader: R) -> DataResult<Vec<Arc>> {
    let mut arcs = Vec::new();
    for result in csv::Reader::from_reader(reader).deserialize::<ArcRecord>() {
        let rec = result.map_err(|e| DataError::load(ARCS_FILE, e))?;
        if rec.time < 0.0 || rec.distance < 0.0 {
            return Err(DataError::load(
                ARCS_FILE,
                format!(
                    "arc ({}, {}) has negative time or distance",
                    rec.tail, rec.head
                ),
            ));
        }
        arcs.push(Arc::new(
            NodeId(rec.tail),
            NodeId(rec.head),
            rec.time,
            rec.distance,
        ));
    }
    Ok(arcs)
}

/// Read the OD pair table. Missing demand defaults to 1.0; unknown
/// origin/destination ids are reported and dropped by preprocessing.
pub fn read_od_pairs<R: Read>(reader: R) -> DataResult<Vec<OdPair>> {
    let mut pairs = Vec::new();
    for result in csv::Reader::from_reader(reader).deserialize::<OdPairRecord>() {
        let rec = result.map_err(|e| DataError::load(OD_PAIRS_FILE, e))?;
        let demand = rec.demand.unwrap_or(DEFAULT_DEMAND);
        if demand < 0.0 {
            return Err(DataError::load(
                OD_PAIRS_FILE,
                format!(
                    "pair ({}, {}) has negative demand {demand}",
                    rec.origin, rec.destination
                ),
            ));
        }
        pairs.push(OdPair::new(NodeId(rec.origin), NodeId(rec.destination), demand));
    }
    Ok(pairs)
}

/// Read `parameters.json` and derive the validated parameter set.
pub fn read_parameters<R: Read>(reader: R) -> DataResult<Parameters> {
    let input: InputParameters = serde_json::from_reader(reader)
        .map_err(|e| DataError::load(PARAMETERS_FILE, e))?;
    Ok(Parameters::new(input)?)
}
