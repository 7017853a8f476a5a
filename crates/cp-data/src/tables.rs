//! In-memory tables for nodes, arcs and OD pairs.
//!
//! Rows are created once at load time; preprocessing appends derived fields
//! in place, and the optimizer only ever flips the per-node `real` flag and
//! the post-solve accumulators.

use rustc_hash::FxHashMap;

use cp_core::{EPS, NodeId, NodeType};

// ── Node ──────────────────────────────────────────────────────────────────────

/// A network node with its processed attributes.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeType,
    /// Construction cost; positive for candidate stations, 0 otherwise.
    pub cost: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,

    /// Whether the node is active in the final network: always-active for
    /// sites and pre-existing stations, set by the optimizer for candidates.
    pub real: bool,
    /// Demand routed through this station (post-solve).
    pub demand: f64,
    /// Energy charged at this station in kWh (post-solve).
    pub energy: f64,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeType, cost: f64) -> Node {
        Node {
            id,
            kind,
            cost,
            latitude: None,
            longitude: None,
            name: None,
            real: false,
            demand: 0.0,
            energy: 0.0,
        }
    }

    /// A candidate station: selectable by the optimizer.
    #[inline]
    pub fn is_candidate(&self) -> bool {
        self.cost > EPS
    }
}

/// The node table, indexed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct Nodes {
    rows: Vec<Node>,
    index: FxHashMap<NodeId, usize>,
}

impl Nodes {
    /// Build the table. Duplicate ids must have been rejected by the loader.
    pub fn new(rows: Vec<Node>) -> Nodes {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();
        Nodes { rows, index }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).map(|&i| &mut self.rows[i])
    }

    /// Cost of a known node. Panics on an unknown id — callers only pass ids
    /// that survived preprocessing.
    #[inline]
    pub fn cost(&self, id: NodeId) -> f64 {
        self.rows[self.index[&id]].cost
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeType {
        self.rows[self.index[&id]].kind
    }

    #[inline]
    pub fn is_real(&self, id: NodeId) -> bool {
        self.rows[self.index[&id]].real
    }

    #[inline]
    pub fn is_candidate(&self, id: NodeId) -> bool {
        self.rows[self.index[&id]].is_candidate()
    }

    pub fn set_real(&mut self, id: NodeId, real: bool) {
        let i = self.index[&id];
        self.rows[i].real = real;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.rows.iter_mut()
    }

    /// Ids of all candidate stations, ascending. The deterministic order is
    /// relied on by the redundancy reducer and the cut routines.
    pub fn candidate_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .rows
            .iter()
            .filter(|n| n.is_candidate())
            .map(|n| n.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of costs over currently selected (`real`) nodes.
    pub fn selected_cost(&self) -> f64 {
        self.rows.iter().filter(|n| n.real).map(|n| n.cost).sum()
    }
}

// ── Arc ───────────────────────────────────────────────────────────────────────

/// A directed arc with its processed attributes.
///
/// `fuel_time` and `break_time` are attached by preprocessing; total
/// traversal time is `road_time + fuel_time + break_time`.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub tail: NodeId,
    pub head: NodeId,
    pub road_time: f64,
    pub distance: f64,
    pub fuel_time: f64,
    pub break_time: f64,
}

impl Arc {
    pub fn new(tail: NodeId, head: NodeId, road_time: f64, distance: f64) -> Arc {
        Arc { tail, head, road_time, distance, fuel_time: 0.0, break_time: 0.0 }
    }
}

// ── OD pair ───────────────────────────────────────────────────────────────────

/// An origin–destination demand pair with its processed attributes.
#[derive(Debug, Clone)]
pub struct OdPair {
    pub origin: NodeId,
    pub destination: NodeId,
    pub demand: f64,

    /// Fastest direct distance (km), from the lookup map.
    pub direct_distance: f64,
    /// Fastest direct road time (minutes), from the lookup map.
    pub direct_time: f64,
    /// Road-time budget: `max(direct_time·dev_factor, direct_time + min_deviation)`.
    pub max_road_time: f64,
    /// Full-time budget: `max_road_time` plus mandated breaks.
    pub max_time: f64,

    /// Some station subset could cover this pair.
    pub feasible: bool,
    /// The current selection covers this pair.
    pub covered: bool,

    // Route output (post-solve).
    pub stations: Vec<NodeId>,
    pub fuel_stops: u32,
    pub route_distance: f64,
    pub route_time: f64,
}

impl OdPair {
    pub fn new(origin: NodeId, destination: NodeId, demand: f64) -> OdPair {
        OdPair {
            origin,
            destination,
            demand,
            direct_distance: f64::INFINITY,
            direct_time: f64::INFINITY,
            max_road_time: f64::INFINITY,
            max_time: f64::INFINITY,
            feasible: false,
            covered: false,
            stations: Vec::new(),
            fuel_stops: 0,
            route_distance: f64::INFINITY,
            route_time: f64::INFINITY,
        }
    }

    /// Pairs with (near-)zero demand never enter the objective.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.demand > EPS
    }
}
