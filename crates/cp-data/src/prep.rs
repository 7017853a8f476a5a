//! Preprocessing of the loaded tables.
//!
//! Runs once between loading and subgraph construction:
//!
//! 1. [`preprocess_arcs`] — self-loops, endpoint filtering, the time/distance
//!    lookup map, range filtering, fuel and break time attachment.
//! 2. [`preprocess_nodes`] — marks always-active nodes.
//! 3. [`preprocess_od_pairs`] — unknown-site extraction, trivial-pair
//!    removal, direct distances and transit-time budgets.

use cp_core::{EPS, NodeId, NodeType, Parameters, TransitTime, battery};

use crate::error::DataResult;
use crate::lookup::TimeDistMap;
use crate::tables::{Arc, Nodes, OdPair};

// ── Arcs ──────────────────────────────────────────────────────────────────────

/// Filter arcs based on range, attach fuel and break times, and build the
/// `(tail, head) → (time, distance)` lookup map.
///
/// The map is built *before* range filtering (and includes the per-node zero
/// self-loops) so that direct-connection lookups stay total even for
/// connections a truck cannot drive in one leg.
pub fn preprocess_arcs(
    mut arcs: Vec<Arc>,
    nodes: &Nodes,
    transit: &TransitTime,
    params: &Parameters,
) -> DataResult<(Vec<Arc>, TimeDistMap)> {
    log::info!("Processing: {} arcs.", arcs.len());

    // Self-loops with trivial values for soundness of the lookup map.
    arcs.extend(nodes.iter().map(|n| Arc::new(n.id, n.id, 0.0, 0.0)));

    // Drop arcs whose endpoints are unknown.
    arcs.retain(|a| nodes.contains(a.tail) && nodes.contains(a.head));

    let map = TimeDistMap::from_arcs(&arcs);
    log::info!("Created lookup map with {} direct connections.", map.len());

    range_filter_arcs(&mut arcs, nodes, params)?;
    add_fuel_time(&mut arcs, nodes, params)?;
    fuel_time_filter_arcs(&mut arcs, nodes, params);

    for a in &mut arcs {
        a.break_time = transit.break_time(a.road_time);
    }

    Ok((arcs, map))
}

/// Filter the arcs according to range.
///
/// Removes self-loops; arcs longer than the effective range; arcs into a
/// site that leave less than `dest_range` of charge; arcs out of a site
/// longer than `orig_range`; station-to-station hops shorter than
/// `0.2·safe_range`; and all site-to-site arcs (no direct routes).
fn range_filter_arcs(arcs: &mut Vec<Arc>, nodes: &Nodes, params: &Parameters) -> DataResult<()> {
    log::info!("Filtering arcs globally based on range..");
    let range = params.safe_range;
    let min_dist = 0.2 * range;

    for value in [min_dist, params.orig_range, params.dest_range] {
        if value > range {
            return Err(cp_core::CoreError::Parameter(format!(
                "{value} exceeds maximum effective truck range {range}"
            ))
            .into());
        }
    }

    let final_range = range - params.dest_range;
    arcs.retain(|a| {
        let tail_is_site = nodes.kind(a.tail) == NodeType::Site;
        let head_is_site = nodes.kind(a.head) == NodeType::Site;
        let remove = a.tail == a.head
            || a.distance > range
            || (head_is_site && a.distance > final_range)
            || (tail_is_site && a.distance > params.orig_range)
            || (tail_is_site && head_is_site)
            || (!tail_is_site && !head_is_site && a.distance < min_dist);
        !remove
    });

    log::info!("Arcs remaining: {}", arcs.len());
    Ok(())
}

/// Attach refueling time according to the "charge enough" policy.
///
/// Station to station: time to cover the arc distance. Station to site: time
/// to cover the distance plus the reserved `dest_range`. Site-tailed arcs
/// need no recharge before departure.
fn add_fuel_time(arcs: &mut [Arc], nodes: &Nodes, params: &Parameters) -> DataResult<()> {
    log::info!("Adding refueling time to arcs globally..");
    let buffer = params.min_state;
    let range = params.truck_range;

    for a in arcs.iter_mut() {
        if nodes.kind(a.tail) != NodeType::Station {
            continue;
        }
        let target = if nodes.kind(a.head) == NodeType::Site {
            buffer + (a.distance + params.dest_range) / range
        } else {
            buffer + a.distance / range
        };
        // The range filter keeps the target level within the battery; guard
        // the upper bound against rounding.
        a.fuel_time = battery::recharge_time(
            buffer,
            target.min(1.0),
            params.charger_power,
            params.battery_capacity,
            battery::DEFAULT_LEFT,
            battery::DEFAULT_RIGHT,
        )?;
    }
    Ok(())
}

/// Drop station-tailed arcs whose refueling stop is out of bounds.
fn fuel_time_filter_arcs(arcs: &mut Vec<Arc>, nodes: &Nodes, params: &Parameters) {
    log::info!("Filtering arcs globally based on time..");
    arcs.retain(|a| {
        nodes.kind(a.tail) != NodeType::Station
            || (a.fuel_time >= params.min_fuel_time && a.fuel_time <= params.max_fuel_time)
    });
    log::info!("Arcs remaining: {}", arcs.len());
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// Mark always-active nodes: sites and pre-existing (zero-cost) stations.
pub fn preprocess_nodes(nodes: &mut Nodes) {
    log::info!("Processing: {} nodes.", nodes.len());

    let num_sites = nodes.iter().filter(|n| n.kind == NodeType::Site).count();
    let num_stations = nodes.iter().filter(|n| n.kind == NodeType::Station).count();
    log::info!("Number of sites: {num_sites}. Number of stations: {num_stations}");

    for node in nodes.iter_mut() {
        node.real = node.cost <= EPS;
    }
}

// ── OD pairs ──────────────────────────────────────────────────────────────────

/// Preprocess OD pairs.
///
/// Removes pairs with unknown origin/destination (returning the deduplicated
/// unknown ids for reporting) and trivial pairs, then attaches direct
/// distances and the road/full transit-time budgets.
pub fn preprocess_od_pairs(
    mut pairs: Vec<OdPair>,
    nodes: &Nodes,
    map: &TimeDistMap,
    transit: &TransitTime,
    params: &Parameters,
) -> (Vec<OdPair>, Vec<NodeId>) {
    log::info!("Processing: {} od pairs.", pairs.len());

    let unknown = unknown_sites(&pairs, nodes);
    let before = pairs.len();
    pairs.retain(|p| nodes.contains(p.origin) && nodes.contains(p.destination));
    if pairs.len() < before {
        log::info!(
            "Removed OD pairs with unknown origin or destination. OD pairs remaining: {}",
            pairs.len()
        );
    }

    let before = pairs.len();
    pairs.retain(|p| p.origin != p.destination);
    if pairs.len() < before {
        log::info!(
            "Removed trivial OD pairs (origin = destination). OD pairs remaining: {}",
            pairs.len()
        );
    }

    for p in &mut pairs {
        let (time, dist) = map.get(p.origin, p.destination);
        p.direct_time = time;
        p.direct_distance = dist;
        // Buffered road transit time: the larger of the multiplicative and
        // additive detour allowances.
        let buffered = (time * params.dev_factor).max(time + params.min_deviation);
        p.max_road_time = buffered;
        p.max_time = transit.full_time(buffered);
    }

    (pairs, unknown)
}

/// Origin/destination ids not present in the node table, deduplicated,
/// origins first in row order.
fn unknown_sites(pairs: &[OdPair], nodes: &Nodes) -> Vec<NodeId> {
    let mut unknown = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();
    for p in pairs {
        if !nodes.contains(p.origin) && seen.insert(p.origin) {
            unknown.push(p.origin);
        }
    }
    for p in pairs {
        if !nodes.contains(p.destination) && seen.insert(p.destination) {
            unknown.push(p.destination);
        }
    }
    unknown
}
