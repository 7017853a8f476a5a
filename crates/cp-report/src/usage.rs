//! Station usage accounting.
//!
//! For every pair covered by the final selection, the time-feasible route is
//! recovered and walked: each station stop is attributed the pair's demand
//! and the energy charged there. A stop charges enough to cover the distance
//! to the next stop; before a site leg it additionally tops up the reserved
//! terminal range. Energy is `distance · (capacity / range) · demand` kWh.

use cp_core::{NodeKey, NodeType, Parameters};
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;
use cp_solve::coverage::{get_feasible_path, is_unconditionally_usable};

/// Attach per-station demand/energy and per-pair route data.
pub fn calc_station_stats(
    nodes: &mut Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
    params: &Parameters,
) {
    let kwh_per_km = params.battery_capacity / params.truck_range;
    let terminal_range = params.dest_range;

    for node in nodes.iter_mut() {
        node.demand = 0.0;
        node.energy = 0.0;
    }

    for (pair, sub) in pairs.iter_mut().zip(subgraphs) {
        let usable = |key: NodeKey| {
            let selected = key.is_auxiliary() || nodes.is_real(key.id);
            selected || is_unconditionally_usable(nodes, key)
        };
        let path = get_feasible_path(sub, pair, &usable);
        if path.is_empty() {
            continue;
        }

        let arc = |tail: NodeKey, head: NodeKey| *sub.arc(tail, head).expect("route arc");

        // The first leg leaves the origin site.
        let first = arc(path[0], path[1]);
        let mut route_distance = first.distance;
        let mut route_time = first.total_time();
        let mut stations = Vec::new();

        for n in 1..path.len() - 1 {
            let node = path[n];
            if node.is_auxiliary() {
                continue;
            }
            stations.push(node.id);
            let demand = pair.demand;

            // Charged energy covers the leg leaving this station; the leg
            // starts at the exit half when the station is split.
            let (leg_tail, leg_head) = if path[n + 1].is_auxiliary() {
                (path[n + 1], path[n + 2])
            } else {
                (node, path[n + 1])
            };
            let leg = arc(leg_tail, leg_head);
            let mut energy = leg.distance * kwh_per_km * demand;
            if nodes.kind(leg_head.id) == NodeType::Site {
                // End-of-leg top-up for the reserved terminal range.
                energy += terminal_range * kwh_per_km * demand;
            }

            let station = nodes.get_mut(node.id).expect("station node");
            station.demand += demand;
            station.energy += energy;

            route_distance += leg.distance;
            route_time += leg.total_time();
        }

        pair.fuel_stops = stations.len() as u32;
        pair.stations = stations;
        pair.route_distance = route_distance;
        pair.route_time = route_time;
    }

    for node in nodes.iter_mut() {
        node.energy = (node.energy * 10.0).round() / 10.0;
        node.demand = (node.demand * 100.0).round() / 100.0;
    }
}
