//! Unit tests for cp-report.

mod helpers {
    use cp_core::{InputParameters, NodeId, NodeType, Parameters};
    use cp_data::{Arc, Node, Nodes, OdPair, TimeDistMap};
    use cp_graph::{Subgraph, build_subgraphs, check_pair_feasibility};

    pub fn params() -> Parameters {
        Parameters::new(InputParameters::default()).unwrap()
    }

    pub fn network(
        node_spec: &[(i32, NodeType, f64)],
        arc_spec: &[(i32, i32, f64, f64)],
        pair_spec: &[(i32, i32, f64)],
    ) -> (Nodes, Vec<OdPair>, Vec<Subgraph>) {
        let mut nodes = Nodes::new(
            node_spec
                .iter()
                .map(|&(id, kind, cost)| Node::new(NodeId(id), kind, cost))
                .collect(),
        );
        cp_data::prep::preprocess_nodes(&mut nodes);

        let arcs: Vec<Arc> = arc_spec
            .iter()
            .map(|&(t, h, road, dist)| Arc::new(NodeId(t), NodeId(h), road, dist))
            .collect();
        let mut with_loops = arcs.clone();
        for &(id, _, _) in node_spec {
            with_loops.push(Arc::new(NodeId(id), NodeId(id), 0.0, 0.0));
        }
        let map = TimeDistMap::from_arcs(&with_loops);

        let mut pairs: Vec<OdPair> = pair_spec
            .iter()
            .map(|&(o, d, demand)| {
                let mut p = OdPair::new(NodeId(o), NodeId(d), demand);
                p.max_road_time = 500.0;
                p.max_time = 800.0;
                p
            })
            .collect();

        let subgraphs = build_subgraphs(&pairs, &arcs, &nodes, &map, &params()).unwrap();
        check_pair_feasibility(&subgraphs, &mut pairs);
        (nodes, pairs, subgraphs)
    }
}

mod usage {
    use cp_core::{NodeId, NodeType};

    use super::helpers::{network, params};
    use crate::usage::calc_station_stats;

    #[test]
    fn direct_route_has_no_stops() {
        let (mut nodes, mut pairs, subs) = network(
            &[(1, NodeType::Site, 0.0), (2, NodeType::Site, 0.0)],
            &[(1, 2, 10.0, 10.0)],
            &[(1, 2, 1.0)],
        );
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());
        let p = &pairs[0];
        assert!(p.stations.is_empty());
        assert_eq!(p.fuel_stops, 0);
        assert_eq!(p.route_distance, 10.0);
        assert_eq!(p.route_time, 10.0);
    }

    #[test]
    fn station_stop_accumulates_demand_and_energy() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0, 10.0), (2, 3, 100.0, 10.0)],
            &[(1, 3, 2.0)],
        );
        nodes.set_real(NodeId(2), true);
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());

        let p = &pairs[0];
        assert_eq!(p.stations, vec![NodeId(2)]);
        assert_eq!(p.fuel_stops, 1);
        assert_eq!(p.route_distance, 20.0);
        assert_eq!(p.route_time, 200.0);

        let station = nodes.get(NodeId(2)).unwrap();
        assert_eq!(station.demand, 2.0);
        // kWh per km = 540 / 300 = 1.8; the outgoing leg is 10 km and ends
        // at a site, so the reserved 125 km terminal range is added:
        // (10 + 125) · 1.8 · 2 = 486.
        assert_eq!(station.energy, 486.0);
    }

    #[test]
    fn unselected_candidate_blocks_the_route() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0, 10.0), (2, 3, 100.0, 10.0)],
            &[(1, 3, 1.0)],
        );
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());
        let p = &pairs[0];
        assert!(p.stations.is_empty());
        assert!(p.route_time.is_infinite());
    }

    #[test]
    fn station_to_station_leg_has_no_terminal_topup() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (4, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[
                (1, 2, 100.0, 10.0),
                (2, 4, 100.0, 60.0),
                (4, 3, 100.0, 10.0),
            ],
            &[(1, 3, 1.0)],
        );
        nodes.set_real(NodeId(2), true);
        nodes.set_real(NodeId(4), true);
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());

        let p = &pairs[0];
        assert_eq!(p.stations, vec![NodeId(2), NodeId(4)]);
        assert_eq!(p.fuel_stops, 2);
        // Station 2 charges for the 60 km hop to station 4, no top-up.
        assert_eq!(nodes.get(NodeId(2)).unwrap().energy, 60.0 * 1.8);
        // Station 4 charges for the 10 km leg plus the 125 km terminal range.
        assert_eq!(nodes.get(NodeId(4)).unwrap().energy, (10.0 + 125.0) * 1.8);
    }
}

mod output {
    use cp_core::{NodeId, NodeType};

    use super::helpers::{network, params};
    use crate::output::write_outputs;
    use crate::usage::calc_station_stats;

    #[test]
    fn all_three_files_written() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0, 10.0), (2, 3, 100.0, 10.0)],
            &[(1, 3, 1.0)],
        );
        nodes.set_real(NodeId(2), true);
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());

        let dir = tempfile::tempdir().unwrap();
        write_outputs(dir.path(), &nodes, &pairs, &[NodeId(42)]).unwrap();

        let coverage = std::fs::read_to_string(dir.path().join("od_coverage.csv")).unwrap();
        let mut lines = coverage.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ORIGIN_ID,DESTINATION_ID,DEMAND,DIRECT_DISTANCE,DIRECT_TIME,FEASIBLE,\
             STATIONS,FUEL_STOPS,ROUTE_DISTANCE,ROUTE_TIME"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,3,1,"));
        assert!(row.contains("true"));
        assert!(row.contains(",2,")); // station list

        let stations = std::fs::read_to_string(dir.path().join("stations.csv")).unwrap();
        assert!(stations.starts_with("ID,TYPE,DEMAND,ENERGY"));
        assert!(stations.contains("2,STATION,1,"));

        let unknown = std::fs::read_to_string(dir.path().join("unknown_sites.csv")).unwrap();
        assert_eq!(unknown.trim(), "ID\n42");
    }

    #[test]
    fn multi_station_route_slash_separated() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (4, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[
                (1, 2, 100.0, 10.0),
                (2, 4, 100.0, 60.0),
                (4, 3, 100.0, 10.0),
            ],
            &[(1, 3, 1.0)],
        );
        nodes.set_real(NodeId(2), true);
        nodes.set_real(NodeId(4), true);
        calc_station_stats(&mut nodes, &subs, &mut pairs, &params());

        let dir = tempfile::tempdir().unwrap();
        write_outputs(dir.path(), &nodes, &pairs, &[]).unwrap();
        let coverage = std::fs::read_to_string(dir.path().join("od_coverage.csv")).unwrap();
        assert!(coverage.contains("2/4"));
    }
}
