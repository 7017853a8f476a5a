//! Unit and scenario tests for cp-solve.
//!
//! Networks are tiny and hand-crafted; subgraphs are produced by the real
//! builder so the candidate split is always in effect.

mod helpers {
    use cp_core::{InputParameters, NodeId, NodeType, Parameters};
    use cp_data::{Arc, Node, Nodes, OdPair, TimeDistMap};
    use cp_graph::{Subgraph, build_subgraphs, check_pair_feasibility};

    pub fn params() -> Parameters {
        Parameters::new(InputParameters::default()).unwrap()
    }

    /// Build a fully preprocessed network.
    ///
    /// `nodes`: `(id, type, cost)`. `arcs`: `(tail, head, road_time)` with
    /// distance 10 km and no fuel time. `pairs`: `(origin, destination,
    /// demand)` with generous budgets (road 500, total 800).
    pub fn network(
        node_spec: &[(i32, NodeType, f64)],
        arc_spec: &[(i32, i32, f64)],
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
            .map(|&(t, h, road)| Arc::new(NodeId(t), NodeId(h), road, 10.0))
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

mod coverage {
    use cp_core::{NodeId, NodeType};

    use super::helpers::network;
    use crate::coverage::check_pair_coverage;

    #[test]
    fn candidates_block_until_selected() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0), (2, 3, 100.0)],
            &[(1, 3, 1.0)],
        );
        assert!(pairs[0].feasible);

        check_pair_coverage(&nodes, &subs, &mut pairs);
        assert!(!pairs[0].covered);

        nodes.set_real(NodeId(2), true);
        check_pair_coverage(&nodes, &subs, &mut pairs);
        assert!(pairs[0].covered);
    }

    #[test]
    fn pre_existing_stations_always_usable() {
        let (nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 0.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0), (2, 3, 100.0)],
            &[(1, 3, 1.0)],
        );
        check_pair_coverage(&nodes, &subs, &mut pairs);
        assert!(pairs[0].covered);
    }
}

mod reduce {
    use cp_core::{NodeId, NodeType};

    use super::helpers::network;
    use crate::reduce::remove_redundancy;

    #[test]
    fn redundant_station_dropped_others_kept() {
        // Pair (1,2) is only coverable via 11, pair (5,6) only via 13;
        // 12 duplicates 11 on pair (3,4), which 11 also serves.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (3, NodeType::Site, 0.0),
                (4, NodeType::Site, 0.0),
                (5, NodeType::Site, 0.0),
                (6, NodeType::Site, 0.0),
                (11, NodeType::Station, 2.0),
                (12, NodeType::Station, 3.0),
                (13, NodeType::Station, 4.0),
            ],
            &[
                (1, 11, 50.0),
                (11, 2, 50.0),
                (3, 11, 50.0),
                (3, 12, 50.0),
                (11, 4, 50.0),
                (12, 4, 50.0),
                (5, 13, 50.0),
                (13, 6, 50.0),
            ],
            &[(1, 2, 1.0), (3, 4, 1.0), (5, 6, 1.0)],
        );

        let solution = vec![NodeId(11), NodeId(12), NodeId(13)];
        let reduced = remove_redundancy(&solution, &nodes, &subs, &pairs, None);
        assert_eq!(reduced, vec![NodeId(11), NodeId(13)]);
    }

    #[test]
    fn ignored_pairs_do_not_constrain() {
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 2.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0)],
            &[(1, 2, 1.0)],
        );
        let solution = vec![NodeId(11)];
        // The only pair is ignored, so its station is redundant.
        let reduced = remove_redundancy(&solution, &nodes, &subs, &pairs, Some(&[true]));
        assert!(reduced.is_empty());
    }
}

mod separation {
    use cp_core::{NodeId, NodeType};
    use rustc_hash::FxHashSet;

    use super::helpers::network;
    use crate::separation::{fractional_separation, initial_separator_cuts, integer_separation};

    #[test]
    fn series_stations_yield_both_singleton_cuts() {
        // 1 → 11 → 12 → 2: removing either station disconnects the pair, so
        // seeding must emit both singleton separators.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 1.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );

        let cuts = initial_separator_cuts(&subs[0], &pairs[0], 0, &nodes).unwrap();
        let unique: FxHashSet<Vec<NodeId>> =
            cuts.iter().map(|c| c.members.clone()).collect();
        assert!(unique.contains(&vec![NodeId(11)]));
        assert!(unique.contains(&vec![NodeId(12)]));
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn parallel_stations_yield_one_pair_cut() {
        // Either of 11 / 12 covers the pair: the separator is {11, 12}.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 1.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (1, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );

        let cuts = initial_separator_cuts(&subs[0], &pairs[0], 0, &nodes).unwrap();
        for cut in &cuts {
            assert_eq!(cut.members, vec![NodeId(11), NodeId(12)]);
        }
    }

    #[test]
    fn integer_separation_emits_two_sided_cuts() {
        // 1 → 11 → 12 → 2 with nothing selected: origin-closest is {11},
        // destination-closest is {12}.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 1.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );

        let inactive = |key: cp_core::NodeKey| {
            key.is_auxiliary() || !nodes.is_candidate(key.id)
        };
        let cuts = integer_separation(&subs[0], &pairs[0], 0, &nodes, &inactive).unwrap();
        assert_eq!(cuts.len(), 2);
        assert_eq!(cuts[0].members, vec![NodeId(11)]);
        assert_eq!(cuts[1].members, vec![NodeId(12)]);
    }

    #[test]
    fn fractional_cut_fires_below_threshold() {
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 1.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );

        // Station 11 at 0.3, station 12 at 0.9: the min cut is {11}.
        let lp = |id: NodeId| if id == NodeId(11) { 0.3 } else { 0.9 };
        let cut = fractional_separation(&subs[0], &pairs[0], 0, &nodes, &lp, 1.0 - 1e-8)
            .unwrap()
            .expect("cut expected");
        assert_eq!(cut.members, vec![NodeId(11)]);

        // With both at 1.0 the cut value reaches the threshold: no cut.
        let lp = |_| 1.0;
        assert!(
            fractional_separation(&subs[0], &pairs[0], 0, &nodes, &lp, 1.0 - 1e-8)
                .unwrap()
                .is_none()
        );
    }
}

mod heuristic {
    use cp_core::{NodeId, NodeType};
    use rustc_hash::FxHashMap;

    use super::helpers::network;
    use crate::heuristic::{min_cost_initial_solution, primal_heuristic};

    #[test]
    fn reduced_costs_favor_lp_supported_stations() {
        // Two parallel stations; the LP strongly supports the pricier one.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 5.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (1, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );

        let mut lp: FxHashMap<NodeId, f64> = FxHashMap::default();
        lp.insert(NodeId(11), 0.95);
        lp.insert(NodeId(12), 0.0);
        let (stations, served) =
            primal_heuristic(&[0], &pairs, &subs, &nodes, &lp, None, f64::INFINITY);
        assert!(stations.contains(&NodeId(11)));
        assert!(served.contains(&0));
    }

    #[test]
    fn budget_gates_pairs_in_demand_order() {
        // Two pairs on disjoint stations; the budget only pays for the
        // high-demand one.
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (3, NodeType::Site, 0.0),
                (4, NodeType::Site, 0.0),
                (11, NodeType::Station, 5.0),
                (12, NodeType::Station, 5.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (3, 12, 50.0), (12, 4, 50.0)],
            &[(1, 2, 1.0), (3, 4, 9.0)],
        );

        let lp = FxHashMap::default();
        let mut demand_lp = FxHashMap::default();
        demand_lp.insert(0usize, 1.0);
        demand_lp.insert(1usize, 1.0);
        let (stations, served) =
            primal_heuristic(&[0, 1], &pairs, &subs, &nodes, &lp, Some(&demand_lp), 5.0);
        assert!(served.contains(&1));
        assert!(!served.contains(&0));
        assert!(stations.contains(&NodeId(12)));
        assert!(!stations.contains(&NodeId(11)));
    }

    #[test]
    fn initial_solution_covers_and_reduces() {
        let (nodes, pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 5.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (1, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );
        let solution = min_cost_initial_solution(&[0], &pairs, &subs, &nodes);
        // One station suffices; the reduction keeps exactly one.
        assert_eq!(solution.len(), 1);
    }
}

mod drivers {
    use cp_core::{InputParameters, NodeId, NodeType, Parameters};

    use super::helpers::network;
    use crate::mip::{max_demand_pairs, min_cost_pairs};
    use crate::verify::check_solution;

    #[test]
    fn min_cost_builds_the_required_station() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0), (2, 3, 100.0)],
            &[(1, 3, 1.0)],
        );
        let params = Parameters::new(InputParameters::default()).unwrap();

        let (covered, cost) = min_cost_pairs(&mut nodes, &subs, &mut pairs, &params).unwrap();
        assert_eq!(covered, 1.0);
        assert_eq!(cost, 5.0);
        assert!(nodes.is_real(NodeId(2)));

        let (verified_demand, verified_cost) =
            check_solution(&nodes, &subs, &mut pairs, covered, cost);
        assert_eq!(verified_demand, 1.0);
        assert_eq!(verified_cost, 5.0);
    }

    #[test]
    fn min_cost_prefers_cheaper_alternative() {
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (11, NodeType::Station, 5.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (1, 12, 50.0), (12, 2, 50.0)],
            &[(1, 2, 1.0)],
        );
        let params = Parameters::new(InputParameters::default()).unwrap();
        let (covered, cost) = min_cost_pairs(&mut nodes, &subs, &mut pairs, &params).unwrap();
        assert_eq!(covered, 1.0);
        assert_eq!(cost, 1.0);
        assert!(nodes.is_real(NodeId(12)));
        assert!(!nodes.is_real(NodeId(11)));
    }

    #[test]
    fn max_demand_respects_the_budget() {
        // Station 11 (cost 10) serves pair 0, station 12 (cost 1) serves
        // pair 1; budget 1 ⇒ only pair 1 can be covered.
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Site, 0.0),
                (3, NodeType::Site, 0.0),
                (4, NodeType::Site, 0.0),
                (11, NodeType::Station, 10.0),
                (12, NodeType::Station, 1.0),
            ],
            &[(1, 11, 50.0), (11, 2, 50.0), (3, 12, 50.0), (12, 4, 50.0)],
            &[(1, 2, 1.0), (3, 4, 1.0)],
        );
        let params = Parameters::new(InputParameters {
            cost_budget: 1.0,
            ..Default::default()
        })
        .unwrap();

        let (covered, cost) = max_demand_pairs(&mut nodes, &subs, &mut pairs, &params).unwrap();
        assert_eq!(covered, 1.0);
        assert_eq!(cost, 1.0);
        assert!(nodes.is_real(NodeId(12)));
        assert!(!nodes.is_real(NodeId(11)));
    }

    #[test]
    fn infeasible_pairs_are_excluded() {
        // Pair (1, 4) has no route at all: zero coverage, no stations.
        let (mut nodes, mut pairs, subs) = network(
            &[
                (1, NodeType::Site, 0.0),
                (2, NodeType::Station, 5.0),
                (3, NodeType::Site, 0.0),
                (4, NodeType::Site, 0.0),
            ],
            &[(1, 2, 100.0), (2, 3, 100.0)],
            &[(1, 4, 1.0)],
        );
        assert!(!pairs[0].feasible);
        let params = Parameters::new(InputParameters::default()).unwrap();
        let (covered, cost) = min_cost_pairs(&mut nodes, &subs, &mut pairs, &params).unwrap();
        assert_eq!(covered, 0.0);
        assert_eq!(cost, 0.0);
        assert!(!nodes.is_real(NodeId(2)));
    }
}
