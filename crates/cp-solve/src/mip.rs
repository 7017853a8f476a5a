//! The branch-and-cut orchestrator.
//!
//! Two objective modes share one machinery:
//!
//! - **min-cost** — minimize `Σ cost_u·x_u` subject to every required
//!   feasible pair being covered;
//! - **max-demand** — maximize `Σ demand_k·y_k` subject to
//!   `Σ cost_u·x_u ≤ cost_budget`.
//!
//! Pair coverage is enforced through dynamically separated node-cut
//! inequalities (`Σ_{u∈C} x_u ≥ 1` resp. `≥ y_k`). CBC has no callback API,
//! so the lazy-constraint design runs as a cutting-plane loop:
//!
//! 1. **Root rounds** — solve the LP relaxation with the current cut pool
//!    and separate: integer separation when the candidate support is
//!    near-integral, fractional min-cut separation otherwise. The per-round
//!    pair subset starts from last round's violated pairs plus a 50%
//!    deterministic random sample; a full pass is the fallback. Every 29th
//!    productive round the primal heuristic rounds the LP into an incumbent.
//! 2. **Integer rounds** — solve the MIP, verify every served pair with the
//!    exact feasibility oracle, add connectivity/time separators for the
//!    violated ones and re-solve. Max-demand projections (violated `y_k`
//!    zeroed) are kept as incumbents; pairs covered for free are raised to
//!    maximality on acceptance.
//!
//! Failures inside a separation or heuristic round are logged and the round
//! abandoned; correctness rests on the exact acceptance checks. The wall
//! clock budget is threaded into every CBC solve and checked between
//! rounds.

use std::time::{Duration, Instant};

use good_lp::solvers::coin_cbc::coin_cbc;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    variable,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rustc_hash::{FxHashMap, FxHashSet};

use cp_core::{EPS, EPS_INT, NodeId, NodeKey, Parameters};
use cp_data::{Nodes, OdPair};
use cp_graph::Subgraph;
use cp_graph::csp::{arc_road_time, arc_total_time, shortest_path};

use crate::coverage::{check_pair_coverage, get_feasible_path, is_unconditionally_usable};
use crate::error::{SolveError, SolveResult};
use crate::heuristic::{
    Incumbent, max_demand_initial_solution, min_cost_initial_solution, primal_heuristic,
};
use crate::reduce::{remove_redundancy, remove_redundant_stations};
use crate::separation::{
    Cut, fractional_separation, initial_separator_cuts, integer_separation,
    integer_time_separation,
};

/// Spacing between primal heuristic invocations (in productive rounds).
pub const PRIMAL_HEURISTIC_PERIOD: usize = 29;

/// Cap on fractional separation rounds at the root.
pub const ROOT_FRAC_SEP_ROUNDS: usize = PRIMAL_HEURISTIC_PERIOD + 1;

/// Counters and memory carried across separation rounds.
#[derive(Debug, Default)]
pub struct BranchAndBoundInfo {
    /// Inequalities added by separation.
    pub inequality_count: usize,
    /// Fractional separation rounds performed.
    pub frac_sep_rounds: usize,
    /// Time spent separating.
    pub separation_time: Duration,
    /// Time spent in the primal heuristic.
    pub heuristic_time: Duration,
    /// Pairs that produced cuts in the last round.
    pub checked_pairs: Vec<usize>,
}

// ── Public drivers ────────────────────────────────────────────────────────────

/// Minimize construction cost subject to full coverage of the required
/// feasible pairs. Returns `(covered_demand, total_cost)` and marks the
/// selected stations `real` in `nodes`.
pub fn min_cost_pairs(
    nodes: &mut Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
    params: &Parameters,
) -> SolveResult<(f64, f64)> {
    let (candidates, indices, mut covered_demand) =
        prepare(nodes, subgraphs, pairs);
    if candidates.is_empty() || indices.is_empty() {
        return Ok((covered_demand, 0.0));
    }

    log::info!("Building MIP model to minimize cost.");
    let mut bc = BranchAndCut::new(
        Mode::MinCost,
        nodes,
        subgraphs,
        pairs,
        candidates,
        indices.clone(),
        params,
    );
    bc.seed_initial_cuts()?;

    let start = min_cost_initial_solution(&indices, pairs, subgraphs, nodes);
    bc.incumbent = Some(Incumbent::new(
        start.into_iter().collect(),
        indices.iter().copied().collect(),
        nodes,
        pairs,
    ));

    log::info!("Starting MIP solver..");
    let solution = bc.run()?;
    bc.log_statistics();

    if let Some(solution) = solution {
        covered_demand += solution.demand;
        for &id in &solution.stations {
            nodes.set_real(id, true);
        }
    }
    let total_cost = remove_redundant_stations(nodes, subgraphs, pairs);
    Ok((covered_demand, total_cost))
}

/// Maximize covered demand within the cost budget. Returns
/// `(covered_demand, total_cost)` and marks the selected stations `real`.
pub fn max_demand_pairs(
    nodes: &mut Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
    params: &Parameters,
) -> SolveResult<(f64, f64)> {
    let (candidates, indices, mut covered_demand) =
        prepare(nodes, subgraphs, pairs);
    if candidates.is_empty() || indices.is_empty() {
        return Ok((covered_demand, 0.0));
    }

    log::info!("Building MIP model for maximum demand.");
    let mut bc = BranchAndCut::new(
        Mode::MaxDemand { budget: params.cost_budget },
        nodes,
        subgraphs,
        pairs,
        candidates,
        indices.clone(),
        params,
    );
    bc.seed_initial_cuts()?;

    let (stations, served) =
        max_demand_initial_solution(&indices, pairs, subgraphs, nodes, params.cost_budget);
    bc.incumbent = Some(Incumbent::new(stations, served, nodes, pairs));

    log::info!("Starting MIP solver.");
    let solution = bc.run()?;
    bc.log_statistics();

    if let Some(solution) = solution {
        covered_demand += solution.demand;
        for &id in &solution.stations {
            nodes.set_real(id, true);
        }
    }
    let total_cost = nodes.selected_cost();
    Ok((covered_demand, total_cost))
}

/// Coverage from the pre-existing stations, the candidate list, and the
/// pair indices the optimizer must still cover.
fn prepare(
    nodes: &mut Nodes,
    subgraphs: &[Subgraph],
    pairs: &mut [OdPair],
) -> (Vec<NodeId>, Vec<usize>, f64) {
    check_pair_coverage(nodes, subgraphs, pairs);
    let covered_demand = pairs.iter().filter(|p| p.covered).map(|p| p.demand).sum();
    let indices: Vec<usize> = (0..pairs.len())
        .filter(|&k| pairs[k].is_required() && pairs[k].feasible && !pairs[k].covered)
        .collect();
    (nodes.candidate_ids(), indices, covered_demand)
}

// ── Cutting-plane machinery ───────────────────────────────────────────────────

enum Mode {
    MinCost,
    MaxDemand { budget: f64 },
}

/// Variable values extracted from a solve (fractional or integer).
struct SolveValues {
    station: FxHashMap<NodeId, f64>,
    demand: FxHashMap<usize, f64>,
}

impl SolveValues {
    fn station_value(&self, id: NodeId) -> f64 {
        self.station.get(&id).copied().unwrap_or(0.0)
    }

    fn demand_value(&self, k: usize) -> f64 {
        self.demand.get(&k).copied().unwrap_or(0.0)
    }

    /// Usable under this (near-)integer station assignment.
    fn is_active(&self, nodes: &Nodes, key: NodeKey) -> bool {
        is_unconditionally_usable(nodes, key)
            || self.station_value(key.id) >= 1.0 - EPS_INT
    }

    fn fractional_count(&self) -> usize {
        self.station
            .values()
            .chain(self.demand.values())
            .filter(|&&v| v > EPS_INT && v < 1.0 - EPS_INT)
            .count()
    }
}

struct BranchAndCut<'a> {
    mode: Mode,
    nodes: &'a Nodes,
    subgraphs: &'a [Subgraph],
    pairs: &'a [OdPair],
    candidates: Vec<NodeId>,
    indices: Vec<usize>,
    tolerance: f64,
    deadline: Instant,
    cuts: Vec<Cut>,
    cut_keys: FxHashSet<(usize, Vec<NodeId>)>,
    info: BranchAndBoundInfo,
    incumbent: Option<Incumbent>,
}

impl<'a> BranchAndCut<'a> {
    fn new(
        mode: Mode,
        nodes: &'a Nodes,
        subgraphs: &'a [Subgraph],
        pairs: &'a [OdPair],
        candidates: Vec<NodeId>,
        indices: Vec<usize>,
        params: &Parameters,
    ) -> BranchAndCut<'a> {
        let info = BranchAndBoundInfo {
            checked_pairs: indices.clone(),
            ..Default::default()
        };
        BranchAndCut {
            mode,
            nodes,
            subgraphs,
            pairs,
            candidates,
            indices,
            tolerance: params.tolerance,
            deadline: Instant::now() + Duration::from_secs(params.max_run_time),
            cuts: Vec::new(),
            cut_keys: FxHashSet::default(),
            info,
            incumbent: None,
        }
    }

    fn is_max_demand(&self) -> bool {
        matches!(self.mode, Mode::MaxDemand { .. })
    }

    fn budget(&self) -> f64 {
        match self.mode {
            Mode::MinCost => f64::INFINITY,
            Mode::MaxDemand { budget } => budget,
        }
    }

    fn time_left(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Initial OD separator inequalities, both directions per pair.
    fn seed_initial_cuts(&mut self) -> SolveResult<()> {
        for &k in &self.indices.clone() {
            let cuts = initial_separator_cuts(&self.subgraphs[k], &self.pairs[k], k, self.nodes)?;
            self.add_cuts(cuts);
        }
        log::info!("Seeded {} initial separator inequalities.", self.cuts.len());
        // Statistics report separation cuts only, not the seeds.
        self.info.inequality_count = 0;
        Ok(())
    }

    fn add_cuts(&mut self, cuts: Vec<Cut>) -> usize {
        let mut added = 0;
        for cut in cuts {
            if self.cut_keys.insert((cut.pair, cut.members.clone())) {
                self.cuts.push(cut);
                added += 1;
            }
        }
        self.info.inequality_count += added;
        added
    }

    fn run(&mut self) -> SolveResult<Option<Incumbent>> {
        self.root_separation()?;
        let accepted = self.integer_rounds()?;
        // The incumbent (primal heuristic / projection) can beat a
        // time-truncated solver answer.
        Ok(match (accepted, self.incumbent.take()) {
            (Some(a), Some(b)) => Some(if self.first_is_better(&a, &b) { a } else { b }),
            (Some(a), None) => Some(a),
            (None, b) => b,
        })
    }

    fn first_is_better(&self, a: &Incumbent, b: &Incumbent) -> bool {
        if self.is_max_demand() {
            a.demand > b.demand - EPS
        } else {
            a.cost < b.cost + EPS
        }
    }

    // ── Root LP separation rounds ─────────────────────────────────────────

    fn root_separation(&mut self) -> SolveResult<()> {
        let mut productive = 0usize;
        for round in 1..=ROOT_FRAC_SEP_ROUNDS {
            if self.time_left().is_zero() {
                log::warn!("Time budget exhausted during root separation.");
                break;
            }
            let Some(values) = self.solve_model(true)? else { break };

            let started = Instant::now();
            let subset = self.pairs_to_check(round);
            let outcome = self.separation_round(&subset, &values).and_then(|r| {
                // Full pass when the subset produced nothing.
                if r.0 == 0 && subset.len() < self.indices.len() {
                    let all = self.indices.clone();
                    self.separation_round(&all, &values)
                } else {
                    Ok(r)
                }
            });
            self.info.frac_sep_rounds += 1;
            self.info.separation_time += started.elapsed();

            let (added, violated) = match outcome {
                Ok(r) => r,
                Err(e) => {
                    // Abandon the round; acceptance checks keep us correct.
                    log::error!("Problem in separation round: {e}");
                    break;
                }
            };
            self.info.checked_pairs = violated;
            if added == 0 {
                break;
            }
            productive += 1;
            if productive % PRIMAL_HEURISTIC_PERIOD == 1 {
                let started = Instant::now();
                self.run_primal_heuristic(&values);
                self.info.heuristic_time += started.elapsed();
            }
        }
        Ok(())
    }

    /// Start from the pairs that produced cuts last round, plus a 50%
    /// deterministic random sample of the rest for exploration.
    fn pairs_to_check(&self, round: usize) -> Vec<usize> {
        let mut subset = if self.info.checked_pairs.is_empty() {
            self.indices.clone()
        } else {
            self.info.checked_pairs.clone()
        };
        if subset.len() < self.indices.len() {
            let in_subset: FxHashSet<usize> = subset.iter().copied().collect();
            let remaining: Vec<usize> = self
                .indices
                .iter()
                .copied()
                .filter(|k| !in_subset.contains(k))
                .collect();
            let sample = remaining
                .len()
                .min((0.5 * subset.len() as f64).round() as usize);
            let mut rng = SmallRng::seed_from_u64((round + self.info.frac_sep_rounds) as u64);
            subset.extend(remaining.choose_multiple(&mut rng, sample).copied());
        }
        subset
    }

    /// One separation pass over `subset`. Returns the number of cuts added
    /// and the pairs that produced them.
    fn separation_round(
        &mut self,
        subset: &[usize],
        values: &SolveValues,
    ) -> SolveResult<(usize, Vec<usize>)> {
        let frac_vars = values.fractional_count();
        let min_demand = if frac_vars == 0 { 0.5 } else { EPS_INT };
        let is_max_demand = self.is_max_demand();
        let nodes = self.nodes;
        let subgraphs = self.subgraphs;
        let pairs = self.pairs;

        let mut added = 0;
        let mut violated = Vec::new();
        for &k in subset {
            if is_max_demand && values.demand_value(k) < min_demand {
                continue; // demand inactive
            }
            let sub = &subgraphs[k];
            let pair = &pairs[k];
            let orig = NodeKey::entry(pair.origin);
            let dest = NodeKey::entry(pair.destination);
            let before = added;

            let is_active = |key: NodeKey| values.is_active(nodes, key);
            let (path, path_time) = shortest_path(
                sub.view().filter_nodes(&is_active),
                orig,
                dest,
                arc_total_time,
            );

            // Integer separation applies when this subgraph's support is
            // integral (or the whole solution is).
            let support_integral = frac_vars == 0
                || sub.nodes().all(|key| {
                    is_active(key) || values.station_value(key.id) <= EPS_INT
                });

            if support_integral {
                if path.is_empty() {
                    let cuts = integer_separation(sub, pair, k, nodes, &is_active)?;
                    added += self.add_cuts(cuts);
                } else {
                    let (_, path_road_time) = shortest_path(
                        sub.view().filter_nodes(&is_active),
                        orig,
                        dest,
                        arc_road_time,
                    );
                    if path_time > pair.max_time || path_road_time > pair.max_road_time {
                        let cuts = integer_time_separation(sub, pair, k, nodes, &is_active)?;
                        added += self.add_cuts(cuts);
                    }
                }
            } else if path.is_empty() {
                // Fractional separation is pure connectivity.
                let threshold = if is_max_demand {
                    values.demand_value(k)
                } else {
                    1.0 - EPS
                };
                let station_value = |id: NodeId| values.station_value(id);
                if let Some(cut) =
                    fractional_separation(sub, pair, k, nodes, &station_value, threshold)?
                {
                    added += self.add_cuts(vec![cut]);
                }
            }

            if added > before {
                violated.push(k);
            }
        }
        Ok((added, violated))
    }

    fn run_primal_heuristic(&mut self, values: &SolveValues) {
        let demand_lp = self.is_max_demand().then_some(&values.demand);
        let (stations, served) = primal_heuristic(
            &self.indices,
            self.pairs,
            self.subgraphs,
            self.nodes,
            &values.station,
            demand_lp,
            self.budget(),
        );
        let candidate = if self.is_max_demand() {
            Incumbent::new(stations, served, self.nodes, self.pairs)
        } else {
            // Min-cost incumbents must cover everything; reduce before use.
            if served.len() < self.indices.len() {
                return;
            }
            let stations: Vec<NodeId> = stations.into_iter().collect();
            let reduced =
                remove_redundancy(&stations, self.nodes, self.subgraphs, self.pairs, None);
            Incumbent::new(reduced.into_iter().collect(), served, self.nodes, self.pairs)
        };
        self.offer_incumbent(candidate);
    }

    fn offer_incumbent(&mut self, candidate: Incumbent) {
        let better = match &self.incumbent {
            None => true,
            Some(best) => {
                if self.is_max_demand() {
                    candidate.demand > best.demand + EPS
                } else {
                    candidate.cost < best.cost - EPS
                }
            }
        };
        if better {
            log::info!(
                "New incumbent: covered demand = {:.2}, cost = {:.2}",
                candidate.demand,
                candidate.cost
            );
            self.incumbent = Some(candidate);
        }
    }

    // ── Integer rounds ────────────────────────────────────────────────────

    fn integer_rounds(&mut self) -> SolveResult<Option<Incumbent>> {
        loop {
            if self.time_left().is_zero() {
                log::warn!("Time budget exhausted; falling back to the best incumbent.");
                return Ok(None);
            }
            let Some(values) = self.solve_model(false)? else {
                log::warn!("MIP reported infeasible; falling back to the best incumbent.");
                return Ok(None);
            };

            let nodes = self.nodes;
            let subgraphs = self.subgraphs;
            let pairs = self.pairs;
            let is_active = |key: NodeKey| values.is_active(nodes, key);
            let served: Vec<usize> = if self.is_max_demand() {
                self.indices
                    .iter()
                    .copied()
                    .filter(|&k| values.demand_value(k) > 0.5)
                    .collect()
            } else {
                self.indices.clone()
            };

            // Exact feasibility of every served pair.
            let violated: Vec<usize> = served
                .iter()
                .copied()
                .filter(|&k| get_feasible_path(&subgraphs[k], &pairs[k], &is_active).is_empty())
                .collect();

            let stations: FxHashSet<NodeId> = self
                .candidates
                .iter()
                .copied()
                .filter(|&id| values.station_value(id) > 0.5)
                .collect();

            if violated.is_empty() {
                let mut served: FxHashSet<usize> = served.into_iter().collect();
                if self.is_max_demand() {
                    // Maximality: pairs covered for free are served too.
                    for &k in &self.indices {
                        if !served.contains(&k)
                            && !get_feasible_path(&subgraphs[k], &pairs[k], &is_active).is_empty()
                        {
                            served.insert(k);
                        }
                    }
                }
                return Ok(Some(Incumbent::new(stations, served, nodes, pairs)));
            }

            // Max-demand: the projection with violated demands zeroed is a
            // valid integer solution worth keeping.
            if self.is_max_demand() {
                let violated_set: FxHashSet<usize> = violated.iter().copied().collect();
                let projected: FxHashSet<usize> = served
                    .iter()
                    .copied()
                    .filter(|k| !violated_set.contains(k))
                    .collect();
                self.offer_incumbent(Incumbent::new(
                    stations,
                    projected,
                    self.nodes,
                    self.pairs,
                ));
            }

            let started = Instant::now();
            let added = self.cuts_for_rejected(&violated, &values);
            self.info.separation_time += started.elapsed();
            match added {
                Ok(0) => {
                    log::warn!(
                        "Rejected integer solution produced no new cuts; \
                         falling back to the best incumbent."
                    );
                    return Ok(None);
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Problem separating a rejected integer solution: {e}");
                    return Ok(None);
                }
            }
        }
    }

    /// Connectivity or time separators for pairs that failed the exact
    /// integer-solution check.
    fn cuts_for_rejected(
        &mut self,
        violated: &[usize],
        values: &SolveValues,
    ) -> SolveResult<usize> {
        let nodes = self.nodes;
        let subgraphs = self.subgraphs;
        let pairs = self.pairs;
        let mut added = 0;
        for &k in violated {
            let sub = &subgraphs[k];
            let pair = &pairs[k];
            let orig = NodeKey::entry(pair.origin);
            let dest = NodeKey::entry(pair.destination);
            let is_active = |key: NodeKey| values.is_active(nodes, key);

            let (path, path_time) =
                shortest_path(sub.view().filter_nodes(&is_active), orig, dest, arc_total_time);
            if path.is_empty() {
                added += self.add_cuts(integer_separation(sub, pair, k, nodes, &is_active)?);
                continue;
            }
            let (_, path_road_time) =
                shortest_path(sub.view().filter_nodes(&is_active), orig, dest, arc_road_time);
            if path_time > pair.max_time || path_road_time > pair.max_road_time {
                added += self.add_cuts(integer_time_separation(sub, pair, k, nodes, &is_active)?);
            } else {
                // The exact oracle is conservative; nothing to separate.
                log::debug!("Pair {k} rejected without a separable bound violation.");
            }
        }
        Ok(added)
    }

    // ── Model building and solving ────────────────────────────────────────

    /// Solve the LP relaxation (`relaxed`) or the MIP with the current cut
    /// pool. Returns `None` on infeasibility.
    fn solve_model(&self, relaxed: bool) -> SolveResult<Option<SolveValues>> {
        let mut pvars = ProblemVariables::new();
        let mut station_vars: FxHashMap<NodeId, Variable> = FxHashMap::default();
        for &id in &self.candidates {
            let def = if relaxed {
                variable().min(0.0).max(1.0)
            } else {
                variable().binary()
            };
            station_vars.insert(id, pvars.add(def));
        }
        let mut demand_vars: FxHashMap<usize, Variable> = FxHashMap::default();
        if self.is_max_demand() {
            for &k in &self.indices {
                let def = if relaxed {
                    variable().min(0.0).max(1.0)
                } else {
                    variable().binary()
                };
                demand_vars.insert(k, pvars.add(def));
            }
        }

        let mut model = match self.mode {
            Mode::MinCost => {
                let objective: Expression = self
                    .candidates
                    .iter()
                    .map(|&id| station_vars[&id] * self.nodes.cost(id))
                    .sum();
                coin_cbc(pvars.minimise(objective))
            }
            Mode::MaxDemand { .. } => {
                let objective: Expression = self
                    .indices
                    .iter()
                    .map(|&k| demand_vars[&k] * self.pairs[k].demand)
                    .sum();
                coin_cbc(pvars.maximise(objective))
            }
        };

        model.set_parameter("logLevel", "0");
        // Cut management assumes solutions arrive one at a time.
        model.set_parameter("threads", "1");
        model.set_parameter("presolve", "off");
        model.set_parameter("heuristics", "off");
        let seconds = self.time_left().as_secs().max(1);
        model.set_parameter("seconds", &seconds.to_string());
        if !relaxed && self.tolerance > 0.0 {
            model.set_parameter("ratio", &self.tolerance.to_string());
        }

        for cut in &self.cuts {
            let sum: Expression = cut.members.iter().map(|id| station_vars[id]).sum();
            match self.mode {
                Mode::MinCost => {
                    model.add_constraint(constraint!(sum >= 1.0));
                }
                Mode::MaxDemand { .. } => {
                    model.add_constraint(constraint!(sum >= demand_vars[&cut.pair]));
                }
            }
        }
        if let Mode::MaxDemand { budget } = self.mode {
            let total_cost: Expression = self
                .candidates
                .iter()
                .map(|&id| station_vars[&id] * self.nodes.cost(id))
                .sum();
            model.add_constraint(constraint!(total_cost <= budget));
        }

        match model.solve() {
            Ok(solution) => {
                let station = self
                    .candidates
                    .iter()
                    .map(|&id| (id, solution.value(station_vars[&id])))
                    .collect();
                let demand = demand_vars
                    .iter()
                    .map(|(&k, &v)| (k, solution.value(v)))
                    .collect();
                Ok(Some(SolveValues { station, demand }))
            }
            Err(ResolutionError::Infeasible) => Ok(None),
            Err(e) => Err(SolveError::Solver(e.to_string())),
        }
    }

    fn log_statistics(&self) {
        log::info!("MIP solver finished.");
        log::info!("Added inequalities during separation: {}", self.info.inequality_count);
        log::info!(
            "Total time spent in separation: {:.2} secs.",
            self.info.separation_time.as_secs_f64()
        );
        log::info!(
            "Total time spent in primal heuristic: {:.2} secs.",
            self.info.heuristic_time.as_secs_f64()
        );
    }
}
