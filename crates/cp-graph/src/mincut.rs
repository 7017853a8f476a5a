//! Maximum flow / minimum cut on a subgraph.
//!
//! Used by fractional separation: candidate split arcs `(entry, exit)` carry
//! the LP value of their station variable as capacity, every other arc is
//! uncapacitated. The minimum `s`–`t` cut value then equals the cheapest
//! fractional node cut, and the sink-side partition yields the separator.
//!
//! The implementation is Edmonds–Karp (BFS shortest augmenting paths) on an
//! indexed residual network; infinite capacities stay infinite through
//! residual updates.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use cp_core::NodeKey;

use crate::subgraph::Subgraph;

const FLOW_EPS: f64 = 1e-12;

/// Minimum cut between `source` and `sink` under `capacity`.
///
/// Returns the cut value and the **source-side** partition (residual-
/// reachable nodes). When the cut value is unbounded (an uncapacitated path
/// exists) the value is `f64::INFINITY` and the partition is the full
/// reachable set.
pub fn minimum_cut(
    graph: &Subgraph,
    source: NodeKey,
    sink: NodeKey,
    capacity: impl Fn(NodeKey, NodeKey) -> f64,
) -> (f64, FxHashSet<NodeKey>) {
    // Index nodes and arcs; each directed arc gets a residual twin.
    let nodes: Vec<NodeKey> = graph.nodes().collect();
    let index: FxHashMap<NodeKey, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let (Some(&s), Some(&t)) = (index.get(&source), index.get(&sink)) else {
        return (0.0, FxHashSet::default());
    };

    // arcs[i]: (to, residual capacity); arcs[i ^ 1] is the reverse twin.
    let mut arc_to: Vec<usize> = Vec::new();
    let mut residual: Vec<f64> = Vec::new();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (tail, head, _) in graph.arcs() {
        let (u, v) = (index[&tail], index[&head]);
        let cap = capacity(tail, head);
        adj[u].push(arc_to.len());
        arc_to.push(v);
        residual.push(cap);
        adj[v].push(arc_to.len());
        arc_to.push(u);
        residual.push(0.0);
    }

    let mut total_flow = 0.0f64;
    loop {
        // BFS for a shortest augmenting path in the residual network.
        let mut via: Vec<Option<usize>> = vec![None; nodes.len()];
        let mut queue = VecDeque::new();
        queue.push_back(s);
        let mut reached_sink = false;
        'bfs: while let Some(u) = queue.pop_front() {
            for &e in &adj[u] {
                let v = arc_to[e];
                if residual[e] > FLOW_EPS && via[v].is_none() && v != s {
                    via[v] = Some(e);
                    if v == t {
                        reached_sink = true;
                        break 'bfs;
                    }
                    queue.push_back(v);
                }
            }
        }
        if !reached_sink {
            break;
        }

        // Bottleneck along the augmenting path.
        let mut bottleneck = f64::INFINITY;
        let mut v = t;
        while v != s {
            let e = via[v].unwrap();
            bottleneck = bottleneck.min(residual[e]);
            v = arc_to[e ^ 1];
        }
        if bottleneck.is_infinite() {
            // Uncapacitated path: the cut is unbounded.
            let reachable = residual_reachable(&adj, &arc_to, &residual, s, &nodes);
            return (f64::INFINITY, reachable);
        }

        let mut v = t;
        while v != s {
            let e = via[v].unwrap();
            residual[e] -= bottleneck;
            residual[e ^ 1] += bottleneck;
            v = arc_to[e ^ 1];
        }
        total_flow += bottleneck;
    }

    let reachable = residual_reachable(&adj, &arc_to, &residual, s, &nodes);
    (total_flow, reachable)
}

fn residual_reachable(
    adj: &[Vec<usize>],
    arc_to: &[usize],
    residual: &[f64],
    s: usize,
    nodes: &[NodeKey],
) -> FxHashSet<NodeKey> {
    let mut seen = vec![false; adj.len()];
    let mut stack = vec![s];
    seen[s] = true;
    while let Some(u) = stack.pop() {
        for &e in &adj[u] {
            let v = arc_to[e];
            if residual[e] > FLOW_EPS && !seen[v] {
                seen[v] = true;
                stack.push(v);
            }
        }
    }
    nodes
        .iter()
        .enumerate()
        .filter(|&(i, _)| seen[i])
        .map(|(_, &n)| n)
        .collect()
}
