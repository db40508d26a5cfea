//! Action scheduler (component C4, spec §4.4).
//!
//! A FIFO action list executed to completion or timeout, with
//! backtracking: a failed action is undone and re-queued with an
//! incremented try-counter until a global try-budget runs out.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::chains::{self, ChainResult};
use crate::error::GraphError;
use crate::model::{EdgeId, Graph, NodeId};
use crate::placement;
use crate::router;
use crate::splice;

const MAX_TRIES_PER_ACTION: u32 = 8;
const DEFAULT_TRY_BUDGET: u64 = 10_000;

#[derive(Debug, Clone)]
pub enum Action {
    PlaceNode { node: NodeId, tries: u32 },
    ChainNode { node: NodeId, tries: u32, parent: NodeId, edge: EdgeId },
    TraceEdge { edge: EdgeId },
    Splice,
}

pub struct LayoutReport {
    pub partial: bool,
    pub warnings: Vec<String>,
}

/// Runs the scheduler to completion, within `timeout`. Mutates `graph` in
/// place: placed coordinates, routed edges, and (after Splice) the
/// doubled grid with group cells.
pub fn run(graph: &mut Graph, timeout: Duration) -> Result<LayoutReport, GraphError> {
    run_seeded(graph, timeout, None)
}

/// Same as `run`, but with an optional seed that reorders the "leftover"
/// part of the initial action queue (spec §9 "Score" — randomised
/// equal-score retries). `None` reproduces `run`'s fully deterministic
/// ordering; `layout::layout_randomized` drives this with a fresh seed
/// per attempt and keeps whichever attempt scores best.
///
/// When `graph.options.debug` is set (spec §6.4 `debug`, SPEC_FULL §10.2),
/// this call runs under a local `tracing` subscriber raised to `DEBUG` for
/// its duration, rather than a global one-shot stderr print — any
/// process-wide subscriber `main.rs` already installed is shadowed only
/// for this call's thread.
pub fn run_seeded(graph: &mut Graph, timeout: Duration, seed: Option<u64>) -> Result<LayoutReport, GraphError> {
    if graph.options.debug {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::with_default(subscriber, || run_seeded_inner(graph, timeout, seed))
    } else {
        run_seeded_inner(graph, timeout, seed)
    }
}

#[tracing::instrument(level = "debug", skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
fn run_seeded_inner(graph: &mut Graph, timeout: Duration, seed: Option<u64>) -> Result<LayoutReport, GraphError> {
    let start = Instant::now();
    let chain_result = chains::find_chains(graph, &chains::assign_ranks(graph));
    debug!(chains = chain_result.chains.len(), "chains discovered");

    let mut queue = build_initial_queue(graph, &chain_result, seed);
    let mut try_budget: u64 = DEFAULT_TRY_BUDGET;
    let mut warnings = Vec::new();
    let mut partial = false;

    while let Some(action) = queue.pop_front() {
        if start.elapsed() > timeout {
            warn!(node_count = graph.node_count(), "layout timed out");
            return Err(GraphError::LayoutTimeout {
                node_count: graph.node_count(),
                timeout_secs: timeout.as_secs(),
            });
        }

        let outcome = execute(graph, &action);
        match outcome {
            Ok(_score_delta) => {}
            Err(err) => {
                undo(graph, &action);
                if try_budget == 0 {
                    warn!(%err, ?action, "try-budget exhausted");
                    warnings.push(format!("try-budget exhausted near action {:?}: {}", action, err));
                    partial = true;
                    continue;
                }
                try_budget -= 1;
                let retried = bump_tries(action);
                match retried {
                    Some(retried) if tries_of(&retried) <= MAX_TRIES_PER_ACTION => {
                        queue.push_back(retried);
                    }
                    _ => {
                        debug!(%err, "giving up on action after retries");
                        warnings.push(format!("giving up on action: {}", err));
                        partial = true;
                    }
                }
            }
        }
    }

    graph.score = Some(score(graph));
    debug!(score = graph.score, partial, "layout complete");
    Ok(LayoutReport { partial, warnings })
}

fn tries_of(action: &Action) -> u32 {
    match action {
        Action::PlaceNode { tries, .. } => *tries,
        Action::ChainNode { tries, .. } => *tries,
        _ => 0,
    }
}

fn bump_tries(action: Action) -> Option<Action> {
    match action {
        Action::PlaceNode { node, tries } => Some(Action::PlaceNode { node, tries: tries + 1 }),
        Action::ChainNode { node, tries, parent, edge } => Some(Action::ChainNode { node, tries: tries + 1, parent, edge }),
        Action::TraceEdge { edge } => Some(Action::TraceEdge { edge }),
        Action::Splice => None,
    }
}

/// Builds the initial stack (spec §4.4): the root first, then each
/// chain's actions, then left-over nodes/edges, then one Splice. When
/// `seed` is given, the two left-over lists are shuffled before being
/// queued; the chain-driven prefix is never reordered, since that part
/// already carries the deterministic rank/name tie-breaks spec §5 needs.
fn build_initial_queue(graph: &Graph, chains: &ChainResult, seed: Option<u64>) -> VecDeque<Action> {
    let mut queue = VecDeque::new();
    let mut placed_or_queued = std::collections::HashSet::new();
    let mut routed_or_queued = std::collections::HashSet::new();

    if let Some(root) = graph.root {
        queue.push_back(Action::PlaceNode { node: root, tries: 0 });
        placed_or_queued.insert(root);
    }

    for chain in &chains.chains {
        for (i, &node) in chain.nodes.iter().enumerate() {
            if placed_or_queued.contains(&node) {
                continue;
            }
            if i == 0 {
                queue.push_back(Action::PlaceNode { node, tries: 0 });
            } else {
                let parent = chain.nodes[i - 1];
                let edge = chain.edges[i - 1];
                queue.push_back(Action::ChainNode { node, tries: 0, parent, edge });
            }
            placed_or_queued.insert(node);
        }
        for &edge in &chain.edges {
            queue.push_back(Action::TraceEdge { edge });
            routed_or_queued.insert(edge);
        }
    }

    let mut leftover_nodes: Vec<NodeId> = graph.node_ids().filter(|id| !placed_or_queued.contains(id)).collect();
    let mut leftover_edges: Vec<EdgeId> = graph.edge_ids().filter(|id| !routed_or_queued.contains(id)).collect();
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        leftover_nodes.shuffle(&mut rng);
        leftover_edges.shuffle(&mut rng);
    }
    for id in leftover_nodes {
        queue.push_back(Action::PlaceNode { node: id, tries: 0 });
        placed_or_queued.insert(id);
    }
    for id in leftover_edges {
        queue.push_back(Action::TraceEdge { edge: id });
        routed_or_queued.insert(id);
    }

    queue.push_back(Action::Splice);
    queue
}

fn execute(graph: &mut Graph, action: &Action) -> Result<i64, GraphError> {
    match *action {
        Action::PlaceNode { node, .. } => {
            if placement::place_node(graph, node, None) {
                Ok(1)
            } else {
                Err(GraphError::Internal(format!("could not place node {}", node.0)))
            }
        }
        Action::ChainNode { node, parent, .. } => {
            if placement::place_node(graph, node, Some(parent)) {
                Ok(1)
            } else {
                Err(GraphError::Internal(format!("could not place node {}", node.0)))
            }
        }
        Action::TraceEdge { edge } => {
            router::route_edge(graph, edge)?;
            Ok(celltype_score(graph, edge))
        }
        Action::Splice => {
            splice::splice(graph);
            Ok(0)
        }
    }
}

fn celltype_score(graph: &Graph, edge: EdgeId) -> i64 {
    graph
        .edge(edge)
        .map(|e| {
            e.cells
                .iter()
                .filter(|c| !c.base.is_straight())
                .count() as i64
        })
        .unwrap_or(0)
}

fn undo(graph: &mut Graph, action: &Action) {
    match *action {
        Action::PlaceNode { node, .. } | Action::ChainNode { node, .. } => {
            placement::unplace_node(graph, node);
        }
        Action::TraceEdge { edge } => {
            if let Some(e) = graph.edge_mut(edge) {
                e.unplace();
            }
        }
        Action::Splice => {}
    }
}

/// Arbitrary layout-goodness score (spec §4.4, §5, §9 "Score"): fewer
/// bends and fewer crossings score better; used only to rank repeated
/// randomised attempts against each other, never to affect routing.
fn score(graph: &Graph) -> i64 {
    let mut total = 0i64;
    for id in graph.edge_ids() {
        let e = graph.edge(id).unwrap();
        for cell in &e.cells {
            if !cell.base.is_straight() {
                total -= 1;
            }
            if cell.cross_with.is_some() {
                total -= 3;
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;
    use crate::model::Graph;
    use std::time::Duration;

    #[test]
    fn single_edge_graph_lays_out_without_warnings() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("Bonn").unwrap();
        let b = g.add_node("Berlin").unwrap();
        g.add_edge(a, b);
        let report = run(&mut g, Duration::from_secs(5)).unwrap();
        assert!(!report.partial);
        assert!(g.node(a).unwrap().is_placed());
        assert!(g.node(b).unwrap().is_placed());
        assert!(g.edge_ids().all(|e| g.edge(e).unwrap().is_routed()));
    }

    #[test]
    fn three_node_cycle_lays_out_all_nodes_without_corner_touch() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        let c = g.add_node("C").unwrap();
        g.add_edge(a, b);
        g.add_edge(b, c);
        g.add_edge(c, a);
        run(&mut g, Duration::from_secs(5)).unwrap();
        for id in [a, b, c] {
            assert!(g.node(id).unwrap().is_placed());
        }
    }

    #[test]
    fn score_is_set_after_a_successful_layout() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        g.add_edge(a, b);
        run(&mut g, Duration::from_secs(5)).unwrap();
        assert!(g.score.is_some());
    }

    #[test]
    fn seeded_run_still_places_and_routes_everything() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        let c = g.add_node("C").unwrap();
        g.add_edge(a, b);
        g.add_edge(a, c);
        let report = run_seeded(&mut g, Duration::from_secs(5), Some(42)).unwrap();
        assert!(!report.partial);
        for id in [a, b, c] {
            assert!(g.node(id).unwrap().is_placed());
        }
    }

    #[test]
    fn different_seeds_can_reorder_the_leftover_queue() {
        let mut g = Graph::new(GraphOptions::default());
        let root = g.add_node("Root").unwrap();
        for name in ["X", "Y", "Z", "W"] {
            g.add_node(name).unwrap();
        }
        let chains = chains::find_chains(&g, &chains::assign_ranks(&g));
        let _ = root;
        let q1 = build_initial_queue(&g, &chains, Some(1));
        let q2 = build_initial_queue(&g, &chains, Some(2));
        let order = |q: &VecDeque<Action>| -> Vec<u32> {
            q.iter()
                .filter_map(|a| match a {
                    Action::PlaceNode { node, .. } => Some(node.0),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(q1.len(), q2.len());
        // Not asserting the two orders differ (a seed collision in
        // outcome is possible by chance); just that shuffling runs
        // without losing or duplicating any leftover node.
        let mut a = order(&q1);
        let mut b = order(&q2);
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
