//! Chain finder (component C3, spec §4.3).
//!
//! Partitions the graph into maximal non-branching paths ("chains"),
//! assigning each node a rank along the way. Chains are the primary
//! placement unit the action scheduler (C4) walks.

use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::model::{EdgeId, Graph, NodeId};

#[derive(Debug, Clone)]
pub struct Chain {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct ChainResult {
    pub chains: Vec<Chain>,
    pub chain_of: HashMap<NodeId, usize>,
    pub ranks: HashMap<NodeId, i32>,
}

/// Assigns ranks: user-specified ranks (from `node.rank`, 1..) are kept
/// verbatim; everything else gets an auto-rank (-1, -2, ... deeper in BFS
/// order from sources). Absolute value defines sort order (spec §4.3 step 1).
pub fn assign_ranks(graph: &Graph) -> HashMap<NodeId, i32> {
    let mut ranks: HashMap<NodeId, i32> = HashMap::new();
    let mut has_predecessor: HashSet<NodeId> = HashSet::new();
    for eid in graph.edge_ids() {
        let e = graph.edge(eid).unwrap();
        if e.from != e.to {
            has_predecessor.insert(e.to);
        }
    }

    for id in graph.node_ids() {
        if let Some(r) = graph.node(id).unwrap().rank {
            ranks.insert(id, r);
        }
    }

    // BFS from every node without a predecessor (a source), deepest-first
    // auto-rank assignment, lexicographic tie-break for determinism.
    let mut sources: Vec<NodeId> = graph.node_ids().filter(|n| !has_predecessor.contains(n)).collect();
    sources.sort_by_key(|n| graph.node(*n).unwrap().name.clone());

    let mut depth: HashMap<NodeId, i32> = HashMap::new();
    let mut queue: std::collections::VecDeque<NodeId> = std::collections::VecDeque::new();
    for s in &sources {
        depth.entry(*s).or_insert(0);
        queue.push_back(*s);
    }
    while let Some(cur) = queue.pop_front() {
        let d = depth[&cur];
        for succ in successors(graph, cur) {
            let nd = d + 1;
            let better = match depth.get(&succ) {
                Some(&existing) => nd > existing,
                None => true,
            };
            if better {
                depth.insert(succ, nd);
                queue.push_back(succ);
            }
        }
    }

    for id in graph.node_ids() {
        ranks.entry(id).or_insert_with(|| -(depth.get(&id).copied().unwrap_or(0) + 1));
    }
    ranks
}

fn successors(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(n) = graph.node(node) {
        for &eid in &n.incident {
            let e = graph.edge(eid).unwrap();
            if e.from == node && e.to != node {
                out.push(e.to);
            }
        }
    }
    out.sort_by_key(|id| graph.node(*id).unwrap().name.clone());
    out
}

fn predecessors(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(n) = graph.node(node) {
        for &eid in &n.incident {
            let e = graph.edge(eid).unwrap();
            if e.to == node && e.from != node {
                out.push(e.from);
            }
        }
    }
    out
}

/// One candidate root on the priority heap: lower is better, ordered by
/// `(abs rank, has-origin, has-predecessors, name)` (spec §4.3 step 2),
/// with the graph's `root` attribute always sorting first.
#[derive(Debug, Clone, Eq, PartialEq)]
struct RootKey {
    is_graph_root: bool,
    abs_rank: i32,
    has_origin: bool,
    has_predecessors: bool,
    name: String,
}

impl Ord for RootKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; "first" means greatest under this order.
        other
            .is_graph_root
            .cmp(&self.is_graph_root)
            .then(self.abs_rank.cmp(&other.abs_rank))
            .then(self.has_origin.cmp(&other.has_origin))
            .then(self.has_predecessors.cmp(&other.has_predecessors))
            .then(other.name.cmp(&self.name))
            .reverse()
    }
}
impl PartialOrd for RootKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Discovers maximal chains and records each node's chain membership
/// (spec §4.3 steps 2-4).
pub fn find_chains(graph: &Graph, ranks: &HashMap<NodeId, i32>) -> ChainResult {
    let mut in_chain: HashSet<NodeId> = HashSet::new();
    let mut chains: Vec<Chain> = Vec::new();
    let mut chain_of: HashMap<NodeId, usize> = HashMap::new();

    let mut heap: BinaryHeap<RootKey> = BinaryHeap::new();
    let mut key_to_node: HashMap<(i32, bool, bool, String), NodeId> = HashMap::new();
    for id in graph.node_ids() {
        let node = graph.node(id).unwrap();
        let key = RootKey {
            is_graph_root: graph.root == Some(id),
            abs_rank: ranks.get(&id).copied().unwrap_or(0).abs(),
            has_origin: node.origin.is_some(),
            has_predecessors: !predecessors(graph, id).is_empty(),
            name: node.name.clone(),
        };
        key_to_node.insert(
            (key.abs_rank, key.has_origin, key.has_predecessors, key.name.clone()),
            id,
        );
        heap.push(key);
    }

    while let Some(key) = heap.pop() {
        let Some(&root) = key_to_node.get(&(key.abs_rank, key.has_origin, key.has_predecessors, key.name.clone())) else {
            continue;
        };
        if in_chain.contains(&root) {
            continue;
        }
        let chain = extend_chain(graph, root, &in_chain);
        let idx = chains.len();
        for &n in &chain.nodes {
            in_chain.insert(n);
            chain_of.insert(n, idx);
        }
        chains.push(chain);
    }

    ChainResult { chains, chain_of, ranks: ranks.clone() }
}

/// Greedily extends a chain from `start` through unique successors,
/// stopping at self-loops, multi-edges, explicit ports/flow, or branches
/// (spec §4.3 step 3). Ties among successors prefer more total
/// successors, then lexicographic name order.
fn extend_chain(graph: &Graph, start: NodeId, in_chain: &HashSet<NodeId>) -> Chain {
    let mut nodes = vec![start];
    let mut edges = Vec::new();
    let mut cur = start;
    loop {
        let n = graph.node(cur).unwrap();
        let out_edges: Vec<EdgeId> = n
            .incident
            .iter()
            .copied()
            .filter(|&e| graph.edge(e).unwrap().from == cur)
            .collect();

        let candidates: Vec<(NodeId, EdgeId)> = out_edges
            .iter()
            .filter_map(|&e| {
                let edge = graph.edge(e).unwrap();
                if edge.to == cur {
                    return None; // self-loop
                }
                if in_chain.contains(&edge.to) {
                    return None;
                }
                if edge.start_port.is_some() || edge.end_port.is_some() {
                    return None;
                }
                if edge.flow_attr.is_some() {
                    return None;
                }
                Some((edge.to, e))
            })
            .collect();

        // Duplicate multi-edges between the same pair terminate extension.
        let mut targets: HashMap<NodeId, usize> = HashMap::new();
        for (to, _) in &candidates {
            *targets.entry(*to).or_insert(0) += 1;
        }
        let unique: Vec<&(NodeId, EdgeId)> = candidates.iter().filter(|(to, _)| targets[to] == 1).collect();
        if unique.len() != 1 {
            break;
        }
        let (next, via) = *unique[0];

        // Successor must be "unique identity": no other in-chain-eligible
        // predecessor edge should also want it exclusively at this moment,
        // which is already guaranteed by the in_chain check above.
        edges.push(via);
        nodes.push(next);
        cur = next;
    }
    Chain { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;

    fn simple_chain_graph() -> Graph {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        let c = g.add_node("C").unwrap();
        g.add_edge(a, b);
        g.add_edge(b, c);
        g
    }

    #[test]
    fn straight_three_node_path_is_one_chain() {
        let g = simple_chain_graph();
        let ranks = assign_ranks(&g);
        let result = find_chains(&g, &ranks);
        assert_eq!(result.chains.len(), 1);
        assert_eq!(result.chains[0].len(), 3);
    }

    #[test]
    fn branching_node_terminates_the_chain() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        let c = g.add_node("C").unwrap();
        g.add_edge(a, b);
        g.add_edge(a, c);
        let ranks = assign_ranks(&g);
        let result = find_chains(&g, &ranks);
        // A has two distinct successors: chain stops at A, B and C start
        // their own (length-1) chains.
        let a_chain = result.chains[result.chain_of[&a]].clone();
        assert_eq!(a_chain.nodes, vec![a]);
    }

    #[test]
    fn self_loop_does_not_extend_the_chain() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        g.add_edge(a, a);
        let ranks = assign_ranks(&g);
        let result = find_chains(&g, &ranks);
        assert_eq!(result.chains[0].nodes, vec![a]);
    }

    #[test]
    fn auto_ranks_are_negative_and_user_ranks_preserved() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        g.add_edge(a, b);
        g.node_mut(b).unwrap().rank = Some(5);
        let ranks = assign_ranks(&g);
        assert!(ranks[&a] <= 0);
        assert_eq!(ranks[&b], 5);
    }

    #[test]
    fn every_node_ends_up_in_exactly_one_chain() {
        let g = simple_chain_graph();
        let ranks = assign_ranks(&g);
        let result = find_chains(&g, &ranks);
        for id in g.node_ids() {
            assert!(result.chain_of.contains_key(&id));
        }
    }
}
