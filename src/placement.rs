//! Node placement (component C5, spec §4.5).

use crate::flow::{Flow, Side};
use crate::model::{Cell, EdgeId, Graph, NodeId};

/// Grows a node's `(cx, cy)` so every port-restricted edge gets its own
/// slot (spec §4.5 "The node size is *grown before placement*").
pub fn grow_node(graph: &mut Graph, node: NodeId) {
    let flow = effective_flow(graph, node);
    let incident: Vec<EdgeId> = graph.node(node).unwrap().incident.iter().copied().collect();

    let mut per_side: [u32; 4] = [0, 0, 0, 0]; // N, S, E, W
    let mut unconstrained = 0u32;

    for eid in &incident {
        let edge = graph.edge(*eid).unwrap();
        let side = if edge.from == node {
            edge.start_port.map(|p| p.side)
        } else {
            edge.end_port.map(|p| p.side)
        };
        match side {
            Some(Side::North) => per_side[0] += 1,
            Some(Side::South) => per_side[1] += 1,
            Some(Side::East) => per_side[2] += 1,
            Some(Side::West) => per_side[3] += 1,
            None => unconstrained += 1,
        }
    }

    // The flow's own exit side absorbs the unconstrained edges; everything
    // else must fit in whatever room the port-restricted counts leave.
    let flow_idx = match flow.as_side() {
        Side::North => 0,
        Side::South => 1,
        Side::East => 2,
        Side::West => 3,
    };
    per_side[flow_idx] = per_side[flow_idx].max(unconstrained);

    // North/South ports are spread along the top/bottom edge, whose
    // length is cx; East/West ports are spread along the left/right
    // edge, whose length is cy.
    let min_width = per_side[0].max(per_side[1]).max(1);
    let min_height = per_side[2].max(per_side[3]).max(1);
    let node = graph.node_mut(node).unwrap();
    node.cx = node.cx.max(min_width as i32);
    node.cy = node.cy.max(min_height as i32);
}

fn effective_flow(graph: &Graph, node: NodeId) -> Flow {
    graph.node(node).unwrap().flow_attr.unwrap_or(graph.flow)
}

fn rect_free(graph: &Graph, x: i32, y: i32, cx: i32, cy: i32) -> bool {
    for j in 0..cy {
        for i in 0..cx {
            if graph.cells.contains_key(&(x + i, y + j)) {
                return false;
            }
        }
    }
    !touches_other_node(graph, x, y, cx, cy)
}

/// No two nodes may touch corners (spec §8 property 4): reject a
/// candidate rect if any of the 8 surrounding cells belongs to a
/// different node's body.
fn touches_other_node(graph: &Graph, x: i32, y: i32, cx: i32, cy: i32) -> bool {
    for j in -1..=cy {
        for i in -1..=cx {
            if (0..cy).contains(&j) && (0..cx).contains(&i) {
                continue; // interior, checked separately
            }
            if let Some(cell) = graph.cells.get(&(x + i, y + j)) {
                if cell.node_id().is_some() {
                    return true;
                }
            }
        }
    }
    false
}

/// Candidate offsets around a parent, rotated by the parent's flow, used
/// by `place_node`'s step 3 (spec §4.5 `_near_places`).
fn near_places(distance: i32, flow: Flow) -> Vec<(i32, i32)> {
    let primary = flow.as_side().delta();
    let (px, py) = (primary.0 * distance, primary.1 * distance);
    let perpendicular = match flow.as_side() {
        Side::North | Side::South => [(1, 0), (-1, 0)],
        Side::East | Side::West => [(0, 1), (0, -1)],
    };
    let mut out = vec![(px, py)];
    for (dx, dy) in perpendicular {
        out.push((px + dx * distance, py + dy * distance));
    }
    out
}

/// Places `node`, optionally anchored near `parent` along `via`'s flow
/// (spec §4.5 steps 1-5).
pub fn place_node(graph: &mut Graph, node: NodeId, parent: Option<NodeId>) -> bool {
    grow_node(graph, node);
    let (cx, cy) = {
        let n = graph.node(node).unwrap();
        (n.cx, n.cy)
    };

    // Step 1: reuse a placed node's coordinate along the user rank axis.
    if let Some(rank) = graph.node(node).unwrap().rank {
        if let Some(pos) = rank_axis_slot(graph, rank, cx, cy) {
            return commit(graph, node, pos, cx, cy);
        }
    }

    // Steps 3-4: near the parent, then near any placed neighbour.
    if let Some(parent_id) = parent {
        if let Some((px, py)) = graph.node(parent_id).unwrap().pos {
            let flow = effective_flow(graph, parent_id);
            for minlen in [1, 2, 3] {
                for (dx, dy) in near_places(minlen, flow) {
                    let candidate = (px + dx, py + dy);
                    if rect_free(graph, candidate.0, candidate.1, cx, cy) {
                        return commit(graph, node, candidate, cx, cy);
                    }
                }
            }
        }
    }

    for neighbour in placed_neighbours(graph, node) {
        let (nx, ny) = graph.node(neighbour).unwrap().pos.unwrap();
        let flow = effective_flow(graph, neighbour);
        for minlen in [1, 2, 3] {
            for (dx, dy) in near_places(minlen, flow) {
                let candidate = (nx + dx, ny + dy);
                if rect_free(graph, candidate.0, candidate.1, cx, cy) {
                    return commit(graph, node, candidate, cx, cy);
                }
            }
        }
    }

    // Step 5: last resort, walk outward from the origin along the flow axis.
    let flow = effective_flow(graph, node);
    for step in 0..10_000 {
        let (dx, dy) = flow.as_side().delta();
        let candidate = (dx * step, dy * step);
        if rect_free(graph, candidate.0, candidate.1, cx, cy) {
            return commit(graph, node, candidate, cx, cy);
        }
    }
    false
}

fn rank_axis_slot(graph: &Graph, rank: i32, cx: i32, cy: i32) -> Option<(i32, i32)> {
    let anchor = graph
        .node_ids()
        .filter_map(|id| {
            let n = graph.node(id).unwrap();
            if n.rank == Some(rank) {
                n.pos
            } else {
                None
            }
        })
        .next()?;
    for step in 0..1000 {
        for sign in [1, -1] {
            let candidate = match graph.flow.as_side() {
                Side::East | Side::West => (anchor.0, anchor.1 + sign * step),
                Side::North | Side::South => (anchor.0 + sign * step, anchor.1),
            };
            if rect_free(graph, candidate.0, candidate.1, cx, cy) {
                return Some(candidate);
            }
            if step == 0 {
                break;
            }
        }
    }
    None
}

fn placed_neighbours(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(n) = graph.node(node) {
        for &eid in &n.incident {
            let e = graph.edge(eid).unwrap();
            let other = if e.from == node { e.to } else { e.from };
            if other != node && graph.node(other).map(|o| o.is_placed()).unwrap_or(false) {
                out.push(other);
            }
        }
    }
    out
}

fn commit(graph: &mut Graph, node: NodeId, pos: (i32, i32), cx: i32, cy: i32) -> bool {
    {
        let n = graph.node_mut(node).unwrap();
        n.pos = Some(pos);
        n.cx = cx;
        n.cy = cy;
    }
    for j in 0..cy {
        for i in 0..cx {
            let cell = if i == 0 && j == 0 { Cell::Node(node) } else { Cell::NodeFiller(node) };
            graph.cells.insert((pos.0 + i, pos.1 + j), cell);
        }
    }
    true
}

/// Undoes a placement, freeing its cells (spec §4.4 "`_unplace`").
pub fn unplace_node(graph: &mut Graph, node: NodeId) {
    let (pos, cx, cy) = {
        let n = graph.node(node).unwrap();
        match n.pos {
            Some(p) => (p, n.cx, n.cy),
            None => return,
        }
    };
    for j in 0..cy {
        for i in 0..cx {
            graph.cells.remove(&(pos.0 + i, pos.1 + j));
        }
    }
    let n = graph.node_mut(node).unwrap();
    n.pos = None;
    n.invalidate_cache();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;
    use crate::model::Graph;

    #[test]
    fn first_node_places_at_some_origin() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        assert!(place_node(&mut g, a, None));
        assert!(g.node(a).unwrap().is_placed());
    }

    #[test]
    fn second_node_does_not_overlap_or_corner_touch_first() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        g.add_edge(a, b);
        place_node(&mut g, a, None);
        place_node(&mut g, b, Some(a));
        let (ax, ay) = g.node(a).unwrap().pos.unwrap();
        let (bx, by) = g.node(b).unwrap().pos.unwrap();
        assert!(!(ax == bx && ay == by));
        // Not diagonally adjacent (corner-touch check).
        let dx = (ax - bx).abs();
        let dy = (ay - by).abs();
        assert!(!(dx == 1 && dy == 1));
    }

    #[test]
    fn unplace_frees_the_cells() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        place_node(&mut g, a, None);
        let pos = g.node(a).unwrap().pos.unwrap();
        unplace_node(&mut g, a);
        assert!(g.node(a).unwrap().pos.is_none());
        assert!(!g.cells.contains_key(&pos));
    }

    #[test]
    fn multi_cell_node_claims_its_whole_block() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        g.node_mut(a).unwrap().cx = 3;
        g.node_mut(a).unwrap().cy = 2;
        place_node(&mut g, a, None);
        let n = g.node(a).unwrap();
        assert_eq!(n.cells().len(), 6);
        for cell in n.cells() {
            assert!(g.cells.get(&cell).unwrap().node_id() == Some(a));
        }
    }
}
