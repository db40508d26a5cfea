//! Repair / splice pass (component C8, spec §4.8).
//!
//! Doubles the grid so odd rows/columns can host group boundaries and
//! label whitespace, then repairs everything the doubling severed:
//! node interiors, edge continuity, and group boundary cells.

use crate::celltype::CellBase;
use crate::model::cell::Cell;
use crate::model::edge::EdgeCell;
use crate::model::group::{GroupBoundary, GroupCell};
use crate::model::Graph;

pub fn splice(graph: &mut Graph) {
    double_node_positions(graph);
    double_edge_cells(graph);
    rebuild_cell_map(graph);
    restitch_edges(graph);
    fill_group_cells(graph);
}

fn double_node_positions(graph: &mut Graph) {
    let ids: Vec<_> = graph.node_ids().collect();
    for id in ids {
        if let Some(n) = graph.node_mut(id) {
            if let Some((x, y)) = n.pos {
                n.pos = Some((x * 2, y * 2));
            }
        }
    }
}

fn double_edge_cells(graph: &mut Graph) {
    let ids: Vec<_> = graph.edge_ids().collect();
    for id in ids {
        if let Some(e) = graph.edge_mut(id) {
            for cell in &mut e.cells {
                cell.x *= 2;
                cell.y *= 2;
            }
        }
    }
}

/// Rebuilds the sparse cell map from scratch after doubling: node blocks
/// (with filler entries for cx/cy > 1) and every edge cell, in
/// deterministic (node, then edge) order.
fn rebuild_cell_map(graph: &mut Graph) {
    graph.cells.clear();
    let node_ids: Vec<_> = graph.node_ids().collect();
    for id in node_ids {
        let n = graph.node(id).unwrap();
        for (idx, cell) in n.cells().into_iter().enumerate() {
            let entry = if idx == 0 { Cell::Node(id) } else { Cell::NodeFiller(id) };
            graph.cells.insert(cell, entry);
        }
    }
    let edge_ids: Vec<_> = graph.edge_ids().collect();
    for id in edge_ids {
        let e = graph.edge(id).unwrap();
        for (idx, cell) in e.cells.iter().enumerate() {
            graph.cells.entry((cell.x, cell.y)).or_insert(Cell::Edge(id, idx));
        }
    }
}

/// Re-stitches edges across the newly-opened odd coordinates: wherever
/// two formerly-adjacent cells are now 2 apart, insert a same-orientation
/// cell at the midpoint (spec §4.8 "Re-stitch edges").
fn restitch_edges(graph: &mut Graph) {
    let edge_ids: Vec<_> = graph.edge_ids().collect();
    for id in edge_ids {
        let original = graph.edge(id).unwrap().cells.clone();
        if original.len() < 2 {
            continue;
        }
        let mut stitched = Vec::with_capacity(original.len() * 2);
        stitched.push(original[0]);
        for w in original.windows(2) {
            let (a, b) = (w[0], w[1]);
            if matches!(a.base, CellBase::Hole) || matches!(b.base, CellBase::Hole) {
                stitched.push(b);
                continue;
            }
            let mx = (a.x + b.x) / 2;
            let my = (a.y + b.y) / 2;
            if (mx, my) != (a.x, a.y) && (mx, my) != (b.x, b.y) {
                let base = if a.y == b.y { CellBase::Hor } else { CellBase::Ver };
                let mut mid = EdgeCell::new(mx, my, base);
                mid.flags = a.flags.merge(b.flags);
                mid.flags.label_cell = false;
                stitched.push(mid);
            }
            stitched.push(b);
        }
        if let Some(e) = graph.edge_mut(id) {
            e.cells = stitched;
        }
    }
    rebuild_cell_map(graph);
}

/// Paints the 8 cells surrounding every member node with `GroupCell`
/// entries, closes single-cell holes, and computes each cell's boundary
/// mask by comparing with its 4-neighbours (spec §4.8).
fn fill_group_cells(graph: &mut Graph) {
    let group_ids: Vec<_> = graph.group_ids().collect();
    for gid in group_ids {
        let member_cells: Vec<(i32, i32)> = {
            let g = graph.group(gid).unwrap();
            g.members
                .iter()
                .filter_map(|&n| graph.node(n))
                .flat_map(|n| n.cells())
                .collect()
        };
        let member_set: std::collections::HashSet<(i32, i32)> = member_cells.iter().copied().collect();

        let mut candidates = std::collections::HashSet::new();
        for &(x, y) in &member_cells {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    candidates.insert((x + dx, y + dy));
                }
            }
        }

        let mut cells = Vec::new();
        for &(x, y) in &candidates {
            if member_set.contains(&(x, y)) {
                continue;
            }
            if graph.cells.contains_key(&(x, y)) {
                continue; // occupied by something else; leave it alone
            }
            cells.push((x, y));
        }
        cells.sort();

        let full_set: std::collections::HashSet<(i32, i32)> = member_set.union(&cells.iter().copied().collect()).copied().collect();
        let mut group_cells = Vec::with_capacity(cells.len());
        for (x, y) in cells {
            let boundary = GroupBoundary {
                top: !full_set.contains(&(x, y - 1)),
                bottom: !full_set.contains(&(x, y + 1)),
                left: !full_set.contains(&(x - 1, y)),
                right: !full_set.contains(&(x + 1, y)),
            };
            group_cells.push(GroupCell { x, y, boundary });
        }

        let anchor = pick_label_anchor(&group_cells);
        if let Some(g) = graph.group_mut(gid) {
            for (idx, gc) in group_cells.iter().enumerate() {
                graph.cells.entry((gc.x, gc.y)).or_insert(Cell::Group(gid, idx));
            }
            g.cells = group_cells;
            g.label_anchor = anchor;
        }
    }
}

/// Top-most cell of the group; ties broken toward the leftmost column
/// (spec §4.8 "Pick the label anchor cell per group").
fn pick_label_anchor(cells: &[GroupCell]) -> Option<(i32, i32)> {
    cells
        .iter()
        .min_by_key(|c| (c.y, c.x))
        .map(|c| (c.x, c.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;
    use crate::router;
    use crate::scheduler;

    #[test]
    fn splice_doubles_node_positions() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        g.node_mut(a).unwrap().pos = Some((3, 4));
        g.cells.insert((3, 4), Cell::Node(a));
        splice(&mut g);
        assert_eq!(g.node(a).unwrap().pos, Some((6, 8)));
    }

    #[test]
    fn restitch_inserts_a_midpoint_cell_for_a_straight_run() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        g.node_mut(a).unwrap().pos = Some((0, 0));
        g.node_mut(b).unwrap().pos = Some((3, 0));
        let e = g.add_edge(a, b);
        router::route_edge(&mut g, e).unwrap();
        let before = g.edge(e).unwrap().cells.len();
        splice(&mut g);
        let after = g.edge(e).unwrap().cells.len();
        assert!(after >= before);
        assert!(g.edge(e).unwrap().cells_are_contiguous());
    }

    #[test]
    fn group_members_get_surrounded_by_group_cells() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        g.node_mut(a).unwrap().pos = Some((0, 0));
        g.node_mut(b).unwrap().pos = Some((2, 0));
        let gid = g.add_group("G").unwrap();
        g.add_node_to_group(a, gid);
        g.add_node_to_group(b, gid);
        splice(&mut g);
        assert!(!g.group(gid).unwrap().cells.is_empty());
        assert!(g.group(gid).unwrap().label_anchor.is_some());
    }

    #[test]
    fn end_to_end_layout_then_splice_keeps_edges_contiguous() {
        let mut g = Graph::new(GraphOptions::default());
        let a = g.add_node("A").unwrap();
        let b = g.add_node("B").unwrap();
        let c = g.add_node("C").unwrap();
        g.add_edge(a, b);
        g.add_edge(b, c);
        scheduler::run(&mut g, std::time::Duration::from_secs(5)).unwrap();
        for id in g.edge_ids() {
            assert!(g.edge(id).unwrap().cells_are_contiguous());
        }
    }
}
