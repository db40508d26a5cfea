//! Property-based tests over the small pure algebra (`flow`) and the
//! layout/routing invariants listed in spec §8, using the same
//! `#[quickcheck] fn prop_name(args) -> bool` pattern the adjacency-matrix
//! tests use, but with plain integer arguments mapped into this crate's
//! own types instead of a custom `Arbitrary` impl.

use quickcheck_macros::quickcheck;

use manhattan_layout::config::{GraphOptions, LayoutOptions};
use manhattan_layout::flow::{Direction, Flow, Side};
use manhattan_layout::layout;
use manhattan_layout::model::Graph;

fn side_from(n: u8) -> Side {
    match n % 4 {
        0 => Side::North,
        1 => Side::South,
        2 => Side::East,
        _ => Side::West,
    }
}

#[quickcheck]
fn prop_flow_normalize_always_lands_on_one_of_the_four_sides(deg: i32) -> bool {
    let flow = Flow::normalize(deg);
    matches!(flow.as_side(), Side::North | Side::South | Side::East | Side::West)
}

#[quickcheck]
fn prop_flow_normalize_is_idempotent(deg: i32) -> bool {
    let once = Flow::normalize(deg);
    let twice = Flow::normalize(once.0 as i32);
    once == twice
}

#[quickcheck]
fn prop_side_opposite_is_an_involution(n: u8) -> bool {
    let side = side_from(n);
    side.opposite().opposite() == side
}

#[quickcheck]
fn prop_side_delta_and_its_opposite_cancel_out(n: u8) -> bool {
    let side = side_from(n);
    let (dx, dy) = side.delta();
    let (ox, oy) = side.opposite().delta();
    dx + ox == 0 && dy + oy == 0
}

#[quickcheck]
fn prop_four_rights_are_a_full_turn(n: u8) -> bool {
    let mut flow = side_from(n).as_flow();
    for _ in 0..4 {
        flow = Direction::Right.resolve(flow);
    }
    flow == side_from(n).as_flow()
}

#[quickcheck]
fn prop_left_and_right_are_inverses(n: u8) -> bool {
    let start = side_from(n).as_flow();
    let turned = Direction::Right.resolve(start);
    Direction::Left.resolve(turned) == start
}

#[quickcheck]
fn prop_back_twice_is_forward(n: u8) -> bool {
    let start = side_from(n).as_flow();
    let there = Direction::Back.resolve(start);
    Direction::Back.resolve(there) == start
}

/// Builds a small graph from a flat list of `(from, to)` node indices,
/// both taken mod a small bound so quickcheck's shrinker stays useful and
/// layout stays fast. Node count is `bound`'s value, 1..=6.
fn build_graph(bound: u8, edges: &[(u8, u8)]) -> Graph {
    let bound = (bound % 6) + 1;
    let mut g = Graph::new(GraphOptions::default());
    let ids: Vec<_> = (0..bound).map(|i| g.add_node(&format!("n{i}")).unwrap()).collect();
    for &(a, b) in edges.iter().take(12) {
        let from = ids[(a % bound) as usize];
        let to = ids[(b % bound) as usize];
        g.add_edge(from, to);
    }
    g
}

#[quickcheck]
fn prop_laid_out_nodes_never_overlap_or_touch_at_a_corner(bound: u8, edges: Vec<(u8, u8)>) -> bool {
    let mut g = build_graph(bound, &edges);
    let opts = g.options.clone();
    if layout::layout(&mut g, &opts, &LayoutOptions::default()).is_err() {
        return true; // timeouts/unroutable cases are covered by scheduler's own tests
    }

    let rects: Vec<(i32, i32, i32, i32)> = g
        .node_ids()
        .map(|id| {
            let n = g.node(id).unwrap();
            let (x, y) = n.pos.unwrap();
            (x, y, n.cx, n.cy)
        })
        .collect();

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let (x1, y1, cx1, cy1) = rects[i];
            let (x2, y2, cx2, cy2) = rects[j];
            let overlap = x1 < x2 + cx2 && x2 < x1 + cx1 && y1 < y2 + cy2 && y2 < y1 + cy1;
            if overlap {
                return false;
            }
            let corner_touch = (x1 + cx1 == x2 || x2 + cx2 == x1) && (y1 + cy1 == y2 || y2 + cy2 == y1);
            if corner_touch {
                return false;
            }
        }
    }
    true
}

/// Layout already runs the optimizer, so consecutive cells are adjacent
/// up to the *previous* cell's own width/height (coalesced HOR/VER runs
/// span more than one grid column/row) rather than always a single step.
#[quickcheck]
fn prop_routed_edge_cells_form_a_contiguous_orthogonal_path(bound: u8, edges: Vec<(u8, u8)>) -> bool {
    let mut g = build_graph(bound, &edges);
    let opts = g.options.clone();
    if layout::layout(&mut g, &opts, &LayoutOptions::default()).is_err() {
        return true;
    }

    for id in g.edge_ids() {
        let edge = g.edge(id).unwrap();
        if !edge.is_routed() {
            continue;
        }
        for w in edge.cells.windows(2) {
            let (prev, next) = (&w[0], &w[1]);
            let adjacent_right = next.x == prev.x + prev.cx.max(1) && next.y == prev.y;
            let adjacent_down = next.y == prev.y + prev.cy.max(1) && next.x == prev.x;
            let adjacent_left = prev.x == next.x + next.cx.max(1) && next.y == prev.y;
            let adjacent_up = prev.y == next.y + next.cy.max(1) && next.x == prev.x;
            if !(adjacent_right || adjacent_down || adjacent_left || adjacent_up) {
                return false;
            }
        }
    }
    true
}

#[quickcheck]
fn prop_optimize_is_idempotent(bound: u8, edges: Vec<(u8, u8)>) -> bool {
    let mut g = build_graph(bound, &edges);
    let opts = g.options.clone();
    if layout::layout(&mut g, &opts, &LayoutOptions::default()).is_err() {
        return true;
    }
    let once: Vec<usize> = g.edge_ids().map(|id| g.edge(id).unwrap().cells.len()).collect();
    manhattan_layout::optimize::optimize(&mut g);
    let twice: Vec<usize> = g.edge_ids().map(|id| g.edge(id).unwrap().cells.len()).collect();
    once == twice
}
