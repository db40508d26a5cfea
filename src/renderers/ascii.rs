//! ASCII/Unicode box-drawing renderer (spec §6.3, supplemented per §11).
//!
//! The layout engine hands the renderer nothing but a populated cell map:
//! every node and edge cell already carries its final grid position, so
//! rendering is a pure coordinate transform (grid cell -> pixel rect) plus
//! painting, with no layout decisions of its own. Column and row pixel
//! sizes are computed independently per grid line from the labels that
//! land on it, the same shape as the teacher's per-node width/height calc
//! (`NODE_PADDING`, `NODE_HEIGHT` in its `layout/sugiyama.rs`) — just moved
//! here since this engine's grid itself carries no pixel geometry.

use crate::config::RenderConfig;
use crate::flow::Side;
use crate::model::{Edge, EdgeCell, Graph, Group, Node};

use super::canvas::{Canvas, Rect};
use super::charset::{Arms, BoxChars, CharSet};

const MIN_CELL_W: i64 = 4;
const MIN_CELL_H: i64 = 3;
const MARGIN_X: i64 = 1;
const MARGIN_Y: i64 = 2; // leaves room for an edge label above row 0.

/// Renders a laid-out graph to ASCII or Unicode box-drawing text.
pub struct AsciiRenderer {
    charset: CharSet,
    padding: usize,
}

impl AsciiRenderer {
    pub fn new(cfg: &RenderConfig) -> Self {
        Self {
            charset: if cfg.unicode { CharSet::Unicode } else { CharSet::Ascii },
            padding: cfg.padding,
        }
    }

    pub fn render(&self, graph: &Graph) -> String {
        let Some(bounds) = collect_bounds(graph) else {
            return String::new();
        };
        let grid = Grid::new(graph, bounds, self.padding);
        if grid.canvas_width <= 0 || grid.canvas_height <= 0 {
            return String::new();
        }

        let mut canvas = Canvas::new(grid.canvas_width as usize, grid.canvas_height as usize, self.charset);

        for gid in graph.group_ids() {
            if let Some(group) = graph.group(gid) {
                paint_group(&mut canvas, &grid, group, self.charset);
            }
        }
        for nid in graph.node_ids() {
            if let Some(node) = graph.node(nid) {
                if node.is_placed() && !node.anonymous {
                    paint_node(&mut canvas, &grid, node, self.charset);
                }
            }
        }
        for eid in graph.edge_ids() {
            if let Some(edge) = graph.edge(eid) {
                if edge.is_routed() {
                    paint_edge(&mut canvas, &grid, edge, self.charset);
                }
            }
        }

        canvas.render_to_string()
    }
}

/// Maps grid cell coordinates to a pixel rect, honouring each row/column's
/// own computed size rather than a single fixed cell size.
struct Grid {
    min_x: i32,
    min_y: i32,
    col_prefix: Vec<i64>,
    row_prefix: Vec<i64>,
    canvas_width: i64,
    canvas_height: i64,
}

impl Grid {
    fn new(graph: &Graph, (min_x, max_x, min_y, max_y): (i32, i32, i32, i32), padding: usize) -> Self {
        let cols = (max_x - min_x + 1) as usize;
        let rows = (max_y - min_y + 1) as usize;
        let mut col_w = vec![MIN_CELL_W; cols];
        let mut row_h = vec![MIN_CELL_H; rows];

        for nid in graph.node_ids() {
            let Some(node) = graph.node(nid) else { continue };
            let Some((x, y)) = node.pos else { continue };
            if node.cx == 1 {
                let idx = (x - min_x) as usize;
                let need = label_width(&node.label) + 2 + 2 * padding as i64;
                col_w[idx] = col_w[idx].max(need);
            }
            if node.cy == 1 {
                let idx = (y - min_y) as usize;
                let lines = node.label.split('\n').count().max(1) as i64;
                row_h[idx] = row_h[idx].max(lines + 2);
            }
        }

        let col_prefix = prefix_sums(&col_w);
        let row_prefix = prefix_sums(&row_h);
        let canvas_width = MARGIN_X + col_prefix[cols] + MARGIN_X;
        let canvas_height = MARGIN_Y + row_prefix[rows] + MARGIN_Y;

        Self {
            min_x,
            min_y,
            col_prefix,
            row_prefix,
            canvas_width,
            canvas_height,
        }
    }

    fn px(&self, gx: i32) -> i64 {
        MARGIN_X + self.col_prefix[(gx - self.min_x) as usize]
    }

    fn py(&self, gy: i32) -> i64 {
        MARGIN_Y + self.row_prefix[(gy - self.min_y) as usize]
    }

    fn span_w(&self, gx: i32, cx: i32) -> i64 {
        let lo = (gx - self.min_x) as usize;
        self.col_prefix[lo + cx.max(1) as usize] - self.col_prefix[lo]
    }

    fn span_h(&self, gy: i32, cy: i32) -> i64 {
        let lo = (gy - self.min_y) as usize;
        self.row_prefix[lo + cy.max(1) as usize] - self.row_prefix[lo]
    }

    fn rect(&self, gx: i32, gy: i32, cx: i32, cy: i32) -> Rect {
        Rect::new(self.px(gx), self.py(gy), self.span_w(gx, cx), self.span_h(gy, cy))
    }

    fn center(&self, gx: i32, gy: i32, cx: i32, cy: i32) -> (i64, i64) {
        (self.px(gx) + self.span_w(gx, cx) / 2, self.py(gy) + self.span_h(gy, cy) / 2)
    }
}

fn prefix_sums(widths: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(widths.len() + 1);
    out.push(0);
    for &w in widths {
        out.push(out.last().unwrap() + w);
    }
    out
}

fn label_width(label: &str) -> i64 {
    label.split('\n').map(|l| l.chars().count() as i64).max().unwrap_or(0)
}

fn collect_bounds(graph: &Graph) -> Option<(i32, i32, i32, i32)> {
    let mut min_x = i32::MAX;
    let mut max_x = i32::MIN;
    let mut min_y = i32::MAX;
    let mut max_y = i32::MIN;
    let mut touch = |x0: i32, y0: i32, x1: i32, y1: i32| {
        min_x = min_x.min(x0);
        max_x = max_x.max(x1);
        min_y = min_y.min(y0);
        max_y = max_y.max(y1);
    };

    for nid in graph.node_ids() {
        if let Some(n) = graph.node(nid) {
            if let Some((x, y)) = n.pos {
                touch(x, y, x + n.cx.max(1) - 1, y + n.cy.max(1) - 1);
            }
        }
    }
    for eid in graph.edge_ids() {
        if let Some(e) = graph.edge(eid) {
            for c in &e.cells {
                touch(c.x, c.y, c.x + c.cx.max(1) - 1, c.y + c.cy.max(1) - 1);
            }
        }
    }
    for gid in graph.group_ids() {
        if let Some(g) = graph.group(gid) {
            for gc in &g.cells {
                touch(gc.x, gc.y, gc.x, gc.y);
            }
        }
    }

    if min_x == i32::MAX {
        None
    } else {
        Some((min_x, max_x, min_y, max_y))
    }
}

fn paint_node(canvas: &mut Canvas, grid: &Grid, node: &Node, cs: CharSet) {
    let (x, y) = node.pos.unwrap();
    let rect = grid.rect(x, y, node.cx, node.cy);
    let bc = BoxChars::for_charset(cs);
    canvas.draw_box(rect, &bc);

    let inner_w = (rect.width - 2).max(0) as usize;
    let inner_h = (rect.height - 2).max(0) as i64;
    for (i, line) in node.label.split('\n').enumerate() {
        if i as i64 >= inner_h {
            break;
        }
        let row = rect.y + 1 + i as i64;
        let pad = inner_w.saturating_sub(line.chars().count()) / 2;
        let col = rect.x + 1 + pad as i64;
        if row >= 0 && col >= 0 {
            canvas.write_str(col as usize, row as usize, line);
        }
    }
}

fn paint_group(canvas: &mut Canvas, grid: &Grid, group: &Group, cs: CharSet) {
    if group.cells.is_empty() {
        return;
    }
    let mut min_x = i32::MAX;
    let mut max_x = i32::MIN;
    let mut min_y = i32::MAX;
    let mut max_y = i32::MIN;
    for gc in &group.cells {
        min_x = min_x.min(gc.x);
        max_x = max_x.max(gc.x);
        min_y = min_y.min(gc.y);
        max_y = max_y.max(gc.y);
    }
    if min_x == i32::MAX {
        return;
    }

    let rect = grid.rect(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
    let bc = BoxChars::for_charset(cs);
    canvas.draw_box(rect, &bc);

    let (ax, ay) = group.label_anchor.unwrap_or((min_x, min_y));
    let (lx, ly) = grid.center(ax, ay, 1, 1);
    let label = format!(" {} ", group.name);
    if ly >= 0 && lx >= 0 {
        canvas.write_str(lx.max(rect.x + 1) as usize, (rect.y).max(0) as usize, &label);
    }
}

/// The one character to draw along a straight run, given the edge's
/// `style` attribute (thin by default, thick/dotted if set).
fn line_chars(style: Option<&str>, cs: CharSet) -> (char, char) {
    match style {
        Some("thick") => ('═', '║'),
        Some("dotted") | Some("dashed") => ('╌', '╎'),
        _ => {
            let bc = BoxChars::for_charset(cs);
            (bc.horizontal, bc.vertical)
        }
    }
}

fn arrow_char(side: Side, bc: &BoxChars) -> char {
    match side {
        Side::North => bc.arrow_up,
        Side::South => bc.arrow_down,
        Side::East => bc.arrow_right,
        Side::West => bc.arrow_left,
    }
}

fn paint_edge(canvas: &mut Canvas, grid: &Grid, edge: &Edge, cs: CharSet) {
    let waypoints: Vec<(i64, i64)> = edge
        .cells
        .iter()
        .map(|c: &EdgeCell| grid.center(c.x, c.y, c.cx, c.cy))
        .collect();
    if waypoints.len() < 2 {
        return;
    }

    let (h_ch, v_ch) = line_chars(edge.style.as_deref(), cs);

    for w in waypoints.windows(2) {
        let (p0, p1) = (w[0], w[1]);
        if p0.1 == p1.1 {
            let (lo, hi) = (p0.0.min(p1.0), p0.0.max(p1.0));
            for col in (lo + 1)..hi {
                if col >= 0 && p0.1 >= 0 {
                    canvas.set_merge(col as usize, p0.1 as usize, h_ch);
                }
            }
        } else if p0.0 == p1.0 {
            let (lo, hi) = (p0.1.min(p1.1), p0.1.max(p1.1));
            for row in (lo + 1)..hi {
                if p0.0 >= 0 && row >= 0 {
                    canvas.set_merge(p0.0 as usize, row as usize, v_ch);
                }
            }
        }
    }

    for (i, &(px, py)) in waypoints.iter().enumerate() {
        let mut arms = Arms::default();
        if i > 0 {
            bump_arm(&mut arms, waypoints[i - 1], (px, py));
        }
        if i + 1 < waypoints.len() {
            bump_arm(&mut arms, waypoints[i + 1], (px, py));
        }
        if px >= 0 && py >= 0 {
            let (col, row) = (px as usize, py as usize);
            if col < canvas.width && row < canvas.height {
                let existing = canvas.get(col, row);
                let merged = Arms::from_char(existing).map(|e| e.merge(arms)).unwrap_or(arms);
                canvas.set(col, row, merged.to_char(cs));
            }
        }
    }

    let bc = BoxChars::for_charset(cs);
    if let Some(first) = edge.cells.first() {
        if let Some(side) = first.flags.arrow_start {
            let (x, y) = waypoints[0];
            if x >= 0 && y >= 0 {
                canvas.set(x as usize, y as usize, arrow_char(side, &bc));
            }
        }
        if first.flags.label_cell {
            if let Some(label) = &edge.label {
                let (x, y) = waypoints[0];
                let row = (y - 1).max(0);
                if x >= 0 {
                    canvas.write_str(x as usize, row as usize, label);
                }
            }
        }
    }
    if let Some(last) = edge.cells.last() {
        if let Some(side) = last.flags.arrow_end {
            let (x, y) = *waypoints.last().unwrap();
            if x >= 0 && y >= 0 {
                canvas.set(x as usize, y as usize, arrow_char(side, &bc));
            }
        }
    }
}

/// From `p` looking toward `toward`, which single arm of `p` points there.
fn bump_arm(arms: &mut Arms, toward: (i64, i64), p: (i64, i64)) {
    if toward.0 > p.0 {
        arms.right = true;
    } else if toward.0 < p.0 {
        arms.left = true;
    } else if toward.1 > p.1 {
        arms.down = true;
    } else if toward.1 < p.1 {
        arms.up = true;
    }
}
