//! Edge and EdgeCell (spec §3, §4.6, §4.7).

use super::ids::{EdgeId, NodeId};
use crate::celltype::{CellBase, CellFlags};
use crate::flow::{Flow, Side};

/// An explicit port pin on an edge endpoint: a side, and optionally which
/// numbered slot on that side (spec §4.5 "shares a start-port or
/// end-port").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub side: Side,
    pub slot: Option<u32>,
}

/// One materialised grid cell of a routed edge (spec §3 `EdgeCell`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCell {
    pub x: i32,
    pub y: i32,
    pub cx: i32,
    pub cy: i32,
    pub base: CellBase,
    pub flags: CellFlags,
    /// Set on a CROSS cell: the other edge's id, so the renderer can draw
    /// both strokes (spec §3).
    pub cross_with: Option<EdgeId>,
}

impl EdgeCell {
    pub fn new(x: i32, y: i32, base: CellBase) -> Self {
        Self {
            x,
            y,
            cx: 1,
            cy: 1,
            base,
            flags: CellFlags::default(),
            cross_with: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeCache {
    pub flow: Option<Flow>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub bidirectional: bool,
    pub undirected: bool,
    pub label: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
    pub start_port: Option<PortSpec>,
    pub end_port: Option<PortSpec>,
    pub minlen: i32,
    pub flow_attr: Option<Flow>,
    pub cells: Vec<EdgeCell>,
    pub cache: EdgeCache,
}

impl Edge {
    pub fn new(id: EdgeId, from: NodeId, to: NodeId) -> Self {
        Self {
            id,
            from,
            to,
            bidirectional: false,
            undirected: false,
            label: None,
            style: None,
            color: None,
            start_port: None,
            end_port: None,
            minlen: 1,
            flow_attr: None,
            cells: Vec::new(),
            cache: EdgeCache::default(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    pub fn is_routed(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn unplace(&mut self) {
        self.cells.clear();
        self.cache = EdgeCache::default();
    }

    /// §8 invariant 3: successive cells differ by exactly (+/-1, 0) or
    /// (0, +/-1), except where a HOLE interposes a crossing.
    pub fn cells_are_contiguous(&self) -> bool {
        self.cells.windows(2).all(|w| {
            let (a, b) = (w[0], w[1]);
            if matches!(a.base, CellBase::Hole) || matches!(b.base, CellBase::Hole) {
                return true;
            }
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            (dx.abs() == 1 && dy == 0) || (dy.abs() == 1 && dx == 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celltype::CellBase;

    #[test]
    fn self_loop_detection() {
        let e = Edge::new(EdgeId(0), NodeId(1), NodeId(1));
        assert!(e.is_self_loop());
    }

    #[test]
    fn unplace_clears_cells_and_cache() {
        let mut e = Edge::new(EdgeId(0), NodeId(1), NodeId(2));
        e.cells.push(EdgeCell::new(0, 0, CellBase::Hor));
        e.cache.flow = Some(Flow::EAST);
        e.unplace();
        assert!(e.cells.is_empty());
        assert!(e.cache.flow.is_none());
    }

    #[test]
    fn contiguity_check_accepts_a_straight_run() {
        let mut e = Edge::new(EdgeId(0), NodeId(1), NodeId(2));
        e.cells.push(EdgeCell::new(0, 0, CellBase::Hor));
        e.cells.push(EdgeCell::new(1, 0, CellBase::Hor));
        e.cells.push(EdgeCell::new(2, 0, CellBase::Hor));
        assert!(e.cells_are_contiguous());
    }

    #[test]
    fn contiguity_check_rejects_a_jump() {
        let mut e = Edge::new(EdgeId(0), NodeId(1), NodeId(2));
        e.cells.push(EdgeCell::new(0, 0, CellBase::Hor));
        e.cells.push(EdgeCell::new(5, 0, CellBase::Hor));
        assert!(!e.cells_are_contiguous());
    }

    #[test]
    fn contiguity_check_tolerates_a_hole_at_a_crossing() {
        let mut e = Edge::new(EdgeId(0), NodeId(1), NodeId(2));
        e.cells.push(EdgeCell::new(0, 0, CellBase::Hor));
        e.cells.push(EdgeCell::new(5, 0, CellBase::Hole));
        e.cells.push(EdgeCell::new(6, 0, CellBase::Hor));
        assert!(e.cells_are_contiguous());
    }
}
