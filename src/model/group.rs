//! Group (spec §3, §4.8).

use indexmap::IndexSet;

use super::ids::{GroupId, NodeId};

/// Which of a GroupCell's sides sit on the group's outer boundary
/// (spec §4.8: `gt`, `gb`, `gl`, `gr`, `ga`, `gi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupBoundary {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl GroupBoundary {
    /// `gi`: wholly interior, touches no boundary.
    pub fn is_interior(self) -> bool {
        !(self.top || self.bottom || self.left || self.right)
    }

    /// `ga`: touches all four sides (a 1-cell-wide sliver group).
    pub fn is_all(self) -> bool {
        self.top && self.bottom && self.left && self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCell {
    pub x: i32,
    pub y: i32,
    pub boundary: GroupBoundary,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub anonymous: bool,
    pub parent: Option<GroupId>,
    pub members: IndexSet<NodeId>,
    pub cells: Vec<GroupCell>,
    pub label_anchor: Option<(i32, i32)>,
    /// The anonymous node standing in for this group when an edge joins
    /// it directly rather than one of its members (spec's "virtual
    /// invisible helper node" for group-to-group edges). Lazily created
    /// and reused by `Graph::add_group_edge` so a group with several
    /// outside edges only grows one helper, not one per edge.
    pub edge_helper: Option<NodeId>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            anonymous: false,
            parent: None,
            members: IndexSet::new(),
            cells: Vec::new(),
            label_anchor: None,
            edge_helper: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_boundary_touches_nothing() {
        assert!(GroupBoundary::default().is_interior());
        let b = GroupBoundary { top: true, ..Default::default() };
        assert!(!b.is_interior());
    }

    #[test]
    fn all_boundary_requires_every_side() {
        let b = GroupBoundary { top: true, bottom: true, left: true, right: true };
        assert!(b.is_all());
    }
}
