//! Per-graph id generation.
//!
//! Spec §9 calls out the "global monotonic id counter backing every
//! object" as needing re-architecture: each `Graph` owns its own
//! generator, so ids from two graphs laid out on different threads never
//! collide by construction and a `Graph` can be dropped and recreated
//! without perturbing a sibling's ids.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

/// Monotonic counter owned by a single `Graph`.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_node: u32,
    next_edge: u32,
    next_group: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn next_edge(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }

    pub fn next_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_independent_per_kind() {
        let mut gen = IdGen::new();
        assert_eq!(gen.next_node(), NodeId(0));
        assert_eq!(gen.next_node(), NodeId(1));
        assert_eq!(gen.next_edge(), EdgeId(0));
        assert_eq!(gen.next_node(), NodeId(2));
    }

    #[test]
    fn two_generators_do_not_share_state() {
        let mut a = IdGen::new();
        let mut b = IdGen::new();
        a.next_node();
        a.next_node();
        assert_eq!(b.next_node(), NodeId(0));
    }
}
