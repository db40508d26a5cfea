//! The top-level Graph container (component C1, spec §4.1).
//!
//! Owns every Node, Edge, Group and cell by id; every cross-reference
//! between them is a relation looked up by id, never an ownership edge
//! (spec §9 "Bidirectional weak references").

use indexmap::IndexMap;
use std::collections::HashMap;

use super::cell::Cell;
use super::edge::Edge;
use super::group::Group;
use super::ids::{EdgeId, GroupId, IdGen, NodeId};
use super::node::Node;
use crate::attrs::{AttrValue, AttributeTable, BaseClass, ClassName};
use crate::config::GraphOptions;
use crate::error::{GraphError, GraphWarning, Severity};
use crate::flow::Flow;

#[derive(Clone)]
pub struct Graph {
    pub options: GraphOptions,
    ids: IdGen,

    nodes: IndexMap<NodeId, Node>,
    node_by_name: IndexMap<String, NodeId>,
    edges: IndexMap<EdgeId, Edge>,
    groups: IndexMap<GroupId, Group>,
    group_by_name: IndexMap<String, GroupId>,

    pub cells: HashMap<(i32, i32), Cell>,

    pub attrs: AttributeTable,
    pub root: Option<NodeId>,
    pub flow: Flow,

    /// Arbitrary layout-goodness score; `None` whenever the layout is
    /// stale (spec §4.1 "Side effects", §8 property 9).
    pub score: Option<i64>,

    catch_mode: bool,
    pub warnings: Vec<GraphWarning>,
    pub errors: Vec<GraphError>,
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        let flow = if options.undirected { Flow::EAST } else { Flow::DEFAULT };
        Self {
            options,
            ids: IdGen::new(),
            nodes: IndexMap::new(),
            node_by_name: IndexMap::new(),
            edges: IndexMap::new(),
            groups: IndexMap::new(),
            group_by_name: IndexMap::new(),
            cells: HashMap::new(),
            attrs: AttributeTable::new(),
            root: None,
            flow,
            score: None,
            catch_mode: false,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn catch_errors(&mut self, on: bool) {
        self.catch_mode = on;
    }

    fn report(&mut self, err: GraphError) -> Result<(), GraphError> {
        let severity = match err.default_severity() {
            Severity::Fatal if !self.options.fatal_errors => Severity::Warning,
            s => s,
        };
        match severity {
            Severity::Fatal => {
                if self.catch_mode {
                    self.errors.push(err);
                    Ok(())
                } else {
                    Err(err)
                }
            }
            Severity::Warning => {
                self.warnings.push(GraphWarning { error: err });
                Ok(())
            }
        }
    }

    fn invalidate_score(&mut self) {
        self.score = None;
    }

    // ── Nodes ──────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn node_id_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_by_name.get(name).copied()
    }

    /// Nodes in insertion order, for deterministic iteration (spec §5).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// `add_node(name)`: creates or returns the node.
    pub fn add_node(&mut self, name: &str) -> Result<NodeId, GraphError> {
        if let Some(&id) = self.node_by_name.get(name) {
            return Ok(id);
        }
        if self.group_by_name.contains_key(name) {
            self.report(GraphError::DuplicateIdentity {
                name: name.to_string(),
                existing_kind: "group".into(),
                wanted_kind: "node".into(),
            })?;
        }
        let id = self.ids.next_node();
        self.node_by_name.insert(name.to_string(), id);
        self.nodes.insert(id, Node::new(id, name));
        self.invalidate_score();
        Ok(id)
    }

    pub fn add_anonymous_node(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let name = format!("__anon_{}", id.0);
        let node = Node::anonymous(id, &name);
        self.node_by_name.insert(name, id);
        self.nodes.insert(id, node);
        self.invalidate_score();
        id
    }

    /// `del_node(n)`: removes the node, all incident edges and its group
    /// membership in O(deg(n)).
    pub fn del_node(&mut self, id: NodeId) {
        let incident: Vec<EdgeId> = self.nodes.get(&id).map(|n| n.incident.iter().copied().collect()).unwrap_or_default();
        for e in incident {
            self.del_edge(e);
        }
        if let Some(node) = self.nodes.shift_remove(&id) {
            self.node_by_name.shift_remove(&node.name);
            if let Some(gid) = node.group {
                if let Some(g) = self.groups.get_mut(&gid) {
                    g.members.shift_remove(&id);
                }
            }
            for (x, y) in node.cells() {
                self.cells.remove(&(x, y));
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.invalidate_score();
    }

    // ── Edges ──────────────────────────────────────────────────────────

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `add_edge(from, to)`: always creates a new edge, allowing
    /// multigraphs (spec §4.1, §11 "Multigraph support").
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        let id = self.ids.next_edge();
        let mut edge = Edge::new(id, from, to);
        edge.undirected = self.options.undirected;
        self.edges.insert(id, edge);
        if let Some(n) = self.nodes.get_mut(&from) {
            n.incident.insert(id);
        }
        if let Some(n) = self.nodes.get_mut(&to) {
            n.incident.insert(id);
        }
        self.invalidate_score();
        id
    }

    /// `add_edge_once`: returns the pre-existing edge between the same
    /// ordered pair if one exists, else behaves like `add_edge`.
    pub fn add_edge_once(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        if let Some(existing) = self.edges.values().find(|e| e.from == from && e.to == to) {
            return existing.id;
        }
        self.add_edge(from, to)
    }

    pub fn del_edge(&mut self, id: EdgeId) {
        if let Some(edge) = self.edges.shift_remove(&id) {
            if let Some(n) = self.nodes.get_mut(&edge.from) {
                n.incident.remove(&id);
            }
            if let Some(n) = self.nodes.get_mut(&edge.to) {
                n.incident.remove(&id);
            }
            for cell in &edge.cells {
                self.cells.remove(&(cell.x, cell.y));
            }
        }
        self.invalidate_score();
    }

    /// `merge_nodes(a, b)`: drops edges between a and b, rebinds every
    /// remaining incidence of b to a, deletes b. `joiner`, when given,
    /// concatenates the two labels into `a`'s.
    pub fn merge_nodes(&mut self, a: NodeId, b: NodeId, joiner: Option<&str>) {
        if a == b {
            return;
        }
        let b_incident: Vec<EdgeId> = self.nodes.get(&b).map(|n| n.incident.iter().copied().collect()).unwrap_or_default();
        for eid in b_incident {
            let (from, to) = match self.edges.get(&eid) {
                Some(e) => (e.from, e.to),
                None => continue,
            };
            if (from == a && to == b) || (from == b && to == a) {
                self.del_edge(eid);
                continue;
            }
            if let Some(e) = self.edges.get_mut(&eid) {
                if e.from == b {
                    e.from = a;
                }
                if e.to == b {
                    e.to = a;
                }
            }
            if let Some(n) = self.nodes.get_mut(&a) {
                n.incident.insert(eid);
            }
        }
        if let Some(joiner) = joiner {
            let b_label = self.nodes.get(&b).map(|n| n.label.clone()).unwrap_or_default();
            if let Some(an) = self.nodes.get_mut(&a) {
                if !b_label.is_empty() {
                    an.label = format!("{}{}{}", an.label, joiner, b_label);
                }
            }
        }
        self.del_node(b);
        self.invalidate_score();
    }

    // ── Groups ─────────────────────────────────────────────────────────

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.keys().copied()
    }

    pub fn add_group(&mut self, name: &str) -> Result<GroupId, GraphError> {
        if let Some(&id) = self.group_by_name.get(name) {
            return Ok(id);
        }
        if self.node_by_name.contains_key(name) {
            self.report(GraphError::DuplicateIdentity {
                name: name.to_string(),
                existing_kind: "node".into(),
                wanted_kind: "group".into(),
            })?;
        }
        let id = self.ids.next_group();
        self.group_by_name.insert(name.to_string(), id);
        self.groups.insert(id, Group::new(id, name));
        Ok(id)
    }

    pub fn add_node_to_group(&mut self, node: NodeId, group: GroupId) {
        if let Some(g) = self.groups.get_mut(&group) {
            g.members.insert(node);
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.group = Some(group);
        }
        self.invalidate_score();
    }

    /// Joins two groups directly with an edge, via a virtual invisible
    /// helper node per group (spec.md's open question on group-to-group
    /// edges, resolved in DESIGN.md): each group gets at most one helper,
    /// created and added as a member on first use and reused by any later
    /// edge that touches the same group, so the group's boundary still
    /// surrounds it during splice like any other member.
    pub fn add_group_edge(&mut self, from_group: GroupId, to_group: GroupId) -> Result<EdgeId, GraphError> {
        let from = self.group_edge_helper(from_group)?;
        let to = self.group_edge_helper(to_group)?;
        Ok(self.add_edge(from, to))
    }

    fn group_edge_helper(&mut self, group: GroupId) -> Result<NodeId, GraphError> {
        if let Some(helper) = self.groups.get(&group).and_then(|g| g.edge_helper) {
            return Ok(helper);
        }
        if self.group(group).is_none() {
            return Err(GraphError::Internal(format!("add_group_edge: unknown group {}", group.0)));
        }
        let helper = self.add_anonymous_node();
        self.add_node_to_group(helper, group);
        if let Some(g) = self.groups.get_mut(&group) {
            g.edge_helper = Some(helper);
        }
        Ok(helper)
    }

    // ── Attributes ─────────────────────────────────────────────────────

    /// `set_attribute(class_or_object, name, value)`. Setting any
    /// layout-affecting attribute invalidates the cached score.
    pub fn set_class_attribute(&mut self, class: ClassName, name: &str, value: AttrValue) {
        self.attrs.set_class(class, name, value);
        self.invalidate_score();
    }

    pub fn set_node_attribute(&mut self, node: NodeId, name: &str, value: AttrValue) {
        self.attrs.set_object(object_key(ObjectKind::Node, node.0), name, value);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.invalidate_cache();
        }
        self.invalidate_score();
    }

    pub fn set_edge_attribute(&mut self, edge: EdgeId, name: &str, value: AttrValue) {
        self.attrs.set_object(object_key(ObjectKind::Edge, edge.0), name, value);
        if let Some(e) = self.edges.get_mut(&edge) {
            e.cache = Default::default();
        }
        self.invalidate_score();
    }

    pub fn node_attribute(&self, node: NodeId, name: &str, default: &AttrValue) -> AttrValue {
        self.attrs.attribute(Some(object_key(ObjectKind::Node, node.0)), &ClassName::base(BaseClass::Node), name, default)
    }

    pub fn edge_attribute(&self, edge: EdgeId, name: &str, default: &AttrValue) -> AttrValue {
        self.attrs.attribute(Some(object_key(ObjectKind::Edge, edge.0)), &ClassName::base(BaseClass::Edge), name, default)
    }
}

#[derive(Clone, Copy)]
enum ObjectKind {
    Node,
    Edge,
}

/// Combines an object kind and its per-graph id into the opaque u64 key
/// `AttributeTable` uses for per-object overrides.
fn object_key(kind: ObjectKind, raw: u32) -> u64 {
    let tag: u64 = match kind {
        ObjectKind::Node => 0,
        ObjectKind::Edge => 1,
    };
    (tag << 32) | raw as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g() -> Graph {
        Graph::new(GraphOptions::default())
    }

    #[test]
    fn add_node_is_idempotent_by_name() {
        let mut graph = g();
        let a1 = graph.add_node("A").unwrap();
        let a2 = graph.add_node("A").unwrap();
        assert_eq!(a1, a2);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_edge_allows_multigraph() {
        let mut graph = g();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        let e1 = graph.add_edge(a, b);
        let e2 = graph.add_edge(a, b);
        assert_ne!(e1, e2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn add_edge_once_reuses_existing_edge() {
        let mut graph = g();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        let e1 = graph.add_edge_once(a, b);
        let e2 = graph.add_edge_once(a, b);
        assert_eq!(e1, e2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn del_node_removes_incident_edges() {
        let mut graph = g();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        graph.add_edge(a, b);
        graph.del_node(a);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_del_edge_round_trips() {
        // §8 property 8.
        let mut graph = g();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        let before = graph.node_count();
        let e = graph.add_edge(a, b);
        graph.del_edge(e);
        assert_eq!(graph.node_count(), before);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn merge_nodes_drops_direct_edge_and_rebinds_others() {
        let mut graph = g();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        let c = graph.add_node("C").unwrap();
        graph.add_edge(a, b);
        let bc = graph.add_edge(b, c);
        graph.merge_nodes(a, b, Some(", "));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let merged = graph.edge(bc).or_else(|| graph.edges.values().next());
        let e = merged.unwrap();
        assert!(e.from == a || e.to == a);
    }

    #[test]
    fn setting_attribute_invalidates_score() {
        let mut graph = g();
        graph.score = Some(42);
        let a = graph.add_node("A").unwrap();
        graph.set_node_attribute(a, "color", AttrValue::Color("#ff0000".into()));
        assert!(graph.score.is_none());
    }

    #[test]
    fn duplicate_identity_between_node_and_group_is_fatal() {
        let mut graph = g();
        graph.add_node("A").unwrap();
        let err = graph.add_group("A").unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentity { .. }));
    }

    #[test]
    fn catch_mode_accumulates_instead_of_returning_err() {
        let mut graph = g();
        graph.catch_errors(true);
        graph.add_node("A").unwrap();
        graph.add_group("A").unwrap();
        assert_eq!(graph.errors.len(), 1);
    }

    #[test]
    fn group_edge_joins_via_one_helper_node_per_group() {
        let mut graph = g();
        let ga = graph.add_group("GA").unwrap();
        let gb = graph.add_group("GB").unwrap();
        let e = graph.add_group_edge(ga, gb).unwrap();

        let edge = graph.edge(e).unwrap();
        assert!(graph.node(edge.from).unwrap().anonymous);
        assert!(graph.node(edge.to).unwrap().anonymous);
        assert!(graph.group(ga).unwrap().members.contains(&edge.from));
        assert!(graph.group(gb).unwrap().members.contains(&edge.to));
    }

    #[test]
    fn a_group_reuses_its_helper_node_across_edges() {
        let mut graph = g();
        let ga = graph.add_group("GA").unwrap();
        let gb = graph.add_group("GB").unwrap();
        let gc = graph.add_group("GC").unwrap();
        let e1 = graph.add_group_edge(ga, gb).unwrap();
        let e2 = graph.add_group_edge(ga, gc).unwrap();
        assert_eq!(graph.edge(e1).unwrap().from, graph.edge(e2).unwrap().from);
        assert_eq!(graph.group(ga).unwrap().members.len(), 1);
    }
}
