//! Minimal native-text front end (spec §11 "parsing front end").
//!
//! A small line-oriented grammar, just expressive enough to exercise every
//! part of the `Graph` surface the layout engine needs populated (spec
//! §6.2): node declarations, directed/undirected/bidirectional edges with
//! labels, class-wide and per-object attributes, and groups.
//!
//! ```text
//! flow: east
//! node { shape: rect }
//!
//! [Berlin]
//! [Munich] { color: red }
//!
//! Berlin -> Munich : ICE
//! Berlin -> Hamburg
//!
//! group Cities { Berlin Munich Hamburg }
//! ```
//!
//! Each attribute assignment reaches the graph through exactly one
//! `set_class_attribute`/`set_node_attribute`/`set_edge_attribute` call, so
//! the "one `set_attribute` call per (object, name) pair" part of §6.2
//! holds by construction.

use crate::attrs::{AttrValue, BaseClass, ClassName};
use crate::error::GraphError;
use crate::flow::Flow;
use crate::model::Graph;

/// Parses `source` into a freshly laid-out-but-unrouted `Graph`. Returns
/// the first fatal error encountered; non-fatal attribute problems are
/// accumulated as warnings on the graph when `graph.catch_errors(true)`.
pub fn parse(source: &str, graph: &mut Graph) -> Result<(), GraphError> {
    for (lineno, raw_line) in source.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        parse_line(graph, line).map_err(|e| match e {
            GraphError::Internal(msg) => GraphError::Internal(format!("line {}: {}", lineno + 1, msg)),
            other => other,
        })?;
    }
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_line(graph: &mut Graph, line: &str) -> Result<(), GraphError> {
    if let Some(rest) = line.strip_prefix("flow:") {
        graph.flow = parse_flow(rest.trim())?;
        return Ok(());
    }
    if let Some(rest) = strip_class_header(line, "graph") {
        apply_attrs(graph, ClassName::base(BaseClass::Graph), None, rest)?;
        return Ok(());
    }
    if let Some(rest) = strip_class_header(line, "node") {
        apply_attrs(graph, ClassName::base(BaseClass::Node), None, rest)?;
        return Ok(());
    }
    if let Some(rest) = strip_class_header(line, "edge") {
        apply_attrs(graph, ClassName::base(BaseClass::Edge), None, rest)?;
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix("group ") {
        return parse_group(graph, rest.trim());
    }
    if let Some(op) = find_edge_op(line) {
        return parse_edge(graph, line, op);
    }
    parse_node(graph, line).map(|_| ())
}

/// Matches a `<keyword> { ... }` or `<keyword>.<subclass> { ... }` header,
/// returning the brace body.
fn strip_class_header<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    let rest = rest.trim_start();
    let body = rest.strip_prefix('{')?.strip_suffix('}')?;
    Some(body)
}

fn parse_flow(word: &str) -> Result<Flow, GraphError> {
    match word.to_ascii_lowercase().as_str() {
        "north" | "up" => Ok(Flow::NORTH),
        "south" | "down" => Ok(Flow::SOUTH),
        "east" | "right" => Ok(Flow::EAST),
        "west" | "left" => Ok(Flow::WEST),
        other => Err(GraphError::InvalidAttributeValue {
            class: "graph".into(),
            name: "flow".into(),
            value: other.into(),
            kind: "compass direction".into(),
        }),
    }
}

/// `name { k: v, k2: v2 }`, `[name]`, `[name] { ... }`, or a bare `name`.
/// Returns the node id, creating it (and applying any attrs) if needed.
fn parse_node(graph: &mut Graph, line: &str) -> Result<crate::model::NodeId, GraphError> {
    let (head, body) = split_head_body(line);
    let name = head.trim().trim_start_matches('[').trim_end_matches(']').trim();
    let (name, label) = split_name_label(name);
    let id = graph.add_node(name)?;
    if let Some(label) = label {
        graph.node_mut(id).unwrap().label = label.to_string();
    }
    if let Some(body) = body {
        apply_attrs(graph, ClassName::base(BaseClass::Node), Some(ObjectRef::Node(id)), body)?;
    }
    Ok(id)
}

/// Splits `NAME "Label"` into `(NAME, Some("Label"))`.
fn split_name_label(s: &str) -> (&str, Option<&str>) {
    match s.find('"') {
        Some(start) => {
            let name = s[..start].trim();
            let rest = &s[start + 1..];
            let label = rest.strip_suffix('"').unwrap_or(rest);
            (name, Some(label))
        }
        None => (s, None),
    }
}

fn split_head_body(line: &str) -> (&str, Option<&str>) {
    match line.find('{') {
        Some(idx) => {
            let head = &line[..idx];
            let body = line[idx + 1..].trim_end().strip_suffix('}').unwrap_or(&line[idx + 1..]);
            (head, Some(body))
        }
        None => (line, None),
    }
}

enum EdgeOp {
    Forward,
    Backward,
    Bidirectional,
    Undirected,
}

/// Finds the first top-level edge operator token, left to right, so labels
/// or attribute bodies containing `-`/`>` don't get mistaken for one.
fn find_edge_op(line: &str) -> Option<(usize, usize, EdgeOp)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' if line[i..].starts_with("<->") => return Some((i, i + 3, EdgeOp::Bidirectional)),
            b'<' if line[i..].starts_with("<-") => return Some((i, i + 2, EdgeOp::Backward)),
            b'-' if line[i..].starts_with("->") => return Some((i, i + 2, EdgeOp::Forward)),
            b'-' if line[i..].starts_with("--") => return Some((i, i + 2, EdgeOp::Undirected)),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_edge(graph: &mut Graph, line: &str, (start, end, op): (usize, usize, EdgeOp)) -> Result<(), GraphError> {
    let left = line[..start].trim();
    let right_full = line[end..].trim();

    let (right, label) = match right_full.find(':') {
        Some(idx) => (right_full[..idx].trim(), Some(right_full[idx + 1..].trim())),
        None => (right_full, None),
    };
    let (right, body) = split_head_body(right);
    let right = right.trim();

    let from_name = left;
    let to_name = right;
    let from = graph.add_node(from_name)?;
    let to = graph.add_node(to_name)?;

    let (from, to, bidirectional, undirected) = match op {
        EdgeOp::Forward => (from, to, false, false),
        EdgeOp::Backward => (to, from, false, false),
        EdgeOp::Bidirectional => (from, to, true, false),
        EdgeOp::Undirected => (from, to, false, true),
    };
    let id = graph.add_edge(from, to);
    {
        let edge = graph.edge_mut(id).unwrap();
        edge.bidirectional = bidirectional;
        edge.undirected = undirected;
        if let Some(label) = label {
            edge.label = Some(label.trim().to_string());
        }
    }
    if let Some(body) = body {
        apply_attrs(graph, ClassName::base(BaseClass::Edge), Some(ObjectRef::Edge(id)), body)?;
    }
    if graph.root.is_none() {
        graph.root = Some(from);
    }
    Ok(())
}

fn parse_group(graph: &mut Graph, rest: &str) -> Result<(), GraphError> {
    let (head, body) = split_head_body(rest);
    let name = head.trim();
    let group = graph.add_group(name)?;
    if let Some(body) = body {
        for member in body.split_whitespace() {
            let node = graph.add_node(member)?;
            graph.add_node_to_group(node, group);
        }
    }
    Ok(())
}

enum ObjectRef {
    Node(crate::model::NodeId),
    Edge(crate::model::EdgeId),
}

/// Applies a comma- or semicolon-separated `key: value` body, each via a
/// single `set_*_attribute` call (spec §6.2). Colour-looking values are
/// routed through `AttrType::Color`; everything else is stored as text,
/// the router/placement/celltype modules being the only layers that
/// actually interpret attribute semantics (`flow`, ports, etc.) today.
fn apply_attrs(graph: &mut Graph, class: ClassName, object: Option<ObjectRef>, body: &str) -> Result<(), GraphError> {
    for pair in body.split([',', ';']) {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once(':').ok_or_else(|| GraphError::Internal(format!("malformed attribute '{}'", pair)))?;
        let key = key.trim();
        let value = value.trim();
        let parsed = crate::attrs::validate(&class, key, value, attr_type_for(key), &[]).unwrap_or(AttrValue::Text(value.to_string()));
        match &object {
            None => graph.set_class_attribute(class.clone(), key, parsed),
            Some(ObjectRef::Node(id)) => graph.set_node_attribute(*id, key, parsed),
            Some(ObjectRef::Edge(id)) => graph.set_edge_attribute(*id, key, parsed),
        }
    }
    Ok(())
}

fn attr_type_for(key: &str) -> crate::attrs::AttrType {
    match key {
        "color" | "background" | "fill" => crate::attrs::AttrType::Color,
        "minlen" => crate::attrs::AttrType::Uint,
        _ => crate::attrs::AttrType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;

    fn parsed(src: &str) -> Graph {
        let mut g = Graph::new(GraphOptions::default());
        parse(src, &mut g).unwrap();
        g
    }

    #[test]
    fn bare_node_lines_create_nodes_in_order() {
        let g = parsed("[Berlin]\n[Munich]\n");
        let names: Vec<_> = g.node_ids().map(|id| g.node(id).unwrap().name.clone()).collect();
        assert_eq!(names, vec!["Berlin", "Munich"]);
    }

    #[test]
    fn edge_line_creates_both_endpoints_and_a_labelled_edge() {
        let g = parsed("Berlin -> Munich : ICE\n");
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        let e = g.edge(g.edge_ids().next().unwrap()).unwrap();
        assert_eq!(e.label.as_deref(), Some("ICE"));
    }

    #[test]
    fn backward_edge_swaps_endpoints() {
        let g = parsed("A <- B\n");
        let e = g.edge(g.edge_ids().next().unwrap()).unwrap();
        let from = g.node(e.from).unwrap().name.clone();
        let to = g.node(e.to).unwrap().name.clone();
        assert_eq!((from.as_str(), to.as_str()), ("B", "A"));
    }

    #[test]
    fn undirected_edge_is_flagged() {
        let g = parsed("A -- B\n");
        let e = g.edge(g.edge_ids().next().unwrap()).unwrap();
        assert!(e.undirected);
    }

    #[test]
    fn node_attrs_are_applied_through_one_call_each() {
        let g = parsed("[Berlin] { color: red }\n");
        let id = g.node_id_by_name("Berlin").unwrap();
        let v = g.node_attribute(id, "color", &AttrValue::Text(String::new()));
        assert_eq!(v, AttrValue::Color("#ff0000".into()));
    }

    #[test]
    fn group_line_creates_members() {
        let g = parsed("group Cities { Berlin Munich }\n");
        let gid = g.group_ids().next().unwrap();
        assert_eq!(g.group(gid).unwrap().members.len(), 2);
    }

    #[test]
    fn flow_directive_sets_graph_flow() {
        let g = parsed("flow: south\n");
        assert_eq!(g.flow, Flow::SOUTH);
    }

    #[test]
    fn comment_and_blank_lines_are_ignored() {
        let g = parsed("# a comment\n\n[Berlin]\n# trailing\n");
        assert_eq!(g.node_count(), 1);
    }
}
