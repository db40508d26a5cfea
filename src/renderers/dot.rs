//! Minimal Graphviz DOT emitter (spec §11 supplement).
//!
//! Doesn't attempt DOT's full attribute grammar (`graphitude`'s `dot::attr`
//! models that exhaustively); just enough `label`/`shape`/layout-position
//! attributes for a laid-out graph to be handed to `dot`/`neato` as a
//! sanity check or a nicer-looking alternative to the box-drawing output.

use std::fmt::Write as _;

use crate::model::Graph;

pub struct DotRenderer;

impl DotRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, graph: &Graph) -> String {
        let mut out = String::new();
        let directed = !graph.options.undirected;
        let _ = writeln!(out, "{} {{", if directed { "digraph G" } else { "graph G" });

        for nid in graph.node_ids() {
            let Some(node) = graph.node(nid) else { continue };
            if node.anonymous {
                continue;
            }
            let _ = write!(out, "  \"{}\" [label=\"{}\"", escape(&node.name), escape(&node.label));
            if let Some((x, y)) = node.pos {
                let _ = write!(out, ", pos=\"{},{}!\"", x, -y);
            }
            let _ = writeln!(out, "];");
        }

        let arrow = if directed { "->" } else { "--" };
        for eid in graph.edge_ids() {
            let Some(edge) = graph.edge(eid) else { continue };
            let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            let _ = write!(out, "  \"{}\" {} \"{}\"", escape(&from.name), arrow, escape(&to.name));
            let mut attrs = Vec::new();
            if let Some(label) = &edge.label {
                attrs.push(format!("label=\"{}\"", escape(label)));
            }
            if edge.bidirectional {
                attrs.push("dir=both".to_string());
            }
            if !attrs.is_empty() {
                let _ = write!(out, " [{}]", attrs.join(", "));
            }
            let _ = writeln!(out, ";");
        }

        out.push_str("}\n");
        out
    }
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
