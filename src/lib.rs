//! manhattan-layout — Manhattan-style orthogonal graph layout and routing engine.
//!
//! Public API: `render_source()` parses, lays out and renders a graph in one
//! call; the individual stages (`parser`, `layout`, `renderers`) are public
//! so a caller can build a `Graph` directly instead of going through the
//! native text front end.

pub mod attrs;
pub mod celltype;
pub mod chains;
pub mod config;
pub mod error;
pub mod flow;
pub mod layout;
pub mod model;
pub mod optimize;
pub mod parser;
pub mod placement;
pub mod renderers;
pub mod router;
pub mod scheduler;
pub mod splice;

pub use config::{GraphOptions, LayoutOptions, RenderConfig};
pub use error::{GraphError, GraphResult};
pub use model::Graph;
pub use renderers::OutputFormat;

/// Parses `source` with the native text front end, lays it out, and renders
/// it in the requested format — the one-call convenience entry point spec
/// §6.4's constructor/`layout(...)` pair is built around.
pub fn render_source(
    source: &str,
    graph_opts: GraphOptions,
    layout_opts: &LayoutOptions,
    format: OutputFormat,
    render_cfg: &RenderConfig,
) -> GraphResult<String> {
    let mut graph = Graph::new(graph_opts);
    parser::parse(source, &mut graph)?;
    let go = graph.options.clone();
    layout::layout(&mut graph, &go, layout_opts)?;
    renderers::render(&graph, format, render_cfg)
}
