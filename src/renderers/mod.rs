//! Output surface (spec §6.3, supplemented per §11).
//!
//! The layout engine itself is format-agnostic: it only ever produces a
//! populated cell map on a `Graph`. Turning that into text is a renderer's
//! job. `ascii`/`boxart` is the one format the engine fully supports; `dot`
//! is a minimal Graphviz emitter good enough to hand a laid-out graph to an
//! external tool. Every other format named in the original surface
//! (svg, vcg, gdl, graphml, txt, debug) is accepted as a selector but
//! reported as `GraphError::Unsupported` rather than silently approximated.

pub mod ascii;
pub mod canvas;
pub mod charset;
pub mod dot;

pub use ascii::AsciiRenderer;
pub use dot::DotRenderer;

use crate::config::RenderConfig;
use crate::error::GraphError;
use crate::model::Graph;

/// Selects which renderer `render` below dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ascii,
    Dot,
    Svg,
    Vcg,
    Gdl,
    GraphMl,
    Txt,
    Debug,
}

impl OutputFormat {
    fn name(self) -> &'static str {
        match self {
            OutputFormat::Ascii => "ascii",
            OutputFormat::Dot => "dot",
            OutputFormat::Svg => "svg",
            OutputFormat::Vcg => "vcg",
            OutputFormat::Gdl => "gdl",
            OutputFormat::GraphMl => "graphml",
            OutputFormat::Txt => "txt",
            OutputFormat::Debug => "debug",
        }
    }
}

/// Renders a laid-out graph in the requested format (spec §6.3's `as_ascii`,
/// `as_dot`, ... family, collapsed to one entry point with a format tag).
pub fn render(graph: &Graph, format: OutputFormat, cfg: &RenderConfig) -> Result<String, GraphError> {
    match format {
        OutputFormat::Ascii => Ok(AsciiRenderer::new(cfg).render(graph)),
        OutputFormat::Dot => Ok(DotRenderer::new().render(graph)),
        other => Err(GraphError::Unsupported(format!("{} output", other.name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;

    #[test]
    fn unsupported_formats_report_their_own_name() {
        let g = Graph::new(GraphOptions::default());
        let err = render(&g, OutputFormat::Svg, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, GraphError::Unsupported(msg) if msg.contains("svg")));
    }
}
