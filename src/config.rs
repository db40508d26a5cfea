//! Configuration for graph construction, layout and rendering.
//!
//! `GraphOptions` and `LayoutOptions` mirror the teacher's `RenderConfig`
//! pattern (a `Default` impl plus a `new()` that delegates to it) but cover
//! the constructor and `layout(...)` options of spec §6.4. `RenderConfig`
//! is kept for the renderers (§6.3), which are independent of layout.

use std::time::Duration;

/// Constructor-time options (spec §6.4 `new(...)`).
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Emit diagnostic `tracing` spans/events for the layout pipeline.
    pub debug: bool,
    /// Per-layout wall-clock budget.
    pub timeout: Duration,
    /// Enforce attribute validation.
    pub strict: bool,
    /// Attribute errors abort the call (true) vs. downgrade to a warning.
    pub fatal_errors: bool,
    /// Shortcut for `type=undirected` on every edge added afterwards.
    pub undirected: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            debug: false,
            timeout: Duration::from_secs(5),
            strict: true,
            fatal_errors: true,
            undirected: false,
        }
    }
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The two layout algorithms named in spec §6.4. `Force` is declared but
/// deliberately unimplemented (spec §9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutKind {
    #[default]
    Adhoc,
    Force,
}

/// `layout(...)` call options (spec §6.4).
#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    pub kind: LayoutKind,
    /// Overrides `GraphOptions::timeout` when set.
    pub timeout: Option<Duration>,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effective_timeout(&self, opts: &GraphOptions) -> Duration {
        self.timeout.unwrap_or(opts.timeout)
    }
}

/// Configuration for the rendering pipeline (spec §6.3): how a laid-out
/// graph is turned into text, independent of the layout options above.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Use Unicode box-drawing characters (true) or plain ASCII (false).
    pub unicode: bool,
    /// Padding inside node boxes (in characters).
    pub padding: usize,
    /// Override the diagram direction. `None` = use the graph's own flow.
    pub direction_override: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            unicode: true,
            padding: 1,
            direction_override: None,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
