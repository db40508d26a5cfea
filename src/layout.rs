//! Layout orchestration: ties the action scheduler (C4), placement (C5),
//! router (C6), splice (C8) and optimizer (C9) together behind the
//! `layout(...)` entry point named in spec §6.4.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::Rng as _;

use crate::config::{GraphOptions, LayoutKind, LayoutOptions};
use crate::error::GraphError;
use crate::model::Graph;
use crate::optimize;
use crate::scheduler::{self, LayoutReport};

/// Runs a full layout pass over `graph` using `opts`, honouring
/// `graph_opts.timeout` unless `opts.timeout` overrides it.
pub fn layout(graph: &mut Graph, graph_opts: &GraphOptions, opts: &LayoutOptions) -> Result<LayoutReport, GraphError> {
    if opts.kind == LayoutKind::Force {
        return Err(GraphError::Unsupported("force layout".into()));
    }
    let timeout = opts.effective_timeout(graph_opts);
    let report = scheduler::run(graph, timeout)?;
    optimize::optimize(graph);
    Ok(report)
}

/// Runs `attempts` independent, seeded layout passes and keeps whichever
/// scores best (spec §9 "Score": "used only to rank repeated randomised
/// attempts against each other"). Each attempt starts over from `graph`'s
/// pre-layout state, so it only makes sense to call this before the
/// graph has been laid out once already.
///
/// This is an explicit opt-in: ordinary `layout()` is fully deterministic,
/// and callers who don't ask for randomisation never pay for it.
pub fn layout_randomized(
    graph: &mut Graph,
    graph_opts: &GraphOptions,
    opts: &LayoutOptions,
    attempts: u32,
    seed: u64,
) -> Result<LayoutReport, GraphError> {
    if opts.kind == LayoutKind::Force {
        return Err(GraphError::Unsupported("force layout".into()));
    }
    let timeout = opts.effective_timeout(graph_opts);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut best: Option<(Graph, LayoutReport)> = None;
    let mut last_err = None;
    for _ in 0..attempts.max(1) {
        let mut attempt = graph.clone();
        let sub_seed: u64 = rng.gen_range(0..=u64::MAX);
        match scheduler::run_seeded(&mut attempt, timeout, Some(sub_seed)) {
            Ok(report) => {
                optimize::optimize(&mut attempt);
                let is_better = match &best {
                    None => true,
                    Some((current, _)) => attempt.score.unwrap_or(i64::MIN) > current.score.unwrap_or(i64::MIN),
                };
                if is_better {
                    best = Some((attempt, report));
                }
            }
            Err(err) => last_err = Some(err),
        }
    }

    match best {
        Some((best_graph, report)) => {
            *graph = best_graph;
            Ok(report)
        }
        None => Err(last_err.unwrap_or(GraphError::Internal("layout_randomized: no attempt ran".into()))),
    }
}
