//! manhattan-layout CLI entry point.
//!
//! Parses the native graph-description language (spec §6.2/§11), lays it
//! out, and renders it in the requested output format (spec §6.3).

use std::fs;
use std::io::{self, Read, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use manhattan_layout::config::{GraphOptions, LayoutOptions, RenderConfig};
use manhattan_layout::model::Graph;
use manhattan_layout::renderers::{self, OutputFormat};
use manhattan_layout::{layout, parser};

const DEFAULT_RANDOMIZE_ATTEMPTS: u32 = 8;

/// Manhattan-style orthogonal graph layout and routing engine.
#[derive(Parser, Debug)]
#[command(
    name = "manhattan-layout",
    about = "Lays out and renders a graph described in the native text format"
)]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<String>,

    /// Output format: ascii, dot (svg/vcg/gdl/graphml/txt/debug are accepted
    /// but report GraphError::Unsupported — see spec §9 Open Questions)
    #[arg(short = 'f', long = "format", default_value = "ascii")]
    format: String,

    /// Use plain ASCII instead of Unicode box-drawing characters
    #[arg(short = 'a', long = "ascii")]
    use_ascii: bool,

    /// Node padding (spaces inside border)
    #[arg(short = 'p', long = "padding", default_value_t = 1)]
    padding: usize,

    /// Per-layout wall-clock budget, in seconds
    #[arg(short = 't', long = "timeout", default_value_t = 5)]
    timeout: u64,

    /// Downgrade attribute errors to warnings instead of aborting (spec §6.4 `fatal_errors`)
    #[arg(long = "lenient")]
    lenient: bool,

    /// Emit diagnostic tracing spans/events for the layout pipeline to
    /// stderr (spec §6.4 `debug`)
    #[arg(long = "debug")]
    debug: bool,

    /// Treat every edge as undirected (spec §6.4 `undirected`)
    #[arg(long = "undirected")]
    undirected: bool,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Try several randomised layout attempts and keep the best-scoring
    /// one, seeded by this value, instead of a single deterministic pass
    /// (spec §9 "Score")
    #[arg(long = "randomize", value_name = "SEED")]
    randomize: Option<u64>,

    /// Number of attempts when --randomize is given
    #[arg(long = "attempts", default_value_t = DEFAULT_RANDOMIZE_ATTEMPTS)]
    attempts: u32,
}

fn parse_format(name: &str) -> Option<OutputFormat> {
    match name {
        "ascii" | "boxart" => Some(OutputFormat::Ascii),
        "dot" | "graphviz" => Some(OutputFormat::Dot),
        "svg" => Some(OutputFormat::Svg),
        "vcg" => Some(OutputFormat::Vcg),
        "gdl" => Some(OutputFormat::Gdl),
        "graphml" => Some(OutputFormat::GraphMl),
        "txt" => Some(OutputFormat::Txt),
        "debug" => Some(OutputFormat::Debug),
        _ => None,
    }
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `warn` (or `debug` when `--debug` is given) when the env var is unset.
fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let Some(format) = parse_format(&cli.format) else {
        eprintln!("error: unknown output format '{}'", cli.format);
        process::exit(1);
    };

    let text = if let Some(ref path) = cli.input {
        match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path, e);
                process::exit(1);
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("error: cannot read stdin: {}", e);
            process::exit(1);
        }
        buf
    };

    let graph_opts = GraphOptions {
        debug: cli.debug,
        timeout: Duration::from_secs(cli.timeout),
        fatal_errors: !cli.lenient,
        undirected: cli.undirected,
        ..GraphOptions::default()
    };

    let mut graph = Graph::new(graph_opts);
    if let Err(e) = parser::parse(&text, &mut graph) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let layout_opts = LayoutOptions::default();
    let effective_opts = graph.options.clone();
    let layout_result = match cli.randomize {
        Some(seed) => layout::layout_randomized(&mut graph, &effective_opts, &layout_opts, cli.attempts, seed),
        None => layout::layout(&mut graph, &effective_opts, &layout_opts),
    };
    if let Err(e) = layout_result {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let render_cfg = RenderConfig {
        unicode: !cli.use_ascii,
        padding: cli.padding,
        direction_override: None,
    };
    let rendered = match renderers::render(&graph, format, &render_cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    if let Some(ref path) = cli.output {
        match fs::write(path, rendered) {
            Ok(()) => {}
            Err(e) => {
                eprintln!("error: cannot write '{}': {}", path, e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", rendered);
        if let Err(e) = io::stdout().flush() {
            eprintln!("error: cannot flush stdout: {}", e);
            process::exit(1);
        }
    }
}
