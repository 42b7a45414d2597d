//! Cache hierarchy prefetch simulator CLI.
//!
//! This binary replays memory access traces through a simulated cache hierarchy. It performs:
//! 1. **Trace run:** Builds the hierarchy from a JSON configuration (or the defaults),
//!    replays the trace, drains outstanding work, and prints statistics.
//! 2. **Config dump:** Prints the default configuration as JSON, as a starting point
//!    for custom configurations.

use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pfsim_core::common::SimError;
use pfsim_core::config::Config;
use pfsim_core::sim::MemoryHierarchy;
use pfsim_core::sim::trace::load_trace;

/// Upper bound on cycles spent waiting for one request or for the final drain.
const MAX_STALL_CYCLES: u64 = 1_000_000;

#[derive(Parser, Debug)]
#[command(
    name = "pfsim",
    author,
    version,
    about = "Cycle-level cache hierarchy and hardware prefetch simulator",
    long_about = "Replay a memory access trace through L1/L2/L3 caches with configurable prefetchers.\n\nTrace lines are `R <addr> [core]` or `W <addr> [core]`; addresses are decimal or 0x hex.\n\nExamples:\n  pfsim run --trace traces/stream.trace\n  pfsim run --trace traces/stream.trace --config traces/l3_adaptive.json --stats prefetch\n  pfsim config > default.json"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print statistics.
    Run {
        /// Access trace to replay.
        #[arg(short, long)]
        trace: String,

        /// JSON configuration; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Statistics sections to print (summary, cache, prefetch); all when omitted.
        #[arg(short, long, value_parser = ["summary", "cache", "prefetch"])]
        stats: Vec<String>,
    },

    /// Print the default configuration as JSON.
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            trace,
            config,
            stats,
        } => cmd_run(&trace, config.as_deref(), &stats),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Installs the stderr log subscriber.
///
/// Honours `RUST_LOG`, falling back to `warn`; `--verbose` forces `debug`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration, replays the trace, and prints the selected statistics.
fn cmd_run(
    trace_path: &str,
    config_path: Option<&str>,
    sections: &[String],
) -> Result<(), SimError> {
    let config = match config_path {
        Some(path) => Config::from_json(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    let trace = load_trace(trace_path)?;
    let mut hierarchy = MemoryHierarchy::new(&config)?;

    println!("[*] Trace: {trace_path} ({} requests)", trace.len());
    println!(
        "    Levels: {}",
        hierarchy
            .levels()
            .iter()
            .map(|c| format!(
                "{}({:?})",
                c.level().name(),
                config.cache.level(c.level()).prefetcher
            ))
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let completed = hierarchy.replay(&trace, MAX_STALL_CYCLES);
    info!(completed = completed.len(), cycles = hierarchy.cycles(), "replay finished");
    if !hierarchy.is_idle() {
        eprintln!(
            "[!] Warning: hierarchy still busy after {} cycles",
            hierarchy.cycles()
        );
    }

    hierarchy.stats().print_sections(sections);
    Ok(())
}

/// Prints the default configuration as pretty JSON.
fn cmd_config() -> Result<(), SimError> {
    println!("{}", serde_json::to_string_pretty(&Config::default())?);
    Ok(())
}
