//! `brain` - grid simulation driven by behavior trees.
//!
//! - `brain run` - run the simulation and print a summary
//! - `brain trees` - list the built-in trees

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use brain_bt::ResumptionStack;
use brain_cli::{trees, Sim, SimConfig};

#[derive(Parser)]
#[command(name = "brain")]
#[command(about = "Tick-based behavior tree simulation", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run {
        /// YAML config; the built-in demo when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured tick count
        #[arg(long)]
        ticks: Option<u64>,

        /// Write the structured trace as JSON
        #[arg(long)]
        trace_out: Option<PathBuf>,
    },

    /// List the built-in trees
    Trees,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            trace_out,
        } => run(config, ticks, trace_out),
        Commands::Trees => list_trees(),
    }
}

fn run(config: Option<PathBuf>, ticks: Option<u64>, trace_out: Option<PathBuf>) -> Result<()> {
    let mut config = SimConfig::load_or_default(config.as_deref())?;
    config.trace |= trace_out.is_some();
    let ticks = ticks.unwrap_or(config.ticks);

    let mut sim = Sim::new(&config)?;
    let summary = sim.run(ticks);

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let (Some(path), Some(trace)) = (trace_out, sim.world().trace()) {
        let log = trace.snapshot();
        let json = serde_json::to_string_pretty(&log)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write trace to {}", path.display()))?;
        tracing::info!(path = %path.display(), events = log.events.len(), "Trace written");
    }

    Ok(())
}

fn list_trees() -> Result<()> {
    let registry = trees::registry()?;
    for name in registry.names() {
        let tree = registry.lookup(name)?;
        println!("{name}");
        let description = tree.describe_traversal(&ResumptionStack::new());
        for line in description.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}
