//! # protofab CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use protofab_cli::config::ResolveConfig;
use protofab_cli::inspect::{run_inspect, InspectArgs};
use protofab_cli::resolve::{run_resolve, ResolveArgs};

/// protofab: build runtime message types from schema descriptor sets.
#[derive(Parser, Debug)]
#[command(name = "protofab", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML resolve manifest.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve descriptor sets and list the resulting message types.
    Resolve(ResolveArgs),

    /// Print a single message type.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Resolve(args) => run_resolve(&args, &config),
        Commands::Inspect(args) => run_inspect(&args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ResolveConfig> {
    match path {
        Some(path) => ResolveConfig::load(path),
        None => Ok(ResolveConfig::default()),
    }
}
