//! # Inspect Subcommand
//!
//! Prints one message type, after resolving the descriptor sets that
//! define it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::ResolveConfig;
use crate::resolve::resolve_sets;

/// Arguments for the `protofab inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Descriptor sets to load.
    #[arg(value_name = "SET")]
    pub sets: Vec<PathBuf>,

    /// Fully-qualified message name, e.g. `acme.Node`.
    #[arg(long, value_name = "FULL_NAME")]
    pub message: String,
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs, config: &ResolveConfig) -> Result<u8> {
    let merged = ResolveConfig {
        files: Vec::new(),
        ..config.merged_with(&args.sets, &[])
    };
    if merged.descriptor_sets.is_empty() {
        println!("Usage: protofab inspect SET... --message FULL_NAME");
        return Ok(1);
    }
    print!("{}", inspect(&merged, &args.message)?);
    Ok(0)
}

/// The [`describe`](crate::describe) listing for `message`.
pub fn inspect(config: &ResolveConfig, message: &str) -> Result<String> {
    let (mut factory, _) = resolve_sets(config)?;
    let message_type = factory
        .get_prototype_by_name(message)
        .with_context(|| format!("message {message} not found"))?;
    Ok(crate::describe(&message_type))
}
