//! # Resolve Subcommand
//!
//! Loads descriptor sets, registers every file they contain in dependency
//! order, and prints the message types of the requested files (all files
//! when none are named).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protofab_factory::{MessageFactory, MessageMap};

use crate::config::ResolveConfig;

/// Arguments for the `protofab resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Descriptor sets to load (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "SET")]
    pub sets: Vec<PathBuf>,

    /// Report only the messages of this file. Repeatable.
    #[arg(long = "file", value_name = "NAME")]
    pub files: Vec<String>,
}

/// Execute the resolve subcommand.
///
/// Returns exit code: 0 on success, 1 when no descriptor set was given.
pub fn run_resolve(args: &ResolveArgs, config: &ResolveConfig) -> Result<u8> {
    let merged = config.merged_with(&args.sets, &args.files);
    if merged.descriptor_sets.is_empty() {
        println!("Usage: protofab resolve [SET]... [--file NAME]...");
        return Ok(1);
    }

    let (_, types) = resolve_sets(&merged)?;
    for message_type in types.values() {
        print!("{}", crate::describe(message_type));
    }
    println!("{} message type(s) resolved.", types.len());
    Ok(0)
}

/// Load every set in `config` into a fresh factory and resolve `config.files`,
/// or every loaded file when that list is empty.
pub fn resolve_sets(config: &ResolveConfig) -> Result<(MessageFactory, MessageMap)> {
    let set = crate::load_sets(&config.descriptor_sets)?;
    let mut factory = MessageFactory::new();
    let all = factory
        .load_files(set.file)
        .context("failed to resolve descriptor sets")?;

    if config.files.is_empty() {
        return Ok((factory, all));
    }
    let requested = factory
        .get_messages(&config.files)
        .context("failed to resolve requested files")?;
    Ok((factory, requested))
}
