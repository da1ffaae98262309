#![warn(missing_docs)]

//! Entry point for the `winkeepctl` binary.

mod cli;
mod commands;
mod error;

use std::process;

use clap::Parser;
use tracing::error;

use crate::{
    cli::{Cli, Commands},
    commands::Context,
    error::Result,
};

/// Run and exit non-zero on failure.
fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli {
        log,
        dir,
        config,
        json,
        command,
    } = Cli::parse();
    logging::init(&log.spec());

    let ctx = Context::load(dir.as_deref(), config.as_deref(), json)?;
    match command {
        Commands::List => commands::list(&ctx),
        Commands::Registry => commands::registry(&ctx),
        Commands::Detect(args) => commands::detect(&ctx, &args),
        Commands::Plan(args) => commands::plan(&ctx, &args),
        Commands::Cleanup => commands::cleanup(&ctx),
        Commands::Stats => commands::stats(&ctx),
    }
}
