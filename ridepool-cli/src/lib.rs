//! Command-line interface for the ridepool matching engine.
//!
//! The `match` subcommand reads a JSON batch of offers and requests, wires
//! a [`Matcher`](ridepool_matcher::Matcher) from layered configuration and
//! writes the matching results as JSON.

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use log::LevelFilter;

mod error;
mod fs;
mod logger;
mod matching;

pub use error::CliError;
use matching::{MatchArgs, run_match};

pub(crate) const ARG_MATCH_BATCH: &str = "batch";
pub(crate) const ARG_MATCH_OUTPUT: &str = "output";
pub(crate) const ARG_MATCH_LIMIT: &str = "limit";
pub(crate) const ARG_MATCH_PLANNER: &str = "planner";
pub(crate) const ARG_MATCH_PATH_GENERATOR: &str = "path-generator";
pub(crate) const ARG_MATCH_PICKUP_DROPOFF: &str = "pickup-dropoff";
pub(crate) const ARG_MATCH_SAMPLES: &str = "samples";
pub(crate) const ARG_MATCH_SEED: &str = "seed";
pub(crate) const ARG_MATCH_CACHING_BOUND: &str = "caching-bound";
pub(crate) const ARG_MATCH_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_MATCH_ORTOOLS_BASE_URL: &str = "ortools-base-url";
pub(crate) const ENV_MATCH_BATCH: &str = "RIDEPOOL_CMDS_MATCH_BATCH_PATH";

/// Run the CLI with the process arguments.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration or the
/// matching run fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    logger::init(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    match cli.command {
        Command::Match(args) => run_match(args),
    }
}

#[derive(Debug, Parser)]
#[command(name = "ridepool", about = "Ride-pooling batch matcher", version)]
pub(crate) struct Cli {
    /// Log per-round diagnostics to stderr.
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Match a batch of offers and requests.
    #[command(name = "match")]
    Match(MatchArgs),
}

#[cfg(test)]
mod tests;
