//! Match command implementation for the ridepool CLI.

use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridepool_core::{MatchingResult, PointIdGenerator};
use ridepool_data::routing::{OsrmRoutingEngine, OsrmRoutingEngineConfig};
use ridepool_data::wire::{Batch, read_batch, write_results};
use ridepool_matcher::generator::RandomTopologicalConfig;
use ridepool_matcher::selector::RouteProximityGenerator;
use ridepool_matcher::{
    Matcher, MatcherBuilder, MatcherConfig, RandomTopologicalGenerator, SharedRoutingEngine,
    TimeMatrixConfig,
};
use serde::{Deserialize, Serialize};

use crate::fs::{create_utf8_file, file_is_file, open_utf8_file};
use crate::{
    ARG_MATCH_BATCH, ARG_MATCH_CACHING_BOUND, ARG_MATCH_LIMIT, ARG_MATCH_ORTOOLS_BASE_URL,
    ARG_MATCH_OSRM_BASE_URL, ARG_MATCH_OUTPUT, ARG_MATCH_PATH_GENERATOR, ARG_MATCH_PICKUP_DROPOFF,
    ARG_MATCH_PLANNER, ARG_MATCH_SAMPLES, ARG_MATCH_SEED, CliError, ENV_MATCH_BATCH,
};

const DEFAULT_ORTOOLS_BASE_URL: &str = "http://localhost:8000";

/// Route search used for each offer and request pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PlannerKind {
    /// Enumerate candidate routes and keep the earliest feasible arrival.
    #[default]
    Default,
    /// Native pickup-and-delivery solver.
    Vrp,
    /// External OR-tools service.
    Ortools,
}

/// Strategy producing candidate routes for the default planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PathGeneratorKind {
    /// Every position of the pickup and dropoff in the current route.
    #[default]
    Insertion,
    /// Random orderings of every stop that keep pickups before dropoffs.
    RandomTopological,
}

/// Strategy choosing where riders board and leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PickupDropoffKind {
    /// Snap the rider's own locations to the road.
    #[default]
    Snap,
    /// Walk to the nearest stop of the driver's route.
    RouteProximity,
}

/// CLI arguments for the `match` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Match a batch of driver offers and rider requests. The batch \
                 is a JSON document with `offers` and `requests`; travel times \
                 come from an OSRM instance. Results are printed as JSON, one \
                 entry per offer that accepted at least one request.",
    about = "Match offers and requests from a JSON batch"
)]
#[ortho_config(prefix = "RIDEPOOL")]
pub(crate) struct MatchArgs {
    /// Path to a JSON batch of offers and requests.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) batch_path: Option<Utf8PathBuf>,
    /// Write results to this file instead of stdout.
    #[arg(long = ARG_MATCH_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Requests after which an offer stops accepting riders.
    #[arg(long = ARG_MATCH_LIMIT, value_name = "n")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Route search used for each pair.
    #[arg(long = ARG_MATCH_PLANNER, value_enum)]
    #[serde(default)]
    pub(crate) planner: Option<PlannerKind>,
    /// Candidate route strategy for the default planner.
    #[arg(long = ARG_MATCH_PATH_GENERATOR, value_enum)]
    #[serde(default)]
    pub(crate) path_generator: Option<PathGeneratorKind>,
    /// Pickup and dropoff placement strategy.
    #[arg(long = ARG_MATCH_PICKUP_DROPOFF, value_enum)]
    #[serde(default)]
    pub(crate) pickup_dropoff: Option<PickupDropoffKind>,
    /// Orderings sampled per pair by the random topological generator.
    #[arg(long = ARG_MATCH_SAMPLES, value_name = "k")]
    #[serde(default)]
    pub(crate) samples: Option<usize>,
    /// Seed for reproducible random topological sampling.
    #[arg(long = ARG_MATCH_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Candidate requests per offer up to which one matrix per offer is cached.
    #[arg(long = ARG_MATCH_CACHING_BOUND, value_name = "n")]
    #[serde(default)]
    pub(crate) caching_bound: Option<usize>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_MATCH_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Base URL for the OR-tools service (e.g. "http://localhost:8000").
    #[arg(long = ARG_MATCH_ORTOOLS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) ortools_base_url: Option<String>,
}

impl MatchArgs {
    pub(crate) fn into_config(self) -> Result<MatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MatchConfig::try_from(merged)
    }
}

/// Resolved `match` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchConfig {
    /// Path to the JSON batch.
    pub(crate) batch_path: Utf8PathBuf,
    /// Destination file; stdout when absent.
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) limit: usize,
    pub(crate) planner: PlannerKind,
    pub(crate) path_generator: PathGeneratorKind,
    pub(crate) pickup_dropoff: PickupDropoffKind,
    pub(crate) sampling: RandomTopologicalConfig,
    pub(crate) caching_bound: usize,
    /// Base URL for the OSRM services.
    pub(crate) osrm_base_url: String,
    /// Base URL for the OR-tools service.
    pub(crate) ortools_base_url: String,
}

impl MatchConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.batch_path;
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_MATCH_BATCH,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_MATCH_BATCH,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_MATCH_BATCH,
                path: path.clone(),
                source,
            }),
        }
    }
}

fn positive(value: Option<usize>, default: usize, field: &'static str) -> Result<usize, CliError> {
    match value.unwrap_or(default) {
        0 => Err(CliError::NonPositive { field }),
        resolved => Ok(resolved),
    }
}

impl TryFrom<MatchArgs> for MatchConfig {
    type Error = CliError;

    fn try_from(args: MatchArgs) -> Result<Self, Self::Error> {
        let batch_path = args.batch_path.ok_or(CliError::MissingArgument {
            field: ARG_MATCH_BATCH,
            env: ENV_MATCH_BATCH,
        })?;

        let limit = positive(args.limit, MatcherConfig::default().limit, ARG_MATCH_LIMIT)?;
        let default_sampling = RandomTopologicalConfig::default();
        let sampling = RandomTopologicalConfig {
            samples: positive(args.samples, default_sampling.samples, ARG_MATCH_SAMPLES)?,
            seed: args.seed,
        };
        let caching_bound = args
            .caching_bound
            .unwrap_or(TimeMatrixConfig::default().caching_bound);

        let osrm_base_url = args
            .osrm_base_url
            .unwrap_or_else(|| OsrmRoutingEngineConfig::default().base_url);
        let ortools_base_url = args
            .ortools_base_url
            .unwrap_or_else(|| DEFAULT_ORTOOLS_BASE_URL.to_owned());

        Ok(Self {
            batch_path,
            output: args.output,
            limit,
            planner: args.planner.unwrap_or_default(),
            path_generator: args.path_generator.unwrap_or_default(),
            pickup_dropoff: args.pickup_dropoff.unwrap_or_default(),
            sampling,
            caching_bound,
            osrm_base_url,
            ortools_base_url,
        })
    }
}

/// Builds the routing engine for the current match invocation.
pub(super) trait MatchEngineBuilder {
    fn build(&self, config: &MatchConfig) -> Result<SharedRoutingEngine, CliError>;
}

pub(super) struct DefaultMatchEngineBuilder;

impl MatchEngineBuilder for DefaultMatchEngineBuilder {
    fn build(&self, config: &MatchConfig) -> Result<SharedRoutingEngine, CliError> {
        let engine = OsrmRoutingEngine::new(config.osrm_base_url.clone()).map_err(|source| {
            CliError::BuildRoutingEngine {
                base_url: config.osrm_base_url.clone(),
                source,
            }
        })?;
        Ok(Arc::new(engine))
    }
}

pub(super) fn run_match(args: MatchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultMatchEngineBuilder;
    run_match_with(args, &builder, &mut stdout)
}

pub(super) fn run_match_with(
    args: MatchArgs,
    builder: &dyn MatchEngineBuilder,
    stdout: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_match_config(args)?;
    let results = execute_match(&config, builder)?;
    match &config.output {
        Some(path) => {
            let file = create_utf8_file(path).map_err(|source| CliError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            write_match_results(&mut BufWriter::new(file), &results)
        }
        None => write_match_results(stdout, &results),
    }
}

fn resolve_match_config(args: MatchArgs) -> Result<MatchConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_match(
    config: &MatchConfig,
    builder: &dyn MatchEngineBuilder,
) -> Result<Vec<MatchingResult>, CliError> {
    let ids = Arc::new(PointIdGenerator::new());
    let batch = load_batch(&config.batch_path, &ids)?;
    let engine = builder.build(config)?;
    let matcher = build_matcher(config, engine, ids)?;
    let offers = batch.offers.len();
    let results = matcher
        .match_batch(batch.offers, batch.requests)
        .map_err(|source| CliError::Match { source })?;
    info!(
        "matched {} of {offers} offers from {}",
        results.len(),
        config.batch_path
    );
    Ok(results)
}

/// Loads a JSON batch from disk.
pub(super) fn load_batch(path: &Utf8Path, ids: &PointIdGenerator) -> Result<Batch, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenBatch {
        path: path.to_path_buf(),
        source,
    })?;
    read_batch(BufReader::new(file), ids).map_err(|source| CliError::ReadBatch {
        path: path.to_path_buf(),
        source,
    })
}

/// Assemble a matcher with the strategies chosen in `config`.
pub(super) fn build_matcher(
    config: &MatchConfig,
    engine: SharedRoutingEngine,
    ids: Arc<PointIdGenerator>,
) -> Result<Matcher, CliError> {
    let mut builder = Matcher::builder(Arc::clone(&engine), ids)
        .with_limit(config.limit)
        .with_time_matrix_config(TimeMatrixConfig {
            caching_bound: config.caching_bound,
        });
    if config.path_generator == PathGeneratorKind::RandomTopological {
        builder = builder.with_path_generator(Box::new(RandomTopologicalGenerator::with_config(
            config.sampling,
        )));
    }
    if config.pickup_dropoff == PickupDropoffKind::RouteProximity {
        builder =
            builder.with_pickup_dropoff_generator(Box::new(RouteProximityGenerator::new(engine)));
    }
    let builder = match config.planner {
        PlannerKind::Default => builder,
        PlannerKind::Vrp => with_vrp_solver(builder)?,
        PlannerKind::Ortools => with_ortools_solver(builder, &config.ortools_base_url)?,
    };
    Ok(builder.build())
}

#[cfg(feature = "solver-vrp")]
fn with_vrp_solver(builder: MatcherBuilder) -> Result<MatcherBuilder, CliError> {
    Ok(builder.with_solver(Box::new(ridepool_solver_vrp::VrpSolver::new())))
}

#[cfg(not(feature = "solver-vrp"))]
fn with_vrp_solver(_builder: MatcherBuilder) -> Result<MatcherBuilder, CliError> {
    Err(CliError::MissingFeature {
        feature: "solver-vrp",
        action: "the vrp planner",
    })
}

#[cfg(feature = "solver-ortools")]
fn with_ortools_solver(
    builder: MatcherBuilder,
    base_url: &str,
) -> Result<MatcherBuilder, CliError> {
    let solver = ridepool_solver_ortools::OrtoolsSolver::new(base_url).map_err(|source| {
        CliError::BuildSolver {
            base_url: base_url.to_owned(),
            source,
        }
    })?;
    Ok(builder.with_solver(Box::new(solver)))
}

#[cfg(not(feature = "solver-ortools"))]
fn with_ortools_solver(
    _builder: MatcherBuilder,
    _base_url: &str,
) -> Result<MatcherBuilder, CliError> {
    Err(CliError::MissingFeature {
        feature: "solver-ortools",
        action: "the ortools planner",
    })
}

fn write_match_results(writer: &mut dyn Write, results: &[MatchingResult]) -> Result<(), CliError> {
    write_results(&mut *writer, results).map_err(CliError::WriteResults)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<MatchConfig, CliError> {
    let merged = MatchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    MatchConfig::try_from(merged)
}
