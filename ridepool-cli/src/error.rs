//! Error types emitted by the ridepool CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ridepool_data::routing::EngineBuildError;
use ridepool_data::wire::WireError;
use ridepool_matcher::MatchError;
use thiserror::Error;

/// Errors emitted by the ridepool CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A numeric option is outside its accepted range.
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the batch file failed.
    #[error("failed to open batch at {path:?}: {source}")]
    OpenBatch {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The batch document could not be decoded.
    #[error("failed to read batch at {path:?}: {source}")]
    ReadBatch {
        path: Utf8PathBuf,
        #[source]
        source: WireError,
    },
    /// Constructing the OSRM routing engine failed.
    #[error("failed to build routing engine for {base_url:?}: {source}")]
    BuildRoutingEngine {
        base_url: String,
        #[source]
        source: EngineBuildError,
    },
    /// Constructing the OR-tools client failed.
    #[cfg(feature = "solver-ortools")]
    #[error("failed to build OR-tools client for {base_url:?}: {source}")]
    BuildSolver {
        base_url: String,
        #[source]
        source: ridepool_solver_ortools::SolverBuildError,
    },
    /// The matching run failed.
    #[error("matching failed: {source}")]
    Match {
        #[source]
        source: MatchError,
    },
    /// Creating the output file failed.
    #[error("failed to create output at {path:?}: {source}")]
    CreateOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serializing or writing the results failed.
    #[error("failed to write results: {0}")]
    WriteResults(#[source] WireError),
    /// Writing the trailing newline failed.
    #[error("failed to write results: {0}")]
    WriteOutput(#[source] std::io::Error),
}
