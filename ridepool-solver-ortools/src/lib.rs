//! Pickup-and-delivery solver backed by an external OR-Tools service.
//!
//! [`OrtoolsSolver`] implements
//! [`VehicleRoutingSolver`](ridepool_core::VehicleRoutingSolver) by posting
//! each problem as JSON to `{base_url}/solve` and reading back the visiting
//! order. The service reports infeasible problems with `success: false`,
//! which maps to `Ok(None)`.
//!
//! # Example
//!
//! ```no_run
//! use ridepool_solver_ortools::{OrtoolsSolver, OrtoolsSolverConfig, SolverTuning};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OrtoolsSolverConfig::new("http://localhost:8000").with_tuning(SolverTuning {
//!     enable_guided_local_search: true,
//!     ..SolverTuning::default()
//! });
//! let solver = OrtoolsSolver::with_config(config)?;
//! # let _ = solver;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod dto;

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use ridepool_core::{PickupDeliveryProblem, SolverError, VehicleRoutingSolver, Visit};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use crate::dto::{SolveRequestDto, SolveResponseDto};

/// Default user agent for solver requests.
pub const DEFAULT_USER_AGENT: &str = "ridepool-ortools/0.1";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest response body excerpt carried by [`SolverError::HttpError`].
const MAX_ERROR_BODY: usize = 512;

/// Error type for [`OrtoolsSolver`] construction failures.
#[derive(Debug, Error)]
pub enum SolverBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Search parameters forwarded to OR-Tools with every problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverTuning {
    /// Search budget in milliseconds.
    pub timeout_ms: u64,
    /// First-solution strategy, e.g. `parallel_cheapest_insertion`.
    pub method: String,
    /// Improve the first solution with guided local search.
    pub enable_guided_local_search: bool,
}

impl Default for SolverTuning {
    fn default() -> Self {
        Self {
            timeout_ms: 100,
            method: "parallel_cheapest_insertion".to_owned(),
            enable_guided_local_search: false,
        }
    }
}

/// Configuration for [`OrtoolsSolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrtoolsSolverConfig {
    /// Base URL of the service (e.g., `"http://localhost:8000"`).
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Search parameters.
    pub tuning: SolverTuning,
}

impl Default for OrtoolsSolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            tuning: SolverTuning::default(),
        }
    }
}

impl OrtoolsSolverConfig {
    /// Create a configuration for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the HTTP request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the search parameters.
    #[must_use]
    pub fn with_tuning(mut self, tuning: SolverTuning) -> Self {
        self.tuning = tuning;
        self
    }

    fn solve_url(&self) -> String {
        format!("{}/solve", self.base_url.trim_end_matches('/'))
    }
}

/// HTTP client for the OR-Tools pickup-and-delivery service.
///
/// Like the OSRM routing engine it owns a `current_thread` Tokio runtime and
/// blocks on the caller's handle when already inside a multi-threaded
/// runtime.
pub struct OrtoolsSolver {
    client: Client,
    config: OrtoolsSolverConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OrtoolsSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtoolsSolver")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl OrtoolsSolver {
    /// Create a solver for the service at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SolverBuildError> {
        Self::with_config(OrtoolsSolverConfig::new(base_url))
    }

    /// Create a solver with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OrtoolsSolverConfig) -> Result<Self, SolverBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SolverBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SolverBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrtoolsSolverConfig {
        &self.config
    }

    async fn post(&self, body: &SolveRequestDto<'_>) -> Result<SolveResponseDto, SolverError> {
        let url = self.config.solve_url();
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SolverError::HttpError {
                url,
                status: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|err| SolverError::ParseError {
                message: err.to_string(),
            })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> SolverError {
        if error.is_timeout() {
            return SolverError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return SolverError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        SolverError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl VehicleRoutingSolver for OrtoolsSolver {
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError> {
        problem.validate()?;
        let body = SolveRequestDto::new(problem, &self.config.tuning);
        let response = self.block_on(self.post(&body))?;
        let visits = response.into_visits();
        if visits.is_none() {
            debug!(
                "OR-Tools found no route over {} nodes",
                problem.node_count()
            );
        }
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::{PickupDropoffPair, SolverTimeWindow};
    use rstest::{fixture, rstest};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    #[fixture]
    fn problem() -> PickupDeliveryProblem {
        PickupDeliveryProblem {
            time_matrix: vec![
                vec![0, 60, 120, 180],
                vec![60, 0, 60, 120],
                vec![120, 60, 0, 60],
                vec![180, 120, 60, 0],
            ],
            time_windows: vec![SolverTimeWindow { start: 0, end: 600 }; 4],
            demands: vec![0, 1, -1, 0],
            vehicle_capacity: 2,
            pickups_and_dropoffs: vec![PickupDropoffPair {
                pickup: 1,
                dropoff: 2,
            }],
            max_route_duration: 600,
        }
    }

    /// Serve a single HTTP exchange, returning the request body it read.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("request line");
            let mut content_length = 0_usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header");
                let header = line.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().expect("length");
                }
            }
            let mut received = vec![0_u8; content_length];
            reader.read_exact(&mut received).expect("body");
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("response");
            format!("{}{}", request_line.trim_end(), String::from_utf8_lossy(&received))
        });
        (base_url, handle)
    }

    #[rstest]
    fn posts_the_problem_and_reads_the_route(problem: PickupDeliveryProblem) {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"success": true, "route": [
                {"node": 0, "arrival_time": 0},
                {"node": 1, "arrival_time": 60},
                {"node": 2, "arrival_time": 120},
                {"node": 3, "arrival_time": 180}
            ]}"#,
        );
        let solver = OrtoolsSolver::new(base_url).expect("solver builds");
        let visits = solver
            .solve(&problem)
            .expect("solve succeeds")
            .expect("route exists");
        assert_eq!(
            visits.iter().map(|visit| visit.node).collect::<Vec<_>>(),
            [0, 1, 2, 3]
        );
        let request = server.join().expect("server thread");
        assert!(request.starts_with("POST /solve HTTP/1.1"), "{request}");
        assert!(request.contains(r#""pickup_and_dropoffs":[[1,2]]"#), "{request}");
    }

    #[rstest]
    fn unsuccessful_solves_have_no_route(problem: PickupDeliveryProblem) {
        let (base_url, server) = serve_once("200 OK", r#"{"success": false, "route": []}"#);
        let solver = OrtoolsSolver::new(base_url).expect("solver builds");
        assert_eq!(solver.solve(&problem), Ok(None));
        server.join().expect("server thread");
    }

    #[rstest]
    fn error_statuses_carry_the_body(problem: PickupDeliveryProblem) {
        let (base_url, server) =
            serve_once("422 Unprocessable Entity", r#"{"detail": "bad matrix"}"#);
        let solver = OrtoolsSolver::new(base_url).expect("solver builds");
        let err = solver.solve(&problem).expect_err("status is an error");
        assert!(matches!(
            err,
            SolverError::HttpError { status: 422, ref message, .. } if message.contains("bad matrix")
        ));
        server.join().expect("server thread");
    }

    #[rstest]
    fn garbage_responses_are_parse_errors(problem: PickupDeliveryProblem) {
        let (base_url, server) = serve_once("200 OK", "not json");
        let solver = OrtoolsSolver::new(base_url).expect("solver builds");
        assert!(matches!(
            solver.solve(&problem),
            Err(SolverError::ParseError { .. })
        ));
        server.join().expect("server thread");
    }

    #[rstest]
    fn invalid_problems_are_not_sent(mut problem: PickupDeliveryProblem) {
        problem.demands.pop();
        let solver = OrtoolsSolver::new("http://127.0.0.1:9").expect("solver builds");
        assert!(matches!(
            solver.solve(&problem),
            Err(SolverError::InvalidProblem { .. })
        ));
    }

    #[rstest]
    fn config_builder_sets_fields() {
        let config = OrtoolsSolverConfig::new("http://solver.example.com/")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");
        assert_eq!(config.solve_url(), "http://solver.example.com/solve");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.tuning, SolverTuning::default());
    }
}
