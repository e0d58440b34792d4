//! [`RoutingEngine`] implementation over OSRM's HTTP API.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use ridepool_core::{Coordinate, Profile, RoutingEngine, RoutingError, TravelTimeMatrix};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::osrm::{NearestResponse, RouteResponse, Status, TableResponse};

/// Error type for [`OsrmRoutingEngine`] construction failures.
#[derive(Debug, Error)]
pub enum EngineBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "ridepool-routing/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`OsrmRoutingEngine`].
#[derive(Debug, Clone)]
pub struct OsrmRoutingEngineConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// OSRM profile used for driving queries.
    pub driving_profile: String,
    /// OSRM profile used for walking queries.
    pub walking_profile: String,
}

impl Default for OsrmRoutingEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            driving_profile: "car".to_string(),
            walking_profile: "foot".to_string(),
        }
    }
}

impl OsrmRoutingEngineConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the OSRM profile names for driving and walking.
    #[must_use]
    pub fn with_profiles(mut self, driving: impl Into<String>, walking: impl Into<String>) -> Self {
        self.driving_profile = driving.into();
        self.walking_profile = walking.into();
        self
    }
}

/// Routing engine backed by an OSRM service.
///
/// The engine owns a Tokio runtime reused across calls. Called from inside a
/// multi-threaded Tokio runtime it blocks on that runtime's handle with
/// [`tokio::task::block_in_place`] instead. Inside a `current_thread`
/// runtime it falls back to its own runtime, which may deadlock if the
/// caller's runtime drives IO this request depends on.
///
/// OSRM has no time-dependent routing, so departure times are ignored.
pub struct OsrmRoutingEngine {
    client: Client,
    config: OsrmRoutingEngineConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OsrmRoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmRoutingEngine")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl OsrmRoutingEngine {
    /// Create an engine with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineBuildError> {
        Self::with_config(OsrmRoutingEngineConfig::new(base_url))
    }

    /// Create an engine with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OsrmRoutingEngineConfig) -> Result<Self, EngineBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(EngineBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(EngineBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OsrmRoutingEngineConfig {
        &self.config
    }

    fn profile_name(&self, profile: Profile) -> &str {
        match profile {
            Profile::Driving => &self.config.driving_profile,
            Profile::Walking => &self.config.walking_profile,
        }
    }

    /// Build `{base_url}/{service}/v1/{profile}/{lng,lat;...}`.
    fn service_url(&self, service: &str, profile: Profile, coordinates: &[Coordinate]) -> String {
        let coords = coordinates
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng(), c.lat()))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/{service}/v1/{}/{coords}",
            self.config.base_url.trim_end_matches('/'),
            self.profile_name(profile)
        )
    }

    async fn fetch<T: DeserializeOwned + Status>(&self, url: String) -> Result<T, RoutingError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let mut body: T = response
            .json()
            .await
            .map_err(|err| RoutingError::ParseError {
                message: err.to_string(),
            })?;
        if !body.is_ok() {
            return Err(RoutingError::ServiceError {
                code: body.code().to_owned(),
                message: body.take_message().unwrap_or_default(),
            });
        }
        Ok(body)
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    /// Convert a reqwest error to a `RoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RoutingError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    fn table(&self, points: &[Coordinate], profile: Profile) -> Result<TravelTimeMatrix, RoutingError> {
        let url = self.service_url("table", profile, points);
        let response: TableResponse = self.block_on(self.fetch(url))?;
        to_matrix(response, points.len())
    }
}

/// Seconds to a duration, rejecting negative and non-finite values.
fn seconds(value: f64) -> Option<Duration> {
    (value >= 0.0 && value.is_finite()).then(|| Duration::from_secs_f64(value))
}

/// Convert a table response into a square matrix.
///
/// Unreachable pairs and invalid values become [`Duration::MAX`].
fn to_matrix(response: TableResponse, size: usize) -> Result<TravelTimeMatrix, RoutingError> {
    let durations = response
        .durations
        .ok_or_else(|| RoutingError::ParseError {
            message: "OSRM response missing durations array".to_string(),
        })?;
    if durations.len() != size || durations.iter().any(|row| row.len() != size) {
        return Err(RoutingError::ParseError {
            message: format!("expected a {size}x{size} durations array"),
        });
    }
    Ok(durations
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.and_then(seconds).unwrap_or(Duration::MAX))
                .collect()
        })
        .collect())
}

/// Running totals of `matrix[i][i + 1]`, starting at zero.
fn cumulative_legs(matrix: &TravelTimeMatrix) -> Result<Vec<Duration>, RoutingError> {
    let mut total = Duration::ZERO;
    let mut cumulative = Vec::with_capacity(matrix.len());
    cumulative.push(total);
    for (from, row) in matrix.iter().enumerate().take(matrix.len().saturating_sub(1)) {
        let leg = row
            .get(from + 1)
            .copied()
            .filter(|leg| *leg != Duration::MAX)
            .ok_or_else(|| RoutingError::ServiceError {
                code: "NoRoute".to_owned(),
                message: format!("no route between waypoints {from} and {}", from + 1),
            })?;
        total = total.saturating_add(leg);
        cumulative.push(total);
    }
    Ok(cumulative)
}

impl RoutingEngine for OsrmRoutingEngine {
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        _departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError> {
        match waypoints {
            [] => Err(RoutingError::EmptyInput),
            [_] => Ok(vec![Duration::ZERO]),
            _ => cumulative_legs(&self.table(waypoints, Profile::Driving)?),
        }
    }

    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        profile: Profile,
        _departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError> {
        if points.is_empty() {
            return Err(RoutingError::EmptyInput);
        }
        self.table(points, profile)
    }

    fn compute_walking_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Duration, RoutingError> {
        let url = format!(
            "{}?overview=false",
            self.service_url("route", Profile::Walking, &[*origin, *destination])
        );
        let response: RouteResponse = self.block_on(self.fetch(url))?;
        let route = response
            .routes
            .first()
            .ok_or_else(|| RoutingError::ParseError {
                message: "OSRM response contains no routes".to_string(),
            })?;
        debug!(
            "walking {:.0} m takes {:.0} s",
            route.distance, route.duration
        );
        seconds(route.duration).ok_or_else(|| RoutingError::ParseError {
            message: format!("invalid route duration {}", route.duration),
        })
    }

    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
        let url = format!(
            "{}?number=1",
            self.service_url("nearest", Profile::Driving, &[*point])
        );
        let response: NearestResponse = self.block_on(self.fetch(url))?;
        let waypoint = response
            .waypoints
            .first()
            .ok_or_else(|| RoutingError::ParseError {
                message: "OSRM response contains no waypoints".to_string(),
            })?;
        if let Some(distance) = waypoint.distance {
            debug!("snapped point moved {distance:.1} m");
        }
        let [lng, lat] = waypoint.location;
        Coordinate::new(lat, lng).map_err(|err| RoutingError::ParseError {
            message: err.to_string(),
        })
    }
}
