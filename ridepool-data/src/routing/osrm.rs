//! OSRM response types for the Table, Route and Nearest services.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/>

use serde::Deserialize;

/// Status code OSRM reports for a successful request.
const OK: &str = "Ok";

/// Table service response.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// `durations[i][j]` is the travel time in seconds from the i-th to the
    /// j-th coordinate, or `None` when no route exists.
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

/// Route service response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// Alternative routes, best first.
    #[serde(default)]
    pub routes: Vec<RouteSummary>,
}

/// Totals for one route.
#[derive(Debug, Deserialize)]
pub struct RouteSummary {
    /// Travel time in seconds.
    pub duration: f64,
    /// Distance in metres.
    pub distance: f64,
}

/// Nearest service response.
#[derive(Debug, Deserialize)]
pub struct NearestResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// Snapped positions, nearest first.
    #[serde(default)]
    pub waypoints: Vec<NearestWaypoint>,
}

/// A position snapped to the road network.
#[derive(Debug, Deserialize)]
pub struct NearestWaypoint {
    /// `[longitude, latitude]` of the snapped position.
    pub location: [f64; 2],
    /// Distance in metres from the queried point.
    pub distance: Option<f64>,
}

/// Status carried by every OSRM response.
pub trait Status {
    /// The response code.
    fn code(&self) -> &str;

    /// Take the error message, if any.
    fn take_message(&mut self) -> Option<String>;

    /// Whether the request succeeded.
    fn is_ok(&self) -> bool {
        self.code() == OK
    }
}

macro_rules! impl_status {
    ($($response:ty),+) => {
        $(impl Status for $response {
            fn code(&self) -> &str {
                &self.code
            }

            fn take_message(&mut self) -> Option<String> {
                self.message.take()
            }
        })+
    };
}

impl_status!(TableResponse, RouteResponse, NearestResponse);
