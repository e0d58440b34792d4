//! External pickup-and-delivery solver interface.
//!
//! The alternate path planner hands the whole insertion decision to a
//! vehicle-routing solver. Problems are expressed in integer seconds relative
//! to the offer's departure; node `0` is the driver's source and the last
//! node is the driver's destination.

use thiserror::Error;

/// Inclusive arrival window for a node, in seconds after departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverTimeWindow {
    /// Earliest arrival.
    pub start: u64,
    /// Latest arrival.
    pub end: u64,
}

/// Node indices that must be visited in order by the same vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupDropoffPair {
    /// Node where riders board.
    pub pickup: usize,
    /// Node where the same riders leave.
    pub dropoff: usize,
}

/// Single-vehicle pickup-and-delivery problem with time windows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickupDeliveryProblem {
    /// Travel seconds between nodes.
    pub time_matrix: Vec<Vec<u64>>,
    /// Arrival window for each node.
    pub time_windows: Vec<SolverTimeWindow>,
    /// Load change at each node: positive at pickups, negative at dropoffs.
    pub demands: Vec<i64>,
    /// Maximum load carried at once.
    pub vehicle_capacity: u32,
    /// Precedence pairs, one per request.
    pub pickups_and_dropoffs: Vec<PickupDropoffPair>,
    /// Upper bound on the route's total duration.
    pub max_route_duration: u64,
}

impl PickupDeliveryProblem {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.time_matrix.len()
    }

    /// Check the problem is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidProblem`] when the matrix is not square,
    /// a per-node vector has the wrong length, a window is inverted, or a
    /// pair references a node that does not exist.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.node_count();
        let invalid = |message: String| Err(SolverError::InvalidProblem { message });
        if n < 2 {
            return invalid(format!("expected at least two nodes, got {n}"));
        }
        if self.time_matrix.iter().any(|row| row.len() != n) {
            return invalid(format!("time matrix must be {n}x{n}"));
        }
        if self.time_windows.len() != n || self.demands.len() != n {
            return invalid(format!(
                "expected {n} time windows and demands, got {} and {}",
                self.time_windows.len(),
                self.demands.len()
            ));
        }
        if let Some(node) = self.time_windows.iter().position(|w| w.start > w.end) {
            return invalid(format!("time window for node {node} is inverted"));
        }
        if let Some(pair) = self
            .pickups_and_dropoffs
            .iter()
            .find(|pair| pair.pickup >= n || pair.dropoff >= n || pair.pickup == pair.dropoff)
        {
            return invalid(format!(
                "pickup/dropoff pair ({}, {}) is out of range",
                pair.pickup, pair.dropoff
            ));
        }
        Ok(())
    }
}

/// One stop of a solved route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Node index into the problem.
    pub node: usize,
    /// Arrival, in seconds after departure.
    pub arrival_secs: u64,
}

/// Errors returned by [`VehicleRoutingSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The problem failed validation.
    #[error("invalid routing problem: {message}")]
    InvalidProblem {
        /// Description of the inconsistency.
        message: String,
    },

    /// The solver could not build its internal model.
    #[error("solver model error: {message}")]
    Model {
        /// Description of the failure.
        message: String,
    },

    /// Network error communicating with a remote solver.
    #[error("network error requesting {url}: {message}")]
    NetworkError {
        /// The URL that was requested.
        url: String,
        /// Description of the network error.
        message: String,
    },

    /// Request to a remote solver timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The URL that was requested.
        url: String,
        /// Timeout duration in seconds.
        timeout_secs: u64,
    },

    /// HTTP error response from a remote solver.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error message or response body excerpt.
        message: String,
    },

    /// Failed to decode a remote solver response.
    #[error("failed to parse solver response: {message}")]
    ParseError {
        /// Description of the parse failure.
        message: String,
    },
}

/// Solve a [`PickupDeliveryProblem`].
///
/// Returns `Ok(None)` when the solver finds no feasible route. Solvers must
/// be `Send + Sync` to be shared across threads.
pub trait VehicleRoutingSolver: Send + Sync {
    /// Solve `problem`, returning the visiting order with arrival times.
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError>;
}

impl<T: VehicleRoutingSolver + ?Sized> VehicleRoutingSolver for Box<T> {
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError> {
        (**self).solve(problem)
    }
}

impl<T: VehicleRoutingSolver + ?Sized> VehicleRoutingSolver for std::sync::Arc<T> {
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError> {
        (**self).solve(problem)
    }
}
