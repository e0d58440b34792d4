use ridepool_core::{ModelError, PointId, PointType, RoutingError, SolverError};
use thiserror::Error;

/// Errors raised while matching offers to requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// The routing engine failed.
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),
    /// The external solver failed.
    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),
    /// An offer, request or path broke a model invariant.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A pruning checker could not reach a verdict.
    #[error("{checker} checker failed: {source}")]
    Checker {
        /// Name of the failing checker.
        checker: &'static str,
        /// Underlying failure.
        source: Box<MatchError>,
    },
    /// A pickup or dropoff is not owned by a request.
    #[error("{point_type:?} point {point} is not owned by a request")]
    OwnerMismatch {
        /// Offending point.
        point: PointId,
        /// Role of the offending point.
        point_type: PointType,
    },
    /// A point is absent from the travel-time matrix built for an offer.
    #[error("offer {offer_id}: point {point} has no travel-time entry")]
    MissingPoint {
        /// Offer whose matrix was queried.
        offer_id: String,
        /// Point that was looked up.
        point: PointId,
    },
    /// The matching named a pair the graph does not contain.
    #[error("no edge between offer {offer_id} and request {request_id}")]
    MissingEdge {
        /// Offer endpoint.
        offer_id: String,
        /// Request endpoint.
        request_id: String,
    },
    /// No pickup or dropoff serving the request was found on a path.
    #[error("offer {offer_id}: path does not serve request {request_id}")]
    MissingPickupDropoff {
        /// Offer whose path was inspected.
        offer_id: String,
        /// Request that should have been served.
        request_id: String,
    },
    /// A matching result could not be built.
    #[error("offer {offer_id}: invalid result: {reason}")]
    InvalidResult {
        /// Offer the result belongs to.
        offer_id: String,
        /// What went wrong.
        reason: String,
    },
    /// A path had fewer than two points.
    #[error("path has {len} points, need at least two")]
    PathTooShort {
        /// Number of points provided.
        len: usize,
    },
    /// The batch contained no offers.
    #[error("no offers to match")]
    NoOffers,
    /// The batch contained no requests.
    #[error("no requests to match")]
    NoRequests,
}

impl MatchError {
    /// Wrap `self` as the failure of the named checker.
    #[must_use]
    pub fn in_checker(self, checker: &'static str) -> Self {
        Self::Checker {
            checker,
            source: Box::new(self),
        }
    }
}
