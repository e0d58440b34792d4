//! Route search for a single offer and request.

mod default;
mod solver;

pub use default::DefaultPathPlanner;
pub use solver::SolverPathPlanner;

use ridepool_core::PathPoint;

use crate::{MatchError, OfferNode, RequestNode};

/// Finds a feasible route serving one more request.
pub trait PathPlanner: Send + Sync {
    /// The first feasible route for `request` on `offer`, or `None` when
    /// the search finds none.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when a collaborator fails or the search hits
    /// an internal inconsistency.
    fn find_first_feasible_path(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
    ) -> Result<Option<Vec<PathPoint>>, MatchError>;
}
