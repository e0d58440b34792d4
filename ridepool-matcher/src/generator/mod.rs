//! Candidate route generation.
//!
//! A [`PathGenerator`] turns an offer's current route and a new pickup and
//! dropoff into a lazy sequence of complete candidate routes. Consumers pull
//! candidates until one validates; each call starts a fresh sequence.

mod insertion;
mod random_topological;

pub use insertion::InsertionPathGenerator;
pub use random_topological::{RandomTopologicalConfig, RandomTopologicalGenerator};

use ridepool_core::PathPoint;

use crate::MatchError;

/// A finite, lazily produced sequence of candidate routes.
pub type CandidatePaths<'a> = Box<dyn Iterator<Item = Vec<PathPoint>> + 'a>;

/// Produces candidate routes serving one extra request.
///
/// Every candidate keeps the first and last point of `path` in place and
/// visits `pickup` before `dropoff`.
pub trait PathGenerator: Send + Sync {
    /// Start a new candidate sequence.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::PathTooShort`] when `path` has fewer than two
    /// points.
    fn generate<'a>(
        &'a self,
        path: &'a [PathPoint],
        pickup: &'a PathPoint,
        dropoff: &'a PathPoint,
    ) -> Result<CandidatePaths<'a>, MatchError>;
}
