//! Early pruning of offer and request pairs.
//!
//! A [`Checker`] answers a cheap yes/no question about a pair before any
//! route search happens. A `false` answer silently drops the pair; an error
//! aborts the run.

mod capacity;
mod composite;
mod detour;
mod haversine;
mod overlap;
mod preference;
mod pruner;

pub use capacity::CapacityChecker;
pub use composite::CompositeChecker;
pub use detour::DetourTimeChecker;
pub use haversine::HaversineChecker;
pub use overlap::OverlapChecker;
pub use preference::PreferenceChecker;
pub use pruner::{CandidatePruner, Candidates};

use crate::{MatchError, OfferNode, RequestNode};

/// A side-effect-free compatibility test for one pair.
pub trait Checker: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether `request` may still be served by `offer`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when a collaborator needed for the verdict
    /// fails.
    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError>;
}
