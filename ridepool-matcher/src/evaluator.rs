//! Edge evaluation for the feasibility graph.

use ridepool_core::PathPoint;

use crate::checker::{Checker, PreferenceChecker};
use crate::planner::PathPlanner;
use crate::{MatchError, OfferNode, RequestNode};

/// Decides whether an offer and request pair becomes a graph edge.
///
/// Preferences are checked again because the offer may have accepted new
/// riders since pruning.
pub struct MatchEvaluator {
    preference: PreferenceChecker,
    planner: Box<dyn PathPlanner>,
}

impl MatchEvaluator {
    /// Create an evaluator searching routes with `planner`.
    #[must_use]
    pub fn new(planner: Box<dyn PathPlanner>) -> Self {
        Self {
            preference: PreferenceChecker,
            planner,
        }
    }

    /// The route serving `request` on `offer`, if the pair is feasible.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::PathTooShort`] when the planner reports a
    /// route of fewer than two points, and planner failures otherwise.
    pub fn evaluate(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
    ) -> Result<Option<Vec<PathPoint>>, MatchError> {
        if !self.preference.check(offer, request)? {
            return Ok(None);
        }
        let found = self.planner.find_first_feasible_path(offer, request)?;
        if let Some(path) = &found
            && path.len() < 2
        {
            return Err(MatchError::PathTooShort { len: path.len() });
        }
        Ok(found)
    }
}

impl std::fmt::Debug for MatchEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEvaluator").finish_non_exhaustive()
    }
}
