use std::sync::Arc;

use log::debug;
use ridepool_core::PathPoint;

use super::PathPlanner;
use crate::generator::PathGenerator;
use crate::selector::PickupDropoffSelector;
use crate::{MatchError, OfferNode, PathValidator, RequestNode};

/// Generates candidate routes and returns the first that validates.
pub struct DefaultPathPlanner {
    selector: Arc<PickupDropoffSelector>,
    generator: Box<dyn PathGenerator>,
    validator: PathValidator,
}

impl DefaultPathPlanner {
    /// Create a planner from its collaborators.
    #[must_use]
    pub fn new(
        selector: Arc<PickupDropoffSelector>,
        generator: Box<dyn PathGenerator>,
        validator: PathValidator,
    ) -> Self {
        Self {
            selector,
            generator,
            validator,
        }
    }
}

impl PathPlanner for DefaultPathPlanner {
    fn find_first_feasible_path(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
    ) -> Result<Option<Vec<PathPoint>>, MatchError> {
        let points = self.selector.select(offer.offer(), request.request())?;
        let candidates =
            self.generator
                .generate(&offer.offer().path, &points.pickup, &points.dropoff)?;
        for mut candidate in candidates {
            if self.validator.validate(offer, request, &mut candidate)? {
                return Ok(Some(candidate));
            }
        }
        debug!(
            "no valid path for offer {} and request {}",
            offer.id(),
            request.id()
        );
        Ok(None)
    }
}

impl std::fmt::Debug for DefaultPathPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPathPlanner")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
