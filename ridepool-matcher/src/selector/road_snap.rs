use std::sync::Arc;

use ridepool_core::{Offer, PathPoint, PointIdGenerator, PointOwner, PointType, Request};

use super::{PickupDropoff, PickupDropoffGenerator};
use crate::{MatchError, SharedRoutingEngine};

/// Boards and drops riders at the road positions nearest their own origin
/// and destination.
pub struct RoadSnapGenerator {
    engine: SharedRoutingEngine,
}

impl RoadSnapGenerator {
    /// Create a generator snapping through `engine`.
    #[must_use]
    pub const fn new(engine: SharedRoutingEngine) -> Self {
        Self { engine }
    }
}

impl PickupDropoffGenerator for RoadSnapGenerator {
    fn generate(
        &self,
        _offer: &Offer,
        request: &Arc<Request>,
        ids: &PointIdGenerator,
    ) -> Result<PickupDropoff, MatchError> {
        let pickup = self.engine.snap_point_to_road(&request.source)?;
        let dropoff = self.engine.snap_point_to_road(&request.destination)?;
        let owner = PointOwner::Request(Arc::clone(request));
        Ok(PickupDropoff {
            pickup: PathPoint::new(
                ids.next_id(),
                pickup,
                PointType::Pickup,
                request.earliest_departure_time,
                owner.clone(),
            ),
            dropoff: PathPoint::new(
                ids.next_id(),
                dropoff,
                PointType::Dropoff,
                request.latest_arrival_time,
                owner,
            ),
        })
    }
}
