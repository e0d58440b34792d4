use std::sync::Arc;
use std::time::Duration;

use ridepool_core::{Coordinate, Offer, PathPoint, PointIdGenerator, PointOwner, PointType, Request};

use super::{PickupDropoff, PickupDropoffGenerator};
use crate::{MatchError, SharedRoutingEngine};

/// Boards and drops riders at the stop of the offer's current route nearest
/// to them, when they can walk there.
///
/// Walking time is estimated from the straight-line distance at
/// `walking_speed_kmh`. When the nearest stop is beyond the rider's maximum
/// walk, the rider's own location is snapped to the road instead.
pub struct RouteProximityGenerator {
    engine: SharedRoutingEngine,
    walking_speed_kmh: f64,
}

impl RouteProximityGenerator {
    /// Default walking speed.
    pub const DEFAULT_WALKING_SPEED_KMH: f64 = 5.0;

    /// Create a generator at the default walking speed.
    #[must_use]
    pub const fn new(engine: SharedRoutingEngine) -> Self {
        Self {
            engine,
            walking_speed_kmh: Self::DEFAULT_WALKING_SPEED_KMH,
        }
    }

    /// Override the walking speed.
    #[must_use]
    pub const fn with_walking_speed_kmh(mut self, walking_speed_kmh: f64) -> Self {
        self.walking_speed_kmh = walking_speed_kmh;
        self
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "walking estimates divide distance by speed"
    )]
    fn estimated_walk(&self, from: &Coordinate, to: &Coordinate) -> Duration {
        let hours = from.haversine_km(to) / self.walking_speed_kmh;
        Duration::try_from_secs_f64(hours * 3_600.0).unwrap_or(Duration::MAX)
    }

    fn nearest_on_route(
        &self,
        path: &[PathPoint],
        target: &Coordinate,
        max_walk: Duration,
    ) -> Result<Coordinate, MatchError> {
        let nearest = path
            .iter()
            .map(|point| (self.estimated_walk(target, &point.coordinate), point.coordinate))
            .min_by_key(|(walk, _)| *walk);
        match nearest {
            Some((walk, coordinate)) if walk <= max_walk => Ok(coordinate),
            _ => Ok(self.engine.snap_point_to_road(target)?),
        }
    }
}

impl PickupDropoffGenerator for RouteProximityGenerator {
    fn generate(
        &self,
        offer: &Offer,
        request: &Arc<Request>,
        ids: &PointIdGenerator,
    ) -> Result<PickupDropoff, MatchError> {
        let pickup =
            self.nearest_on_route(&offer.path, &request.source, request.max_walking_duration)?;
        let dropoff = self.nearest_on_route(
            &offer.path,
            &request.destination,
            request.max_walking_duration,
        )?;
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
