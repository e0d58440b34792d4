use std::time::Duration;

use ridepool_core::time::advance;

use super::Checker;
use crate::{MatchError, OfferNode, RequestNode};

/// Straight-line feasibility estimate at a constant driving speed.
///
/// The driver must reach the rider's destination, going through the rider's
/// source, before the rider's latest arrival. The straight-line trip through
/// both rider points must also be no longer than the direct trip plus the
/// distance the detour budget allows.
#[derive(Debug, Clone, Copy)]
pub struct HaversineChecker {
    speed_kmh: f64,
}

impl Default for HaversineChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HaversineChecker {
    /// Default estimated driving speed.
    pub const DEFAULT_SPEED_KMH: f64 = 27.0;

    /// Create a checker at the default speed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed_kmh: Self::DEFAULT_SPEED_KMH,
        }
    }

    /// Create a checker assuming `speed_kmh`.
    #[must_use]
    pub const fn with_speed_kmh(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl Checker for HaversineChecker {
    fn name(&self) -> &'static str {
        "haversine"
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "straight-line estimates combine distances and speeds"
    )]
    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        let offer = offer.offer();
        let rider = request.request();
        let to_rider = offer.source.haversine_km(&rider.source);
        let riding = rider.source.haversine_km(&rider.destination);
        let to_end = rider.destination.haversine_km(&offer.destination);

        let hours = (to_rider + riding) / self.speed_kmh;
        let eta = Duration::try_from_secs_f64(hours * 3_600.0).unwrap_or(Duration::MAX);
        if advance(offer.departure_time, eta) > rider.latest_arrival_time {
            return Ok(false);
        }

        let direct = offer.source.haversine_km(&offer.destination);
        let allowance = offer.detour.as_secs_f64() / 3_600.0 * self.speed_kmh;
        Ok(to_rider + riding + to_end <= direct + allowance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::test_support::{at_minutes, coordinate, offer, offer_params, offer_from, request};
    use ridepool_core::PointIdGenerator;
    use rstest::rstest;
    use std::sync::Arc;

    fn node() -> OfferNode {
        let ids = PointIdGenerator::new();
        let mut params = offer_params("o1");
        // Roughly 11 km due east.
        params.destination = coordinate(0.0, 0.1);
        OfferNode::new(offer_from(params, &ids))
    }

    #[rstest]
    fn accepts_riders_along_the_way() {
        let rider = request("r1", coordinate(0.0, 0.02), coordinate(0.0, 0.08));
        let verdict = HaversineChecker::new().check(&node(), &RequestNode::new(Arc::new(rider)));
        assert_eq!(verdict, Ok(true));
    }

    #[rstest]
    fn rejects_distant_riders() {
        // A 50 km excursion cannot fit in a 30 minute detour at 27 km/h.
        let rider = request("r1", coordinate(0.45, 0.0), coordinate(0.45, 0.1));
        let verdict = HaversineChecker::new().check(&node(), &RequestNode::new(Arc::new(rider)));
        assert_eq!(verdict, Ok(false));
    }

    #[rstest]
    fn rejects_unreachable_deadlines() {
        let mut rider = request("r1", coordinate(0.0, 0.02), coordinate(0.0, 0.08));
        // About 9 km of driving needs roughly 20 minutes at 27 km/h.
        rider.latest_arrival_time = at_minutes(10);
        let ids = PointIdGenerator::new();
        let verdict = HaversineChecker::new().check(
            &OfferNode::new(offer("o1", &ids)),
            &RequestNode::new(Arc::new(rider)),
        );
        assert_eq!(verdict, Ok(false));
    }
}
