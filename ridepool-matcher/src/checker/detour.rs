use std::sync::Arc;

use ridepool_core::RoutingError;
use ridepool_core::time::{advance, rewind, saturating_elapsed};

use super::Checker;
use crate::selector::PickupDropoffSelector;
use crate::{MatchError, OfferNode, RequestNode, SharedRoutingEngine};

/// Rejects pairs that fail even when the rider is the only stop.
///
/// Drives `source → pickup → dropoff → destination` in one routing query
/// and rejects the pair when the driver would wait at the pickup for longer
/// than the detour budget, reach the dropoff after the rider's latest
/// arrival less the walk, or finish after the offer's latest arrival.
pub struct DetourTimeChecker {
    selector: Arc<PickupDropoffSelector>,
    engine: SharedRoutingEngine,
}

impl DetourTimeChecker {
    /// Create a checker selecting points through `selector`.
    #[must_use]
    pub const fn new(selector: Arc<PickupDropoffSelector>, engine: SharedRoutingEngine) -> Self {
        Self { selector, engine }
    }
}

impl Checker for DetourTimeChecker {
    fn name(&self) -> &'static str {
        "detour time"
    }

    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        let offer = offer.offer();
        let rider = request.request();
        let points = self.selector.select(offer, rider)?;
        let waypoints = [
            offer.source,
            points.pickup.coordinate,
            points.dropoff.coordinate,
            offer.destination,
        ];
        let cumulative = self
            .engine
            .compute_driving_time(&waypoints, offer.departure_time)?;
        let &[_, to_pickup, to_dropoff, to_destination] = cumulative.as_slice() else {
            return Err(RoutingError::ParseError {
                message: format!("expected 4 cumulative durations, got {}", cumulative.len()),
            }
            .into());
        };

        let ready = advance(rider.earliest_departure_time, points.pickup.walking_duration);
        let wait = saturating_elapsed(advance(offer.departure_time, to_pickup), ready);
        if wait > offer.detour {
            return Ok(false);
        }
        let dropoff = advance(offer.departure_time, to_dropoff.saturating_add(wait));
        if dropoff > rewind(rider.latest_arrival_time, points.dropoff.walking_duration) {
            return Ok(false);
        }
        let finish = advance(offer.departure_time, to_destination.saturating_add(wait));
        Ok(finish <= offer.max_estimated_arrival_time)
    }
}

impl std::fmt::Debug for DetourTimeChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetourTimeChecker")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
