//! Feasibility check for one candidate route.

use std::sync::Arc;
use std::time::Duration;

use ridepool_core::time::{advance, rewind, saturating_elapsed};
use ridepool_core::{PathPoint, PointType, Request};

use crate::time_matrix::TimeMatrixService;
use crate::{MatchError, OfferNode, RequestNode};

/// Validates candidate routes against detour, capacity and time windows.
#[derive(Debug, Clone)]
pub struct PathValidator {
    time_matrix: Arc<TimeMatrixService>,
}

fn rider(point: &PathPoint) -> Result<Arc<Request>, MatchError> {
    point
        .request()
        .cloned()
        .ok_or(MatchError::OwnerMismatch {
            point: point.id,
            point_type: point.point_type,
        })
}

impl PathValidator {
    /// Create a validator reading travel times from `time_matrix`.
    #[must_use]
    pub const fn new(time_matrix: Arc<TimeMatrixService>) -> Self {
        Self { time_matrix }
    }

    /// Whether `path` is a feasible route for `offer` once `request` joins.
    ///
    /// The total driving time may exceed the direct trip by at most the
    /// offer's detour. Walking the route in order, the riders on board never
    /// exceed capacity, the driver reaches each pickup no earlier than the
    /// rider's earliest departure plus walk, waiting when early, and reaches
    /// each dropoff no later than the rider's latest arrival less walk.
    /// Waiting delays every later stop and comes out of the unused detour.
    /// Time bounds are inclusive.
    ///
    /// Expected arrival times are written into `path` as the walk proceeds,
    /// so a rejected path is left partially updated and must be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::PathTooShort`] for paths under two points,
    /// [`MatchError::OwnerMismatch`] for a pickup or dropoff not owned by a
    /// request, and travel-time failures from the matrix service.
    pub fn validate(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
        path: &mut [PathPoint],
    ) -> Result<bool, MatchError> {
        let driver = offer.offer();
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(MatchError::PathTooShort { len: path.len() });
        };
        if path.len() < 2 {
            return Err(MatchError::PathTooShort { len: path.len() });
        }
        let cumulative =
            self.time_matrix
                .cumulative_durations(driver, request.request(), path)?;
        let direct = self
            .time_matrix
            .duration(driver, request.request(), first, last)?;
        let total = cumulative.last().copied().unwrap_or_default();
        let detour = total.saturating_sub(direct);
        if detour > driver.detour {
            return Ok(false);
        }

        let mut spare = driver.detour.saturating_sub(detour);
        let mut waited = Duration::ZERO;
        let mut on_board = 0_u32;
        for (point, elapsed) in path.iter_mut().zip(cumulative) {
            let arrival = advance(driver.departure_time, elapsed.saturating_add(waited));
            match point.point_type {
                PointType::Pickup => {
                    let rider = rider(point)?;
                    on_board = on_board.saturating_add(rider.number_of_riders);
                    if on_board > driver.capacity {
                        return Ok(false);
                    }
                    let ready = advance(rider.earliest_departure_time, point.walking_duration);
                    if arrival < ready {
                        let wait = saturating_elapsed(arrival, ready);
                        if wait > spare {
                            return Ok(false);
                        }
                        spare -= wait;
                        waited = waited.saturating_add(wait);
                        point.expected_arrival_time = ready;
                    } else {
                        point.expected_arrival_time = arrival;
                    }
                }
                PointType::Dropoff => {
                    let rider = rider(point)?;
                    if arrival > rewind(rider.latest_arrival_time, point.walking_duration) {
                        return Ok(false);
                    }
                    on_board = on_board.saturating_sub(rider.number_of_riders);
                    point.expected_arrival_time = arrival;
                }
                // Includes the waits accumulated at earlier pickups.
                PointType::Destination => point.expected_arrival_time = arrival,
                PointType::Source => {}
            }
        }
        Ok(true)
    }
}
