//! Route search delegated to an external pickup-and-delivery solver.
//!
//! The offer's current stops and the new pickup and dropoff become solver
//! nodes: the source first, the destination last. Travel times and windows
//! are whole seconds after the offer's departure. The solver's visiting
//! order is mapped back onto the original points with their arrival times.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use ridepool_core::time::{advance, elapsed_secs};
use ridepool_core::{
    Offer, PathPoint, PickupDeliveryProblem, PickupDropoffPair, PointOwner, PointType,
    SolverTimeWindow, VehicleRoutingSolver,
};

use super::PathPlanner;
use crate::selector::PickupDropoffSelector;
use crate::time_matrix::TimeMatrixService;
use crate::{MatchError, OfferNode, RequestNode};

/// Path planner backed by a [`VehicleRoutingSolver`].
pub struct SolverPathPlanner<S> {
    selector: Arc<PickupDropoffSelector>,
    time_matrix: Arc<TimeMatrixService>,
    solver: S,
}

impl<S: VehicleRoutingSolver> SolverPathPlanner<S> {
    /// Create a planner handing problems to `solver`.
    #[must_use]
    pub const fn new(
        selector: Arc<PickupDropoffSelector>,
        time_matrix: Arc<TimeMatrixService>,
        solver: S,
    ) -> Self {
        Self {
            selector,
            time_matrix,
            solver,
        }
    }

    fn nodes(offer: &Offer, pickup: PathPoint, dropoff: PathPoint) -> Result<Vec<PathPoint>, MatchError> {
        let (Some(first), Some(last)) = (offer.path.first(), offer.path.last()) else {
            return Err(MatchError::PathTooShort {
                len: offer.path.len(),
            });
        };
        if offer.path.len() < 2 {
            return Err(MatchError::PathTooShort {
                len: offer.path.len(),
            });
        }
        let interior = offer.path.get(1..offer.path.len() - 1).unwrap_or_default();
        let mut nodes = Vec::with_capacity(offer.path.len() + 2);
        nodes.push(first.clone());
        nodes.extend(interior.iter().cloned());
        nodes.push(pickup);
        nodes.push(dropoff);
        nodes.push(last.clone());
        Ok(nodes)
    }

    fn problem(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
        nodes: &[PathPoint],
    ) -> Result<PickupDeliveryProblem, MatchError> {
        let driver = offer.offer();
        let departure = driver.departure_time;
        let horizon = elapsed_secs(departure, driver.max_estimated_arrival_time);

        let mut time_matrix = Vec::with_capacity(nodes.len());
        for from in nodes {
            let row = nodes
                .iter()
                .map(|to| {
                    self.time_matrix
                        .duration(driver, request.request(), from, to)
                        .map(|duration| duration.as_secs())
                })
                .collect::<Result<Vec<_>, _>>()?;
            time_matrix.push(row);
        }

        let time_windows = nodes
            .iter()
            .map(|point| match &point.owner {
                PointOwner::Request(rider) => SolverTimeWindow {
                    start: elapsed_secs(departure, rider.earliest_departure_time),
                    end: elapsed_secs(departure, rider.latest_arrival_time),
                },
                PointOwner::Offer { .. } => SolverTimeWindow {
                    start: 0,
                    end: horizon,
                },
            })
            .collect();

        let demands = nodes
            .iter()
            .map(|point| {
                let riders = point
                    .request()
                    .map_or(0, |rider| i64::from(rider.number_of_riders));
                match point.point_type {
                    PointType::Pickup => riders,
                    PointType::Dropoff => -riders,
                    PointType::Source | PointType::Destination => 0,
                }
            })
            .collect();

        let pickups_and_dropoffs = nodes
            .iter()
            .enumerate()
            .filter(|(_, point)| point.point_type == PointType::Pickup)
            .filter_map(|(pickup, point)| {
                nodes
                    .iter()
                    .position(|candidate| {
                        candidate.point_type == PointType::Dropoff
                            && candidate.owner.id() == point.owner.id()
                    })
                    .map(|dropoff| PickupDropoffPair { pickup, dropoff })
            })
            .collect();

        Ok(PickupDeliveryProblem {
            time_matrix,
            time_windows,
            demands,
            vehicle_capacity: driver.capacity,
            pickups_and_dropoffs,
            max_route_duration: horizon,
        })
    }
}

impl<S: VehicleRoutingSolver> PathPlanner for SolverPathPlanner<S> {
    fn find_first_feasible_path(
        &self,
        offer: &OfferNode,
        request: &RequestNode,
    ) -> Result<Option<Vec<PathPoint>>, MatchError> {
        let points = self.selector.select(offer.offer(), request.request())?;
        let nodes = Self::nodes(offer.offer(), points.pickup, points.dropoff)?;
        let problem = self.problem(offer, request, &nodes)?;
        let Some(visits) = self.solver.solve(&problem)? else {
            debug!(
                "solver found no route for offer {} and request {}",
                offer.id(),
                request.id()
            );
            return Ok(None);
        };
        if visits.len() != nodes.len() {
            return Err(MatchError::InvalidResult {
                offer_id: offer.id().to_owned(),
                reason: format!(
                    "solver visited {} of {} nodes",
                    visits.len(),
                    nodes.len()
                ),
            });
        }
        let departure = offer.offer().departure_time;
        visits
            .iter()
            .map(|visit| {
                let mut point =
                    nodes
                        .get(visit.node)
                        .cloned()
                        .ok_or_else(|| MatchError::InvalidResult {
                            offer_id: offer.id().to_owned(),
                            reason: format!("solver returned unknown node {}", visit.node),
                        })?;
                point.expected_arrival_time =
                    advance(departure, Duration::from_secs(visit.arrival_secs));
                Ok(point)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

impl<S> std::fmt::Debug for SolverPathPlanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverPathPlanner")
            .field("time_matrix", &self.time_matrix)
            .finish_non_exhaustive()
    }
}
