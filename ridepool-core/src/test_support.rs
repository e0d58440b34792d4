//! Deterministic builders and collaborator doubles used by unit and
//! behaviour tests across the workspace.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    Coordinate, MatchedRequest, Offer, OfferParams, PathPoint, PickupDeliveryProblem,
    PointIdGenerator, PointOwner, PointType, Preference, Profile, Request, RoutingEngine,
    RoutingError, SolverError, TravelTimeMatrix, VehicleRoutingSolver, Visit,
};

/// 2025-01-01T08:00:00Z, the instant every test clock is measured from.
const EPOCH_SECS: i64 = 1_735_718_400;

/// The instant `minutes` after the test epoch.
#[must_use]
pub fn at_minutes(minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH_SECS + minutes * 60, 0).unwrap_or_default()
}

/// A duration of whole minutes.
#[must_use]
pub const fn minutes(value: u64) -> Duration {
    Duration::from_secs(value * 60)
}

/// Build a coordinate, falling back to the origin when out of range.
#[must_use]
pub fn coordinate(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap_or_default()
}

/// A valid single-rider request travelling between `source` and
/// `destination`, open from the epoch for two hours.
#[must_use]
pub fn request(id: &str, source: Coordinate, destination: Coordinate) -> Request {
    Request {
        id: id.to_owned(),
        user_id: format!("rider-{id}"),
        source,
        destination,
        earliest_departure_time: at_minutes(0),
        latest_arrival_time: at_minutes(120),
        max_walking_duration: minutes(10),
        number_of_riders: 1,
        preference: Preference::default(),
    }
}

/// Parameters for an offer from `(0, 0)` to `(0, 0.1)` leaving at the epoch,
/// with capacity three, a 30 minute detour and a two hour window.
#[must_use]
pub fn offer_params(id: &str) -> OfferParams {
    OfferParams {
        id: id.to_owned(),
        user_id: format!("driver-{id}"),
        source: coordinate(0.0, 0.0),
        destination: coordinate(0.0, 0.1),
        departure_time: at_minutes(0),
        max_estimated_arrival_time: at_minutes(120),
        detour: minutes(30),
        capacity: 3,
        preference: Preference::default(),
    }
}

/// An offer built from [`offer_params`] with a direct path.
#[must_use]
pub fn offer(id: &str, ids: &PointIdGenerator) -> Offer {
    offer_from(offer_params(id), ids)
}

/// An offer with a direct path built from `params` without validation.
#[must_use]
pub fn offer_from(params: OfferParams, ids: &PointIdGenerator) -> Offer {
    let owner = PointOwner::Offer {
        offer_id: params.id.clone(),
        user_id: params.user_id.clone(),
    };
    let path = vec![
        PathPoint::new(
            ids.next_id(),
            params.source,
            PointType::Source,
            params.departure_time,
            owner.clone(),
        ),
        PathPoint::new(
            ids.next_id(),
            params.destination,
            PointType::Destination,
            params.max_estimated_arrival_time,
            owner,
        ),
    ];
    Offer {
        id: params.id,
        user_id: params.user_id,
        source: params.source,
        destination: params.destination,
        departure_time: params.departure_time,
        max_estimated_arrival_time: params.max_estimated_arrival_time,
        detour: params.detour,
        capacity: params.capacity,
        preference: params.preference,
        current_number_of_requests: 0,
        matched_requests: Vec::new(),
        path,
    }
}

/// Pickup at the request's source and dropoff at its destination, seeded
/// with the request's earliest departure and latest arrival.
#[must_use]
pub fn request_points(request: &Arc<Request>, ids: &PointIdGenerator) -> (PathPoint, PathPoint) {
    let owner = PointOwner::Request(Arc::clone(request));
    (
        PathPoint::new(
            ids.next_id(),
            request.source,
            PointType::Pickup,
            request.earliest_departure_time,
            owner.clone(),
        ),
        PathPoint::new(
            ids.next_id(),
            request.destination,
            PointType::Dropoff,
            request.latest_arrival_time,
            owner,
        ),
    )
}

/// Place `request` on `offer` immediately before its destination, with the
/// pickup and dropoff expected at `pickup_at` and `dropoff_at`.
pub fn attach_rider(
    offer: &mut Offer,
    request: Request,
    ids: &PointIdGenerator,
    pickup_at: DateTime<Utc>,
    dropoff_at: DateTime<Utc>,
) -> MatchedRequest {
    let rider = Arc::new(request);
    let (mut pickup, mut dropoff) = request_points(&rider, ids);
    pickup.expected_arrival_time = pickup_at;
    dropoff.expected_arrival_time = dropoff_at;
    let at = offer.path.len().saturating_sub(1);
    offer.path.insert(at, dropoff.clone());
    offer.path.insert(at, pickup.clone());
    let matched = MatchedRequest {
        request: rider,
        pickup,
        dropoff,
    };
    offer.matched_requests.push(matched.clone());
    offer.current_number_of_requests = offer.matched_requests.len();
    matched
}

/// Routing double returning pre-configured responses.
///
/// Matrix queries return the configured matrix regardless of the points.
/// Driving-time queries accumulate `matrix[i][i + 1]` along the waypoints by
/// position; missing cells count as zero.
#[derive(Debug, Clone)]
pub struct StubRoutingEngine {
    response: StubResponse,
    walking: Duration,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Matrix(TravelTimeMatrix),
    Error(RoutingError),
}

impl StubRoutingEngine {
    /// Return `matrix` for every non-empty query.
    #[must_use]
    pub const fn with_matrix(matrix: TravelTimeMatrix) -> Self {
        Self {
            response: StubResponse::Matrix(matrix),
            walking: Duration::ZERO,
        }
    }

    /// Fail every non-empty query with `error`.
    #[must_use]
    pub const fn with_error(error: RoutingError) -> Self {
        Self {
            response: StubResponse::Error(error),
            walking: Duration::ZERO,
        }
    }

    /// Report `walking` for every walking-time query.
    #[must_use]
    pub const fn with_walking(mut self, walking: Duration) -> Self {
        self.walking = walking;
        self
    }

    fn matrix(&self) -> Result<&TravelTimeMatrix, RoutingError> {
        match &self.response {
            StubResponse::Matrix(matrix) => Ok(matrix),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

impl RoutingEngine for StubRoutingEngine {
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        _departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError> {
        if waypoints.is_empty() {
            return Err(RoutingError::EmptyInput);
        }
        let matrix = self.matrix()?;
        let mut elapsed = Duration::ZERO;
        Ok((0..waypoints.len())
            .map(|i| {
                if i > 0 {
                    let leg = matrix
                        .get(i - 1)
                        .and_then(|row| row.get(i))
                        .copied()
                        .unwrap_or_default();
                    elapsed += leg;
                }
                elapsed
            })
            .collect())
    }

    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        _profile: Profile,
        _departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError> {
        if points.is_empty() {
            return Err(RoutingError::EmptyInput);
        }
        self.matrix().cloned()
    }

    fn compute_walking_time(
        &self,
        _origin: &Coordinate,
        _destination: &Coordinate,
    ) -> Result<Duration, RoutingError> {
        self.matrix()?;
        Ok(self.walking)
    }

    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
        self.matrix()?;
        Ok(*point)
    }
}

/// Routing double on a Manhattan grid of degrees.
///
/// Travel time between two coordinates is `(|Δlat| + |Δlng|)` multiplied by
/// a per-degree cost, rounded to whole seconds. The default driving cost is
/// 6000 s per degree, so `0.01°` takes one minute; walking is ten times
/// slower. Snapping returns the input point. Matrix calls are counted.
#[derive(Debug, Default)]
pub struct GridRoutingEngine {
    driving_secs_per_degree: Option<f64>,
    walking_secs_per_degree: Option<f64>,
    matrix_calls: AtomicUsize,
}

impl GridRoutingEngine {
    const DEFAULT_DRIVING: f64 = 6_000.0;
    const DEFAULT_WALKING: f64 = 60_000.0;

    /// Engine with the default per-degree costs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-degree walking cost.
    #[must_use]
    pub const fn with_walking_secs_per_degree(mut self, secs: f64) -> Self {
        self.walking_secs_per_degree = Some(secs);
        self
    }

    /// Number of matrix queries served so far.
    #[must_use]
    pub fn matrix_calls(&self) -> usize {
        self.matrix_calls.load(Ordering::Relaxed)
    }

    fn travel(from: &Coordinate, to: &Coordinate, secs_per_degree: f64) -> Duration {
        let degrees = (from.lat() - to.lat()).abs() + (from.lng() - to.lng()).abs();
        Duration::from_secs_f64((degrees * secs_per_degree).round())
    }

    fn driving(&self, from: &Coordinate, to: &Coordinate) -> Duration {
        Self::travel(
            from,
            to,
            self.driving_secs_per_degree.unwrap_or(Self::DEFAULT_DRIVING),
        )
    }

    fn walking(&self, from: &Coordinate, to: &Coordinate) -> Duration {
        Self::travel(
            from,
            to,
            self.walking_secs_per_degree.unwrap_or(Self::DEFAULT_WALKING),
        )
    }
}

impl RoutingEngine for GridRoutingEngine {
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        _departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError> {
        let Some(first) = waypoints.first() else {
            return Err(RoutingError::EmptyInput);
        };
        let mut elapsed = Duration::ZERO;
        let mut previous = first;
        Ok(waypoints
            .iter()
            .map(|point| {
                elapsed += self.driving(previous, point);
                previous = point;
                elapsed
            })
            .collect())
    }

    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        profile: Profile,
        _departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError> {
        if points.is_empty() {
            return Err(RoutingError::EmptyInput);
        }
        self.matrix_calls.fetch_add(1, Ordering::Relaxed);
        Ok(points
            .iter()
            .map(|from| {
                points
                    .iter()
                    .map(|to| match profile {
                        Profile::Driving => self.driving(from, to),
                        Profile::Walking => self.walking(from, to),
                    })
                    .collect()
            })
            .collect())
    }

    fn compute_walking_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Duration, RoutingError> {
        Ok(self.walking(origin, destination))
    }

    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
        Ok(*point)
    }
}

/// Solver double returning a fixed outcome and recording the last problem.
#[derive(Debug)]
pub struct StubSolver {
    outcome: Result<Option<Vec<Visit>>, SolverError>,
    last_problem: Mutex<Option<PickupDeliveryProblem>>,
}

impl StubSolver {
    /// Return `route` for every problem.
    #[must_use]
    pub const fn with_route(route: Vec<Visit>) -> Self {
        Self::with_outcome(Ok(Some(route)))
    }

    /// Report every problem as infeasible.
    #[must_use]
    pub const fn infeasible() -> Self {
        Self::with_outcome(Ok(None))
    }

    /// Fail every problem with `error`.
    #[must_use]
    pub const fn with_error(error: SolverError) -> Self {
        Self::with_outcome(Err(error))
    }

    const fn with_outcome(outcome: Result<Option<Vec<Visit>>, SolverError>) -> Self {
        Self {
            outcome,
            last_problem: Mutex::new(None),
        }
    }

    /// The most recent problem passed to [`VehicleRoutingSolver::solve`].
    #[must_use]
    pub fn last_problem(&self) -> Option<PickupDeliveryProblem> {
        self.last_problem
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl VehicleRoutingSolver for StubSolver {
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError> {
        *self
            .last_problem
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(problem.clone());
        self.outcome.clone()
    }
}
