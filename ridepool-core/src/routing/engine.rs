//! The routing collaborator trait and its value types.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::Coordinate;

use super::error::RoutingError;

/// Square matrix of travel durations; `matrix[i][j]` is the time from the
/// i-th to the j-th point.
pub type TravelTimeMatrix = Vec<Vec<Duration>>;

/// Travel mode for matrix queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    /// By car.
    #[default]
    Driving,
    /// On foot.
    Walking,
}

impl Profile {
    /// Routing profile name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
        }
    }
}

/// Area reachable from a centre within a time budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Isochrone {
    /// Origin of the isochrone.
    pub center: Coordinate,
    /// Travel budget.
    pub duration: Duration,
    /// Boundary ring, in order.
    pub boundary: Vec<Coordinate>,
}

/// Road-network queries needed by the matcher.
///
/// Implementations must be deterministic for a fixed input so that matching
/// runs are reproducible.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::{DateTime, Utc};
/// use ridepool_core::{Coordinate, Profile, RoutingEngine, RoutingError, TravelTimeMatrix};
///
/// struct MinutePerHop;
///
/// impl RoutingEngine for MinutePerHop {
///     fn compute_driving_time(
///         &self,
///         waypoints: &[Coordinate],
///         _departure: DateTime<Utc>,
///     ) -> Result<Vec<Duration>, RoutingError> {
///         if waypoints.is_empty() {
///             return Err(RoutingError::EmptyInput);
///         }
///         Ok((0..waypoints.len())
///             .map(|hops| Duration::from_secs(60 * hops as u64))
///             .collect())
///     }
///
///     fn compute_distance_time_matrix(
///         &self,
///         points: &[Coordinate],
///         _profile: Profile,
///         _departure: DateTime<Utc>,
///     ) -> Result<TravelTimeMatrix, RoutingError> {
///         let n = points.len();
///         Ok(vec![vec![Duration::from_secs(60); n]; n])
///     }
///
///     fn compute_walking_time(
///         &self,
///         _origin: &Coordinate,
///         _destination: &Coordinate,
///     ) -> Result<Duration, RoutingError> {
///         Ok(Duration::from_secs(120))
///     }
///
///     fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
///         Ok(*point)
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let points = [Coordinate::new(0.0, 0.0)?, Coordinate::new(0.0, 0.1)?];
/// let cumulative = MinutePerHop.compute_driving_time(&points, Utc::now())?;
/// assert_eq!(cumulative, vec![Duration::ZERO, Duration::from_secs(60)]);
/// # Ok(())
/// # }
/// ```
pub trait RoutingEngine: Send + Sync {
    /// Cumulative driving durations along `waypoints` leaving at `departure`.
    ///
    /// The result has one entry per waypoint and starts at zero.
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError>;

    /// Pairwise travel durations between `points`.
    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        profile: Profile,
        departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError>;

    /// Walking duration from `origin` to `destination`.
    fn compute_walking_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Duration, RoutingError>;

    /// Nearest point on the road network.
    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError>;

    /// Area reachable from `center` within `budget`.
    ///
    /// The default implementation reports the operation as unsupported.
    fn compute_isochrone(
        &self,
        center: &Coordinate,
        profile: Profile,
        budget: Duration,
    ) -> Result<Isochrone, RoutingError> {
        let _ = (center, profile, budget);
        Err(RoutingError::Unsupported {
            operation: "compute_isochrone",
        })
    }
}

impl<T: RoutingEngine + ?Sized> RoutingEngine for Arc<T> {
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError> {
        (**self).compute_driving_time(waypoints, departure)
    }

    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        profile: Profile,
        departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError> {
        (**self).compute_distance_time_matrix(points, profile, departure)
    }

    fn compute_walking_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Duration, RoutingError> {
        (**self).compute_walking_time(origin, destination)
    }

    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
        (**self).snap_point_to_road(point)
    }

    fn compute_isochrone(
        &self,
        center: &Coordinate,
        profile: Profile,
        budget: Duration,
    ) -> Result<Isochrone, RoutingError> {
        (**self).compute_isochrone(center, profile, budget)
    }
}
