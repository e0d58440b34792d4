use std::iter;

use ridepool_core::PathPoint;

use super::{CandidatePaths, PathGenerator};
use crate::MatchError;

/// Exhaustive insertion of the pickup and dropoff into the current route.
///
/// Candidates are produced in increasing pickup position, then increasing
/// dropoff position, with the dropoff inserted at or after the pickup. The
/// scan from the end of the route stops both positions before any stop the
/// driver is expected to reach after the rider's target time.
///
/// # Examples
///
/// ```
/// use ridepool_core::test_support::{offer, request, request_points, coordinate};
/// use ridepool_core::PointIdGenerator;
/// use ridepool_matcher::{InsertionPathGenerator, PathGenerator};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), ridepool_matcher::MatchError> {
/// let ids = PointIdGenerator::new();
/// let driver = offer("o1", &ids);
/// let rider = Arc::new(request("r1", coordinate(0.0, 0.02), coordinate(0.0, 0.04)));
/// let (pickup, dropoff) = request_points(&rider, &ids);
/// let generator = InsertionPathGenerator::new();
/// let candidates: Vec<_> = generator.generate(&driver.path, &pickup, &dropoff)?.collect();
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates[0].len(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertionPathGenerator;

impl InsertionPathGenerator {
    /// Create the generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highest pickup and dropoff insertion positions for `path`.
    ///
    /// Both start just before the final point. Scanning backwards over the
    /// interior points, a point expected after the dropoff's target lowers
    /// the dropoff bound to its own position minus one, and the first point
    /// expected after the pickup's target lowers the pickup bound likewise
    /// and ends the scan.
    #[must_use]
    pub fn bounds(path: &[PathPoint], pickup: &PathPoint, dropoff: &PathPoint) -> (usize, usize) {
        let last = path.len().saturating_sub(1);
        let mut upper_pickup = last;
        let mut upper_dropoff = last;
        for (position, point) in path.iter().enumerate().take(last).skip(1).rev() {
            if point.expected_arrival_time > dropoff.expected_arrival_time {
                upper_dropoff = position - 1;
            }
            if point.expected_arrival_time > pickup.expected_arrival_time {
                upper_pickup = position - 1;
                break;
            }
        }
        (upper_pickup, upper_dropoff)
    }
}

fn splice(
    path: &[PathPoint],
    pickup: &PathPoint,
    dropoff: &PathPoint,
    pickup_at: usize,
    dropoff_at: usize,
) -> Vec<PathPoint> {
    path.iter()
        .take(pickup_at)
        .cloned()
        .chain(iter::once(pickup.clone()))
        .chain(path.iter().skip(pickup_at).take(dropoff_at - pickup_at).cloned())
        .chain(iter::once(dropoff.clone()))
        .chain(path.iter().skip(dropoff_at).cloned())
        .collect()
}

impl PathGenerator for InsertionPathGenerator {
    fn generate<'a>(
        &'a self,
        path: &'a [PathPoint],
        pickup: &'a PathPoint,
        dropoff: &'a PathPoint,
    ) -> Result<CandidatePaths<'a>, MatchError> {
        if path.len() < 2 {
            return Err(MatchError::PathTooShort { len: path.len() });
        }
        let (upper_pickup, upper_dropoff) = Self::bounds(path, pickup, dropoff);
        Ok(Box::new((1..=upper_pickup).flat_map(move |pickup_at| {
            (pickup_at..=upper_dropoff)
                .map(move |dropoff_at| splice(path, pickup, dropoff, pickup_at, dropoff_at))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::test_support::{
        at_minutes, attach_rider, coordinate, offer, request, request_points,
    };
    use ridepool_core::{PointIdGenerator, PointType};
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    struct Route {
        path: Vec<PathPoint>,
        ids: PointIdGenerator,
    }

    #[fixture]
    fn route() -> Route {
        let ids = PointIdGenerator::new();
        let mut driver = offer("o1", &ids);
        attach_rider(
            &mut driver,
            request("r0", coordinate(0.0, 0.02), coordinate(0.0, 0.04)),
            &ids,
            at_minutes(10),
            at_minutes(20),
        );
        Route {
            path: driver.path,
            ids,
        }
    }

    fn points(ids: &PointIdGenerator, pickup_at: i64, dropoff_at: i64) -> (PathPoint, PathPoint) {
        let rider = Arc::new(request("r1", coordinate(0.0, 0.05), coordinate(0.0, 0.06)));
        let (mut pickup, mut dropoff) = request_points(&rider, ids);
        pickup.expected_arrival_time = at_minutes(pickup_at);
        dropoff.expected_arrival_time = at_minutes(dropoff_at);
        (pickup, dropoff)
    }

    fn positions(candidate: &[PathPoint]) -> (usize, usize) {
        let find = |kind| {
            candidate
                .iter()
                .position(|p| p.point_type == kind && p.owner.id() == "r1")
                .unwrap_or(usize::MAX)
        };
        (find(PointType::Pickup), find(PointType::Dropoff))
    }

    #[rstest]
    fn enumerates_every_slot_when_unbounded(route: Route) {
        let (pickup, dropoff) = points(&route.ids, 30, 60);
        let slots: Vec<_> = InsertionPathGenerator::new()
            .generate(&route.path, &pickup, &dropoff)
            .expect("four point route")
            .map(|candidate| positions(&candidate))
            .collect();
        assert_eq!(
            slots,
            [(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)]
        );
    }

    #[rstest]
    fn early_pickup_goes_before_later_stops(route: Route) {
        let (pickup, dropoff) = points(&route.ids, 5, 60);
        assert_eq!(
            InsertionPathGenerator::bounds(&route.path, &pickup, &dropoff),
            (1, 3)
        );
    }

    #[rstest]
    fn early_dropoff_bounds_both_positions(route: Route) {
        let (pickup, dropoff) = points(&route.ids, 15, 15);
        assert_eq!(
            InsertionPathGenerator::bounds(&route.path, &pickup, &dropoff),
            (1, 1)
        );
    }

    #[rstest]
    fn keeps_route_ends_in_place(route: Route) {
        let (pickup, dropoff) = points(&route.ids, 30, 60);
        for candidate in InsertionPathGenerator::new()
            .generate(&route.path, &pickup, &dropoff)
            .expect("four point route")
        {
            assert_eq!(candidate.first(), route.path.first());
            assert_eq!(candidate.last(), route.path.last());
            assert_eq!(candidate.len(), route.path.len() + 2);
        }
    }

    #[rstest]
    fn rejects_degenerate_routes(route: Route) {
        let (pickup, dropoff) = points(&route.ids, 30, 60);
        let short = route.path.get(..1).expect("non-empty");
        assert!(matches!(
            InsertionPathGenerator::new().generate(short, &pickup, &dropoff),
            Err(MatchError::PathTooShort { len: 1 })
        ));
    }
}
