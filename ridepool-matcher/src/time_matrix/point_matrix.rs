use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ridepool_core::{PathPoint, PointId, Profile, RoutingEngine, RoutingError, TravelTimeMatrix};

use crate::MatchError;

/// A square driving-time matrix addressed by [`PointId`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointTimeMatrix {
    matrix: TravelTimeMatrix,
    index: HashMap<PointId, usize>,
}

impl PointTimeMatrix {
    /// Query `engine` for the driving times between `points`.
    ///
    /// Repeated point ids are queried once.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Routing`] when the query fails or the engine
    /// answers with a matrix of the wrong shape.
    pub fn build(
        engine: &dyn RoutingEngine,
        points: &[PathPoint],
        departure: DateTime<Utc>,
    ) -> Result<Self, MatchError> {
        let mut index = HashMap::with_capacity(points.len());
        let mut coordinates = Vec::with_capacity(points.len());
        for point in points {
            if !index.contains_key(&point.id) {
                index.insert(point.id, coordinates.len());
                coordinates.push(point.coordinate);
            }
        }
        let matrix =
            engine.compute_distance_time_matrix(&coordinates, Profile::Driving, departure)?;
        let size = coordinates.len();
        if matrix.len() != size || matrix.iter().any(|row| row.len() != size) {
            return Err(RoutingError::ParseError {
                message: format!("expected a {size}x{size} travel-time matrix"),
            }
            .into());
        }
        Ok(Self { matrix, index })
    }

    /// Driving time from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingPoint`] when either point is not in the
    /// matrix.
    pub fn duration(&self, offer_id: &str, from: PointId, to: PointId) -> Result<Duration, MatchError> {
        let position = |point: PointId| {
            self.index
                .get(&point)
                .copied()
                .ok_or_else(|| MatchError::MissingPoint {
                    offer_id: offer_id.to_owned(),
                    point,
                })
        };
        let (row, column) = (position(from)?, position(to)?);
        self.matrix
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .ok_or_else(|| MatchError::MissingPoint {
                offer_id: offer_id.to_owned(),
                point: to,
            })
    }

    /// Whether `point` has an entry.
    #[must_use]
    pub fn contains(&self, point: PointId) -> bool {
        self.index.contains_key(&point)
    }

    /// Whether every point in `points` has an entry.
    #[must_use]
    pub fn covers(&self, points: &[PathPoint]) -> bool {
        points.iter().all(|point| self.contains(point.id))
    }

    /// Number of distinct points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    /// Whether the matrix has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::PointIdGenerator;
    use ridepool_core::test_support::{StubRoutingEngine, at_minutes, minutes, offer};
    use rstest::rstest;

    #[rstest]
    fn rejects_misshapen_matrices() {
        let ids = PointIdGenerator::new();
        let driver = offer("o1", &ids);
        let engine = StubRoutingEngine::with_matrix(vec![vec![Duration::ZERO]]);
        let err = PointTimeMatrix::build(&engine, &driver.path, at_minutes(0))
            .expect_err("1x1 for two points");
        assert!(matches!(err, MatchError::Routing(RoutingError::ParseError { .. })));
    }

    #[rstest]
    fn looks_up_by_point_id() {
        let ids = PointIdGenerator::new();
        let driver = offer("o1", &ids);
        let engine = StubRoutingEngine::with_matrix(vec![
            vec![Duration::ZERO, minutes(7)],
            vec![minutes(8), Duration::ZERO],
        ]);
        let mut points = driver.path.clone();
        points.extend(driver.path.iter().cloned());
        let matrix = PointTimeMatrix::build(&engine, &points, at_minutes(0)).expect("2x2");
        assert_eq!(matrix.len(), 2);
        let (Some(source), Some(destination)) = (driver.path.first(), driver.path.last()) else {
            panic!("direct path has two points");
        };
        assert_eq!(
            matrix.duration("o1", destination.id, source.id),
            Ok(minutes(8))
        );
    }
}
