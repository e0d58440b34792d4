//! Validated geographic coordinates.

use geo::{Coord, Distance, Haversine, Point};
use thiserror::Error;

const METRES_PER_KM: f64 = 1000.0;

/// A WGS84 position.
///
/// Internally stored as a [`geo::Coord`] with `x` as longitude and `y` as
/// latitude, matching the convention used by routing services.
///
/// # Examples
///
/// ```
/// use ridepool_core::Coordinate;
///
/// # fn main() -> Result<(), ridepool_core::CoordinateError> {
/// let cairo = Coordinate::new(30.0444, 31.2357)?;
/// assert_eq!(cairo.lat(), 30.0444);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    inner: Coord<f64>,
}

/// Errors returned by [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude lies outside `[-90, 90]` or is not finite.
    #[error("latitude {0} must be within [-90, 90]")]
    Latitude(f64),
    /// Longitude lies outside `[-180, 180]` or is not finite.
    #[error("longitude {0} must be within [-180, 180]")]
    Longitude(f64),
}

impl Coordinate {
    /// Validates and constructs a [`Coordinate`].
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::Longitude(lng));
        }
        Ok(Self {
            inner: Coord { x: lng, y: lat },
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.inner.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.inner.x
    }

    /// The underlying `geo` coordinate (`x` = longitude).
    #[must_use]
    pub const fn as_coord(&self) -> Coord<f64> {
        self.inner
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "metres to kilometres")]
    pub fn haversine_km(&self, other: &Self) -> f64 {
        Haversine.distance(Point::from(self.inner), Point::from(other.inner)) / METRES_PER_KM
    }
}

impl TryFrom<Coord<f64>> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: Coord<f64>) -> Result<Self, Self::Error> {
        Self::new(value.y, value.x)
    }
}
