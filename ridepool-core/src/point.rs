//! Path points and their identities.
//!
//! Every stop on an offer's route is a [`PathPoint`]. Points carry a
//! [`PointId`] issued by a [`PointIdGenerator`] owned by the current batch, so
//! identities are unique within a run and independent across runs. The
//! identifiers key the travel-time matrices the matcher caches.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{Coordinate, Request};

/// Identifier of a path point, unique within one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u64);

impl PointId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Monotonic issuer of [`PointId`] values.
///
/// A generator belongs to a single batch. Create a fresh one per run to keep
/// runs independent and tests deterministic.
///
/// # Examples
///
/// ```
/// use ridepool_core::PointIdGenerator;
///
/// let ids = PointIdGenerator::new();
/// let first = ids.next_id();
/// let second = ids.next_id();
/// assert!(first < second);
/// ```
#[derive(Debug, Default)]
pub struct PointIdGenerator {
    next: AtomicU64,
}

impl PointIdGenerator {
    /// Create a generator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Issue the next identifier.
    pub fn next_id(&self) -> PointId {
        PointId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Role of a point within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointType {
    /// The driver's starting point.
    Source,
    /// The driver's final stop.
    Destination,
    /// Where a rider boards.
    Pickup,
    /// Where a rider leaves.
    Dropoff,
}

impl PointType {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        }
    }
}

/// Who a point belongs to.
///
/// Sources and destinations belong to the offer they bound. Pickups and
/// dropoffs belong to the request they serve.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOwner {
    /// A driver offer.
    Offer {
        /// Offer identifier.
        offer_id: String,
        /// Driver identifier.
        user_id: String,
    },
    /// A rider request.
    Request(Arc<Request>),
}

impl PointOwner {
    /// Identifier of the owning offer or request.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Offer { offer_id, .. } => offer_id,
            Self::Request(request) => &request.id,
        }
    }

    /// Identifier of the owning user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Offer { user_id, .. } => user_id,
            Self::Request(request) => &request.user_id,
        }
    }

    /// `offer` or `request`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Request(_) => "request",
        }
    }
}

/// A stop on an offer's route.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    /// Batch-unique identity.
    pub id: PointId,
    /// Location of the stop.
    pub coordinate: Coordinate,
    /// Role of the stop.
    pub point_type: PointType,
    /// When the driver is expected to reach the stop.
    ///
    /// Seeded with the rider's target time for new pickups and dropoffs and
    /// overwritten by path validation.
    pub expected_arrival_time: DateTime<Utc>,
    /// Rider walk between the stop and the rider's own origin or destination.
    pub walking_duration: Duration,
    /// Owner of the stop.
    pub owner: PointOwner,
}

impl PathPoint {
    /// Build a point with zero walking duration.
    #[must_use]
    pub const fn new(
        id: PointId,
        coordinate: Coordinate,
        point_type: PointType,
        expected_arrival_time: DateTime<Utc>,
        owner: PointOwner,
    ) -> Self {
        Self {
            id,
            coordinate,
            point_type,
            expected_arrival_time,
            walking_duration: Duration::ZERO,
            owner,
        }
    }

    /// Set the rider walking duration.
    #[must_use]
    pub fn with_walking_duration(mut self, walking_duration: Duration) -> Self {
        self.walking_duration = walking_duration;
        self
    }

    /// The request served by this point, if any.
    #[must_use]
    pub const fn request(&self) -> Option<&Arc<Request>> {
        match &self.owner {
            PointOwner::Request(request) => Some(request),
            PointOwner::Offer { .. } => None,
        }
    }
}
