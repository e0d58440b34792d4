//! Driver offers and the requests already committed to them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    Coordinate, ModelError, PathPoint, PointIdGenerator, PointOwner, PointType, Preference, Request,
};

/// A request already placed on an offer's route, with the points serving it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRequest {
    /// The rider request.
    pub request: Arc<Request>,
    /// Boarding point.
    pub pickup: PathPoint,
    /// Alighting point.
    pub dropoff: PathPoint,
}

impl MatchedRequest {
    /// Extract the pickup and dropoff serving `request` from `path`.
    ///
    /// Returns `None` when either point is missing.
    #[must_use]
    pub fn from_path(request: Arc<Request>, path: &[PathPoint]) -> Option<Self> {
        let find = |kind: PointType| {
            path.iter()
                .find(|point| point.point_type == kind && point.owner.id() == request.id)
                .cloned()
        };
        let pickup = find(PointType::Pickup)?;
        let dropoff = find(PointType::Dropoff)?;
        Some(Self {
            request,
            pickup,
            dropoff,
        })
    }
}

/// Scalar attributes of an offer, used to build an [`Offer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OfferParams {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the driver.
    pub user_id: String,
    /// Where the driver starts.
    pub source: Coordinate,
    /// Where the driver finishes.
    pub destination: Coordinate,
    /// When the driver leaves `source`.
    pub departure_time: DateTime<Utc>,
    /// Latest time the driver is willing to reach `destination`.
    pub max_estimated_arrival_time: DateTime<Utc>,
    /// Extra driving time tolerated over the direct trip.
    pub detour: Duration,
    /// Maximum riders on board at once.
    pub capacity: u32,
    /// Driver preferences.
    pub preference: Preference,
}

/// A driver's route proposal.
///
/// The matcher replaces `path` in place each time a round accepts a new
/// request for the offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the driver.
    pub user_id: String,
    /// Where the driver starts.
    pub source: Coordinate,
    /// Where the driver finishes.
    pub destination: Coordinate,
    /// When the driver leaves `source`.
    pub departure_time: DateTime<Utc>,
    /// Latest time the driver is willing to reach `destination`.
    pub max_estimated_arrival_time: DateTime<Utc>,
    /// Extra driving time tolerated over the direct trip.
    pub detour: Duration,
    /// Maximum riders on board at once.
    pub capacity: u32,
    /// Driver preferences.
    pub preference: Preference,
    /// Requests committed before this run.
    pub current_number_of_requests: usize,
    /// Requests already on the route before this run.
    pub matched_requests: Vec<MatchedRequest>,
    /// Ordered stops, bracketed by a source and a destination.
    pub path: Vec<PathPoint>,
}

impl Offer {
    /// Build an offer whose path is the direct trip from source to
    /// destination.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the parameters fail [`Offer::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use chrono::{TimeZone, Utc};
    /// use ridepool_core::{Coordinate, Offer, OfferParams, PointIdGenerator, Preference};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let departure = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    /// let ids = PointIdGenerator::new();
    /// let offer = Offer::new(
    ///     OfferParams {
    ///         id: "o1".into(),
    ///         user_id: "driver".into(),
    ///         source: Coordinate::new(30.0, 31.0)?,
    ///         destination: Coordinate::new(30.1, 31.1)?,
    ///         departure_time: departure,
    ///         max_estimated_arrival_time: departure + Duration::from_secs(3600),
    ///         detour: Duration::from_secs(900),
    ///         capacity: 3,
    ///         preference: Preference::default(),
    ///     },
    ///     &ids,
    /// )?;
    /// assert_eq!(offer.path.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(params: OfferParams, ids: &PointIdGenerator) -> Result<Self, ModelError> {
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
        let offer = Self {
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
        };
        offer.validate()?;
        Ok(offer)
    }

    /// Replace the route with one that already serves `matched` requests.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedPath`] when the new path breaks the
    /// offer's path invariants.
    pub fn with_matched_requests(
        mut self,
        matched: Vec<MatchedRequest>,
        path: Vec<PathPoint>,
    ) -> Result<Self, ModelError> {
        self.current_number_of_requests = matched.len();
        self.matched_requests = matched;
        self.path = path;
        self.validate()?;
        Ok(self)
    }

    /// The owner value used for this offer's source and destination.
    #[must_use]
    pub fn owner(&self) -> PointOwner {
        PointOwner::Offer {
            offer_id: self.id.clone(),
            user_id: self.user_id.clone(),
        }
    }

    /// Check the offer's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for empty identifiers, zero capacity, an
    /// inverted time window, or a path that is not bracketed by a source and
    /// a destination or that drops a rider before picking them up.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.is_empty() {
            return Err(ModelError::EmptyId { field: "offer id" });
        }
        if self.user_id.is_empty() {
            return Err(ModelError::EmptyId {
                field: "offer user id",
            });
        }
        if self.capacity == 0 {
            return Err(ModelError::NonPositive {
                entity: "offer",
                id: self.id.clone(),
                field: "capacity",
            });
        }
        if self.max_estimated_arrival_time < self.departure_time {
            return Err(ModelError::InvertedTimeWindow {
                entity: "offer",
                id: self.id.clone(),
            });
        }
        self.validate_path()
    }

    fn validate_path(&self) -> Result<(), ModelError> {
        let malformed = |reason: &str| ModelError::MalformedPath {
            offer_id: self.id.clone(),
            reason: reason.to_owned(),
        };
        let (Some(first), Some(last)) = (self.path.first(), self.path.last()) else {
            return Err(malformed("path must contain at least two points"));
        };
        if self.path.len() < 2 {
            return Err(malformed("path must contain at least two points"));
        }
        if first.point_type != PointType::Source {
            return Err(malformed("path must start at the offer source"));
        }
        if last.point_type != PointType::Destination {
            return Err(malformed("path must end at the offer destination"));
        }
        for matched in &self.matched_requests {
            let position = |kind: PointType| {
                self.path
                    .iter()
                    .position(|p| p.point_type == kind && p.owner.id() == matched.request.id)
            };
            match (position(PointType::Pickup), position(PointType::Dropoff)) {
                (Some(pickup), Some(dropoff)) if pickup < dropoff => {}
                _ => {
                    return Err(malformed(&format!(
                        "request {} needs a pickup before its dropoff",
                        matched.request.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of riders on board at every position of the current path.
    #[must_use]
    pub fn riders_on_board(&self) -> Vec<u32> {
        let mut on_board = 0_u32;
        self.path
            .iter()
            .map(|point| {
                if let Some(request) = point.request() {
                    match point.point_type {
                        PointType::Pickup => {
                            on_board = on_board.saturating_add(request.number_of_riders);
                        }
                        PointType::Dropoff => {
                            on_board = on_board.saturating_sub(request.number_of_riders);
                        }
                        PointType::Source | PointType::Destination => {}
                    }
                }
                on_board
            })
            .collect()
    }
}
