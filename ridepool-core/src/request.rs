//! Rider requests.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{Coordinate, ModelError, Preference};

/// A rider's request for a seat.
///
/// Requests are immutable once a matching run starts and are shared between
/// the path points that serve them through [`std::sync::Arc`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the rider who made the request.
    pub user_id: String,
    /// Where the rider starts.
    pub source: Coordinate,
    /// Where the rider is going.
    pub destination: Coordinate,
    /// Earliest time the rider can leave `source`.
    pub earliest_departure_time: DateTime<Utc>,
    /// Latest acceptable arrival at `destination`.
    pub latest_arrival_time: DateTime<Utc>,
    /// Longest walk the rider accepts to reach a pickup or leave a dropoff.
    pub max_walking_duration: Duration,
    /// Party size.
    pub number_of_riders: u32,
    /// Compatibility preferences.
    pub preference: Preference,
}

impl Request {
    /// Check the request's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when an identifier is empty, the party size is
    /// zero or the time window is inverted.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.is_empty() {
            return Err(ModelError::EmptyId { field: "request id" });
        }
        if self.user_id.is_empty() {
            return Err(ModelError::EmptyId {
                field: "request user id",
            });
        }
        if self.number_of_riders == 0 {
            return Err(ModelError::NonPositive {
                entity: "request",
                id: self.id.clone(),
                field: "number of riders",
            });
        }
        if self.latest_arrival_time < self.earliest_departure_time {
            return Err(ModelError::InvertedTimeWindow {
                entity: "request",
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}
