//! Result output: one document entry per matched offer.

use std::io::Write;

use chrono::{DateTime, Utc};
use ridepool_core::{MatchedRequest, MatchingResult, PathPoint, PointType};
use serde::{Deserialize, Serialize};

use super::{CoordinateDto, WireError};

/// A stop on a result route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDto {
    /// `offer` or `request`.
    pub owner_type: String,
    pub owner_id: String,
    pub point: CoordinateDto,
    pub time: DateTime<Utc>,
    pub point_type: PointType,
    /// Whole minutes, rounded down.
    pub walking_duration_minutes: u64,
}

impl From<&PathPoint> for PointDto {
    fn from(point: &PathPoint) -> Self {
        Self {
            owner_type: point.owner.kind().to_owned(),
            owner_id: point.owner.id().to_owned(),
            point: point.coordinate.into(),
            time: point.expected_arrival_time,
            point_type: point.point_type,
            walking_duration_minutes: point.walking_duration.as_secs() / 60,
        }
    }
}

/// A request assigned to the offer during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRequestDto {
    pub request_id: String,
    pub user_id: String,
    pub pickup_point: PointDto,
    pub dropoff_point: PointDto,
}

impl From<&MatchedRequest> for AssignedRequestDto {
    fn from(matched: &MatchedRequest) -> Self {
        Self {
            request_id: matched.request.id.clone(),
            user_id: matched.request.user_id.clone(),
            pickup_point: (&matched.pickup).into(),
            dropoff_point: (&matched.dropoff).into(),
        }
    }
}

/// The outcome for one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingResultDto {
    pub offer_id: String,
    pub user_id: String,
    pub assigned_matched_requests: Vec<AssignedRequestDto>,
    pub path: Vec<PointDto>,
    pub total_requests: usize,
}

impl From<&MatchingResult> for MatchingResultDto {
    fn from(result: &MatchingResult) -> Self {
        Self {
            offer_id: result.offer_id.clone(),
            user_id: result.user_id.clone(),
            assigned_matched_requests: result
                .assigned_requests
                .iter()
                .map(AssignedRequestDto::from)
                .collect(),
            path: result.path.iter().map(PointDto::from).collect(),
            total_requests: result.total_requests,
        }
    }
}

/// Write `results` to `writer` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`WireError::Json`] when serialization or the write fails.
pub fn write_results<W: Write>(writer: W, results: &[MatchingResult]) -> Result<(), WireError> {
    let documents: Vec<MatchingResultDto> = results.iter().map(MatchingResultDto::from).collect();
    serde_json::to_writer_pretty(writer, &documents)?;
    Ok(())
}
