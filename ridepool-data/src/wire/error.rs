use ridepool_core::{CoordinateError, ModelError, PointType};
use thiserror::Error;

/// Errors raised while decoding batches or encoding results.
#[derive(Debug, Error)]
pub enum WireError {
    /// The document is not valid JSON for the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A coordinate is out of range.
    #[error("{owner}: {source}")]
    Coordinate {
        /// Offer or request the coordinate belongs to.
        owner: String,
        /// The range violation.
        source: CoordinateError,
    },
    /// A decoded offer or request is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A path entry names a rider the offer does not carry.
    #[error("offer {offer_id}: path references unknown request {request_id}")]
    UnknownRider {
        /// Offer whose path is being decoded.
        offer_id: String,
        /// The unknown request.
        request_id: String,
    },
    /// A pickup or dropoff path entry has no request id.
    #[error("offer {offer_id}: {point_type} path entry needs a requestId")]
    MissingRequestId {
        /// Offer whose path is being decoded.
        offer_id: String,
        /// Type of the offending entry.
        point_type: &'static str,
    },
    /// A source or destination path entry is not at the end it belongs to.
    #[error("offer {offer_id}: {point_type} path entry is out of place")]
    MisplacedEndpoint {
        /// Offer whose path is being decoded.
        offer_id: String,
        /// Type of the offending entry.
        point_type: &'static str,
    },
}

impl WireError {
    pub(crate) fn missing_request_id(offer_id: &str, point_type: PointType) -> Self {
        Self::MissingRequestId {
            offer_id: offer_id.to_owned(),
            point_type: point_type.as_str(),
        }
    }

    pub(crate) fn misplaced(offer_id: &str, point_type: PointType) -> Self {
        Self::MisplacedEndpoint {
            offer_id: offer_id.to_owned(),
            point_type: point_type.as_str(),
        }
    }
}
