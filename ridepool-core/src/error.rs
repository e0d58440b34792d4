use thiserror::Error;

use crate::CoordinateError;

/// Errors returned when validating offers, requests and paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// An identifier field was empty.
    #[error("{field} must not be empty")]
    EmptyId {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A coordinate failed validation.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    /// A time window ends before it starts.
    #[error("{entity} {id}: time window ends before it starts")]
    InvertedTimeWindow {
        /// `offer` or `request`.
        entity: &'static str,
        /// Identifier of the entity.
        id: String,
    },
    /// Capacity or rider count was zero.
    #[error("{entity} {id}: {field} must be positive")]
    NonPositive {
        /// `offer` or `request`.
        entity: &'static str,
        /// Identifier of the entity.
        id: String,
        /// Name of the offending field.
        field: &'static str,
    },
    /// The path is shorter than two points or is not bracketed by the
    /// offer's source and destination.
    #[error("offer {offer_id}: {reason}")]
    MalformedPath {
        /// Identifier of the offer.
        offer_id: String,
        /// Description of the violated invariant.
        reason: String,
    },
}
