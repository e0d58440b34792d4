//! JSON wire formats for batches and results.
//!
//! Times are RFC 3339 instants and durations are whole minutes. Field names
//! are camelCase.

mod batch;
mod error;
mod result;

pub use batch::{
    Batch, BatchDto, CoordinateDto, MatchedRequestDto, OfferDto, PathEntryDto, RequestDto, StopDto,
    read_batch,
};
pub use error::WireError;
pub use result::{AssignedRequestDto, MatchingResultDto, PointDto, write_results};
