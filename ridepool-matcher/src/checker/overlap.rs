use super::Checker;
use crate::{MatchError, OfferNode, RequestNode};

/// Rejects pairs whose time windows do not intersect.
///
/// Both windows are closed, so windows that only touch still overlap.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlapChecker;

impl Checker for OverlapChecker {
    fn name(&self) -> &'static str {
        "overlap"
    }

    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        let offer = offer.offer();
        let request = request.request();
        Ok(offer.departure_time <= request.latest_arrival_time
            && request.earliest_departure_time <= offer.max_estimated_arrival_time)
    }
}
