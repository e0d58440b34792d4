use super::Checker;
use crate::{MatchError, OfferNode, RequestNode};

/// Rejects parties larger than the offer's capacity.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapacityChecker;

impl Checker for CapacityChecker {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        Ok(request.request().number_of_riders <= offer.offer().capacity)
    }
}
