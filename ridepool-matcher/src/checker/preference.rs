use super::Checker;
use crate::{MatchError, OfferNode, RequestNode};

/// Rejects requests whose preferences clash with the driver or with any
/// rider already on the route.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreferenceChecker;

impl Checker for PreferenceChecker {
    fn name(&self) -> &'static str {
        "preference"
    }

    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        let wanted = &request.request().preference;
        if !offer.offer().preference.is_compatible_with(wanted) {
            return Ok(false);
        }
        Ok(offer
            .all_requests()
            .all(|matched| matched.request.preference.is_compatible_with(wanted)))
    }
}
