use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::{Checker, CompositeChecker};
use crate::{MatchError, OfferNode, RequestNode};

/// Pairs that survived pruning, with the nodes they refer to.
///
/// Only offers and requests appearing in at least one surviving pair are
/// kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Candidates {
    /// Surviving offers by id.
    pub offers: BTreeMap<String, OfferNode>,
    /// Surviving requests by id.
    pub requests: BTreeMap<String, RequestNode>,
    /// Compatible request ids for each surviving offer.
    pub pairs: BTreeMap<String, BTreeSet<String>>,
}

impl Candidates {
    /// Total number of surviving pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.values().map(BTreeSet::len).sum()
    }
}

/// Applies a [`CompositeChecker`] to every offer and request pair.
#[derive(Debug)]
pub struct CandidatePruner {
    checker: CompositeChecker,
}

impl CandidatePruner {
    /// Create a pruner running `checker` on each pair.
    #[must_use]
    pub const fn new(checker: CompositeChecker) -> Self {
        Self { checker }
    }

    /// Keep the pairs every checker accepts.
    ///
    /// # Errors
    ///
    /// Returns the first checker error, wrapped in [`MatchError::Checker`].
    pub fn prune(
        &self,
        offers: &[OfferNode],
        requests: &[RequestNode],
    ) -> Result<Candidates, MatchError> {
        let mut candidates = Candidates::default();
        for offer in offers {
            for request in requests {
                if !self.checker.check(offer, request)? {
                    continue;
                }
                candidates
                    .pairs
                    .entry(offer.id().to_owned())
                    .or_default()
                    .insert(request.id().to_owned());
                candidates
                    .offers
                    .entry(offer.id().to_owned())
                    .or_insert_with(|| offer.clone());
                candidates
                    .requests
                    .entry(request.id().to_owned())
                    .or_insert_with(|| request.clone());
            }
        }
        debug!(
            "pruning kept {} of {} pairs",
            candidates.pair_count(),
            offers.len().saturating_mul(requests.len())
        );
        Ok(candidates)
    }
}
