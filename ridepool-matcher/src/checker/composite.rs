use log::debug;

use super::Checker;
use crate::{MatchError, OfferNode, RequestNode};

/// Runs checkers in order, stopping at the first rejection or error.
///
/// Errors are wrapped in [`MatchError::Checker`] with the name of the
/// checker that raised them.
pub struct CompositeChecker {
    checkers: Vec<Box<dyn Checker>>,
}

impl CompositeChecker {
    /// Combine `checkers`, evaluated in the given order.
    #[must_use]
    pub fn new(checkers: Vec<Box<dyn Checker>>) -> Self {
        Self { checkers }
    }

    /// Names of the combined checkers, in evaluation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|checker| checker.name()).collect()
    }
}

impl Checker for CompositeChecker {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn check(&self, offer: &OfferNode, request: &RequestNode) -> Result<bool, MatchError> {
        for checker in &self.checkers {
            let accepted = checker
                .check(offer, request)
                .map_err(|err| err.in_checker(checker.name()))?;
            if !accepted {
                debug!(
                    "{} checker rejected offer {} and request {}",
                    checker.name(),
                    offer.id(),
                    request.id()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for CompositeChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeChecker")
            .field("checkers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::test_support::{coordinate, offer, request};
    use ridepool_core::{PointIdGenerator, RoutingError};
    use rstest::{fixture, rstest};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        verdict: Result<bool, MatchError>,
        calls: Arc<AtomicUsize>,
    }

    impl Checker for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn check(&self, _: &OfferNode, _: &RequestNode) -> Result<bool, MatchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.verdict.clone()
        }
    }

    fn fixed(name: &'static str, verdict: Result<bool, MatchError>, calls: &Arc<AtomicUsize>) -> Box<dyn Checker> {
        Box::new(Fixed {
            name,
            verdict,
            calls: Arc::clone(calls),
        })
    }

    #[fixture]
    fn pair() -> (OfferNode, RequestNode) {
        let ids = PointIdGenerator::new();
        (
            OfferNode::new(offer("o1", &ids)),
            RequestNode::new(Arc::new(request(
                "r1",
                coordinate(0.0, 0.0),
                coordinate(0.0, 0.1),
            ))),
        )
    }

    #[rstest]
    fn short_circuits_on_rejection(pair: (OfferNode, RequestNode)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeChecker::new(vec![
            fixed("first", Ok(false), &calls),
            fixed("second", Ok(true), &calls),
        ]);
        assert_eq!(composite.check(&pair.0, &pair.1), Ok(false));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[rstest]
    fn names_the_failing_checker(pair: (OfferNode, RequestNode)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeChecker::new(vec![
            fixed("first", Ok(true), &calls),
            fixed("detour", Err(RoutingError::EmptyInput.into()), &calls),
            fixed("third", Ok(true), &calls),
        ]);
        let err = composite.check(&pair.0, &pair.1).expect_err("second fails");
        assert!(matches!(err, MatchError::Checker { checker: "detour", .. }));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[rstest]
    fn accepts_when_every_checker_does(pair: (OfferNode, RequestNode)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeChecker::new(vec![fixed("only", Ok(true), &calls)]);
        assert_eq!(composite.check(&pair.0, &pair.1), Ok(true));
        assert_eq!(composite.names(), ["only"]);
    }
}
