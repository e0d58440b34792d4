//! Bipartite feasibility graph between offers and requests.
//!
//! Offers and requests enter the graph through the edges that connect them,
//! in insertion order. That order drives tie-breaking in the matching, so it
//! is preserved exactly.

use std::collections::HashMap;
use std::sync::Arc;

use ridepool_core::{MatchedRequest, MatchingResult, Offer, PathPoint, Request};

use crate::MatchError;

/// An offer taking part in a run, with the requests it accepted so far.
///
/// Candidate edges to requests are kept on the owning [`Graph`], not here.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferNode {
    offer: Offer,
    newly_assigned: Vec<MatchedRequest>,
    matched: bool,
}

impl OfferNode {
    /// Wrap `offer` with no assignments.
    #[must_use]
    pub const fn new(offer: Offer) -> Self {
        Self {
            offer,
            newly_assigned: Vec::new(),
            matched: false,
        }
    }

    /// The wrapped offer, including its current path.
    #[must_use]
    pub const fn offer(&self) -> &Offer {
        &self.offer
    }

    /// Offer identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.offer.id
    }

    /// Whether the offer accepted at least one request during this run.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.matched
    }

    /// Requests accepted during this run, in acceptance order.
    #[must_use]
    pub fn newly_assigned(&self) -> &[MatchedRequest] {
        &self.newly_assigned
    }

    /// Every request on the route: previously matched, then newly assigned.
    pub fn all_requests(&self) -> impl Iterator<Item = &MatchedRequest> {
        self.offer
            .matched_requests
            .iter()
            .chain(self.newly_assigned.iter())
    }

    /// Number of requests on the route.
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.offer
            .matched_requests
            .len()
            .saturating_add(self.newly_assigned.len())
    }

    /// Accept `request`, replacing the offer's route with `path`.
    ///
    /// Every request already on the route has its pickup and dropoff
    /// refreshed from `path`, which carries the recomputed arrival times.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingPickupDropoff`] when `path` does not
    /// serve `request`.
    pub fn accept(&mut self, request: Arc<Request>, path: Vec<PathPoint>) -> Result<(), MatchError> {
        let request_id = request.id.clone();
        let accepted = MatchedRequest::from_path(request, &path).ok_or_else(|| {
            MatchError::MissingPickupDropoff {
                offer_id: self.offer.id.clone(),
                request_id,
            }
        })?;
        for existing in self
            .offer
            .matched_requests
            .iter_mut()
            .chain(self.newly_assigned.iter_mut())
        {
            if let Some(refreshed) = MatchedRequest::from_path(Arc::clone(&existing.request), &path)
            {
                *existing = refreshed;
            }
        }
        self.newly_assigned.push(accepted);
        self.offer.path = path;
        self.matched = true;
        Ok(())
    }

    /// Finalize the node into a [`MatchingResult`].
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidResult`] when no request was accepted
    /// during the run.
    pub fn into_result(self) -> Result<MatchingResult, MatchError> {
        if self.newly_assigned.is_empty() {
            return Err(MatchError::InvalidResult {
                offer_id: self.offer.id,
                reason: "no requests were assigned during this run".to_owned(),
            });
        }
        let total_requests = self.total_requests();
        Ok(MatchingResult {
            offer_id: self.offer.id,
            user_id: self.offer.user_id,
            assigned_requests: self.newly_assigned,
            path: self.offer.path,
            total_requests,
        })
    }
}

/// A request taking part in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestNode {
    request: Arc<Request>,
}

impl RequestNode {
    /// Wrap `request`.
    #[must_use]
    pub const fn new(request: Arc<Request>) -> Self {
        Self { request }
    }

    /// The wrapped request.
    #[must_use]
    pub const fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Request identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.request.id
    }
}

/// A feasible pairing and the route that serves it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Offer endpoint.
    pub offer_id: String,
    /// Request endpoint.
    pub request_id: String,
    /// The offer's route if the request is accepted.
    pub path: Vec<PathPoint>,
}

/// Feasibility graph for one round.
#[derive(Debug, Default)]
pub struct Graph {
    offers: Vec<String>,
    requests: Vec<String>,
    offer_index: HashMap<String, usize>,
    request_index: HashMap<String, usize>,
    edges: Vec<Vec<Edge>>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `edge`, registering its endpoints on first sight.
    ///
    /// An existing edge between the same pair is replaced in place.
    pub fn add_edge(&mut self, edge: Edge) {
        let offer = self.offer_slot(&edge.offer_id);
        self.request_slot(&edge.request_id);
        let Some(adjacent) = self.edges.get_mut(offer) else {
            return;
        };
        if let Some(existing) = adjacent
            .iter_mut()
            .find(|candidate| candidate.request_id == edge.request_id)
        {
            *existing = edge;
        } else {
            adjacent.push(edge);
        }
    }

    fn offer_slot(&mut self, id: &str) -> usize {
        if let Some(&index) = self.offer_index.get(id) {
            return index;
        }
        let index = self.offers.len();
        self.offers.push(id.to_owned());
        self.offer_index.insert(id.to_owned(), index);
        self.edges.push(Vec::new());
        index
    }

    fn request_slot(&mut self, id: &str) -> usize {
        if let Some(&index) = self.request_index.get(id) {
            return index;
        }
        let index = self.requests.len();
        self.requests.push(id.to_owned());
        self.request_index.insert(id.to_owned(), index);
        index
    }

    /// Offer identifiers in insertion order.
    #[must_use]
    pub fn offer_ids(&self) -> &[String] {
        &self.offers
    }

    /// Request identifiers in insertion order.
    #[must_use]
    pub fn request_ids(&self) -> &[String] {
        &self.requests
    }

    /// Position of `offer_id` in [`Graph::offer_ids`].
    #[must_use]
    pub fn offer_index(&self, offer_id: &str) -> Option<usize> {
        self.offer_index.get(offer_id).copied()
    }

    /// Position of `request_id` in [`Graph::request_ids`].
    #[must_use]
    pub fn request_index(&self, request_id: &str) -> Option<usize> {
        self.request_index.get(request_id).copied()
    }

    /// Edges leaving the offer at `index`, in insertion order.
    #[must_use]
    pub fn edges_from(&self, index: usize) -> &[Edge] {
        self.edges.get(index).map_or(&[], Vec::as_slice)
    }

    /// The edge between `offer_id` and `request_id`.
    #[must_use]
    pub fn edge(&self, offer_id: &str, request_id: &str) -> Option<&Edge> {
        self.offer_index(offer_id)
            .map(|index| self.edges_from(index))
            .and_then(|edges| edges.iter().find(|edge| edge.request_id == request_id))
    }

    /// Whether `offer_id` has at least one edge.
    #[must_use]
    pub fn contains_offer(&self, offer_id: &str) -> bool {
        self.offer_index.contains_key(offer_id)
    }

    /// Whether `request_id` has at least one edge.
    #[must_use]
    pub fn contains_request(&self, request_id: &str) -> bool {
        self.request_index.contains_key(request_id)
    }

    /// Number of offers with at least one edge.
    #[must_use]
    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Number of requests with at least one edge.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Whether the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::PointIdGenerator;
    use ridepool_core::test_support::{
        at_minutes, attach_rider, coordinate, offer, request, request_points,
    };
    use rstest::rstest;

    fn edge(offer_id: &str, request_id: &str) -> Edge {
        Edge {
            offer_id: offer_id.to_owned(),
            request_id: request_id.to_owned(),
            path: Vec::new(),
        }
    }

    #[rstest]
    fn edges_keep_insertion_order() {
        let mut graph = Graph::new();
        graph.add_edge(edge("o2", "r1"));
        graph.add_edge(edge("o1", "r2"));
        graph.add_edge(edge("o2", "r3"));
        assert_eq!(graph.offer_ids(), ["o2", "o1"]);
        assert_eq!(graph.request_ids(), ["r1", "r2", "r3"]);
        let from_o2: Vec<_> = graph
            .edges_from(0)
            .iter()
            .map(|e| e.request_id.as_str())
            .collect();
        assert_eq!(from_o2, ["r1", "r3"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[rstest]
    fn re_adding_a_pair_replaces_its_edge() {
        let mut graph = Graph::new();
        graph.add_edge(edge("o1", "r1"));
        let ids = PointIdGenerator::new();
        let replacement = Edge {
            path: offer("o1", &ids).path,
            ..edge("o1", "r1")
        };
        graph.add_edge(replacement.clone());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge("o1", "r1"), Some(&replacement));
        assert!(graph.edge("o1", "r2").is_none());
    }

    #[rstest]
    fn accept_refreshes_existing_riders() {
        let ids = PointIdGenerator::new();
        let mut base = offer("o1", &ids);
        attach_rider(
            &mut base,
            request("r0", coordinate(0.0, 0.02), coordinate(0.0, 0.04)),
            &ids,
            at_minutes(0),
            at_minutes(120),
        );
        let mut node = OfferNode::new(base);
        let rider = Arc::new(request("r1", coordinate(0.0, 0.05), coordinate(0.0, 0.06)));
        let (pickup, dropoff) = request_points(&rider, &ids);
        let mut path = node.offer().path.clone();
        path.insert(3, dropoff);
        path.insert(3, pickup);
        for (minute, point) in (0_i64..).zip(path.iter_mut()) {
            point.expected_arrival_time = at_minutes(minute);
        }
        node.accept(Arc::clone(&rider), path).expect("path serves r1");
        assert!(node.is_matched());
        assert_eq!(node.total_requests(), 2);
        let previous = node
            .offer()
            .matched_requests
            .first()
            .expect("r0 stays on the route");
        assert_eq!(previous.pickup.expected_arrival_time, at_minutes(1));
        assert_eq!(previous.dropoff.expected_arrival_time, at_minutes(2));
        let result = node.into_result().expect("one assignment");
        assert_eq!(result.assigned_request_ids().collect::<Vec<_>>(), ["r1"]);
        assert_eq!(result.total_requests, 2);
    }

    #[rstest]
    fn accept_rejects_paths_missing_the_request() {
        let ids = PointIdGenerator::new();
        let mut node = OfferNode::new(offer("o1", &ids));
        let rider = Arc::new(request("r1", coordinate(0.0, 0.05), coordinate(0.0, 0.06)));
        let path = node.offer().path.clone();
        let err = node.accept(rider, path).expect_err("r1 is not on the path");
        assert!(matches!(err, MatchError::MissingPickupDropoff { .. }));
        assert!(!node.is_matched());
    }

    #[rstest]
    fn unmatched_node_has_no_result() {
        let ids = PointIdGenerator::new();
        let node = OfferNode::new(offer("o1", &ids));
        assert!(matches!(
            node.into_result(),
            Err(MatchError::InvalidResult { .. })
        ));
    }
}
