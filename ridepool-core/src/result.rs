//! Final output of a matching run.

use crate::{MatchedRequest, PathPoint};

/// One offer's outcome after a run.
///
/// Emitted once per offer that accepted at least one request during the run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingResult {
    /// Offer identifier.
    pub offer_id: String,
    /// Driver identifier.
    pub user_id: String,
    /// Requests assigned during this run, in acceptance order.
    pub assigned_requests: Vec<MatchedRequest>,
    /// Final route, including previously matched riders.
    pub path: Vec<PathPoint>,
    /// Requests on the route after the run, previously matched ones included.
    pub total_requests: usize,
}

impl MatchingResult {
    /// Identifiers of the requests assigned during this run.
    pub fn assigned_request_ids(&self) -> impl Iterator<Item = &str> {
        self.assigned_requests
            .iter()
            .map(|matched| matched.request.id.as_str())
    }
}
