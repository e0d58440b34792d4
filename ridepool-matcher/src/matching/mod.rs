//! Maximum-cardinality matching over the feasibility graph.

mod hopcroft_karp;

pub use hopcroft_karp::HopcroftKarp;

use crate::{Edge, Graph, MatchError};

/// Chooses at most one edge per offer and per request.
pub trait MaximumMatching: Send + Sync {
    /// Return the edges of a maximum matching, ordered by offer insertion.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingEdge`] when the matching refers to a
    /// pair whose edge the graph does not hold.
    fn find_maximum_matching(&self, graph: &Graph) -> Result<Vec<Edge>, MatchError>;
}
