//! Hopcroft–Karp maximum bipartite matching.
//!
//! Offers form the left side and requests the right. Vertices are numbered
//! from one so that index zero can stand for the shared free vertex. Each
//! phase layers the graph by breadth-first search from every free offer and
//! then augments along vertex-disjoint shortest paths by depth-first search.
//! Adjacency follows edge insertion order, which fixes tie-breaking.

use std::collections::VecDeque;

use super::MaximumMatching;
use crate::{Edge, Graph, MatchError};

const NIL: usize = 0;
const INFINITY: usize = usize::MAX;

/// Hopcroft–Karp matching in `O(E √V)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HopcroftKarp;

impl HopcroftKarp {
    /// Create the matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

struct Search {
    adjacency: Vec<Vec<usize>>,
    pair_offer: Vec<usize>,
    pair_request: Vec<usize>,
    dist: Vec<usize>,
}

#[expect(
    clippy::indexing_slicing,
    reason = "vertex numbers are bounded by the vectors sized in Search::new"
)]
impl Search {
    fn new(graph: &Graph) -> Self {
        let offers = graph.offer_count();
        let mut adjacency = vec![Vec::new(); offers.saturating_add(1)];
        for (index, slot) in adjacency.iter_mut().enumerate().skip(1) {
            *slot = graph
                .edges_from(index.saturating_sub(1))
                .iter()
                .filter_map(|edge| graph.request_index(&edge.request_id))
                .map(|request| request.saturating_add(1))
                .collect();
        }
        Self {
            adjacency,
            pair_offer: vec![NIL; offers.saturating_add(1)],
            pair_request: vec![NIL; graph.request_count().saturating_add(1)],
            dist: vec![INFINITY; offers.saturating_add(1)],
        }
    }

    fn offers(&self) -> impl Iterator<Item = usize> + use<> {
        1..self.pair_offer.len()
    }

    fn layer(&mut self) -> bool {
        let mut queue = VecDeque::new();
        for offer in self.offers() {
            if self.pair_offer[offer] == NIL {
                self.dist[offer] = 0;
                queue.push_back(offer);
            } else {
                self.dist[offer] = INFINITY;
            }
        }
        self.dist[NIL] = INFINITY;
        while let Some(offer) = queue.pop_front() {
            if self.dist[offer] >= self.dist[NIL] {
                continue;
            }
            for &request in &self.adjacency[offer] {
                let partner = self.pair_request[request];
                if self.dist[partner] == INFINITY {
                    self.dist[partner] = self.dist[offer].saturating_add(1);
                    if partner != NIL {
                        queue.push_back(partner);
                    }
                }
            }
        }
        self.dist[NIL] != INFINITY
    }

    fn augment(&mut self, offer: usize) -> bool {
        if offer == NIL {
            return true;
        }
        for position in 0..self.adjacency[offer].len() {
            let request = self.adjacency[offer][position];
            let partner = self.pair_request[request];
            if self.dist[partner] == self.dist[offer].saturating_add(1) && self.augment(partner) {
                self.pair_request[request] = offer;
                self.pair_offer[offer] = request;
                return true;
            }
        }
        self.dist[offer] = INFINITY;
        false
    }

    fn run(&mut self) {
        while self.layer() {
            for offer in self.offers() {
                if self.pair_offer[offer] == NIL {
                    self.augment(offer);
                }
            }
        }
    }

    fn partner_of(&self, offer_index: usize) -> Option<usize> {
        self.pair_offer
            .get(offer_index.saturating_add(1))
            .copied()
            .filter(|&request| request != NIL)
            .map(|request| request.saturating_sub(1))
    }
}

impl MaximumMatching for HopcroftKarp {
    fn find_maximum_matching(&self, graph: &Graph) -> Result<Vec<Edge>, MatchError> {
        let mut search = Search::new(graph);
        search.run();
        let mut matching = Vec::new();
        for (index, offer_id) in graph.offer_ids().iter().enumerate() {
            let Some(request_index) = search.partner_of(index) else {
                continue;
            };
            let request_id = graph
                .request_ids()
                .get(request_index)
                .map_or("", String::as_str);
            let edge = graph
                .edge(offer_id, request_id)
                .ok_or_else(|| MatchError::MissingEdge {
                    offer_id: offer_id.clone(),
                    request_id: request_id.to_owned(),
                })?;
            matching.push(edge.clone());
        }
        Ok(matching)
    }
}
