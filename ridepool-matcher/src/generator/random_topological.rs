//! Randomised topological sampling of candidate routes.
//!
//! The route's interior stops and the new pickup and dropoff form a DAG in
//! which every pickup precedes the dropoff of the same request. Each sample
//! is a complete topological order found by depth-first search with the
//! ready nodes shuffled at every level. The search backtracks after each
//! sample, so successive samples differ and the sequence ends early once
//! every order has been produced.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use ridepool_core::{PathPoint, PointType};

use super::{CandidatePaths, PathGenerator};
use crate::MatchError;

/// Configuration for [`RandomTopologicalGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomTopologicalConfig {
    /// Maximum number of candidates produced per call.
    pub samples: usize,
    /// Seed for reproducible sampling; entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for RandomTopologicalConfig {
    fn default() -> Self {
        Self {
            samples: 1_000,
            seed: None,
        }
    }
}

/// Samples random valid orderings of the route's stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTopologicalGenerator {
    config: RandomTopologicalConfig,
}

impl RandomTopologicalGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator with explicit configuration.
    #[must_use]
    pub const fn with_config(config: RandomTopologicalConfig) -> Self {
        Self { config }
    }

    fn rng(&self) -> ChaCha8Rng {
        self.config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
    }
}

impl PathGenerator for RandomTopologicalGenerator {
    fn generate<'a>(
        &'a self,
        path: &'a [PathPoint],
        pickup: &'a PathPoint,
        dropoff: &'a PathPoint,
    ) -> Result<CandidatePaths<'a>, MatchError> {
        let (Some(start), Some(end)) = (path.first(), path.last()) else {
            return Err(MatchError::PathTooShort { len: path.len() });
        };
        if path.len() < 2 {
            return Err(MatchError::PathTooShort { len: path.len() });
        }
        let interior = path.get(1..path.len() - 1).unwrap_or_default();
        let nodes: Vec<&PathPoint> = interior.iter().chain([pickup, dropoff]).collect();
        Ok(Box::new(Samples::new(
            start,
            end,
            nodes,
            self.config.samples,
            self.rng(),
        )))
    }
}

struct Frame {
    candidates: Vec<usize>,
    cursor: usize,
}

struct Samples<'a> {
    start: &'a PathPoint,
    end: &'a PathPoint,
    nodes: Vec<&'a PathPoint>,
    successors: Vec<Vec<usize>>,
    pending: Vec<usize>,
    visited: Vec<bool>,
    order: Vec<usize>,
    stack: Vec<Frame>,
    remaining: usize,
    started: bool,
    rng: ChaCha8Rng,
}

#[expect(
    clippy::indexing_slicing,
    reason = "node numbers index vectors sized by the node count"
)]
impl<'a> Samples<'a> {
    fn new(
        start: &'a PathPoint,
        end: &'a PathPoint,
        nodes: Vec<&'a PathPoint>,
        remaining: usize,
        rng: ChaCha8Rng,
    ) -> Self {
        let count = nodes.len();
        let mut successors = vec![Vec::new(); count];
        let mut pending = vec![0; count];
        for (from, point) in nodes.iter().enumerate() {
            if point.point_type != PointType::Pickup {
                continue;
            }
            let owner = point.owner.id();
            let partner = nodes.iter().position(|candidate| {
                candidate.point_type == PointType::Dropoff && candidate.owner.id() == owner
            });
            if let Some(to) = partner {
                successors[from].push(to);
                pending[to] += 1;
            }
        }
        Self {
            start,
            end,
            nodes,
            successors,
            pending,
            visited: vec![false; count],
            order: Vec::with_capacity(count),
            stack: Vec::new(),
            remaining,
            started: false,
            rng,
        }
    }

    fn ready_frame(&mut self) -> Frame {
        let mut candidates: Vec<usize> = (0..self.nodes.len())
            .filter(|&node| !self.visited[node] && self.pending[node] == 0)
            .collect();
        candidates.shuffle(&mut self.rng);
        Frame {
            candidates,
            cursor: 0,
        }
    }

    fn visit(&mut self, node: usize) {
        self.visited[node] = true;
        self.order.push(node);
        for &next in &self.successors[node] {
            self.pending[next] -= 1;
        }
    }

    fn unvisit_last(&mut self) {
        if let Some(node) = self.order.pop() {
            self.visited[node] = false;
            for &next in &self.successors[node] {
                self.pending[next] += 1;
            }
        }
    }

    fn route(&self) -> Vec<PathPoint> {
        let mut route = Vec::with_capacity(self.order.len() + 2);
        route.push(self.start.clone());
        route.extend(self.order.iter().map(|&node| self.nodes[node].clone()));
        route.push(self.end.clone());
        route
    }
}

impl Iterator for Samples<'_> {
    type Item = Vec<PathPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if !self.started {
            self.started = true;
            let root = self.ready_frame();
            self.stack.push(root);
        }
        loop {
            let frame = self.stack.last_mut()?;
            let Some(node) = frame.candidates.get(frame.cursor).copied() else {
                self.stack.pop();
                self.unvisit_last();
                continue;
            };
            frame.cursor += 1;
            self.visit(node);
            if self.order.len() == self.nodes.len() {
                let route = self.route();
                self.unvisit_last();
                self.remaining -= 1;
                return Some(route);
            }
            let next = self.ready_frame();
            self.stack.push(next);
        }
    }
}
