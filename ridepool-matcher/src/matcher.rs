//! Round-based orchestration of the matching pipeline.
//!
//! A run prunes the batch once, then repeats rounds. Each round evaluates
//! every remaining offer and request pair against the offers' current
//! routes, builds the feasibility graph, finalizes offers left without any
//! edge, and applies a maximum matching. Applying an edge replaces the
//! offer's route, so the next round searches against the new stops. The run
//! ends when a round yields no edges or nothing is left to match.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use ridepool_core::{
    MatchingResult, Offer, PointIdGenerator, Request, VehicleRoutingSolver,
};

use crate::checker::{
    CapacityChecker, Checker, DetourTimeChecker, HaversineChecker, OverlapChecker,
    PreferenceChecker,
};
use crate::collections::SyncMap;
use crate::generator::{InsertionPathGenerator, PathGenerator};
use crate::planner::{DefaultPathPlanner, PathPlanner, SolverPathPlanner};
use crate::selector::{PickupDropoffGenerator, PickupDropoffSelector, RoadSnapGenerator};
use crate::time_matrix::{TimeMatrixConfig, TimeMatrixService};
use crate::{
    CandidatePruner, Candidates, CompositeChecker, Edge, Graph, HopcroftKarp, MatchError,
    MatchEvaluator, MaximumMatching, OfferNode, PathValidator, RequestNode, SharedRoutingEngine,
};

/// Configuration for [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    /// An offer is finalized once it carries this many requests, counting
    /// those matched before the run.
    pub limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { limit: 5 }
    }
}

/// Working sets shared across the rounds of one run.
struct RunState {
    offers: SyncMap<String, OfferNode>,
    requests: SyncMap<String, RequestNode>,
    pairs: SyncMap<String, BTreeSet<String>>,
}

impl From<Candidates> for RunState {
    fn from(candidates: Candidates) -> Self {
        Self {
            offers: candidates.offers.into_iter().collect(),
            requests: candidates.requests.into_iter().collect(),
            pairs: candidates.pairs.into_iter().collect(),
        }
    }
}

/// Assigns requests to offers.
///
/// Point identifiers for new pickups and dropoffs come from the generator
/// given to [`MatcherBuilder::new`], which must be the one that issued the
/// batch's own points. Cached selections and matrices are cleared at the
/// start of every run.
pub struct Matcher {
    pruner: CandidatePruner,
    evaluator: MatchEvaluator,
    matching: Box<dyn MaximumMatching>,
    selector: Arc<PickupDropoffSelector>,
    time_matrix: Arc<TimeMatrixService>,
    config: MatcherConfig,
}

impl Matcher {
    /// A matcher with the default strategies and configuration.
    #[must_use]
    pub fn new(engine: SharedRoutingEngine, ids: Arc<PointIdGenerator>) -> Self {
        MatcherBuilder::new(engine, ids).build()
    }

    /// Start configuring a matcher.
    #[must_use]
    pub fn builder(engine: SharedRoutingEngine, ids: Arc<PointIdGenerator>) -> MatcherBuilder {
        MatcherBuilder::new(engine, ids)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match `requests` to `offers`.
    ///
    /// Returns one result per offer that accepted at least one request,
    /// with its final route.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NoOffers`] or [`MatchError::NoRequests`] for an
    /// empty side, [`MatchError::Model`] for invalid input, and any
    /// collaborator or consistency failure raised during the run. No
    /// partial results are returned.
    pub fn match_batch(
        &self,
        offers: Vec<Offer>,
        requests: Vec<Request>,
    ) -> Result<Vec<MatchingResult>, MatchError> {
        if offers.is_empty() {
            return Err(MatchError::NoOffers);
        }
        if requests.is_empty() {
            return Err(MatchError::NoRequests);
        }
        for offer in &offers {
            offer.validate()?;
        }
        for request in &requests {
            request.validate()?;
        }
        self.selector.reset();
        self.time_matrix.reset();

        let started = Instant::now();
        let offers: Vec<OfferNode> = offers.into_iter().map(OfferNode::new).collect();
        let requests: Vec<RequestNode> = requests
            .into_iter()
            .map(|request| RequestNode::new(Arc::new(request)))
            .collect();
        let state = RunState::from(self.pruner.prune(&offers, &requests)?);

        let mut results = Vec::new();
        let mut round = 0_usize;
        while !state.offers.is_empty() && !state.requests.is_empty() {
            round += 1;
            let round_started = Instant::now();
            let graph = self.build_graph(&state)?;
            debug!(
                "round {round}: {} edges between {} offers and {} requests in {:?}",
                graph.edge_count(),
                graph.offer_count(),
                graph.request_count(),
                round_started.elapsed()
            );
            if graph.is_empty() {
                break;
            }
            self.finalize_unconnected(&state, &graph, &mut results)?;
            state.requests.retain(|id, _| graph.contains_request(id));
            let matching = self.matching.find_maximum_matching(&graph)?;
            debug!("round {round}: matched {} pairs", matching.len());
            self.apply(&state, matching, &mut results)?;
        }

        for (_, node) in state.offers.snapshot() {
            if node.is_matched() {
                self.finalize(node, &mut results)?;
            }
        }
        info!(
            "matched {} offers after {round} rounds in {:?}",
            results.len(),
            started.elapsed()
        );
        Ok(results)
    }

    fn build_graph(&self, state: &RunState) -> Result<Graph, MatchError> {
        let mut graph = Graph::new();
        for (offer_id, request_ids) in state.pairs.snapshot() {
            let Some(offer) = state.offers.get(&offer_id) else {
                state.pairs.remove(&offer_id);
                continue;
            };
            let available: Vec<RequestNode> = request_ids
                .iter()
                .filter_map(|id| state.requests.get(id))
                .collect();
            if available.len() != request_ids.len() {
                let still_available = available.iter().map(|r| r.id().to_owned()).collect();
                state.pairs.insert(offer_id.clone(), still_available);
            }
            if available.is_empty() {
                continue;
            }
            let riders: Vec<Arc<Request>> = available
                .iter()
                .map(|request| Arc::clone(request.request()))
                .collect();
            self.time_matrix.populate(offer.offer(), &riders)?;
            for request in &available {
                if let Some(path) = self.evaluator.evaluate(&offer, request)? {
                    graph.add_edge(Edge {
                        offer_id: offer_id.clone(),
                        request_id: request.id().to_owned(),
                        path,
                    });
                } else {
                    state.pairs.update(&offer_id, |ids| ids.remove(request.id()));
                }
            }
        }
        Ok(graph)
    }

    fn finalize_unconnected(
        &self,
        state: &RunState,
        graph: &Graph,
        results: &mut Vec<MatchingResult>,
    ) -> Result<(), MatchError> {
        for offer_id in state.offers.keys() {
            if graph.contains_offer(&offer_id) {
                continue;
            }
            state.pairs.remove(&offer_id);
            if let Some(node) = state.offers.remove(&offer_id) {
                if node.is_matched() {
                    self.finalize(node, results)?;
                } else {
                    self.time_matrix.forget_offer(&offer_id);
                }
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        state: &RunState,
        matching: Vec<Edge>,
        results: &mut Vec<MatchingResult>,
    ) -> Result<(), MatchError> {
        for Edge {
            offer_id,
            request_id,
            path,
        } in matching
        {
            let missing = || MatchError::MissingEdge {
                offer_id: offer_id.clone(),
                request_id: request_id.clone(),
            };
            let request = state.requests.get(&request_id).ok_or_else(missing)?;
            let total = state
                .offers
                .update(&offer_id, |node| {
                    node.accept(Arc::clone(request.request()), path)?;
                    Ok::<_, MatchError>(node.total_requests())
                })
                .transpose()?
                .ok_or_else(missing)?;
            debug!("offer {offer_id} accepted request {request_id} ({total} on route)");
            self.time_matrix.invalidate_pairs(&offer_id);
            state.pairs.update(&offer_id, |ids| ids.remove(&request_id));
            if total >= self.config.limit {
                if let Some(node) = state.offers.remove(&offer_id) {
                    self.finalize(node, results)?;
                }
                state.pairs.remove(&offer_id);
            }
            state.requests.remove(&request_id);
        }
        Ok(())
    }

    fn finalize(
        &self,
        node: OfferNode,
        results: &mut Vec<MatchingResult>,
    ) -> Result<(), MatchError> {
        let offer_id = node.id().to_owned();
        self.time_matrix.forget_offer(&offer_id);
        let result = node.into_result()?;
        debug!(
            "offer {offer_id} finalized with {} requests",
            result.total_requests
        );
        results.push(result);
        Ok(())
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("pruner", &self.pruner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Matcher`].
///
/// Defaults: road-snapped pickups and dropoffs, exhaustive insertion,
/// in-process validation, Hopcroft–Karp matching, and the overlap,
/// capacity, preference and detour-time checkers.
pub struct MatcherBuilder {
    engine: SharedRoutingEngine,
    ids: Arc<PointIdGenerator>,
    config: MatcherConfig,
    time_matrix: TimeMatrixConfig,
    path_generator: Box<dyn PathGenerator>,
    pickup_dropoff: Option<Box<dyn PickupDropoffGenerator>>,
    solver: Option<Box<dyn VehicleRoutingSolver>>,
    matching: Box<dyn MaximumMatching>,
    haversine: bool,
}

impl MatcherBuilder {
    /// Start from the defaults.
    #[must_use]
    pub fn new(engine: SharedRoutingEngine, ids: Arc<PointIdGenerator>) -> Self {
        Self {
            engine,
            ids,
            config: MatcherConfig::default(),
            time_matrix: TimeMatrixConfig::default(),
            path_generator: Box::new(InsertionPathGenerator::new()),
            pickup_dropoff: None,
            solver: None,
            matching: Box::new(HopcroftKarp::new()),
            haversine: false,
        }
    }

    /// Replace the matcher configuration.
    #[must_use]
    pub const fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-offer request limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Replace the travel-time cache configuration.
    #[must_use]
    pub const fn with_time_matrix_config(mut self, config: TimeMatrixConfig) -> Self {
        self.time_matrix = config;
        self
    }

    /// Generate candidate routes with `generator`.
    #[must_use]
    pub fn with_path_generator(mut self, generator: Box<dyn PathGenerator>) -> Self {
        self.path_generator = generator;
        self
    }

    /// Choose pickups and dropoffs with `generator`.
    #[must_use]
    pub fn with_pickup_dropoff_generator(
        mut self,
        generator: Box<dyn PickupDropoffGenerator>,
    ) -> Self {
        self.pickup_dropoff = Some(generator);
        self
    }

    /// Delegate route search to `solver` instead of generating candidates.
    #[must_use]
    pub fn with_solver(mut self, solver: Box<dyn VehicleRoutingSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Select edges with `matching`.
    #[must_use]
    pub fn with_maximum_matching(mut self, matching: Box<dyn MaximumMatching>) -> Self {
        self.matching = matching;
        self
    }

    /// Also prune with the straight-line [`HaversineChecker`].
    #[must_use]
    pub const fn with_haversine_checker(mut self, enabled: bool) -> Self {
        self.haversine = enabled;
        self
    }

    /// Assemble the matcher.
    #[must_use]
    pub fn build(self) -> Matcher {
        let generator = self
            .pickup_dropoff
            .unwrap_or_else(|| Box::new(RoadSnapGenerator::new(Arc::clone(&self.engine))));
        let selector = Arc::new(PickupDropoffSelector::new(
            generator,
            Arc::clone(&self.engine),
            self.ids,
        ));
        let time_matrix = Arc::new(TimeMatrixService::with_config(
            Arc::clone(&self.engine),
            Arc::clone(&selector),
            self.time_matrix,
        ));

        let mut checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(OverlapChecker),
            Box::new(CapacityChecker),
            Box::new(PreferenceChecker),
        ];
        if self.haversine {
            checkers.push(Box::new(HaversineChecker::new()));
        }
        checkers.push(Box::new(DetourTimeChecker::new(
            Arc::clone(&selector),
            self.engine,
        )));

        let planner: Box<dyn PathPlanner> = match self.solver {
            Some(solver) => Box::new(SolverPathPlanner::new(
                Arc::clone(&selector),
                Arc::clone(&time_matrix),
                solver,
            )),
            None => Box::new(DefaultPathPlanner::new(
                Arc::clone(&selector),
                self.path_generator,
                PathValidator::new(Arc::clone(&time_matrix)),
            )),
        };

        Matcher {
            pruner: CandidatePruner::new(CompositeChecker::new(checkers)),
            evaluator: MatchEvaluator::new(planner),
            matching: self.matching,
            selector,
            time_matrix,
            config: self.config,
        }
    }
}

impl std::fmt::Debug for MatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherBuilder")
            .field("config", &self.config)
            .field("time_matrix", &self.time_matrix)
            .field("solver", &self.solver.is_some())
            .field("haversine", &self.haversine)
            .finish_non_exhaustive()
    }
}
