//! Matching pipeline for the ridepool engine.
//!
//! [`Matcher`] assigns rider requests to driver offers in rounds. Each run
//! prunes incompatible pairs with cheap [`Checker`]s, searches a feasible
//! route for every surviving pair with a [`PathPlanner`], and selects a
//! non-conflicting set of assignments with a [`MaximumMatching`]. Accepted
//! requests change their offer's route, so the search is repeated until no
//! further pair is feasible.
//!
//! Collaborators are injected as trait objects: a shared
//! [`RoutingEngine`](ridepool_core::RoutingEngine) supplies travel times and
//! an optional [`VehicleRoutingSolver`](ridepool_core::VehicleRoutingSolver)
//! replaces the built-in route search.

#![forbid(unsafe_code)]

use std::sync::Arc;

use ridepool_core::RoutingEngine;

pub mod checker;
pub mod collections;
pub mod generator;
pub mod graph;
pub mod matching;
pub mod planner;
pub mod selector;
pub mod time_matrix;

mod error;
mod evaluator;
mod matcher;
mod validator;

pub use checker::{CandidatePruner, Candidates, Checker, CompositeChecker};
pub use error::MatchError;
pub use evaluator::MatchEvaluator;
pub use generator::{InsertionPathGenerator, PathGenerator, RandomTopologicalGenerator};
pub use graph::{Edge, Graph, OfferNode, RequestNode};
pub use matcher::{Matcher, MatcherBuilder, MatcherConfig};
pub use matching::{HopcroftKarp, MaximumMatching};
pub use planner::{DefaultPathPlanner, PathPlanner, SolverPathPlanner};
pub use selector::{PickupDropoff, PickupDropoffGenerator, PickupDropoffSelector};
pub use time_matrix::{PointTimeMatrix, TimeMatrixConfig, TimeMatrixService};
pub use validator::PathValidator;

/// Routing engine shared by every component of a matcher.
pub type SharedRoutingEngine = Arc<dyn RoutingEngine>;
