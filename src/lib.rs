//! Facade crate for the ridepool matching engine.
//!
//! This crate re-exports the domain types and the [`Matcher`], and exposes
//! the optional vehicle routing solver adapters behind feature flags.

#![forbid(unsafe_code)]

pub use ridepool_core::{
    Coordinate, CoordinateError, Gender, MatchedRequest, MatchingResult, ModelError, Offer,
    OfferParams, PathPoint, PickupDeliveryProblem, PointId, PointIdGenerator, PointOwner,
    PointType, Preference, Profile, Request, RoutingEngine, RoutingError, SolverError,
    TravelTimeMatrix, VehicleRoutingSolver, Visit,
};
pub use ridepool_matcher::{
    MatchError, Matcher, MatcherBuilder, MatcherConfig, SharedRoutingEngine,
};

#[cfg(feature = "test-support")]
pub use ridepool_core::test_support;

#[cfg(feature = "solver-vrp")]
pub use ridepool_solver_vrp::{VrpSolver, VrpSolverConfig};

#[cfg(feature = "solver-ortools")]
pub use ridepool_solver_ortools::{OrtoolsSolver, OrtoolsSolverConfig, SolverTuning};
