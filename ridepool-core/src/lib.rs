//! Core domain types for the ridepool matching engine.
//!
//! The crate models driver offers, rider requests and the path points that
//! link them, together with the collaborator traits the matcher consumes:
//! [`RoutingEngine`] for travel durations and [`VehicleRoutingSolver`] for
//! the optional external pickup-and-delivery solver. Constructors and
//! `validate` methods return `Result` to surface invalid input early.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod coordinate;
pub mod offer;
pub mod point;
pub mod preference;
pub mod request;
pub mod result;
pub mod routing;
pub mod solver;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod time;

mod error;

pub use coordinate::{Coordinate, CoordinateError};
pub use error::ModelError;
pub use offer::{MatchedRequest, Offer, OfferParams};
pub use point::{PathPoint, PointId, PointIdGenerator, PointOwner, PointType};
pub use preference::{Gender, Preference};
pub use request::Request;
pub use result::MatchingResult;
pub use routing::{Isochrone, Profile, RoutingEngine, RoutingError, TravelTimeMatrix};
pub use solver::{
    PickupDeliveryProblem, PickupDropoffPair, SolverError, SolverTimeWindow, VehicleRoutingSolver,
    Visit,
};
