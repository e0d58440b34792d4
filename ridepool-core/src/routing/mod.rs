//! Routing collaborator consumed by the matcher.
//!
//! [`RoutingEngine`] abstracts the road-network service that answers
//! driving-time, matrix, walking-time and road-snapping queries. All methods
//! are synchronous; implementations backed by HTTP services block internally.
//! Failures are returned as [`RoutingError`] and are never retried by the
//! matcher.

mod engine;
mod error;

pub use engine::{Isochrone, Profile, RoutingEngine, TravelTimeMatrix};
pub use error::RoutingError;
