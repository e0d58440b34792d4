//! Adapters between the matching engine and the outside world.
//!
//! - [`routing`] implements [`ridepool_core::RoutingEngine`] against an OSRM
//!   HTTP service.
//! - [`wire`] decodes JSON batches of offers and requests and encodes
//!   matching results for the result sink.

#![forbid(unsafe_code)]

pub mod routing;
pub mod wire;
