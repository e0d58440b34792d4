//! Native pickup-and-delivery solver for the ride-pooling matcher.
//!
//! This crate provides [`VrpSolver`], an implementation of the
//! [`VehicleRoutingSolver`](ridepool_core::VehicleRoutingSolver) trait backed
//! by the `vrp-core` metaheuristics. Each problem is modelled as a single
//! vehicle starting at the driver's source and finishing at the driver's
//! destination, with one pickup-and-delivery job per request. A problem the
//! solver cannot fully assign is reported as having no route.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod solver;
mod vrp;

pub use solver::{VrpSolver, VrpSolverConfig};
