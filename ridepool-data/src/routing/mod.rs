//! HTTP routing engine backed by OSRM.
//!
//! [`OsrmRoutingEngine`] serves the matcher's road-network queries from an
//! OSRM deployment:
//!
//! | Query | OSRM service |
//! |-------|--------------|
//! | driving time along waypoints | `table`, summing consecutive legs |
//! | travel-time matrix | `table` |
//! | walking time | `route` on the walking profile |
//! | snapping to the road | `nearest` on the driving profile |
//!
//! The [`ridepool_core::RoutingEngine`] trait is synchronous, so the engine
//! blocks on its HTTP calls internally.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use chrono::Utc;
//! use ridepool_core::{Coordinate, RoutingEngine};
//! use ridepool_data::routing::{OsrmRoutingEngine, OsrmRoutingEngineConfig};
//!
//! let config = OsrmRoutingEngineConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("dispatch/1.0");
//! let engine = OsrmRoutingEngine::with_config(config)?;
//!
//! let waypoints = [Coordinate::new(30.04, 31.23)?, Coordinate::new(30.07, 31.28)?];
//! let cumulative = engine.compute_driving_time(&waypoints, Utc::now())?;
//! println!("trip takes {:?}", cumulative.last());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod engine;
mod osrm;

pub use engine::{
    DEFAULT_USER_AGENT, EngineBuildError, OsrmRoutingEngine, OsrmRoutingEngineConfig,
};
