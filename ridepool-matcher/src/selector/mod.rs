//! Pickup and dropoff point selection.
//!
//! A [`PickupDropoffGenerator`] decides where a rider boards and alights for
//! a given offer. The [`PickupDropoffSelector`] caches that decision per
//! offer and request so point identities stay stable between rounds, and
//! records how long the rider walks to and from the chosen points.

mod road_snap;
mod route_proximity;

use std::sync::Arc;

use ridepool_core::{Offer, PathPoint, PointIdGenerator, Request};

pub use road_snap::RoadSnapGenerator;
pub use route_proximity::RouteProximityGenerator;

use crate::collections::SyncMap;
use crate::{MatchError, SharedRoutingEngine};

/// The boarding and alighting points chosen for a rider on an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupDropoff {
    /// Boarding point, owned by the request.
    pub pickup: PathPoint,
    /// Alighting point, owned by the request.
    pub dropoff: PathPoint,
}

/// Chooses pickup and dropoff locations for a request on an offer.
///
/// Generated points carry the rider's earliest departure on the pickup and
/// latest arrival on the dropoff as their initial expected arrival.
pub trait PickupDropoffGenerator: Send + Sync {
    /// Produce the pickup and dropoff for `request` on `offer`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Routing`] when the routing engine fails.
    fn generate(
        &self,
        offer: &Offer,
        request: &Arc<Request>,
        ids: &PointIdGenerator,
    ) -> Result<PickupDropoff, MatchError>;
}

/// Cached pickup and dropoff selection with rider walking times.
pub struct PickupDropoffSelector {
    generator: Box<dyn PickupDropoffGenerator>,
    engine: SharedRoutingEngine,
    ids: Arc<PointIdGenerator>,
    cache: SyncMap<(String, String), PickupDropoff>,
}

impl PickupDropoffSelector {
    /// Create a selector issuing point identifiers from `ids`.
    #[must_use]
    pub fn new(
        generator: Box<dyn PickupDropoffGenerator>,
        engine: SharedRoutingEngine,
        ids: Arc<PointIdGenerator>,
    ) -> Self {
        Self {
            generator,
            engine,
            ids,
            cache: SyncMap::new(),
        }
    }

    /// The pickup and dropoff for `request` on `offer`.
    ///
    /// The first call for a pair generates the points and measures the
    /// walks from the request's source and to its destination. Later calls
    /// return the cached points.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Routing`] when the routing engine fails.
    pub fn select(&self, offer: &Offer, request: &Arc<Request>) -> Result<PickupDropoff, MatchError> {
        let key = (offer.id.clone(), request.id.clone());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let generated = self.generator.generate(offer, request, &self.ids)?;
        let to_pickup = self
            .engine
            .compute_walking_time(&request.source, &generated.pickup.coordinate)?;
        let from_dropoff = self
            .engine
            .compute_walking_time(&generated.dropoff.coordinate, &request.destination)?;
        let selected = PickupDropoff {
            pickup: generated.pickup.with_walking_duration(to_pickup),
            dropoff: generated.dropoff.with_walking_duration(from_dropoff),
        };
        self.cache.insert(key, selected.clone());
        Ok(selected)
    }

    /// Forget every cached selection.
    pub fn reset(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for PickupDropoffSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickupDropoffSelector")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
