//! Travel-time matrices keyed by path point.
//!
//! Path validation needs the driving time between any two points that can
//! appear on an offer's candidate routes: the route's current stops plus the
//! pickup and dropoff of every candidate request. [`TimeMatrixService`]
//! fetches those matrices from the routing engine in one call and caches
//! them for the rest of the run.
//!
//! Offers with at most [`TimeMatrixConfig::caching_bound`] candidates share
//! one matrix covering all of them. Busier offers get one smaller matrix per
//! request, built on first use and dropped whenever the offer's route
//! changes.

mod point_matrix;

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use ridepool_core::{Offer, PathPoint, Request};

pub use point_matrix::PointTimeMatrix;

use crate::collections::SyncMap;
use crate::selector::PickupDropoffSelector;
use crate::{MatchError, SharedRoutingEngine};

/// Configuration for [`TimeMatrixService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMatrixConfig {
    /// Largest number of candidate requests for which one matrix per offer
    /// is cached.
    pub caching_bound: usize,
}

impl Default for TimeMatrixConfig {
    fn default() -> Self {
        Self { caching_bound: 40 }
    }
}

/// Cached travel-time lookups between path points.
pub struct TimeMatrixService {
    engine: SharedRoutingEngine,
    selector: Arc<PickupDropoffSelector>,
    config: TimeMatrixConfig,
    per_offer: SyncMap<String, Arc<PointTimeMatrix>>,
    per_pair: SyncMap<(String, String), Arc<PointTimeMatrix>>,
}

impl TimeMatrixService {
    /// Create a service with the default configuration.
    #[must_use]
    pub fn new(engine: SharedRoutingEngine, selector: Arc<PickupDropoffSelector>) -> Self {
        Self::with_config(engine, selector, TimeMatrixConfig::default())
    }

    /// Create a service with explicit configuration.
    #[must_use]
    pub const fn with_config(
        engine: SharedRoutingEngine,
        selector: Arc<PickupDropoffSelector>,
        config: TimeMatrixConfig,
    ) -> Self {
        Self {
            engine,
            selector,
            config,
            per_offer: SyncMap::new(),
            per_pair: SyncMap::new(),
        }
    }

    /// Prepare the shared matrix for `offer` against `candidates`.
    ///
    /// Does nothing when the offer has more candidates than the caching
    /// bound, or when the cached matrix already covers every point.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Routing`] when point selection or the matrix
    /// query fails.
    pub fn populate(&self, offer: &Offer, candidates: &[Arc<Request>]) -> Result<(), MatchError> {
        if candidates.len() > self.config.caching_bound {
            return Ok(());
        }
        let mut points = offer.path.clone();
        for request in candidates {
            let selected = self.selector.select(offer, request)?;
            points.push(selected.pickup);
            points.push(selected.dropoff);
        }
        if self
            .per_offer
            .get(&offer.id)
            .is_some_and(|cached| cached.covers(&points))
        {
            return Ok(());
        }
        let matrix = PointTimeMatrix::build(&*self.engine, &points, offer.departure_time)?;
        debug!(
            "cached {}x{} travel-time matrix for offer {}",
            matrix.len(),
            matrix.len(),
            offer.id
        );
        self.per_offer.insert(offer.id.clone(), Arc::new(matrix));
        Ok(())
    }

    /// The matrix covering `offer`'s route and `request`'s points.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Routing`] when point selection or the matrix
    /// query fails.
    pub fn matrix_for(
        &self,
        offer: &Offer,
        request: &Arc<Request>,
    ) -> Result<Arc<PointTimeMatrix>, MatchError> {
        let selected = self.selector.select(offer, request)?;
        let mut points = offer.path.clone();
        points.push(selected.pickup);
        points.push(selected.dropoff);
        if let Some(shared) = self
            .per_offer
            .get(&offer.id)
            .filter(|cached| cached.covers(&points))
        {
            return Ok(shared);
        }
        let key = (offer.id.clone(), request.id.clone());
        if let Some(pair) = self
            .per_pair
            .get(&key)
            .filter(|cached| cached.covers(&points))
        {
            return Ok(pair);
        }
        let matrix = Arc::new(PointTimeMatrix::build(
            &*self.engine,
            &points,
            offer.departure_time,
        )?);
        self.per_pair.insert(key, Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Elapsed driving time from the start of `path` to each of its points.
    ///
    /// The first entry is always zero.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::PathTooShort`] for an empty path and
    /// [`MatchError::MissingPoint`] when a point is neither on the offer's
    /// route nor one of the request's points.
    pub fn cumulative_durations(
        &self,
        offer: &Offer,
        request: &Arc<Request>,
        path: &[PathPoint],
    ) -> Result<Vec<Duration>, MatchError> {
        if path.is_empty() {
            return Err(MatchError::PathTooShort { len: 0 });
        }
        let matrix = self.matrix_for(offer, request)?;
        let mut elapsed = Duration::ZERO;
        let mut cumulative = Vec::with_capacity(path.len());
        cumulative.push(elapsed);
        for leg in path.windows(2) {
            if let [from, to] = leg {
                elapsed = elapsed.saturating_add(matrix.duration(&offer.id, from.id, to.id)?);
                cumulative.push(elapsed);
            }
        }
        Ok(cumulative)
    }

    /// Driving time between two points.
    ///
    /// # Errors
    ///
    /// As for [`TimeMatrixService::cumulative_durations`].
    pub fn duration(
        &self,
        offer: &Offer,
        request: &Arc<Request>,
        from: &PathPoint,
        to: &PathPoint,
    ) -> Result<Duration, MatchError> {
        self.matrix_for(offer, request)?
            .duration(&offer.id, from.id, to.id)
    }

    /// Drop the per-request matrices of `offer_id` after its route changed.
    pub fn invalidate_pairs(&self, offer_id: &str) {
        self.per_pair.retain(|(offer, _), _| offer != offer_id);
    }

    /// Drop every matrix of `offer_id`.
    pub fn forget_offer(&self, offer_id: &str) {
        self.per_offer.remove(&offer_id.to_owned());
        self.invalidate_pairs(offer_id);
    }

    /// Drop every cached matrix.
    pub fn reset(&self) {
        self.per_offer.clear();
        self.per_pair.clear();
    }
}

impl std::fmt::Debug for TimeMatrixService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeMatrixService")
            .field("config", &self.config)
            .field("per_offer", &self.per_offer.len())
            .field("per_pair", &self.per_pair.len())
            .finish_non_exhaustive()
    }
}
