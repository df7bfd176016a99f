//! Shared read caches for trips.
//!
//! Two views of the same server data are kept: trips by id, and the
//! upcoming/past listing. Any mounted view may observe changes through
//! [`SharedCache::subscribe`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::api::{ApiResult, TripSource};
use crate::models::{PackingList, PackingProgress, Trip, TripId, TripListing};

#[derive(Debug, Default)]
struct CacheState {
    trips: HashMap<TripId, Trip>,
    listing: Option<TripListing>,
}

/// Cloneable handle to the process-wide trip caches.
#[derive(Clone)]
pub struct SharedCache {
    state: Arc<RwLock<CacheState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedCache {
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            revision: Arc::new(revision),
        }
    }

    /// Receiver that changes whenever any cache entry changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    #[must_use]
    pub fn trip(&self, id: &TripId) -> Option<Trip> {
        self.read().trips.get(id).cloned()
    }

    pub fn put_trip(&self, trip: Trip) {
        self.write().trips.insert(trip.id.clone(), trip);
        self.bump();
    }

    #[must_use]
    pub fn listing(&self) -> Option<TripListing> {
        self.read().listing.clone()
    }

    pub fn put_listing(&self, listing: TripListing) {
        self.write().listing = Some(listing);
        self.bump();
    }

    /// Drop a trip from both views (after deletion or loss of access).
    pub fn invalidate_trip(&self, id: &TripId) {
        {
            let mut state = self.write();
            state.trips.remove(id);
            if let Some(listing) = state.listing.as_mut() {
                listing.remove(id);
            }
        }
        self.bump();
    }

    pub fn clear(&self) {
        {
            let mut state = self.write();
            state.trips.clear();
            state.listing = None;
        }
        self.bump();
    }

    /// Replace the packing list of `id` wherever the trip is cached.
    ///
    /// Returns `false` when the trip is in neither view.
    pub fn patch_packing_list(&self, id: &TripId, list: &PackingList) -> bool {
        let patched = {
            let mut state = self.write();
            let mut patched = false;
            if let Some(trip) = state.trips.get_mut(id) {
                trip.packing_list = list.clone();
                patched = true;
            }
            if let Some(trip) = state.listing.as_mut().and_then(|listing| listing.find_mut(id)) {
                trip.packing_list = list.clone();
                patched = true;
            }
            patched
        };

        if patched {
            tracing::debug!("Patched cached packing list for trip {}", id);
            self.bump();
        }
        patched
    }

    /// Packing progress as shown by list views; falls back to the listing.
    #[must_use]
    pub fn packing_progress(&self, id: &TripId) -> Option<PackingProgress> {
        let state = self.read();
        state
            .trips
            .get(id)
            .or_else(|| state.listing.as_ref().and_then(|listing| listing.find(id)))
            .map(|trip| trip.packing_list.progress())
    }

    /// Cached trip, fetching and caching it on a miss.
    pub async fn load_trip<A>(&self, api: &A, id: &TripId) -> ApiResult<Trip>
    where
        A: TripSource + ?Sized,
    {
        if let Some(trip) = self.trip(id) {
            return Ok(trip);
        }
        let trip = api.get_trip(id).await?;
        self.put_trip(trip.clone());
        Ok(trip)
    }

    /// Always refetch the listing and store it.
    pub async fn refresh_listing<A>(&self, api: &A) -> ApiResult<TripListing>
    where
        A: TripSource + ?Sized,
    {
        let listing = api.list_trips().await?;
        self.put_listing(listing.clone());
        Ok(listing)
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
