//! Optimistic packing-list synchronization.
//!
//! A [`PackingSynchronizer`] owns the local copy of one trip's packing list.
//! Toggling an item flips it locally before anything is sent, then persists
//! the complete list in a background task. Confirmations patch the
//! [`SharedCache`]; failures revert the local copy and raise one alert.
//!
//! Every local change bumps a version counter. A confirmation whose version
//! is older than the newest confirmed one is discarded, so responses that
//! arrive out of order never overwrite a newer cache state. A newer
//! confirmation also brings every settled item of the local copy back in line
//! with the list the server accepted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{ApiError, PackingListApi};
use crate::cache::SharedCache;
use crate::models::{ItemKey, PackingList, TripId};

/// Receives user-facing failure messages.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerts;

impl AlertSink for LogAlerts {
    fn alert(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Per-item toggle progress.
///
/// `Idle -> LocalApplied -> Sending -> Idle`. How the attempt ended is
/// reported by [`PendingToggle::settle`]; once it has, the item is `Idle`
/// and can be toggled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Idle,
    /// Flipped in the local copy; the request has not started yet
    LocalApplied,
    Sending,
}

impl TogglePhase {
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::LocalApplied | Self::Sending)
    }
}

/// How a toggle settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server accepted the change and the shared cache was patched
    Confirmed,
    /// Server accepted the change, but a newer version was already confirmed
    Superseded,
    /// Server rejected the change; the local copy was reverted
    RolledBack,
}

/// Handle to a toggle whose request is in flight.
#[derive(Debug)]
pub struct PendingToggle {
    key: ItemKey,
    version: u64,
    handle: JoinHandle<ToggleOutcome>,
}

impl PendingToggle {
    #[must_use]
    pub const fn key(&self) -> ItemKey {
        self.key
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Wait for the request to settle.
    pub async fn settle(self) -> ToggleOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!("Packing update task for {} failed: {}", self.key, error);
                ToggleOutcome::RolledBack
            }
        }
    }
}

#[derive(Debug)]
struct LocalState {
    list: Arc<PackingList>,
    version: u64,
    confirmed_version: u64,
    phases: HashMap<ItemKey, TogglePhase>,
}

impl LocalState {
    fn phase(&self, key: ItemKey) -> TogglePhase {
        self.phases.get(&key).copied().unwrap_or(TogglePhase::Idle)
    }
}

/// Everything the background task needs to finish one toggle.
struct Attempt {
    key: ItemKey,
    version: u64,
    previous: Arc<PackingList>,
    previous_packed: bool,
    snapshot: Arc<PackingList>,
}

struct Inner<A: ?Sized> {
    trip_id: TripId,
    api: Arc<A>,
    cache: SharedCache,
    alerts: Arc<dyn AlertSink>,
    state: Mutex<LocalState>,
    snapshots: watch::Sender<Arc<PackingList>>,
}

/// Optimistic synchronizer for one trip's packing list.
///
/// Must be used from within a tokio runtime.
pub struct PackingSynchronizer<A: PackingListApi + ?Sized + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: PackingListApi + ?Sized + 'static> Clone for PackingSynchronizer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: PackingListApi + ?Sized + 'static> PackingSynchronizer<A> {
    pub fn new(
        trip_id: TripId,
        list: PackingList,
        api: Arc<A>,
        cache: SharedCache,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let list = Arc::new(list);
        let (snapshots, _) = watch::channel(Arc::clone(&list));
        Self {
            inner: Arc::new(Inner {
                trip_id,
                api,
                cache,
                alerts,
                state: Mutex::new(LocalState {
                    list,
                    version: 0,
                    confirmed_version: 0,
                    phases: HashMap::new(),
                }),
                snapshots,
            }),
        }
    }

    #[must_use]
    pub fn trip_id(&self) -> &TripId {
        &self.inner.trip_id
    }

    /// Current local copy.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PackingList> {
        Arc::clone(&self.inner.lock().list)
    }

    /// Receiver that yields every new local copy (for re-rendering).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<PackingList>> {
        self.inner.snapshots.subscribe()
    }

    /// Number of local changes applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    #[must_use]
    pub fn phase(&self, key: ItemKey) -> TogglePhase {
        self.inner.lock().phase(key)
    }

    /// Whether a request for this item is outstanding (its control is disabled).
    #[must_use]
    pub fn is_updating(&self, key: ItemKey) -> bool {
        self.phase(key).is_in_flight()
    }

    /// Toggle the item at `index` within `category`.
    ///
    /// Returns `None` without sending anything when the address is invalid or
    /// the item already has a request in flight.
    pub fn toggle(&self, category: &str, index: usize) -> Option<PendingToggle> {
        let attempt = {
            let mut state = self.inner.lock();
            let Some(key) = state.list.locate(category, index) else {
                tracing::error!(
                    "Cannot toggle packing item: trip {} has no item {}[{}]",
                    self.inner.trip_id,
                    category,
                    index
                );
                return None;
            };
            self.inner.apply(&mut state, key)?
        };
        Some(self.spawn(attempt))
    }

    /// Toggle the item with the given stable key.
    pub fn toggle_key(&self, key: ItemKey) -> Option<PendingToggle> {
        let attempt = {
            let mut state = self.inner.lock();
            self.inner.apply(&mut state, key)?
        };
        Some(self.spawn(attempt))
    }

    fn spawn(&self, attempt: Attempt) -> PendingToggle {
        let key = attempt.key;
        let version = attempt.version;
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.send(attempt).await });
        PendingToggle {
            key,
            version,
            handle,
        }
    }
}

impl<A: PackingListApi + ?Sized + 'static> Inner<A> {
    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip the item locally and publish the new copy.
    fn apply(&self, state: &mut LocalState, key: ItemKey) -> Option<Attempt> {
        if state.phase(key).is_in_flight() {
            tracing::warn!(
                "Ignoring toggle of {} on trip {}: update already in flight",
                key,
                self.trip_id
            );
            return None;
        }

        let Some(previous_packed) = state.list.find(key).map(|position| position.item.packed)
        else {
            tracing::error!(
                "Cannot toggle packing item: trip {} has no item {}",
                self.trip_id,
                key
            );
            return None;
        };
        let snapshot = Arc::new(state.list.with_packed(key, !previous_packed)?);
        let previous = std::mem::replace(&mut state.list, Arc::clone(&snapshot));
        state.version += 1;
        state.phases.insert(key, TogglePhase::LocalApplied);
        self.snapshots.send_replace(Arc::clone(&snapshot));

        tracing::debug!(
            "Toggled {} on trip {} to packed={} (version {})",
            key,
            self.trip_id,
            !previous_packed,
            state.version
        );

        Some(Attempt {
            key,
            version: state.version,
            previous,
            previous_packed,
            snapshot,
        })
    }

    async fn send(&self, attempt: Attempt) -> ToggleOutcome {
        self.lock().phases.insert(attempt.key, TogglePhase::Sending);
        match self
            .api
            .update_packing_list(&self.trip_id, &attempt.snapshot)
            .await
        {
            Ok(_) => self.confirm(&attempt),
            Err(error) => self.roll_back(&attempt, &error),
        }
    }

    fn confirm(&self, attempt: &Attempt) -> ToggleOutcome {
        let mut state = self.lock();
        state.phases.remove(&attempt.key);

        if attempt.version <= state.confirmed_version {
            tracing::debug!(
                "Discarding stale confirmation for trip {} (version {} <= {})",
                self.trip_id,
                attempt.version,
                state.confirmed_version
            );
            return ToggleOutcome::Superseded;
        }

        state.confirmed_version = attempt.version;
        // Patched under the state lock so a newer confirmation cannot interleave.
        if !self
            .cache
            .patch_packing_list(&self.trip_id, &attempt.snapshot)
        {
            tracing::debug!("Trip {} is not cached; nothing to patch", self.trip_id);
        }

        // Items that settled earlier (a rollback included) take the accepted
        // values; items still in flight keep their local flip.
        let reconciled = state
            .list
            .with_packed_from(&attempt.snapshot, |key| state.phase(key).is_in_flight());
        if let Some(list) = reconciled {
            tracing::debug!(
                "Reconciled local packing list of trip {} with confirmed version {}",
                self.trip_id,
                attempt.version
            );
            let list = Arc::new(list);
            state.list = Arc::clone(&list);
            state.version += 1;
            self.snapshots.send_replace(list);
        }
        ToggleOutcome::Confirmed
    }

    fn roll_back(&self, attempt: &Attempt, error: &ApiError) -> ToggleOutcome {
        tracing::warn!(
            "Packing update for trip {} failed, reverting {}: {}",
            self.trip_id,
            attempt.key,
            error
        );

        {
            let mut state = self.lock();
            let reverted = if state.version == attempt.version {
                Arc::clone(&attempt.previous)
            } else {
                // Later changes were applied on top; undo only this item.
                state
                    .list
                    .with_packed(attempt.key, attempt.previous_packed)
                    .map_or_else(|| Arc::clone(&state.list), Arc::new)
            };
            state.list = Arc::clone(&reverted);
            state.version += 1;
            state.phases.remove(&attempt.key);
            self.snapshots.send_replace(reverted);
        }

        self.alerts
            .alert(&format!("Failed to update packing list: {error}"));
        ToggleOutcome::RolledBack
    }
}
