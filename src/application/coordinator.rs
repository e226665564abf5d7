//! The single funnel every external event goes through.
//!
//! All state mutation is serialized through one mutex (single-writer
//! discipline); the lock is held only for the mutate-and-snapshot step, and
//! fan-out happens after it is released, so a slow or unreachable observer
//! can never stall the mutation path. The store is always mutated before any
//! broadcast: a notification may be lost under failure, but a notification
//! for state the store does not reflect cannot happen.

use crate::application::broadcaster::Broadcaster;
use crate::application::observers::{ObserverId, ObserverRegistry};
use crate::application::ports::{Clock, PolicyRecords, StoreError};
use crate::application::store::{OverrideStatus, PolicyStore};
use crate::domain::host::Domain;
use crate::domain::override_entry::OverrideState;
use crate::domain::resolve::resolve;
use crate::domain::timestamp::Timestamp;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Wires the policy store, resolver, registry, and broadcaster together.
///
/// Every external event kind funnels through here: permanent-list edits,
/// override set/clear, sweep ticks, store change notifications, observer
/// attach/reactivate, and force-resync.
#[derive(Debug)]
pub struct Coordinator {
    store: Mutex<PolicyStore>,
    registry: Arc<ObserverRegistry>,
    broadcaster: Broadcaster,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    /// Assemble a coordinator from its collaborators.
    pub fn new(
        store: PolicyStore,
        registry: Arc<ObserverRegistry>,
        broadcaster: Broadcaster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            registry,
            broadcaster,
            clock,
        }
    }

    /// The observer registry, for hosts that wire attach/detach events.
    pub fn registry(&self) -> &Arc<ObserverRegistry> {
        &self.registry
    }

    fn lock_store(&self) -> MutexGuard<'_, PolicyStore> {
        // Mutations persist before committing, so state behind a poisoned
        // lock is still consistent; recover rather than propagate the panic.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one serialized mutation, then re-resolve and broadcast for every
    /// affected domain outside the lock.
    fn mutate_and_notify<F>(&self, mutation: F) -> Result<Vec<Domain>, StoreError>
    where
        F: FnOnce(&mut PolicyStore, Timestamp) -> Result<Vec<Domain>, StoreError>,
    {
        let now = self.clock.now();
        let (affected, snapshot) = {
            let mut store = self.lock_store();
            let affected = mutation(&mut store, now)?;
            if affected.is_empty() {
                return Ok(affected);
            }
            (affected, store.snapshot())
        };

        self.broadcast_affected(&affected, &snapshot, now);
        Ok(affected)
    }

    fn broadcast_affected(&self, affected: &[Domain], snapshot: &PolicyRecords, now: Timestamp) {
        for domain in affected {
            let apply = resolve(domain, &snapshot.permanent, &snapshot.overrides, now);
            let attempted = self.broadcaster.broadcast(domain, apply);
            debug!(domain = %domain, apply, observers = attempted, "policy change broadcast");
        }
    }

    /// Add a domain to the permanent list and notify its observers.
    pub fn add_permanent(&self, domain: Domain) -> Result<(), StoreError> {
        self.mutate_and_notify(|store, _| store.add_permanent(domain))
            .map(drop)
    }

    /// Remove a domain from the permanent list and notify its observers.
    pub fn remove_permanent(&self, domain: &Domain) -> Result<(), StoreError> {
        self.mutate_and_notify(|store, _| store.remove_permanent(domain))
            .map(drop)
    }

    /// Create or replace a temporary override and notify its observers.
    pub fn set_override(
        &self,
        domain: Domain,
        state: OverrideState,
        duration: Duration,
    ) -> Result<(), StoreError> {
        self.mutate_and_notify(|store, now| store.set_override(domain, state, duration, now))
            .map(drop)
    }

    /// Cancel a temporary override and notify its observers.
    pub fn clear_override(&self, domain: &Domain) -> Result<(), StoreError> {
        self.mutate_and_notify(|store, _| store.clear_override(domain))
            .map(drop)
    }

    /// Evict every expired override and notify observers of evicted domains.
    ///
    /// The sweep tick is an ordinary serialized writer event; overrides
    /// expire even when no observer currently displays their domain.
    pub fn sweep(&self) -> Result<Vec<Domain>, StoreError> {
        self.mutate_and_notify(|store, now| store.evict_expired(now))
    }

    /// Derived override view for one domain (active flag, state, expiry,
    /// remaining duration).
    pub fn override_status(&self, domain: &Domain) -> OverrideStatus {
        let now = self.clock.now();
        self.lock_store().override_status(domain, now)
    }

    /// Current resolved policy for one domain.
    pub fn resolved(&self, domain: &Domain) -> bool {
        let now = self.clock.now();
        let store = self.lock_store();
        resolve(domain, store.permanent(), store.overrides(), now)
    }

    /// An observer navigated to (or loaded) `url`.
    ///
    /// Registers the observer under the extracted domain and pushes the
    /// current resolved policy to it alone. Non-http(s) and malformed URLs
    /// carry no domain: the observer is forgotten until its next navigation.
    pub fn observer_attached(&self, observer: ObserverId, url: &str) {
        match Domain::from_url(url) {
            Some(domain) => {
                self.registry.attach(observer, domain.clone());
                self.refresh_observer(observer, &domain);
            }
            None => {
                self.registry.detach(observer);
            }
        }
    }

    /// An observer became active/visible again; re-resolve and push without
    /// mutating. This is the pull-based reconciliation path for observers
    /// that missed a broadcast.
    pub fn observer_reactivated(&self, observer: ObserverId) {
        if let Some(domain) = self.registry.domain_of(observer) {
            self.refresh_observer(observer, &domain);
        }
    }

    /// The host learned an observer is gone.
    pub fn observer_gone(&self, observer: ObserverId) {
        self.registry.detach(observer);
    }

    /// Re-broadcast the current resolved policy to every known observer,
    /// each re-evaluated against its own current domain.
    pub fn resync_all(&self) {
        let now = self.clock.now();
        let snapshot = self.lock_store().snapshot();

        for (observer, domain) in self.registry.all() {
            let apply = resolve(&domain, &snapshot.permanent, &snapshot.overrides, now);
            self.broadcaster.push_to(observer, &domain, apply);
        }
    }

    /// The durable store reports an external change to either record.
    ///
    /// Treated identically to a local mutation: reload, diff, and notify
    /// only the domains whose resolution may have changed.
    pub fn store_changed(&self) -> Result<(), StoreError> {
        self.mutate_and_notify(|store, _| store.reload()).map(drop)
    }

    /// Resolve for one observer, evicting its domain's expired override
    /// opportunistically on the way.
    fn refresh_observer(&self, observer: ObserverId, domain: &Domain) {
        let now = self.clock.now();
        let apply = {
            let mut store = self.lock_store();
            // Cleanup only; resolution ignores expired entries either way,
            // so a failed eviction write does not change the verdict.
            if let Err(err) = store.evict_if_expired(domain, now) {
                warn!(domain = %domain, error = %err, "lazy override eviction failed");
            }
            resolve(domain, store.permanent(), store.overrides(), now)
        };
        self.broadcaster.push_to(observer, domain, apply);
    }
}
