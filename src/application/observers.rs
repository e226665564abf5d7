//! Registry of live observers and the domain each one displays.
//!
//! Observers appear and disappear outside the engine's control; the registry
//! holds best-effort, possibly-stale membership. No detach signal is required
//! from the observer side: delivery to a vanished observer fails and is
//! ignored, and the observer re-attaches on its next activation.

use crate::domain::host::Domain;
use dashmap::DashMap;

/// Opaque handle identifying one observer (e.g. a browser tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Wrap a host-assigned identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The underlying identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Concurrent mapping from observer to its currently displayed domain.
///
/// DashMap provides lock-free reads and fine-grained locking for writes, so
/// attach events never contend with the mutation path.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    map: DashMap<ObserverId, Domain>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `observer` currently displays `domain`.
    ///
    /// Attaching an already-known observer updates its domain (navigation).
    pub fn attach(&self, observer: ObserverId, domain: Domain) {
        self.map.insert(observer, domain);
    }

    /// Forget an observer. Returns the domain it was displaying, if known.
    pub fn detach(&self, observer: ObserverId) -> Option<Domain> {
        self.map.remove(&observer).map(|(_, domain)| domain)
    }

    /// The domain an observer currently displays, if known.
    pub fn domain_of(&self, observer: ObserverId) -> Option<Domain> {
        self.map.get(&observer).map(|entry| entry.value().clone())
    }

    /// All observers currently known to display `domain`.
    pub fn observers_of(&self, domain: &Domain) -> Vec<ObserverId> {
        self.map
            .iter()
            .filter(|entry| entry.value() == domain)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Enumerate every known observer with its domain, for bulk re-evaluation.
    pub fn all(&self) -> Vec<(ObserverId, Domain)> {
        self.map
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number of known observers.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no observers are known.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
