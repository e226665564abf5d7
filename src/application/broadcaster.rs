//! Best-effort fan-out of resolved policy to observers.

use crate::application::observers::{ObserverId, ObserverRegistry};
use crate::application::ports::{ObserverTransport, PolicyUpdate};
use crate::domain::host::Domain;
use std::sync::Arc;
use tracing::debug;

/// Pushes resolved policy to every observer of a domain.
///
/// Deliveries are independent: failure of one never prevents or alters
/// delivery to another, and no failure is surfaced to the mutation path.
/// A failed send is treated identically to a successful no-op send; the
/// observer self-corrects the next time it attaches or reactivates.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ObserverRegistry>,
    transport: Arc<dyn ObserverTransport>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry and a transport.
    pub fn new(registry: Arc<ObserverRegistry>, transport: Arc<dyn ObserverTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Push a resolved verdict to a single observer, fire-and-forget.
    pub fn push_to(&self, observer: ObserverId, domain: &Domain, apply: bool) {
        let update = PolicyUpdate::from_resolved(domain.clone(), apply);
        if let Err(err) = self.transport.deliver(observer, &update) {
            // Routine churn: the observer may have closed or navigated away.
            debug!(
                observer = observer.get(),
                domain = %domain,
                error = %err,
                "policy delivery failed, ignoring"
            );
        }
    }

    /// Push a resolved verdict to every known observer of `domain`.
    ///
    /// Returns the number of deliveries attempted.
    pub fn broadcast(&self, domain: &Domain, apply: bool) -> usize {
        let observers = self.registry.observers_of(domain);
        for observer in &observers {
            self.push_to(*observer, domain, apply);
        }
        observers.len()
    }
}
