//! Mock observer transport for testing.

use crate::application::observers::ObserverId;
use crate::application::ports::{DeliveryError, ObserverTransport, PolicyUpdate};
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Records every delivered update and allows per-observer failure injection.
///
/// Failed observers still count as attempted deliveries, so tests can verify
/// that a failure for one observer never suppresses delivery to another.
#[derive(Debug, Default)]
pub struct MockTransport {
    delivered: Mutex<Vec<(ObserverId, PolicyUpdate)>>,
    failing: Mutex<BTreeSet<ObserverId>>,
    attempts: Mutex<usize>,
}

impl MockTransport {
    /// Create a transport that accepts every delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to `observer` fail with `DeliveryError::Unreachable`.
    pub fn fail_observer(&self, observer: ObserverId) {
        self.failing.lock().unwrap().insert(observer);
    }

    /// Restore deliveries to `observer`.
    pub fn restore_observer(&self, observer: ObserverId) {
        self.failing.lock().unwrap().remove(&observer);
    }

    /// All successfully delivered updates, in delivery order.
    pub fn deliveries(&self) -> Vec<(ObserverId, PolicyUpdate)> {
        self.delivered.lock().unwrap().clone()
    }

    /// Successfully delivered updates for one observer.
    pub fn deliveries_for(&self, observer: ObserverId) -> Vec<PolicyUpdate> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == observer)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Total delivery attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Forget all recorded deliveries and attempts.
    pub fn clear(&self) {
        self.delivered.lock().unwrap().clear();
        *self.attempts.lock().unwrap() = 0;
    }
}

impl ObserverTransport for MockTransport {
    fn deliver(&self, observer: ObserverId, update: &PolicyUpdate) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.lock().unwrap().contains(&observer) {
            return Err(DeliveryError::Unreachable);
        }
        self.delivered
            .lock()
            .unwrap()
            .push((observer, update.clone()));
        Ok(())
    }
}
