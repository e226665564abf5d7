//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::application::observers::ObserverId;
use crate::domain::host::Domain;
use crate::domain::override_entry::OverrideEntry;
use crate::domain::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Debug;

/// Port for obtaining current wall-clock time.
///
/// This abstraction allows the application layer to work with time without
/// depending on the system clock. Infrastructure provides concrete
/// implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> Timestamp;
}

/// The two durable records owned by the external key-value collaborator.
///
/// This is the persisted shape of the authoritative state: the permanent
/// list and the override map, both keyed by normalized domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecords {
    /// Durable, non-expiring set of domains with the effect enabled by
    /// default policy.
    pub permanent: BTreeSet<Domain>,
    /// Time-bounded exceptions, at most one per domain.
    pub overrides: BTreeMap<Domain, OverrideEntry>,
}

/// Error from the durable settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A durable write failed; in-memory state was left unchanged.
    Write(String),
    /// Loading or decoding a persisted record failed.
    Load(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Write(msg) => write!(f, "settings store write failed: {msg}"),
            StoreError::Load(msg) => write!(f, "settings store load failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Port for the external durable key-value store.
///
/// The engine assumes writes are eventually durable and that externally
/// originated changes are reported back through the coordinator's
/// store-change path. Both records default to empty when never written.
pub trait SettingsStore: Send + Sync + Debug {
    /// Load both records, substituting empty defaults for missing keys.
    fn load(&self) -> Result<PolicyRecords, StoreError>;

    /// Persist the permanent list.
    fn save_permanent(&self, permanent: &BTreeSet<Domain>) -> Result<(), StoreError>;

    /// Persist the override map.
    fn save_overrides(
        &self,
        overrides: &BTreeMap<Domain, OverrideEntry>,
    ) -> Result<(), StoreError>;
}

/// Instruction pushed to an observer after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyCommand {
    /// Apply the display effect.
    Apply,
    /// Remove the display effect.
    Remove,
}

/// A resolved-policy push addressed to one observer.
///
/// Observers ignore updates not addressed to their currently active domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyUpdate {
    /// What the observer should do with the effect.
    pub command: PolicyCommand,
    /// The domain this verdict applies to.
    pub domain: Domain,
}

impl PolicyUpdate {
    /// Build an update from a resolved boolean verdict.
    pub fn from_resolved(domain: Domain, apply: bool) -> Self {
        Self {
            command: if apply {
                PolicyCommand::Apply
            } else {
                PolicyCommand::Remove
            },
            domain,
        }
    }
}

/// Error delivering an update to one observer.
///
/// Observer churn is routine, not exceptional: callers treat a failed send
/// identically to a successful no-op send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The observer is gone or has no listener ready.
    Unreachable,
    /// The transport rejected the message.
    Rejected(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Unreachable => write!(f, "observer unreachable"),
            DeliveryError::Rejected(msg) => write!(f, "delivery rejected: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Port for pushing resolved policy to a single observer.
///
/// Delivery is fire-and-forget: no acknowledgement, no retry, and a slow or
/// unreachable observer must not affect delivery to any other observer.
pub trait ObserverTransport: Send + Sync + Debug {
    /// Attempt delivery to one observer.
    fn deliver(&self, observer: ObserverId, update: &PolicyUpdate) -> Result<(), DeliveryError>;
}
