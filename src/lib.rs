//! # policy-sync
//!
//! Per-domain boolean display policy with temporary overrides, expiry
//! sweeping, and best-effort observer synchronization.
//!
//! The engine derives a single verdict per domain ("apply the effect" or
//! "don't") from two overlapping sources of truth: a durable permanent list
//! and a map of time-bounded overrides. An active override wins outright in
//! both directions; otherwise permanent membership decides. Every change in
//! the resolved verdict is pushed to the observers currently displaying that
//! domain (e.g. browser tabs), fire-and-forget.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use policy_sync::{
//!     Domain, DeliveryError, ObserverId, ObserverTransport, OverrideState,
//!     PolicyEngine, PolicyUpdate,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // The transport is whatever reaches your observers; here, stdout.
//! #[derive(Debug)]
//! struct PrintTransport;
//!
//! impl ObserverTransport for PrintTransport {
//!     fn deliver(&self, observer: ObserverId, update: &PolicyUpdate) -> Result<(), DeliveryError> {
//!         println!("-> observer {}: {:?} {}", observer.get(), update.command, update.domain);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = PolicyEngine::builder()
//!     .with_transport(Arc::new(PrintTransport))
//!     .with_sweep_interval(Duration::from_secs(60))
//!     .build()?;
//!
//! let coordinator = engine.coordinator();
//!
//! // A tab navigated somewhere; it immediately receives the current verdict.
//! coordinator.observer_attached(ObserverId::new(1), "https://www.example.com/article");
//!
//! // Permanently enable the effect for example.com.
//! coordinator.add_permanent(Domain::normalize("example.com").unwrap())?;
//!
//! // Pause it there for half an hour; the override masks the permanent entry.
//! coordinator.set_override(
//!     Domain::normalize("example.com").unwrap(),
//!     OverrideState::EffectOff,
//!     Duration::from_secs(30 * 60),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Resolution rule
//!
//! For a domain `d` at time `now`:
//! 1. If an override for `d` exists and `expires_at > now`, the verdict is
//!    `state == EffectOn`; permanent membership is ignored entirely.
//! 2. Otherwise the verdict is permanent-list membership. An expired
//!    override behaves exactly like no override; eviction merely reclaims it.
//!
//! ## Delivery model
//!
//! Observer fan-out is best-effort, unordered, and non-blocking with respect
//! to the mutation path. A failed delivery is equivalent to a successful
//! no-op; an observer that missed an update self-corrects the next time it
//! attaches or reactivates. The durable store is always written before any
//! broadcast, so observers can never see a verdict the store does not hold.
//!
//! ## Sweeping
//!
//! With the `async` feature (default), [`PolicyEngine::start_sweeper`]
//! spawns a recurring tokio task (60 s period by default) that evicts
//! expired overrides and notifies affected observers, independent of any
//! observer activity. The same idempotent eviction also runs lazily when an
//! observer attaches, so the two paths can never race destructively.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    host::Domain,
    override_entry::{OverrideEntry, OverrideState},
    resolve::resolve,
    timestamp::Timestamp,
};

pub use application::{
    broadcaster::Broadcaster,
    coordinator::Coordinator,
    observers::{ObserverId, ObserverRegistry},
    ports::{
        Clock, DeliveryError, ObserverTransport, PolicyCommand, PolicyRecords, PolicyUpdate,
        SettingsStore, StoreError,
    },
    store::{OverrideStatus, PolicyStore},
};

#[cfg(feature = "async")]
pub use application::sweeper::{
    ExpirySweeper, ShutdownError, SweeperConfig, SweeperConfigError, SweeperHandle,
};

pub use infrastructure::{
    clock::SystemClock,
    engine::{BuildError, PolicyEngine, PolicyEngineBuilder},
    memory_store::MemoryStore,
};
