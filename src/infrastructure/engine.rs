//! Engine assembly.
//!
//! [`PolicyEngine`] wires the clock, settings store, observer registry,
//! transport, and coordinator together, and owns the optional background
//! sweeper. Hosts feed it external events (UI requests, navigation events,
//! store change notifications) through the coordinator.

use crate::application::broadcaster::Broadcaster;
use crate::application::coordinator::Coordinator;
use crate::application::observers::ObserverRegistry;
use crate::application::ports::{Clock, ObserverTransport, SettingsStore, StoreError};
use crate::application::store::PolicyStore;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_store::MemoryStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::application::sweeper::{ExpirySweeper, ShutdownError, SweeperConfig, SweeperHandle};
#[cfg(feature = "async")]
use std::sync::Mutex;

/// Error returned when building a PolicyEngine fails.
#[derive(Debug)]
pub enum BuildError {
    /// An observer transport is required
    MissingTransport,
    /// Sweep interval must be greater than zero
    ZeroSweepInterval,
    /// Loading the initial records from the settings store failed
    Store(StoreError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingTransport => write!(f, "an observer transport is required"),
            BuildError::ZeroSweepInterval => write!(f, "sweep interval must be greater than 0"),
            BuildError::Store(e) => write!(f, "failed to open settings store: {e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<StoreError> for BuildError {
    fn from(e: StoreError) -> Self {
        BuildError::Store(e)
    }
}

/// Builder for constructing a [`PolicyEngine`].
pub struct PolicyEngineBuilder {
    settings: Option<Arc<dyn SettingsStore>>,
    transport: Option<Arc<dyn ObserverTransport>>,
    clock: Option<Arc<dyn Clock>>,
    sweep_interval: Duration,
}

impl PolicyEngineBuilder {
    /// Set the durable settings store. Defaults to an in-process
    /// [`MemoryStore`] when not provided.
    pub fn with_settings_store(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the observer transport. Required.
    pub fn with_transport(mut self, transport: Arc<dyn ObserverTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set a custom clock (mainly for testing). Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the sweep interval. Default: 60 seconds. The value is validated
    /// when `build()` is called.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Assemble the engine.
    ///
    /// # Errors
    /// Fails when no transport was provided, the sweep interval is zero, or
    /// the initial load from the settings store fails.
    pub fn build(self) -> Result<PolicyEngine, BuildError> {
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        if self.sweep_interval.is_zero() {
            return Err(BuildError::ZeroSweepInterval);
        }

        let settings = self
            .settings
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let store = PolicyStore::open(settings)?;
        let registry = Arc::new(ObserverRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), transport);
        let coordinator = Arc::new(Coordinator::new(store, registry, broadcaster, clock));

        Ok(PolicyEngine {
            coordinator,
            sweep_interval: self.sweep_interval,
            #[cfg(feature = "async")]
            sweeper: Mutex::new(None),
        })
    }
}

/// The assembled policy engine.
pub struct PolicyEngine {
    coordinator: Arc<Coordinator>,
    sweep_interval: Duration,
    #[cfg(feature = "async")]
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl PolicyEngine {
    /// Start building an engine.
    pub fn builder() -> PolicyEngineBuilder {
        PolicyEngineBuilder {
            settings: None,
            transport: None,
            clock: None,
            sweep_interval: Duration::from_secs(60),
        }
    }

    /// The coordinator, through which all external events are funneled.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// The configured sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Start the background expiry sweeper. Idempotent; must be called from
    /// within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn start_sweeper(&self) {
        let mut slot = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let config = SweeperConfig {
            interval: self.sweep_interval,
        };
        let sweeper = ExpirySweeper::new(Arc::clone(&self.coordinator), config);
        *slot = Some(sweeper.start());
    }

    /// Stop the background sweeper, if running.
    #[cfg(feature = "async")]
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let handle = {
            let mut slot = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        match handle {
            Some(handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockTransport;

    #[test]
    fn test_build_requires_transport() {
        let result = PolicyEngine::builder().build();
        assert!(matches!(result, Err(BuildError::MissingTransport)));
    }

    #[test]
    fn test_build_rejects_zero_interval() {
        let result = PolicyEngine::builder()
            .with_transport(Arc::new(MockTransport::new()))
            .with_sweep_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(BuildError::ZeroSweepInterval)));
    }

    #[test]
    fn test_build_with_defaults() {
        let engine = PolicyEngine::builder()
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();
        assert_eq!(engine.sweep_interval(), Duration::from_secs(60));
        assert!(engine.coordinator().registry().is_empty());
    }
}
