//! Periodic reclamation of expired overrides.
//!
//! A single recurring timer drives the coordinator's sweep path. Sweep
//! failures are logged and retried on the next tick; a failed sweep never
//! crashes the task and never prevents future ticks.

use crate::application::coordinator::Coordinator;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweeperConfigError {
    /// Sweep interval must be greater than zero
    ZeroSweepInterval,
}

impl fmt::Display for SweeperConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweeperConfigError::ZeroSweepInterval => {
                write!(f, "sweep interval must be greater than 0")
            }
        }
    }
}

impl std::error::Error for SweeperConfigError {}

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to scan for expired overrides.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl SweeperConfig {
    /// Create a sweeper config with the specified interval.
    ///
    /// # Errors
    /// Returns `SweeperConfigError::ZeroSweepInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroSweepInterval);
        }
        Ok(Self { interval })
    }
}

/// Recurring background task that evicts expired overrides.
///
/// Runs independently of observer activity: overrides expire even when no
/// observer currently displays their domain.
pub struct ExpirySweeper {
    coordinator: Arc<Coordinator>,
    config: SweeperConfig,
}

impl ExpirySweeper {
    /// Create a sweeper over a coordinator.
    pub fn new(coordinator: Arc<Coordinator>, config: SweeperConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Spawn the recurring sweep task.
    ///
    /// The first sweep fires one full interval after start. The returned
    /// handle requires an explicit [`SweeperHandle::shutdown`] call; dropping
    /// it leaves the task running.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval() fires immediately; consume that tick so the first
            // sweep happens a full period after start.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.coordinator.sweep() {
                            Ok(evicted) if !evicted.is_empty() => {
                                debug!(count = evicted.len(), "sweep evicted expired overrides");
                            }
                            Ok(_) => {}
                            Err(err) => {
                                warn!(error = %err, "sweep failed, retrying on next tick");
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Error returned when sweeper shutdown fails.
#[derive(Debug)]
pub enum ShutdownError {
    /// The sweep task panicked before shutdown completed
    TaskPanicked,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "sweep task panicked"),
        }
    }
}

impl std::error::Error for ShutdownError {}

/// Handle to a running sweep task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep task and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        // The receiver may already be gone if the task panicked.
        let _ = self.shutdown.send(true);
        self.task.await.map_err(|_| ShutdownError::TaskPanicked)
    }

    /// Whether the sweep task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
