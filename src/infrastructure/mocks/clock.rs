//! Mock clock for testing.

use crate::application::ports::Clock;
use crate::domain::timestamp::Timestamp;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling
/// deterministic testing of expiry behavior.
///
/// # Examples
///
/// ```
/// use policy_sync::infrastructure::mocks::MockClock;
/// use policy_sync::application::ports::Clock;
/// use policy_sync::Timestamp;
/// use std::time::Duration;
///
/// let clock = MockClock::new(Timestamp::from_millis(1_000));
/// assert_eq!(clock.now(), Timestamp::from_millis(1_000));
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), Timestamp::from_millis(11_000));
///
/// clock.set(Timestamp::from_millis(500_000));
/// assert_eq!(clock.now(), Timestamp::from_millis(500_000));
/// ```
///
/// # Thread Safety
///
/// `MockClock` is thread-safe and can be cloned to share across threads.
/// All clones share the same underlying time value.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Timestamp>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific time.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = *time + duration;
    }

    /// Set the clock to a specific time.
    pub fn set(&self, timestamp: Timestamp) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = timestamp;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}
