//! Settings store with write-failure injection for testing.

use crate::application::ports::{PolicyRecords, SettingsStore, StoreError};
use crate::domain::host::Domain;
use crate::domain::override_entry::OverrideEntry;
use crate::infrastructure::memory_store::MemoryStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Wraps a [`MemoryStore`] and fails writes on demand.
///
/// Used to verify that in-memory state is never updated when the durable
/// write fails, and that sweep failures do not stop future ticks.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    /// Create a store that initially accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail until [`heal`](FlakyStore::heal) is called.
    pub fn break_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make subsequent writes succeed again.
    pub fn heal(&self) {
        self.fail_writes.store(false, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Write("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SettingsStore for FlakyStore {
    fn load(&self) -> Result<PolicyRecords, StoreError> {
        self.inner.load()
    }

    fn save_permanent(&self, permanent: &BTreeSet<Domain>) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.save_permanent(permanent)
    }

    fn save_overrides(
        &self,
        overrides: &BTreeMap<Domain, OverrideEntry>,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.save_overrides(overrides)
    }
}
