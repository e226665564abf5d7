//! In-process settings store adapter.
//!
//! Holds the two logical records as bincode-encoded values under fixed keys,
//! matching the shape of a real external key-value collaborator (two
//! top-level records, get/set semantics, empty defaults for missing keys).
//! Useful as the default backend for embedding hosts that bring their own
//! durability, and as the production-shaped store in tests.

use crate::application::ports::{PolicyRecords, SettingsStore, StoreError};
use crate::domain::host::Domain;
use crate::domain::override_entry::OverrideEntry;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};

const KEY_PERMANENT: &str = "permanent_domains";
const KEY_OVERRIDES: &str = "temporary_overrides";

/// In-memory key-value store holding serialized policy records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<&'static str, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store; both records default to empty on first load.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with records, as if written by another
    /// process instance.
    pub fn seed(&self, records: &PolicyRecords) -> Result<(), StoreError> {
        self.save_permanent(&records.permanent)?;
        self.save_overrides(&records.overrides)
    }

    fn decode<T: serde::de::DeserializeOwned + Default>(
        &self,
        key: &'static str,
    ) -> Result<T, StoreError> {
        match self.records.get(key) {
            Some(bytes) => {
                bincode::deserialize(&bytes).map_err(|e| StoreError::Load(e.to_string()))
            }
            None => Ok(T::default()),
        }
    }

    fn encode<T: serde::Serialize>(&self, key: &'static str, value: &T) -> Result<(), StoreError> {
        let bytes = bincode::serialize(value).map_err(|e| StoreError::Write(e.to_string()))?;
        self.records.insert(key, bytes);
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<PolicyRecords, StoreError> {
        Ok(PolicyRecords {
            permanent: self.decode(KEY_PERMANENT)?,
            overrides: self.decode(KEY_OVERRIDES)?,
        })
    }

    fn save_permanent(&self, permanent: &BTreeSet<Domain>) -> Result<(), StoreError> {
        self.encode(KEY_PERMANENT, permanent)
    }

    fn save_overrides(
        &self,
        overrides: &BTreeMap<Domain, OverrideEntry>,
    ) -> Result<(), StoreError> {
        self.encode(KEY_OVERRIDES, overrides)
    }
}
