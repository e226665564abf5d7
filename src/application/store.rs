//! The authoritative policy state and its mutation operations.
//!
//! [`PolicyStore`] owns the in-memory pair (permanent set, override map) and
//! the handle to the durable settings store. Every mutation persists first
//! and commits to memory only after the durable write is confirmed, so the
//! resolved policy can never get ahead of what the store actually reflects.
//! Every mutation reports the domains whose resolved policy might have
//! changed, so notification can be targeted rather than broadcast to all.

use crate::application::ports::{PolicyRecords, SettingsStore, StoreError};
use crate::domain::host::Domain;
use crate::domain::override_entry::{OverrideEntry, OverrideState};
use crate::domain::timestamp::Timestamp;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Derived view of one domain's override, for the controlling surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideStatus {
    /// Whether an active override exists at the queried instant.
    pub active: bool,
    /// The pinned verdict, when active.
    pub state: Option<OverrideState>,
    /// The expiry deadline, when active.
    pub expires_at: Option<Timestamp>,
    /// Time left until expiry, when active. Recomputed on demand; any
    /// periodic countdown re-render belongs to the presentation layer.
    pub remaining: Option<Duration>,
}

impl OverrideStatus {
    fn inactive() -> Self {
        Self {
            active: false,
            state: None,
            expires_at: None,
            remaining: None,
        }
    }
}

/// The single source of truth for both authoritative records.
///
/// Constructed once per process and driven exclusively through the
/// coordinator's single-writer discipline; reads are side-effect-free.
#[derive(Debug)]
pub struct PolicyStore {
    permanent: BTreeSet<Domain>,
    overrides: BTreeMap<Domain, OverrideEntry>,
    settings: Arc<dyn SettingsStore>,
}

impl PolicyStore {
    /// Open the store, loading both records from the durable collaborator.
    pub fn open(settings: Arc<dyn SettingsStore>) -> Result<Self, StoreError> {
        let records = settings.load()?;
        Ok(Self {
            permanent: records.permanent,
            overrides: records.overrides,
            settings,
        })
    }

    /// The permanent set.
    pub fn permanent(&self) -> &BTreeSet<Domain> {
        &self.permanent
    }

    /// The override map. May transiently contain expired entries; the
    /// resolver ignores them and eviction reclaims them.
    pub fn overrides(&self) -> &BTreeMap<Domain, OverrideEntry> {
        &self.overrides
    }

    /// Clone both records for evaluation outside the writer lock.
    pub fn snapshot(&self) -> PolicyRecords {
        PolicyRecords {
            permanent: self.permanent.clone(),
            overrides: self.overrides.clone(),
        }
    }

    /// Add a domain to the permanent list. Idempotent: adding an
    /// already-present domain is a no-op with no store write and no
    /// affected domains.
    pub fn add_permanent(&mut self, domain: Domain) -> Result<Vec<Domain>, StoreError> {
        if self.permanent.contains(&domain) {
            return Ok(Vec::new());
        }
        let mut next = self.permanent.clone();
        next.insert(domain.clone());
        self.settings.save_permanent(&next)?;
        self.permanent = next;
        Ok(vec![domain])
    }

    /// Remove a domain from the permanent list. Idempotent.
    pub fn remove_permanent(&mut self, domain: &Domain) -> Result<Vec<Domain>, StoreError> {
        if !self.permanent.contains(domain) {
            return Ok(Vec::new());
        }
        let mut next = self.permanent.clone();
        next.remove(domain);
        self.settings.save_permanent(&next)?;
        self.permanent = next;
        Ok(vec![domain.clone()])
    }

    /// Create or replace the override for a domain.
    ///
    /// `expires_at = now + duration`; any existing entry is replaced
    /// unconditionally. Permanent membership at this moment is captured as
    /// `preceding_membership` for presentation phrasing.
    pub fn set_override(
        &mut self,
        domain: Domain,
        state: OverrideState,
        duration: Duration,
        now: Timestamp,
    ) -> Result<Vec<Domain>, StoreError> {
        let entry = OverrideEntry {
            state,
            expires_at: now + duration,
            preceding_membership: self.permanent.contains(&domain),
        };
        let mut next = self.overrides.clone();
        next.insert(domain.clone(), entry);
        self.settings.save_overrides(&next)?;
        self.overrides = next;
        Ok(vec![domain])
    }

    /// Remove the override for a domain, if present. Idempotent.
    pub fn clear_override(&mut self, domain: &Domain) -> Result<Vec<Domain>, StoreError> {
        if !self.overrides.contains_key(domain) {
            return Ok(Vec::new());
        }
        let mut next = self.overrides.clone();
        next.remove(domain);
        self.settings.save_overrides(&next)?;
        self.overrides = next;
        Ok(vec![domain.clone()])
    }

    /// Remove every override with `expires_at <= now` and return the evicted
    /// domains. Idempotent; performs no store write when nothing expired.
    ///
    /// Called both by the periodic sweep (all domains) and lazily on the
    /// single-domain refresh path via [`evict_if_expired`].
    ///
    /// [`evict_if_expired`]: PolicyStore::evict_if_expired
    pub fn evict_expired(&mut self, now: Timestamp) -> Result<Vec<Domain>, StoreError> {
        let expired: Vec<Domain> = self
            .overrides
            .iter()
            .filter(|(_, entry)| !entry.is_active(now))
            .map(|(domain, _)| domain.clone())
            .collect();

        if expired.is_empty() {
            return Ok(Vec::new());
        }

        let mut next = self.overrides.clone();
        for domain in &expired {
            next.remove(domain);
        }
        self.settings.save_overrides(&next)?;
        self.overrides = next;
        Ok(expired)
    }

    /// Lazily evict one domain's override if it has expired.
    ///
    /// Same idempotent mutation as [`evict_expired`], scoped to a single
    /// domain so the refresh path can clean up opportunistically without
    /// scanning the whole map.
    ///
    /// [`evict_expired`]: PolicyStore::evict_expired
    pub fn evict_if_expired(
        &mut self,
        domain: &Domain,
        now: Timestamp,
    ) -> Result<Vec<Domain>, StoreError> {
        match self.overrides.get(domain) {
            Some(entry) if !entry.is_active(now) => {
                let mut next = self.overrides.clone();
                next.remove(domain);
                self.settings.save_overrides(&next)?;
                self.overrides = next;
                Ok(vec![domain.clone()])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Re-read both records from the durable store (after an external
    /// change notification) and adopt them wholesale.
    ///
    /// Returns the domains whose resolution may have changed: the symmetric
    /// difference of the permanent sets plus every override key whose entry
    /// differs between old and new.
    pub fn reload(&mut self) -> Result<Vec<Domain>, StoreError> {
        let records = self.settings.load()?;
        Ok(self.replace_from(records))
    }

    /// Adopt externally-provided records, reporting affected domains.
    pub fn replace_from(&mut self, records: PolicyRecords) -> Vec<Domain> {
        let mut affected = BTreeSet::new();

        for domain in self.permanent.symmetric_difference(&records.permanent) {
            affected.insert(domain.clone());
        }
        for (domain, entry) in &self.overrides {
            if records.overrides.get(domain) != Some(entry) {
                affected.insert(domain.clone());
            }
        }
        for (domain, entry) in &records.overrides {
            if self.overrides.get(domain) != Some(entry) {
                affected.insert(domain.clone());
            }
        }

        self.permanent = records.permanent;
        self.overrides = records.overrides;
        affected.into_iter().collect()
    }

    /// Derived override view for one domain at `now`.
    pub fn override_status(&self, domain: &Domain, now: Timestamp) -> OverrideStatus {
        match self.overrides.get(domain) {
            Some(entry) if entry.is_active(now) => OverrideStatus {
                active: true,
                state: Some(entry.state),
                expires_at: Some(entry.expires_at),
                remaining: Some(entry.remaining(now)),
            },
            _ => OverrideStatus::inactive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::MemoryStore;

    fn d(s: &str) -> Domain {
        Domain::normalize(s).unwrap()
    }

    fn open_store() -> PolicyStore {
        PolicyStore::open(Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_add_remove_permanent_idempotent() {
        let mut store = open_store();

        assert_eq!(store.add_permanent(d("example.com")).unwrap(), vec![d("example.com")]);
        assert!(store.add_permanent(d("example.com")).unwrap().is_empty());
        assert!(store.permanent().contains(&d("example.com")));

        assert_eq!(
            store.remove_permanent(&d("example.com")).unwrap(),
            vec![d("example.com")]
        );
        assert!(store.remove_permanent(&d("example.com")).unwrap().is_empty());
        assert!(store.permanent().is_empty());
    }

    #[test]
    fn test_set_override_replaces_outright() {
        let mut store = open_store();
        let now = Timestamp::from_millis(10_000);

        store
            .set_override(d("example.com"), OverrideState::EffectOn, Duration::from_secs(60), now)
            .unwrap();
        store
            .set_override(d("example.com"), OverrideState::EffectOff, Duration::from_secs(5), now)
            .unwrap();

        let entry = store.overrides().get(&d("example.com")).unwrap();
        assert_eq!(entry.state, OverrideState::EffectOff);
        assert_eq!(entry.expires_at, now + Duration::from_secs(5));
        assert_eq!(store.overrides().len(), 1);
    }

    #[test]
    fn test_set_override_captures_preceding_membership() {
        let mut store = open_store();
        let now = Timestamp::from_millis(0);

        store.add_permanent(d("listed.com")).unwrap();
        store
            .set_override(d("listed.com"), OverrideState::EffectOff, Duration::from_secs(1), now)
            .unwrap();
        store
            .set_override(d("unlisted.com"), OverrideState::EffectOn, Duration::from_secs(1), now)
            .unwrap();

        assert!(store.overrides().get(&d("listed.com")).unwrap().preceding_membership);
        assert!(!store.overrides().get(&d("unlisted.com")).unwrap().preceding_membership);
    }

    #[test]
    fn test_evict_expired_is_idempotent() {
        let mut store = open_store();
        let now = Timestamp::from_millis(100_000);

        store
            .set_override(d("old.com"), OverrideState::EffectOn, Duration::from_secs(10), now)
            .unwrap();
        store
            .set_override(d("fresh.com"), OverrideState::EffectOn, Duration::from_secs(600), now)
            .unwrap();

        let later = now + Duration::from_secs(60);
        assert_eq!(store.evict_expired(later).unwrap(), vec![d("old.com")]);
        assert!(store.overrides().contains_key(&d("fresh.com")));
        assert!(!store.overrides().contains_key(&d("old.com")));

        // Second pass with no intervening mutation evicts nothing.
        assert!(store.evict_expired(later).unwrap().is_empty());
    }

    #[test]
    fn test_evict_if_expired_single_domain() {
        let mut store = open_store();
        let now = Timestamp::from_millis(0);

        store
            .set_override(d("a.com"), OverrideState::EffectOn, Duration::from_secs(1), now)
            .unwrap();
        store
            .set_override(d("b.com"), OverrideState::EffectOn, Duration::from_secs(1), now)
            .unwrap();

        let later = now + Duration::from_secs(2);
        assert_eq!(store.evict_if_expired(&d("a.com"), later).unwrap(), vec![d("a.com")]);
        // b.com is also expired but untouched by the single-domain path.
        assert!(store.overrides().contains_key(&d("b.com")));
        assert!(store.evict_if_expired(&d("a.com"), later).unwrap().is_empty());
    }

    #[test]
    fn test_replace_from_diff() {
        let mut store = open_store();
        let now = Timestamp::from_millis(0);

        store.add_permanent(d("kept.com")).unwrap();
        store.add_permanent(d("dropped.com")).unwrap();
        store
            .set_override(d("changed.com"), OverrideState::EffectOn, Duration::from_secs(60), now)
            .unwrap();

        let mut incoming = store.snapshot();
        incoming.permanent.remove(&d("dropped.com"));
        incoming.permanent.insert(d("added.com"));
        incoming
            .overrides
            .get_mut(&d("changed.com"))
            .unwrap()
            .state = OverrideState::EffectOff;

        let mut affected = store.replace_from(incoming);
        affected.sort();
        assert_eq!(affected, vec![d("added.com"), d("changed.com"), d("dropped.com")]);

        // Unchanged records report nothing.
        let same = store.snapshot();
        assert!(store.replace_from(same).is_empty());
    }

    #[test]
    fn test_override_status() {
        let mut store = open_store();
        let now = Timestamp::from_millis(50_000);

        assert_eq!(store.override_status(&d("example.com"), now), OverrideStatus {
            active: false,
            state: None,
            expires_at: None,
            remaining: None,
        });

        store
            .set_override(d("example.com"), OverrideState::EffectOff, Duration::from_secs(90), now)
            .unwrap();

        let status = store.override_status(&d("example.com"), now + Duration::from_secs(30));
        assert!(status.active);
        assert_eq!(status.state, Some(OverrideState::EffectOff));
        assert_eq!(status.expires_at, Some(now + Duration::from_secs(90)));
        assert_eq!(status.remaining, Some(Duration::from_secs(60)));

        // Expired entry reads as inactive even before eviction.
        let status = store.override_status(&d("example.com"), now + Duration::from_secs(90));
        assert!(!status.active);
    }

    #[test]
    fn test_state_survives_reopen() {
        let settings: Arc<dyn crate::application::ports::SettingsStore> =
            Arc::new(MemoryStore::new());
        let now = Timestamp::from_millis(0);

        {
            let mut store = PolicyStore::open(Arc::clone(&settings)).unwrap();
            store.add_permanent(d("example.com")).unwrap();
            store
                .set_override(d("other.com"), OverrideState::EffectOn, Duration::from_secs(60), now)
                .unwrap();
        }

        let reopened = PolicyStore::open(settings).unwrap();
        assert!(reopened.permanent().contains(&d("example.com")));
        assert!(reopened.overrides().contains_key(&d("other.com")));
    }
}
