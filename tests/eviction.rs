//! Integration tests for override eviction and durable-write discipline.

use policy_sync::infrastructure::mocks::FlakyStore;
use policy_sync::{
    Domain, MemoryStore, OverrideState, PolicyStore, SettingsStore, StoreError, Timestamp,
};
use std::sync::Arc;
use std::time::Duration;

fn d(s: &str) -> Domain {
    Domain::normalize(s).unwrap()
}

#[test]
fn evict_expired_returns_exactly_the_evicted_domains() {
    let mut store = PolicyStore::open(Arc::new(MemoryStore::new())).unwrap();
    let now = Timestamp::from_millis(0);

    store
        .set_override(d("example.com"), OverrideState::EffectOn, Duration::from_millis(1), now)
        .unwrap();

    // Past the deadline: the entry is gone and the affected set is exactly it.
    let later = Timestamp::from_millis(5_000);
    let evicted = store.evict_expired(later).unwrap();
    assert_eq!(evicted, vec![d("example.com")]);
    assert!(!store.overrides().contains_key(&d("example.com")));
}

#[test]
fn evict_expired_is_idempotent() {
    let mut store = PolicyStore::open(Arc::new(MemoryStore::new())).unwrap();
    let now = Timestamp::from_millis(0);

    store
        .set_override(d("a.com"), OverrideState::EffectOn, Duration::from_secs(1), now)
        .unwrap();
    store
        .set_override(d("b.com"), OverrideState::EffectOff, Duration::from_secs(2), now)
        .unwrap();

    let later = now + Duration::from_secs(10);
    let mut first = store.evict_expired(later).unwrap();
    first.sort();
    assert_eq!(first, vec![d("a.com"), d("b.com")]);

    // Calling again with no intervening mutation evicts nothing.
    assert!(store.evict_expired(later).unwrap().is_empty());
    assert!(store.evict_expired(later + Duration::from_secs(60)).unwrap().is_empty());
}

#[test]
fn new_override_fully_replaces_existing_one() {
    let mut store = PolicyStore::open(Arc::new(MemoryStore::new())).unwrap();
    let now = Timestamp::from_millis(1_000);

    store
        .set_override(d("example.com"), OverrideState::EffectOn, Duration::from_secs(3_600), now)
        .unwrap();
    store
        .set_override(d("example.com"), OverrideState::EffectOff, Duration::from_secs(60), now)
        .unwrap();

    let entry = store.overrides().get(&d("example.com")).unwrap();
    // No merge: both state and expiry come from the second write.
    assert_eq!(entry.state, OverrideState::EffectOff);
    assert_eq!(entry.expires_at, now + Duration::from_secs(60));
}

#[test]
fn failed_write_leaves_memory_and_durable_state_unchanged() {
    let flaky = Arc::new(FlakyStore::new());
    let mut store = PolicyStore::open(Arc::clone(&flaky) as Arc<dyn SettingsStore>).unwrap();
    let now = Timestamp::from_millis(0);

    store.add_permanent(d("kept.com")).unwrap();
    flaky.break_writes();

    let err = store.add_permanent(d("lost.com")).unwrap_err();
    assert!(matches!(err, StoreError::Write(_)));
    assert!(!store.permanent().contains(&d("lost.com")));

    let err = store
        .set_override(d("lost.com"), OverrideState::EffectOn, Duration::from_secs(60), now)
        .unwrap_err();
    assert!(matches!(err, StoreError::Write(_)));
    assert!(store.overrides().is_empty());

    // The durable records match the in-memory view.
    let records = flaky.load().unwrap();
    assert_eq!(records.permanent, store.snapshot().permanent);
    assert!(records.overrides.is_empty());

    // After the store recovers, the same mutation goes through.
    flaky.heal();
    store.add_permanent(d("lost.com")).unwrap();
    assert!(store.permanent().contains(&d("lost.com")));
}

#[test]
fn failed_eviction_write_keeps_entries_for_the_next_pass() {
    let flaky = Arc::new(FlakyStore::new());
    let mut store = PolicyStore::open(Arc::clone(&flaky) as Arc<dyn SettingsStore>).unwrap();
    let now = Timestamp::from_millis(0);

    store
        .set_override(d("example.com"), OverrideState::EffectOn, Duration::from_secs(1), now)
        .unwrap();

    let later = now + Duration::from_secs(5);
    flaky.break_writes();
    assert!(store.evict_expired(later).is_err());
    // Entry survives so a later sweep can retry.
    assert!(store.overrides().contains_key(&d("example.com")));

    flaky.heal();
    assert_eq!(store.evict_expired(later).unwrap(), vec![d("example.com")]);
}
