//! The priority/expiry resolution rule.
//!
//! Resolution is a pure function of the two authoritative structures and the
//! current time. It never mutates state: eviction of an observed-expired
//! override is a separate responsibility, so concurrent resolution is always
//! safe.

use crate::domain::host::Domain;
use crate::domain::override_entry::{OverrideEntry, OverrideState};
use crate::domain::timestamp::Timestamp;
use std::collections::{BTreeMap, BTreeSet};

/// Resolve the display policy for `domain` at `now`.
///
/// Priority order:
/// 1. An *active* override (`expires_at > now`) wins outright, in both
///    directions, regardless of permanent membership.
/// 2. Otherwise the verdict is permanent-list membership.
///
/// A domain absent from both structures resolves to `false`. An expired
/// override is equivalent to no override.
pub fn resolve(
    domain: &Domain,
    permanent: &BTreeSet<Domain>,
    overrides: &BTreeMap<Domain, OverrideEntry>,
    now: Timestamp,
) -> bool {
    if let Some(entry) = overrides.get(domain) {
        if entry.is_active(now) {
            return entry.state == OverrideState::EffectOn;
        }
    }
    permanent.contains(domain)
}
