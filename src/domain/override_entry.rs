//! Time-bounded policy overrides.

use crate::domain::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The verdict an override pins for its domain while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideState {
    /// Apply the display effect regardless of permanent membership.
    EffectOn,
    /// Suppress the display effect regardless of permanent membership.
    EffectOff,
}

/// A temporary exception to the permanent list's verdict for one domain.
///
/// A domain has at most one override at a time; creating a new one replaces
/// any existing entry outright (last-write-wins, no merge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// The pinned verdict while this entry is active.
    pub state: OverrideState,
    /// Absolute expiry deadline. The entry is active strictly before this
    /// instant; at `expires_at` exactly it is already expired.
    pub expires_at: Timestamp,
    /// Whether the domain was in the permanent list when the override was
    /// created. Informational only, for presentation phrasing; the resolver
    /// never reads it.
    pub preceding_membership: bool,
}

impl OverrideEntry {
    /// Whether this entry still pins the verdict at `now`.
    ///
    /// Strict comparison: `expires_at == now` counts as expired.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    /// Time left until expiry, or zero if already expired.
    pub fn remaining(&self, now: Timestamp) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
