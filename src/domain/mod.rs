//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the policy engine:
//! - Normalized host identifiers
//! - Wall-clock timestamps
//! - Time-bounded override entries
//! - The priority/expiry resolution rule
//!
//! All types in this layer are pure and easily testable.

pub mod host;
pub mod override_entry;
pub mod resolve;
pub mod timestamp;
