//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Policy store (authoritative permanent set and override map)
//! - Observer registry (who is currently displaying which domain)
//! - Broadcaster (best-effort fan-out of resolved policy)
//! - Coordinator (the single funnel every external event goes through)
//! - Expiry sweeper (periodic reclamation of expired overrides)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod broadcaster;
pub mod coordinator;
pub mod observers;
pub mod ports;
pub mod store;

#[cfg(feature = "async")]
pub mod sweeper;
