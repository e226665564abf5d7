//! Controllable test doubles for the engine's ports.

mod clock;
mod store;
mod transport;

pub use clock::MockClock;
pub use store::FlakyStore;
pub use transport::MockTransport;
