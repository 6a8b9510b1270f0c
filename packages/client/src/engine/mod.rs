//! Realtime session engine.
//!
//! - `facade`: the [`Engine`] handle and its single owning task
//! - `presence`: connection lifecycle for one (session, participant)
//! - `probe`: RTT sampling and quality reporting
//! - `socket`: per-socket heartbeat / receive task

pub mod facade;
pub mod presence;
pub mod probe;
pub mod socket;

#[cfg(test)]
pub(crate) mod testing;

pub use facade::{Engine, EngineDeps, EngineEvent, EngineSnapshot};
pub use probe::LatencyProbe;
