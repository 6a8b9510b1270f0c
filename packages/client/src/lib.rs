//! Client-side realtime classroom session engine.
//!
//! This library keeps one presence connection per (session, participant),
//! reconciles quiz deliveries from push, poll and catch-up into a single
//! deduplicated stream, and estimates network quality from round-trip
//! timing. A command-line client is provided in `cli`.

// layers
pub mod domain;
pub mod engine;
pub mod infrastructure;

// client surface
pub mod cli;
pub mod config;
pub mod error;

pub use config::EngineConfig;
pub use engine::{Engine, EngineDeps, EngineEvent, EngineSnapshot};
pub use error::ClientError;
