//! Utilities shared by the classpulse crates.

pub mod logger;
pub mod time;
