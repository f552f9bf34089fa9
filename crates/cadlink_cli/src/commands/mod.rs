//! CLI command implementations.

pub mod client;
pub mod host;
pub mod tags;
