//! # cadlink Testkit
//!
//! Test utilities for cadlink.
//!
//! This crate provides:
//! - Sample snapshots and query builders
//! - Loopback socket pairs for bridge tests
//! - Property-based test generators using proptest
//! - Wire vectors shared with client implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadlink_testkit::prelude::*;
//!
//! #[test]
//! fn inserts_sample() {
//!     let query = insert_query(sample_database());
//!     // ... execute against a host
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
