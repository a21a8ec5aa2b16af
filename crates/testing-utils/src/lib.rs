//! # Lineup Testing Utils
//!
//! Shared testing utilities for the lead dispatch engine.
//! This crate provides in-memory mock implementations of every repository
//! trait plus a controllable push provider, and builder patterns for
//! creating test entities with sensible defaults.
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! lineup-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
