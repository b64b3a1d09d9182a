//! # Robosched Testing Utils
//!
//! Shared testing utilities for the task automation engine.
//! This crate provides in-memory mock implementations of every repository
//! and capability trait, plus builders for creating test entities.
//!
//! ## Usage
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! robosched-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use mocks::*;
