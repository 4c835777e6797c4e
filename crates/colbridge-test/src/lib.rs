//! # colbridge-test
//!
//! End-to-end tests for colbridge.
//!
//! This crate contains:
//! - Fixtures wiring a [`StoreOutput`](colbridge_core::StoreOutput) to an
//!   in-memory store
//! - Planned-row and filter-row generators
//! - A recording bulk writer

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test fixtures and helpers
pub mod utils;

/// Row generators
pub mod workload;
