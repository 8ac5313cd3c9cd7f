//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! settlement test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built settings, policies and weighings
//! - `builders`: Builder patterns for bill requests and in-memory services
//! - `assertions`: Custom assertion helpers for bills and allocations
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
