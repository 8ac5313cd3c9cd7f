//! Repository implementations for settlement records
//!
//! This module provides concrete repository implementations that handle
//! database access for bills, settings and the audit trail. Repositories
//! encapsulate SQL queries and map to plain row types; translation to
//! domain types happens in the adapters.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Runtime-checked queries with bound parameters
//! - Transaction support for multi-table writes
//! - Tables are created by `pool::apply_schema`

pub mod bill;
pub mod settings;
pub mod audit;

pub use bill::{BillRepository, BillFilter};
pub use settings::SettingsRepository;
pub use audit::AuditRepository;
