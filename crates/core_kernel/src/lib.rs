//! Core Kernel - Foundational types shared by the settlement crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for bills, bags and audit events
//! - Port infrastructure for the hexagonal architecture

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{BillId, BagId, AuditEventId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
