//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the settlement engine, built on SQLx.
//!
//! # Architecture
//!
//! Repositories in [`repositories`] speak in row structs and raw SQL. The
//! adapters in [`adapters`] translate between those rows and domain types
//! and implement the ports declared by `domain_settlement`, so the service
//! layer never sees a `sqlx` type.
//!
//! Stored bills are re-verified on load. A row whose totals no longer match
//! its bags surfaces as [`DatabaseError::CorruptRow`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{apply_schema, create_pool, DatabaseConfig, PostgresBillAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/settlement")).await?;
//! apply_schema(&pool).await?;
//! let bills = PostgresBillAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresAuditAdapter, PostgresBillAdapter, PostgresSettingsAdapter};
pub use error::DatabaseError;
pub use pool::{apply_schema, create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
