//! Connection pool and schema bootstrap
//!
//! The pool is a plain SQLx `PgPool`. The schema lives in `sql/schema.sql`
//! and is applied with [`apply_schema`], which is safe to run on every start.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// DDL for the settings, bill and audit tables
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Pool sizing and timeouts
///
/// # Example
///
/// ```rust
/// use infra_db::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("postgres://localhost/settlement")
///     .max_connections(20)
///     .acquire_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_connections, 20);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free connection
    pub acquire_timeout: Duration,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Connection URL with any password replaced, for logging
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let credentials = &self.url[scheme_end + 3..at];
                match credentials.split_once(':') {
                    Some((user, _)) => format!(
                        "{}{}:***{}",
                        &self.url[..scheme_end + 3],
                        user,
                        &self.url[at..]
                    ),
                    None => self.url.clone(),
                }
            }
            _ => self.url.clone(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/settlement")
    }
}

/// Opens a connection pool
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if no connection can be made.
#[instrument(skip(config), fields(url = %config.redacted_url(), max = config.max_connections))]
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(size = pool.size(), "Database pool ready");
    Ok(pool)
}

/// Opens a pool with default sizing
pub async fn create_pool_from_url(url: &str) -> Result<DatabasePool, DatabaseError> {
    create_pool(DatabaseConfig::new(url)).await
}

/// Creates any missing tables and indexes
#[instrument(skip(pool))]
pub async fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    info!("Schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("postgres://test")
            .max_connections(50)
            .min_connections(10)
            .acquire_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_default_points_at_settlement_database() {
        assert_eq!(DatabaseConfig::default().url, "postgres://localhost/settlement");
    }

    #[test]
    fn test_redacted_url_hides_password() {
        let config = DatabaseConfig::new("postgres://mandi:secret@db:5432/settlement");
        assert_eq!(config.redacted_url(), "postgres://mandi:***@db:5432/settlement");

        let bare = DatabaseConfig::new("postgres://localhost/settlement");
        assert_eq!(bare.redacted_url(), "postgres://localhost/settlement");
    }

    #[test]
    fn test_schema_covers_every_table() {
        for table in [
            "settlement_settings",
            "bills",
            "multi_farmer_bills",
            "farmer_partitions",
            "bill_bags",
            "audit_events",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing {table}"
            );
        }
    }

    #[test]
    fn test_schema_matches_bag_and_number_rules() {
        assert!(SCHEMA_SQL.contains("bag_number       BIGINT NOT NULL CHECK (bag_number > 0)"));
        assert!(SCHEMA_SQL.contains("CREATE UNIQUE INDEX IF NOT EXISTS bills_number_key ON bills (bill_number)"));
        assert!(SCHEMA_SQL.contains(
            "CREATE UNIQUE INDEX IF NOT EXISTS multi_farmer_bills_number_key ON multi_farmer_bills (bill_number)"
        ));
    }
}
