//! Domain Adapters
//!
//! This module provides adapter implementations for the settlement ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements one of the domain's port traits
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillAdapter;
//! use domain_settlement::BillRepositoryPort;
//!
//! let adapter = PostgresBillAdapter::new(pool);
//! let bill = adapter.get_bill(bill_id, None).await?;
//! ```

use sqlx::PgPool;
use std::str::FromStr;

use core_kernel::{Currency, HealthCheckResult};
use domain_settlement::{DeductionPerBag, RoundingMode, SettlementPolicy};
use rust_decimal::Decimal;

use crate::error::DatabaseError;

pub mod audit;
pub mod bill;
pub mod settings;

pub use audit::PostgresAuditAdapter;
pub use bill::PostgresBillAdapter;
pub use settings::PostgresSettingsAdapter;

/// Runs `SELECT 1` and reports the pool's health under `adapter_id`
pub(crate) async fn check_pool(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}

pub(crate) fn deduction_from_db(value: i16) -> Result<DeductionPerBag, String> {
    let kg = u8::try_from(value).map_err(|_| format!("deduction {} out of range", value))?;
    DeductionPerBag::try_from(kg).map_err(|e| e.to_string())
}

pub(crate) fn deduction_to_db(deduction: DeductionPerBag) -> i16 {
    i16::from(deduction.as_u8())
}

pub(crate) fn currency_from_db(value: &str) -> Result<Currency, String> {
    Currency::from_str(value).map_err(|e| e.to_string())
}

/// Rebuilds a frozen policy from its stored columns
pub(crate) fn policy_from_db(
    entity: &str,
    id: impl std::fmt::Display,
    deduction_per_bag: i16,
    rate_per_100kg: Decimal,
    rounding_mode: &str,
    currency: &str,
) -> Result<SettlementPolicy, DatabaseError> {
    let build = || -> Result<SettlementPolicy, String> {
        SettlementPolicy::new(
            deduction_from_db(deduction_per_bag)?,
            rate_per_100kg,
            RoundingMode::from_str(rounding_mode).map_err(|e| e.to_string())?,
            currency_from_db(currency)?,
        )
        .map_err(|e| e.to_string())
    };
    build().map_err(|reason| DatabaseError::corrupt(entity, id, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_policy_from_db() {
        let policy = policy_from_db("Bill", "x", 2, dec!(3000), "floor", "INR").unwrap();
        assert_eq!(policy.deduction_per_bag, DeductionPerBag::Two);
        assert_eq!(policy.rounding_mode, RoundingMode::Floor);
        assert_eq!(policy.currency, Currency::INR);
    }

    #[test]
    fn test_policy_from_db_rejects_bad_columns() {
        assert!(policy_from_db("Bill", "x", 3, dec!(3000), "floor", "INR").is_err());
        assert!(policy_from_db("Bill", "x", -1, dec!(3000), "floor", "INR").is_err());
        assert!(policy_from_db("Bill", "x", 1, dec!(3000), "truncate", "INR").is_err());
        assert!(policy_from_db("Bill", "x", 1, dec!(-5), "round", "INR").is_err());
    }

    #[test]
    fn test_deduction_round_trip() {
        for d in DeductionPerBag::ALL {
            assert_eq!(deduction_from_db(deduction_to_db(d)).unwrap(), d);
        }
    }
}
