//! Settings repository implementation
//!
//! The `settlement_settings` table holds at most one row, keyed by the
//! constant `SETTINGS_ROW_ID`. Writes are upserts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

const SETTINGS_ROW_ID: i16 = 1;

/// Repository for the active settings record
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the stored settings row, if one has been written
    pub async fn get(&self) -> Result<Option<SettingsRow>, DatabaseError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT deduction_per_bag_default, rounding_mode, default_rate_per_100kg,
                   currency, updated_at, updated_by
            FROM settlement_settings
            WHERE settings_id = $1
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts or replaces the settings row
    pub async fn upsert(&self, row: &SettingsRow) -> Result<SettingsRow, DatabaseError> {
        let saved = sqlx::query_as::<_, SettingsRow>(
            r#"
            INSERT INTO settlement_settings (
                settings_id, deduction_per_bag_default, rounding_mode,
                default_rate_per_100kg, currency, updated_at, updated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (settings_id) DO UPDATE SET
                deduction_per_bag_default = EXCLUDED.deduction_per_bag_default,
                rounding_mode = EXCLUDED.rounding_mode,
                default_rate_per_100kg = EXCLUDED.default_rate_per_100kg,
                currency = EXCLUDED.currency,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            RETURNING deduction_per_bag_default, rounding_mode, default_rate_per_100kg,
                      currency, updated_at, updated_by
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(row.deduction_per_bag_default)
        .bind(&row.rounding_mode)
        .bind(row.default_rate_per_100kg)
        .bind(&row.currency)
        .bind(row.updated_at)
        .bind(&row.updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

/// Database row for the settings record
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub deduction_per_bag_default: i16,
    pub rounding_mode: String,
    pub default_rate_per_100kg: Decimal,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
