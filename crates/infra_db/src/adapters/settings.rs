//! PostgreSQL Settings Adapter

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError};
use domain_settlement::{RoundingMode, SettingsPort, SettlementSettings};

use super::{check_pool, currency_from_db, deduction_from_db, deduction_to_db};
use crate::error::DatabaseError;
use crate::repositories::settings::{SettingsRepository, SettingsRow};

/// PostgreSQL-backed implementation of the SettingsPort trait
///
/// Returns `SettlementSettings::default()` until the first update is
/// written.
#[derive(Debug, Clone)]
pub struct PostgresSettingsAdapter {
    repository: SettingsRepository,
    pool: PgPool,
}

impl PostgresSettingsAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: SettingsRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresSettingsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresSettingsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-settings-adapter").await
    }
}

#[async_trait]
impl SettingsPort for PostgresSettingsAdapter {
    #[instrument(skip(self))]
    async fn current_settings(&self) -> Result<SettlementSettings, PortError> {
        let row = self
            .repository
            .get()
            .await
            .map_err(|e| e.into_port_error("Settings", "active"))?;

        match row {
            Some(row) => row_to_settings(row).map_err(|e| e.into_port_error("Settings", "active")),
            None => {
                debug!("No stored settings, using defaults");
                Ok(SettlementSettings::default())
            }
        }
    }

    #[instrument(skip(self, settings, metadata))]
    async fn update_settings(
        &self,
        settings: SettlementSettings,
        metadata: Option<OperationMetadata>,
    ) -> Result<SettlementSettings, PortError> {
        let row = SettingsRow {
            deduction_per_bag_default: deduction_to_db(settings.deduction_per_bag_default),
            rounding_mode: settings.rounding_mode.as_str().to_string(),
            default_rate_per_100kg: settings.default_rate_per_100kg,
            currency: settings.currency.code().to_string(),
            updated_at: Utc::now(),
            updated_by: metadata.and_then(|m| m.initiated_by),
        };

        let saved = self
            .repository
            .upsert(&row)
            .await
            .map_err(|e| e.into_port_error("Settings", "active"))?;

        row_to_settings(saved).map_err(|e| e.into_port_error("Settings", "active"))
    }
}

fn row_to_settings(row: SettingsRow) -> Result<SettlementSettings, DatabaseError> {
    let corrupt = |reason: String| DatabaseError::corrupt("Settings", "active", reason);

    let settings = SettlementSettings {
        deduction_per_bag_default: deduction_from_db(row.deduction_per_bag_default).map_err(corrupt)?,
        rounding_mode: row
            .rounding_mode
            .parse::<RoundingMode>()
            .map_err(|e| corrupt(e.to_string()))?,
        default_rate_per_100kg: row.default_rate_per_100kg,
        currency: currency_from_db(&row.currency).map_err(corrupt)?,
        updated_at: row.updated_at,
        updated_by: row.updated_by,
    };
    settings.validate().map_err(|e| corrupt(e.to_string()))?;
    Ok(settings)
}
