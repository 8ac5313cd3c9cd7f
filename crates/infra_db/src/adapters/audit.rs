//! PostgreSQL Audit Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{AuditEventId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_settlement::{AuditAction, AuditEvent, AuditPort};

use super::check_pool;
use crate::error::DatabaseError;
use crate::repositories::audit::{AuditEventRow, AuditRepository};

/// PostgreSQL-backed implementation of the AuditPort trait
#[derive(Debug, Clone)]
pub struct PostgresAuditAdapter {
    repository: AuditRepository,
    pool: PgPool,
}

impl PostgresAuditAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresAuditAdapter {}

#[async_trait]
impl HealthCheckable for PostgresAuditAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-audit-adapter").await
    }
}

#[async_trait]
impl AuditPort for PostgresAuditAdapter {
    #[instrument(skip(self, event), fields(action = %event.action, entity_id = %event.entity_id))]
    async fn record(&self, event: AuditEvent) -> Result<(), PortError> {
        let row = AuditEventRow {
            event_id: *event.id.as_uuid(),
            action: event.action.as_str().to_string(),
            entity_id: event.entity_id,
            actor: event.actor,
            details: event.details,
            recorded_at: event.recorded_at,
        };
        self.repository
            .insert(&row)
            .await
            .map_err(|e| e.into_port_error("AuditEvent", row.event_id))
    }

    #[instrument(skip(self))]
    async fn recent(&self, limit: u32) -> Result<Vec<AuditEvent>, PortError> {
        self.repository
            .recent(i64::from(limit))
            .await
            .and_then(|rows| rows.into_iter().map(row_to_event).collect())
            .map_err(|e| e.into_port_error("AuditEvent", "recent"))
    }
}

fn row_to_event(row: AuditEventRow) -> Result<AuditEvent, DatabaseError> {
    let action = AuditAction::parse(&row.action).ok_or_else(|| {
        DatabaseError::corrupt("AuditEvent", row.event_id, format!("unknown action '{}'", row.action))
    })?;

    Ok(AuditEvent {
        id: AuditEventId::from_uuid(row.event_id),
        action,
        entity_id: row.entity_id,
        actor: row.actor,
        details: row.details,
        recorded_at: row.recorded_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_unknown_action_is_corrupt() {
        let row = AuditEventRow {
            event_id: Uuid::new_v4(),
            action: "bill_archived".to_string(),
            entity_id: "BILL-1".to_string(),
            actor: "system".to_string(),
            details: serde_json::Value::Null,
            recorded_at: Utc::now(),
        };
        assert!(row_to_event(row).is_err());
    }
}
