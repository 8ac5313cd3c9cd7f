//! Audit event repository implementation
//!
//! `audit_events` is append-only; nothing here updates or deletes.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for the audit trail
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Creates a new AuditRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event
    pub async fn insert(&self, event: &AuditEventRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (event_id, action, entity_id, actor, details, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.event_id)
        .bind(&event.action)
        .bind(&event.entity_id)
        .bind(&event.actor)
        .bind(&event.details)
        .bind(event.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the newest `limit` events
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditEventRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT event_id, action, entity_id, actor, details, recorded_at
            FROM audit_events
            ORDER BY recorded_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Database row for an audit event
#[derive(Debug, Clone, FromRow)]
pub struct AuditEventRow {
    pub event_id: Uuid,
    pub action: String,
    pub entity_id: String,
    pub actor: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}
