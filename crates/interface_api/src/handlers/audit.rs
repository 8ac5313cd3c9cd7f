//! Audit trail handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_settlement::AuditEvent;

use crate::dto::audit::AuditEventsParams;
use crate::{error::ApiError, AppState};

/// Most recent audit events, newest first
pub async fn recent_events(
    State(state): State<AppState>,
    Query(params): Query<AuditEventsParams>,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    Ok(Json(state.service.recent_audit_events(params.limit()).await?))
}
