//! Settings handlers

use axum::{extract::State, Extension, Json};

use domain_settlement::SettlementSettings;

use crate::auth::Claims;
use crate::dto::settings::UpdateSettingsRequest;
use crate::{error::ApiError, AppState};

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettlementSettings>, ApiError> {
    Ok(Json(state.service.current_settings().await?))
}

/// Replaces the active settings; existing bills keep their frozen policy
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettlementSettings>, ApiError> {
    let current = state.service.current_settings().await?;
    let saved = state
        .service
        .update_settings(request.into_settings(current.currency), Some(claims.metadata()))
        .await?;
    Ok(Json(saved))
}
