//! Single-farmer bill handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::BillId;
use domain_settlement::{CreateBill, EditBill};

use crate::auth::Claims;
use crate::dto::bill::{BillResponse, ListBillsParams};
use crate::{error::ApiError, AppState};

/// Creates and stores a bill under the current settings
pub async fn create_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateBill>,
) -> Result<(StatusCode, Json<BillResponse>), ApiError> {
    let bill = state.service.create_bill(request, Some(claims.metadata())).await?;
    Ok((StatusCode::CREATED, Json(bill.into())))
}

/// Computes a bill without storing it
pub async fn preview_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBill>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state.service.preview_bill(request).await?;
    Ok(Json(bill.into()))
}

/// Lists bills newest first
pub async fn list_bills(
    State(state): State<AppState>,
    Query(params): Query<ListBillsParams>,
) -> Result<Json<Vec<BillResponse>>, ApiError> {
    let bills = state.service.list_bills(params.into()).await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

/// Gets a bill by ID
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state.service.get_bill(BillId::from_uuid(id)).await?;
    Ok(Json(bill.into()))
}

/// Replaces a bill's header and weighings
pub async fn edit_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditBill>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state
        .service
        .edit_bill(BillId::from_uuid(id), request, Some(claims.metadata()))
        .await?;
    Ok(Json(bill.into()))
}

/// Deletes a bill
pub async fn delete_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_bill(BillId::from_uuid(id), Some(claims.metadata()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
