//! Multi-farmer bill handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::BillId;
use domain_settlement::CreateMultiFarmerBill;

use crate::auth::Claims;
use crate::dto::multi_farmer::MultiFarmerBillResponse;
use crate::{error::ApiError, AppState};

pub async fn create_multi_farmer_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateMultiFarmerBill>,
) -> Result<(StatusCode, Json<MultiFarmerBillResponse>), ApiError> {
    let bill = state
        .service
        .create_multi_farmer_bill(request, Some(claims.metadata()))
        .await?;
    Ok((StatusCode::CREATED, Json(bill.into())))
}

pub async fn get_multi_farmer_bill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MultiFarmerBillResponse>, ApiError> {
    let bill = state.service.get_multi_farmer_bill(BillId::from_uuid(id)).await?;
    Ok(Json(bill.into()))
}

pub async fn delete_multi_farmer_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_multi_farmer_bill(BillId::from_uuid(id), Some(claims.metadata()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
