use crate::{
    errors::ApiError,
    handlers::common::{created_response, success_response},
    services::receipts::{CreateGoodsReceipt, GoodsReceiptDetail},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Record an inbound goods receipt
#[utoipa::path(
    post,
    path = "/api/v1/receipts",
    request_body = CreateGoodsReceipt,
    responses(
        (status = 201, description = "Goods receipt created", body = GoodsReceiptDetail),
        (status = 400, description = "Invalid lines", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown EAN", body = crate::errors::ErrorResponse),
    ),
    tag = "inbound"
)]
pub async fn create_goods_receipt(
    State(state): State<AppState>,
    Json(payload): Json<CreateGoodsReceipt>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .receipts
        .create_goods_receipt(payload, Utc::now())
        .await?;
    Ok(created_response(receipt))
}

/// Fetch a goods receipt with its lines
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}",
    params(("id" = i32, Path, description = "Goods receipt id")),
    responses(
        (status = 200, description = "Goods receipt", body = GoodsReceiptDetail),
        (status = 404, description = "Goods receipt not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inbound"
)]
pub async fn get_goods_receipt(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.services.receipts.get_goods_receipt(id).await?;
    Ok(success_response(receipt))
}

/// Receipts waiting for putaway, newest first
#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    responses(
        (status = 200, description = "Pending goods receipts", body = [GoodsReceiptDetail]),
    ),
    tag = "inbound"
)]
pub async fn pending_receipts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let receipts = state.services.receipts.pending_receipts().await?;
    Ok(success_response(receipts))
}
