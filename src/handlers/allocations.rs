use crate::{
    entities::inventory_lot,
    errors::ApiError,
    handlers::common::success_response,
    services::allocation::AllocationReport,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

const ANY_SHELF_LIFE: &str = "0-100";

fn any_shelf_life() -> String {
    ANY_SHELF_LIFE.to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocateRequest {
    pub product_id: i32,
    pub quantity: Decimal,
    /// Acceptable remaining shelf life, `"min-max"` in percent
    #[serde(default = "any_shelf_life")]
    #[schema(example = "60-100")]
    pub shelf_life: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateLotsQuery {
    /// Acceptable remaining shelf life, `"min-max"` in percent
    #[serde(default = "any_shelf_life")]
    pub shelf_life: String,
}

/// Reserve stock for a product
#[utoipa::path(
    post,
    path = "/api/v1/allocations",
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Allocation result, possibly short", body = AllocationReport),
        (status = 400, description = "Bad window or quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "allocation"
)]
pub async fn allocate(
    State(state): State<AppState>,
    Json(payload): Json<AllocateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .allocation
        .allocate(
            payload.product_id,
            payload.quantity,
            &payload.shelf_life,
            Utc::now(),
        )
        .await?;
    Ok(success_response(report))
}

/// Lots an allocation would draw from, in draw order
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/candidate-lots",
    params(("id" = i32, Path, description = "Product id"), CandidateLotsQuery),
    responses(
        (status = 200, description = "Candidate lots", body = [inventory_lot::Model]),
        (status = 400, description = "Bad window", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "allocation"
)]
pub async fn candidate_lots(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Query(query): Query<CandidateLotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let lots = state
        .services
        .allocation
        .candidate_lots(product_id, &query.shelf_life, Utc::now())
        .await?;
    Ok(success_response(lots))
}
