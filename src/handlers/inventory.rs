use crate::{
    entities::inventory_lot,
    errors::ApiError,
    handlers::common::{no_content_response, success_response},
    services::corrections::LotCorrection,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Lots stored at a location
#[utoipa::path(
    get,
    path = "/api/v1/locations/{code}/lots",
    params(("code" = String, Path, description = "Location code")),
    responses(
        (status = 200, description = "Lots at the location", body = [inventory_lot::Model]),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn lots_at_location(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lots = state.services.corrections.lots_at_location(&code).await?;
    Ok(success_response(lots))
}

/// Correct a lot's quantity, batch or dates
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/lots/{id}",
    params(("id" = i32, Path, description = "Inventory lot id")),
    request_body = LotCorrection,
    responses(
        (status = 200, description = "Corrected lot", body = inventory_lot::Model),
        (status = 204, description = "Lot emptied and removed"),
        (status = 400, description = "Quantity below reserved", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Collides with another lot", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn correct_lot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<LotCorrection>,
) -> Result<impl IntoResponse, ApiError> {
    let lot = state
        .services
        .corrections
        .correct_lot(id, payload, Utc::now())
        .await?;
    Ok(match lot {
        Some(lot) => success_response(lot),
        None => no_content_response(),
    })
}

/// Delete an unreserved lot
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/lots/{id}",
    params(("id" = i32, Path, description = "Inventory lot id")),
    responses(
        (status = 204, description = "Lot deleted"),
        (status = 400, description = "Lot has reservations", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn delete_lot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.corrections.delete_lot(id).await?;
    Ok(no_content_response())
}
