use crate::{
    errors::ApiError,
    handlers::common::{success_response, Actor},
    services::picking::PickConfirmation,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Confirm the pick of an allocated line
#[utoipa::path(
    post,
    path = "/api/v1/picking/items/{id}/execute",
    params(
        ("id" = i32, Path, description = "Pick list item id"),
        ("x-user-id" = String, Header, description = "Operator performing the pick"),
    ),
    responses(
        (status = 200, description = "Pick executed", body = PickConfirmation),
        (status = 400, description = "Line already picked or unallocated", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pick list item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "outbound"
)]
pub async fn execute_pick(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation = state
        .services
        .picking
        .execute_pick(id, actor.as_str(), Utc::now())
        .await?;
    Ok(success_response(confirmation))
}

/// Close a line that received no stock
#[utoipa::path(
    post,
    path = "/api/v1/picking/items/{id}/force-close",
    params(
        ("id" = i32, Path, description = "Pick list item id"),
        ("x-user-id" = String, Header, description = "Operator closing the line"),
    ),
    responses(
        (status = 200, description = "Line closed", body = PickConfirmation),
        (status = 400, description = "Line picked or holding a reservation", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pick list item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "outbound"
)]
pub async fn force_close(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation = state
        .services
        .picking
        .force_close(id, actor.as_str(), Utc::now())
        .await?;
    Ok(success_response(confirmation))
}
