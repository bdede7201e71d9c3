use crate::{
    errors::ApiError,
    handlers::common::{created_response, Actor},
    services::putaway::{PutawayConfirmation, PutawayRequest},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Put received goods away onto a location
#[utoipa::path(
    post,
    path = "/api/v1/putaway",
    request_body = PutawayRequest,
    params(("x-user-id" = String, Header, description = "Operator performing the putaway")),
    responses(
        (status = 201, description = "Putaway recorded", body = PutawayConfirmation),
        (status = 400, description = "Line completed or quantity out of range", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator", body = crate::errors::ErrorResponse),
        (status = 404, description = "Line, product or location not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inbound"
)]
pub async fn putaway(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<PutawayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation = state
        .services
        .putaway
        .putaway(payload, actor.as_str(), Utc::now())
        .await?;
    Ok(created_response(confirmation))
}
