use crate::{
    errors::ApiError,
    handlers::common::{created_response, success_response},
    services::pick_lists::{CreatePickList, PickListDetail},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Create a pick list, allocating stock for every line
#[utoipa::path(
    post,
    path = "/api/v1/picklists",
    request_body = CreatePickList,
    responses(
        (status = 201, description = "Pick list created", body = PickListDetail),
        (status = 400, description = "Invalid lines or shelf-life window", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown EAN", body = crate::errors::ErrorResponse),
        (status = 409, description = "OBD number already used", body = crate::errors::ErrorResponse),
    ),
    tag = "outbound"
)]
pub async fn create_pick_list(
    State(state): State<AppState>,
    Json(payload): Json<CreatePickList>,
) -> Result<impl IntoResponse, ApiError> {
    let pick_list = state
        .services
        .pick_lists
        .create_pick_list(payload, Utc::now())
        .await?;
    Ok(created_response(pick_list))
}

/// Fetch a pick list with its lines
#[utoipa::path(
    get,
    path = "/api/v1/picklists/{id}",
    params(("id" = i32, Path, description = "Pick list id")),
    responses(
        (status = 200, description = "Pick list", body = PickListDetail),
        (status = 404, description = "Pick list not found", body = crate::errors::ErrorResponse),
    ),
    tag = "outbound"
)]
pub async fn get_pick_list(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let pick_list = state.services.pick_lists.get_pick_list(id).await?;
    Ok(success_response(pick_list))
}

/// Pick lists with lines still to pick, newest first
#[utoipa::path(
    get,
    path = "/api/v1/picklists",
    responses(
        (status = 200, description = "Pending pick lists", body = [PickListDetail]),
    ),
    tag = "outbound"
)]
pub async fn pending_pick_lists(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let pick_lists = state.services.pick_lists.pending_pick_lists().await?;
    Ok(success_response(pick_lists))
}
