use crate::{
    entities::{location, product},
    errors::ApiError,
    handlers::common::{created_response, no_content_response, success_response},
    services::master_data::{CreateLocation, CreateProduct, Page, UpdateLocation, UpdateProduct},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

/// Register a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = product::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "EAN or material code already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .master_data
        .create_product(payload, Utc::now())
        .await?;
    Ok(created_response(product))
}

/// List products by id
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(Page),
    responses(
        (status = 200, description = "One page of products", body = [product::Model]),
    ),
    tag = "master-data"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.master_data.list_products(page).await?;
    Ok(success_response(products))
}

/// Update a product's descriptive fields
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Updated product", body = product::Model),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.master_data.update_product(id, payload).await?;
    Ok(success_response(product))
}

/// Delete an unreferenced product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product still in use", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.master_data.delete_product(id).await?;
    Ok(no_content_response())
}

/// Register a shelf location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created", body = location::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Location code already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocation>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .master_data
        .create_location(payload, Utc::now())
        .await?;
    Ok(created_response(location))
}

/// List locations by code
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses(
        (status = 200, description = "All locations", body = [location::Model]),
    ),
    tag = "master-data"
)]
pub async fn list_locations(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let locations = state.services.master_data.list_locations().await?;
    Ok(success_response(locations))
}

/// Update a location's type, description or capacity
#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    params(("id" = i32, Path, description = "Location id")),
    request_body = UpdateLocation,
    responses(
        (status = 200, description = "Updated location", body = location::Model),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLocation>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .master_data
        .update_location(id, payload)
        .await?;
    Ok(success_response(location))
}

/// Delete an empty location
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = i32, Path, description = "Location id")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Location still holds stock", body = crate::errors::ErrorResponse),
    ),
    tag = "master-data"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.master_data.delete_location(id).await?;
    Ok(no_content_response())
}
