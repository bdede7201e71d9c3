//! Warehouse API Library
//!
//! Inbound putaway, shelf-life aware stock allocation and outbound picking
//! over a relational store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::services::factory::{ServiceContainer, ServiceFactory};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: ServiceContainer,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let factory = ServiceFactory::new(db.clone(), event_sender.clone());
        Self {
            services: ServiceContainer::new(&factory),
            db,
            config,
            event_sender,
        }
    }
}

/// Routes served under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Master data
        .route(
            "/products",
            post(handlers::master_data::create_product).get(handlers::master_data::list_products),
        )
        .route(
            "/products/:id",
            put(handlers::master_data::update_product).delete(handlers::master_data::delete_product),
        )
        .route(
            "/locations",
            post(handlers::master_data::create_location)
                .get(handlers::master_data::list_locations),
        )
        // Shared segment name: matched as a numeric id here and as a code below
        .route(
            "/locations/:location",
            put(handlers::master_data::update_location)
                .delete(handlers::master_data::delete_location),
        )
        .route(
            "/locations/:location/lots",
            get(handlers::inventory::lots_at_location),
        )
        // Inbound
        .route(
            "/receipts",
            post(handlers::receipts::create_goods_receipt).get(handlers::receipts::pending_receipts),
        )
        .route("/receipts/:id", get(handlers::receipts::get_goods_receipt))
        .route("/putaway", post(handlers::putaway::putaway))
        // Allocation
        .route("/allocations", post(handlers::allocations::allocate))
        .route(
            "/products/:id/candidate-lots",
            get(handlers::allocations::candidate_lots),
        )
        // Outbound
        .route(
            "/picklists",
            post(handlers::pick_lists::create_pick_list)
                .get(handlers::pick_lists::pending_pick_lists),
        )
        .route("/picklists/:id", get(handlers::pick_lists::get_pick_list))
        .route(
            "/picking/items/:id/execute",
            post(handlers::picking::execute_pick),
        )
        .route(
            "/picking/items/:id/force-close",
            post(handlers::picking::force_close),
        )
        // Corrections
        .route(
            "/inventory/lots/:id",
            patch(handlers::inventory::correct_lot).delete(handlers::inventory::delete_lot),
        )
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        if config.is_production() {
            ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
            CorsLayer::new()
        } else {
            CorsLayer::permissive()
        }
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Full application router: health, OpenAPI document and the v1 API,
/// wrapped in request-id, tracing, timeout and CORS layers.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let health = health::health_routes(state.db.clone());

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
        .nest("/health", health)
        .merge(openapi::openapi_routes())
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::RequestSpanMaker))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        // Outermost so the id is in scope for everything below
        .layer(axum::middleware::from_fn(
            crate::tracing::request_id_middleware,
        ))
}
