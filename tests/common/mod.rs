#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use warehouse_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{inventory_lot, location, product},
    events::{Event, EventSender},
    services::receipts::{CreateGoodsReceipt, GoodsReceiptDetail, ReceiptLineRecord},
    AppState,
};

pub const OPERATOR: &str = "operator-1";

/// Fixed clock used by every test: 2024-06-01 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn days(offset: i64) -> NaiveDate {
    today() + chrono::Duration::days(offset)
}

/// Application state backed by a private in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    events: mpsc::Receiver<Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        // One connection keeps the in-memory database alive for the whole test.
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(3600),
            sqlx_logging: false,
            ..DbConfig::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            db_config.url.clone(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let (event_tx, events) = mpsc::channel(1024);
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let router = app_router(state.clone());

        Self {
            state,
            router,
            events,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.db.as_ref()
    }

    /// Events published so far, in order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub async fn product(&self, ean: &str) -> product::Model {
        product::ActiveModel {
            ean: Set(ean.to_string()),
            material_code: Set(format!("MAT-{ean}")),
            name: Set(format!("Product {ean}")),
            brand: Set("House".to_string()),
            uom: Set(product::UnitOfMeasure::default()),
            mrp: Set(Decimal::ZERO),
            case_size: Set(1),
            min_qty: Set(Decimal::ZERO),
            max_qty: Set(Decimal::ZERO),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed product")
    }

    pub async fn location(&self, code: &str) -> location::Model {
        location::ActiveModel {
            code: Set(code.to_string()),
            location_type: Set(location::LocationType::default()),
            description: Set(None),
            max_weight: Set(None),
            max_volume: Set(None),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed location")
    }

    /// Inserts a lot directly, bypassing putaway.
    pub async fn lot(&self, seed: LotSeed) -> inventory_lot::Model {
        inventory_lot::ActiveModel {
            product_id: Set(seed.product_id),
            location_id: Set(seed.location_id),
            batch: Set(seed.batch),
            mfg_date: Set(seed.mfg_date),
            exp_date: Set(seed.exp_date),
            quantity: Set(seed.quantity),
            reserved_quantity: Set(seed.reserved),
            created_at: Set(now()),
            updated_at: Set(now()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed inventory lot")
    }

    pub async fn find_lot(&self, id: i32) -> Option<inventory_lot::Model> {
        inventory_lot::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("load inventory lot")
    }

    pub async fn all_lots(&self) -> Vec<inventory_lot::Model> {
        inventory_lot::Entity::find()
            .all(self.db())
            .await
            .expect("load inventory lots")
    }

    pub async fn receipt(&self, lines: &[(&str, Decimal)]) -> GoodsReceiptDetail {
        self.state
            .services
            .receipts
            .create_goods_receipt(
                CreateGoodsReceipt {
                    po_number: "PO-1001".to_string(),
                    supplier_name: "Acme Foods".to_string(),
                    lines: lines
                        .iter()
                        .map(|(ean, quantity)| ReceiptLineRecord {
                            ean: ean.to_string(),
                            quantity: *quantity,
                            batch: None,
                        })
                        .collect(),
                },
                now(),
            )
            .await
            .expect("seed goods receipt")
    }

    /// Sends a request through the full router and returns status and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (axum::http::StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, json)
    }
}

pub struct LotSeed {
    pub product_id: i32,
    pub location_id: i32,
    pub batch: Option<String>,
    pub mfg_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
    pub quantity: Decimal,
    pub reserved: Decimal,
}

impl LotSeed {
    /// Lot made today, expiring in `exp_in_days`.
    pub fn new(product_id: i32, location_id: i32, quantity: Decimal, exp_in_days: i64) -> Self {
        Self {
            product_id,
            location_id,
            batch: Some(format!("B-{exp_in_days}")),
            mfg_date: Some(today()),
            exp_date: Some(days(exp_in_days)),
            quantity,
            reserved: Decimal::ZERO,
        }
    }

    pub fn reserved(mut self, reserved: Decimal) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn made(mut self, mfg_date: NaiveDate) -> Self {
        self.mfg_date = Some(mfg_date);
        self
    }

    pub fn batch(mut self, batch: &str) -> Self {
        self.batch = Some(batch.to_string());
        self
    }
}

/// Every lot satisfies `0 <= reserved <= quantity` and holds stock.
pub async fn assert_lot_invariants(app: &TestApp) {
    for lot in app.all_lots().await {
        assert!(
            lot.reserved_quantity >= Decimal::ZERO,
            "lot {} has negative reservation",
            lot.id
        );
        assert!(
            lot.reserved_quantity <= lot.quantity,
            "lot {} reserves {} of {}",
            lot.id,
            lot.reserved_quantity,
            lot.quantity
        );
        assert!(lot.quantity > Decimal::ZERO, "lot {} is empty", lot.id);
    }
}
