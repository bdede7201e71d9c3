use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::entities::{
    goods_receipt::{self, GoodsReceiptStatus},
    goods_receipt_item::{self, GrnItemStatus},
    inventory_lot::{self, normalize_batch, LotKey},
    location, putaway_log,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::allocation::require_product;

/// Moves received goods from a receipt line onto a shelf location.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PutawayRequest {
    pub goods_receipt_item_id: i32,
    pub product_id: i32,
    pub location_id: i32,
    pub quantity: Decimal,
    pub batch: Option<String>,
    pub mfg_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PutawayConfirmation {
    pub putaway_log: putaway_log::Model,
    pub inventory_lot: inventory_lot::Model,
    pub receipt_item: goods_receipt_item::Model,
    pub receipt_status: GoodsReceiptStatus,
}

#[derive(Clone)]
pub struct PutawayService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PutawayService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Puts `request.quantity` away into the matching lot, creating it when absent.
    ///
    /// Lot, log entry, line and header changes commit together or not at all.
    #[instrument(skip(self, request), fields(goods_receipt_item_id = request.goods_receipt_item_id))]
    pub async fn putaway(
        &self,
        request: PutawayRequest,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PutawayConfirmation, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let item = goods_receipt_item::Entity::find_by_id(request.goods_receipt_item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Goods receipt item {} not found",
                    request.goods_receipt_item_id
                ))
            })?;

        if item.status == GrnItemStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "Goods receipt item {} is already completed",
                item.id
            )));
        }

        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::QuantityViolation(format!(
                "putaway quantity must be positive, got {}",
                request.quantity
            )));
        }
        let outstanding = item.outstanding();
        if request.quantity > outstanding {
            return Err(ServiceError::QuantityViolation(format!(
                "putaway of {} exceeds outstanding quantity {} on goods receipt item {}",
                request.quantity.normalize(),
                outstanding.normalize(),
                item.id
            )));
        }

        require_product(&txn, request.product_id).await?;
        location::Entity::find_by_id(request.location_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", request.location_id))
            })?;
        if request.product_id != item.product_id {
            warn!(
                expected = item.product_id,
                received = request.product_id,
                "Putaway product differs from goods receipt line product"
            );
        }

        let key = LotKey {
            product_id: request.product_id,
            location_id: request.location_id,
            batch: normalize_batch(request.batch),
            mfg_date: request.mfg_date,
            exp_date: request.exp_date,
        };
        let lot = receive_into_lot(&txn, key, request.quantity, now).await?;

        let log = putaway_log::ActiveModel {
            goods_receipt_item_id: Set(item.id),
            inventory_lot_id: Set(lot.id),
            quantity: Set(request.quantity),
            performed_by: Set(actor.to_string()),
            performed_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let putaway_quantity = item.putaway_quantity + request.quantity;
        let line_completed = putaway_quantity >= item.quantity;
        let receipt_id = item.goods_receipt_id;
        let mut item: goods_receipt_item::ActiveModel = item.into();
        item.putaway_quantity = Set(putaway_quantity);
        if line_completed {
            item.status = Set(GrnItemStatus::Completed);
        }
        let item = item.update(&txn).await.map_err(ServiceError::db_error)?;

        let receipt_status = refresh_receipt_status(&txn, receipt_id, now).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("warehouse.putaway.completed", 1);
        info!(
            inventory_lot_id = lot.id,
            quantity = %request.quantity,
            line_completed,
            %receipt_status,
            actor,
            "Putaway recorded"
        );

        self.event_sender
            .publish(Event::PutawayCompleted {
                goods_receipt_item_id: item.id,
                inventory_lot_id: lot.id,
                quantity: request.quantity,
                line_completed,
            })
            .await;
        if line_completed && receipt_status == GoodsReceiptStatus::Completed {
            self.event_sender
                .publish(Event::GoodsReceiptCompleted(receipt_id))
                .await;
        }

        Ok(PutawayConfirmation {
            putaway_log: log,
            inventory_lot: lot,
            receipt_item: item,
            receipt_status,
        })
    }
}

/// Adds `quantity` to the lot identified by `key`, creating it with nothing reserved if missing.
async fn receive_into_lot<C: ConnectionTrait>(
    conn: &C,
    key: LotKey,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> Result<inventory_lot::Model, ServiceError> {
    let existing = inventory_lot::Entity::find()
        .filter(key.condition())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    match existing {
        Some(lot) => {
            let merged = lot.quantity + quantity;
            let mut lot: inventory_lot::ActiveModel = lot.into();
            lot.quantity = Set(merged);
            lot.updated_at = Set(now);
            lot.update(conn).await.map_err(ServiceError::db_error)
        }
        None => inventory_lot::ActiveModel {
            product_id: Set(key.product_id),
            location_id: Set(key.location_id),
            batch: Set(key.batch),
            mfg_date: Set(key.mfg_date),
            exp_date: Set(key.exp_date),
            quantity: Set(quantity),
            reserved_quantity: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error),
    }
}

/// Marks the receipt completed once none of its lines is still pending.
async fn refresh_receipt_status<C: ConnectionTrait>(
    conn: &C,
    receipt_id: i32,
    now: DateTime<Utc>,
) -> Result<GoodsReceiptStatus, ServiceError> {
    let receipt = goods_receipt::Entity::find_by_id(receipt_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::integrity_violation(format!(
                "goods receipt {} missing for one of its lines",
                receipt_id
            ))
        })?;

    let pending = goods_receipt_item::Entity::find()
        .filter(goods_receipt_item::Column::GoodsReceiptId.eq(receipt_id))
        .filter(goods_receipt_item::Column::Status.ne(GrnItemStatus::Completed))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if pending > 0 || receipt.status == GoodsReceiptStatus::Completed {
        return Ok(receipt.status);
    }

    let mut receipt: goods_receipt::ActiveModel = receipt.into();
    receipt.status = Set(GoodsReceiptStatus::Completed);
    receipt.completed_at = Set(Some(now));
    let receipt = receipt.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(receipt.status)
}
