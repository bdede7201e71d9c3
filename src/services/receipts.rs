use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{
    goods_receipt::{self, GoodsReceiptStatus},
    goods_receipt_item::{self, GrnItemStatus},
    inventory_lot::normalize_batch,
    product,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// One normalized line of an inbound document, as produced by bulk upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptLineRecord {
    #[validate(length(min = 1, message = "ean is required"))]
    pub ean: String,
    pub quantity: Decimal,
    pub batch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGoodsReceipt {
    #[validate(length(min = 1, max = 64, message = "po_number is required"))]
    pub po_number: String,
    #[validate(length(min = 1, max = 255, message = "supplier_name is required"))]
    pub supplier_name: String,
    #[validate(length(min = 1, message = "at least one line is required"))]
    pub lines: Vec<ReceiptLineRecord>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoodsReceiptDetail {
    #[serde(flatten)]
    pub receipt: goods_receipt::Model,
    pub items: Vec<goods_receipt_item::Model>,
}

pub(crate) async fn find_product_by_ean<C: ConnectionTrait>(
    conn: &C,
    ean: &str,
) -> Result<product::Model, ServiceError> {
    product::Entity::find()
        .filter(product::Column::Ean.eq(ean.trim()))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("No product with EAN {}", ean.trim())))
}

#[derive(Clone)]
pub struct GoodsReceiptService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl GoodsReceiptService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records an inbound document with all of its lines pending putaway.
    #[instrument(skip(self, input), fields(po_number = %input.po_number))]
    pub async fn create_goods_receipt(
        &self,
        input: CreateGoodsReceipt,
        now: DateTime<Utc>,
    ) -> Result<GoodsReceiptDetail, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }
        if let Some(line) = input.lines.iter().find(|l| l.quantity <= Decimal::ZERO) {
            return Err(ServiceError::QuantityViolation(format!(
                "received quantity for EAN {} must be positive, got {}",
                line.ean, line.quantity
            )));
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let receipt = goods_receipt::ActiveModel {
            po_number: Set(input.po_number.trim().to_string()),
            supplier_name: Set(input.supplier_name.trim().to_string()),
            status: Set(GoodsReceiptStatus::PendingPutaway),
            created_at: Set(now),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let product = find_product_by_ean(&txn, &line.ean).await?;
            let item = goods_receipt_item::ActiveModel {
                goods_receipt_id: Set(receipt.id),
                product_id: Set(product.id),
                quantity: Set(line.quantity),
                putaway_quantity: Set(Decimal::ZERO),
                batch: Set(normalize_batch(line.batch)),
                status: Set(GrnItemStatus::Pending),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(item);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            goods_receipt_id = receipt.id,
            lines = items.len(),
            "Goods receipt created"
        );
        self.event_sender
            .publish(Event::GoodsReceiptCreated {
                goods_receipt_id: receipt.id,
                po_number: receipt.po_number.clone(),
                line_count: items.len(),
            })
            .await;

        Ok(GoodsReceiptDetail { receipt, items })
    }

    #[instrument(skip(self))]
    pub async fn get_goods_receipt(&self, id: i32) -> Result<GoodsReceiptDetail, ServiceError> {
        let db = &*self.db_pool;
        let receipt = goods_receipt::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt {} not found", id)))?;

        let items = goods_receipt_item::Entity::find()
            .filter(goods_receipt_item::Column::GoodsReceiptId.eq(id))
            .order_by_asc(goods_receipt_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(GoodsReceiptDetail { receipt, items })
    }

    /// Receipts still waiting for putaway, newest first, with their lines.
    pub async fn pending_receipts(&self) -> Result<Vec<GoodsReceiptDetail>, ServiceError> {
        let db = &*self.db_pool;
        let receipts = goods_receipt::Entity::find()
            .filter(goods_receipt::Column::Status.eq(GoodsReceiptStatus::PendingPutaway))
            .order_by_desc(goods_receipt::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if receipts.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines: HashMap<i32, Vec<goods_receipt_item::Model>> = HashMap::new();
        for item in goods_receipt_item::Entity::find()
            .filter(
                goods_receipt_item::Column::GoodsReceiptId
                    .is_in(receipts.iter().map(|r| r.id).collect::<Vec<_>>()),
            )
            .order_by_asc(goods_receipt_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
        {
            lines.entry(item.goods_receipt_id).or_default().push(item);
        }

        Ok(receipts
            .into_iter()
            .map(|receipt| GoodsReceiptDetail {
                items: lines.remove(&receipt.id).unwrap_or_default(),
                receipt,
            })
            .collect())
    }
}
