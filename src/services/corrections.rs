use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::{
    inventory_lot::{self, normalize_batch, LotKey},
    location,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Manual correction of a lot. Absent fields are left unchanged; a blank
/// `batch` clears it, as does an explicit `null` for either date.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LotCorrection {
    pub quantity: Option<Decimal>,
    pub batch: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub mfg_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub exp_date: Option<Option<NaiveDate>>,
}

#[derive(Clone)]
pub struct InventoryCorrectionService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryCorrectionService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Applies `correction` to a lot. Returns `None` when the lot was emptied and removed.
    #[instrument(skip(self, correction))]
    pub async fn correct_lot(
        &self,
        lot_id: i32,
        correction: LotCorrection,
        now: DateTime<Utc>,
    ) -> Result<Option<inventory_lot::Model>, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let lot = inventory_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory lot {} not found", lot_id)))?;

        let old_quantity = lot.quantity;
        let quantity = correction.quantity.unwrap_or(lot.quantity);
        if quantity < lot.reserved_quantity {
            return Err(ServiceError::QuantityViolation(format!(
                "inventory lot {} has {} reserved; quantity cannot drop to {}",
                lot.id,
                lot.reserved_quantity.normalize(),
                quantity.normalize()
            )));
        }

        if quantity <= Decimal::ZERO {
            lot.delete(&txn).await.map_err(ServiceError::db_error)?;
            txn.commit().await.map_err(ServiceError::db_error)?;

            counter!("warehouse.lots.deleted", 1);
            info!(inventory_lot_id = lot_id, "Inventory lot emptied by correction");
            self.event_sender
                .publish(Event::InventoryLotDeleted(lot_id))
                .await;
            return Ok(None);
        }

        let mut key = LotKey::from(&lot);
        if let Some(batch) = correction.batch {
            key.batch = normalize_batch(Some(batch));
        }
        if let Some(date) = correction.mfg_date {
            key.mfg_date = date;
        }
        if let Some(date) = correction.exp_date {
            key.exp_date = date;
        }

        if key != LotKey::from(&lot) {
            let clash = inventory_lot::Entity::find()
                .filter(key.condition())
                .filter(inventory_lot::Column::Id.ne(lot.id))
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if let Some(other) = clash {
                return Err(ServiceError::Conflict(format!(
                    "inventory lot {} already holds that batch and dates at this location",
                    other.id
                )));
            }
        }

        let mut active: inventory_lot::ActiveModel = lot.into();
        active.quantity = Set(quantity);
        active.batch = Set(key.batch);
        active.mfg_date = Set(key.mfg_date);
        active.exp_date = Set(key.exp_date);
        active.updated_at = Set(now);
        let lot = active.update(&txn).await.map_err(|e| {
            ServiceError::from_insert(e, || {
                format!("inventory lot {} collides with an existing lot", lot_id)
            })
        })?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("warehouse.lots.corrected", 1);
        info!(
            inventory_lot_id = lot.id,
            old_quantity = %old_quantity,
            new_quantity = %lot.quantity,
            "Inventory lot corrected"
        );
        self.event_sender
            .publish(Event::InventoryLotCorrected {
                inventory_lot_id: lot.id,
                old_quantity,
                new_quantity: lot.quantity,
            })
            .await;

        Ok(Some(lot))
    }

    /// Removes a lot that has nothing reserved against it.
    #[instrument(skip(self))]
    pub async fn delete_lot(&self, lot_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let lot = inventory_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory lot {} not found", lot_id)))?;

        if lot.reserved_quantity > Decimal::ZERO {
            return Err(ServiceError::InvalidState(format!(
                "inventory lot {} has {} reserved for picking",
                lot.id,
                lot.reserved_quantity.normalize()
            )));
        }

        lot.delete(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("warehouse.lots.deleted", 1);
        info!(inventory_lot_id = lot_id, "Inventory lot deleted");
        self.event_sender
            .publish(Event::InventoryLotDeleted(lot_id))
            .await;
        Ok(())
    }

    /// Stock view of one shelf location.
    #[instrument(skip(self))]
    pub async fn lots_at_location(
        &self,
        location_code: &str,
    ) -> Result<Vec<inventory_lot::Model>, ServiceError> {
        let db = &*self.db_pool;
        let location = location::Entity::find()
            .filter(location::Column::Code.eq(location_code.trim()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", location_code.trim()))
            })?;

        inventory_lot::Entity::find()
            .filter(inventory_lot::Column::LocationId.eq(location.id))
            .order_by_asc(inventory_lot::Column::ProductId)
            .order_by_asc(inventory_lot::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
