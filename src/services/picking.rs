use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::entities::{
    inventory_lot,
    pick_list::{self, PickListStatus},
    pick_list_item::{self, PickListItemStatus},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PickConfirmation {
    pub item: pick_list_item::Model,
    /// Remaining lot after the deduction; `None` when the lot was emptied and removed.
    pub inventory_lot: Option<inventory_lot::Model>,
    pub pick_list_status: PickListStatus,
}

#[derive(Clone)]
pub struct PickingService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PickingService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Confirms the physical pick of an allocated line, consuming its reservation.
    #[instrument(skip(self))]
    pub async fn execute_pick(
        &self,
        pick_list_item_id: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PickConfirmation, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let item = load_pending_item(&txn, pick_list_item_id).await?;
        let lot_id = item.inventory_lot_id.ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "Pick list item {} has no allocated lot; force-close it instead",
                item.id
            ))
        })?;

        let lot = inventory_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::integrity_violation(format!(
                    "inventory lot {} allocated to pick list item {} no longer exists",
                    lot_id, item.id
                ))
            })?;

        let allocated = item.allocated_quantity;
        if lot.reserved_quantity < allocated || lot.quantity < allocated {
            return Err(ServiceError::integrity_violation(format!(
                "inventory lot {} holds {} with {} reserved, less than the {} allocated to pick list item {}",
                lot.id, lot.quantity, lot.reserved_quantity, allocated, item.id
            )));
        }

        let remaining = lot.quantity - allocated;
        let lot_depleted = remaining <= Decimal::ZERO;
        let lot = if lot_depleted {
            lot.delete(&txn).await.map_err(ServiceError::db_error)?;
            None
        } else {
            let reserved = lot.reserved_quantity - allocated;
            let mut lot: inventory_lot::ActiveModel = lot.into();
            lot.quantity = Set(remaining);
            lot.reserved_quantity = Set(reserved);
            lot.updated_at = Set(now);
            Some(lot.update(&txn).await.map_err(ServiceError::db_error)?)
        };

        let pick_list_id = item.pick_list_id;
        let mut item: pick_list_item::ActiveModel = item.into();
        item.picked_quantity = Set(allocated);
        item.status = Set(PickListItemStatus::Picked);
        item.picked_by = Set(Some(actor.to_string()));
        item.picked_at = Set(Some(now));
        let item = item.update(&txn).await.map_err(ServiceError::db_error)?;

        let pick_list_status = refresh_pick_list_status(&txn, pick_list_id, now).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("warehouse.picks.executed", 1);
        info!(
            pick_list_item_id = item.id,
            inventory_lot_id = lot_id,
            quantity = %allocated,
            lot_depleted,
            actor,
            "Pick executed"
        );

        self.event_sender
            .publish(Event::PickConfirmed {
                pick_list_item_id: item.id,
                inventory_lot_id: lot_id,
                quantity: allocated,
                lot_depleted,
            })
            .await;
        self.publish_completion(pick_list_id, pick_list_status).await;

        Ok(PickConfirmation {
            item,
            inventory_lot: lot,
            pick_list_status,
        })
    }

    /// Closes a line that never received stock. Lines holding a reservation are refused.
    #[instrument(skip(self))]
    pub async fn force_close(
        &self,
        pick_list_item_id: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PickConfirmation, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let item = load_pending_item(&txn, pick_list_item_id).await?;
        if let Some(lot_id) = item.inventory_lot_id {
            return Err(ServiceError::InvalidState(format!(
                "Pick list item {} holds a reservation on lot {}; pick it instead",
                item.id, lot_id
            )));
        }

        let pick_list_id = item.pick_list_id;
        let mut item: pick_list_item::ActiveModel = item.into();
        item.picked_quantity = Set(Decimal::ZERO);
        item.status = Set(PickListItemStatus::Picked);
        item.picked_by = Set(Some(actor.to_string()));
        item.picked_at = Set(Some(now));
        let item = item.update(&txn).await.map_err(ServiceError::db_error)?;

        let pick_list_status = refresh_pick_list_status(&txn, pick_list_id, now).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("warehouse.picks.force_closed", 1);
        warn!(
            pick_list_item_id = item.id,
            notes = item.notes.as_deref().unwrap_or_default(),
            actor,
            "Pick line force-closed without stock"
        );

        self.event_sender
            .publish(Event::PickLineForceClosed {
                pick_list_item_id: item.id,
                actor: actor.to_string(),
            })
            .await;
        self.publish_completion(pick_list_id, pick_list_status).await;

        Ok(PickConfirmation {
            item,
            inventory_lot: None,
            pick_list_status,
        })
    }

    async fn publish_completion(&self, pick_list_id: i32, status: PickListStatus) {
        if status == PickListStatus::Completed {
            info!(pick_list_id, "Pick list completed");
            self.event_sender
                .publish(Event::PickListCompleted(pick_list_id))
                .await;
        }
    }
}

async fn load_pending_item<C: ConnectionTrait>(
    conn: &C,
    pick_list_item_id: i32,
) -> Result<pick_list_item::Model, ServiceError> {
    let item = pick_list_item::Entity::find_by_id(pick_list_item_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Pick list item {} not found", pick_list_item_id))
        })?;

    if item.status == PickListItemStatus::Picked {
        return Err(ServiceError::InvalidState(format!(
            "Pick list item {} is already picked",
            item.id
        )));
    }
    Ok(item)
}

/// Marks the pick list completed once every line is picked.
async fn refresh_pick_list_status<C: ConnectionTrait>(
    conn: &C,
    pick_list_id: i32,
    now: DateTime<Utc>,
) -> Result<PickListStatus, ServiceError> {
    let pick_list = pick_list::Entity::find_by_id(pick_list_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::integrity_violation(format!(
                "pick list {} missing for one of its items",
                pick_list_id
            ))
        })?;

    let open_lines = pick_list_item::Entity::find()
        .filter(pick_list_item::Column::PickListId.eq(pick_list_id))
        .filter(pick_list_item::Column::Status.ne(PickListItemStatus::Picked))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if open_lines > 0 || pick_list.status == PickListStatus::Completed {
        return Ok(pick_list.status);
    }

    let mut pick_list: pick_list::ActiveModel = pick_list.into();
    pick_list.status = Set(PickListStatus::Completed);
    pick_list.completed_at = Set(Some(now));
    let pick_list = pick_list.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(pick_list.status)
}
