use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{
    inventory_lot,
    pick_list::{self, PickListStatus},
    pick_list_item::{self, PickListItemStatus},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::allocation::{allocate_with, AllocationOutcome};
use crate::services::receipts::find_product_by_ean;
use crate::services::shelf_life::ShelfLifeWindow;

/// One normalized outbound line, as produced by bulk upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PickLineRecord {
    #[validate(length(min = 1, message = "ean is required"))]
    pub ean: String,
    pub quantity: Decimal,
    /// Acceptable remaining shelf life, `"min-max"` in percent
    #[schema(example = "60-100")]
    pub shelf_life: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePickList {
    #[validate(length(min = 1, max = 64, message = "obd_number is required"))]
    pub obd_number: String,
    #[validate(length(min = 1, max = 255, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "at least one line is required"))]
    pub lines: Vec<PickLineRecord>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PickListDetail {
    #[serde(flatten)]
    pub pick_list: pick_list::Model,
    pub items: Vec<PickListItemView>,
}

/// Pick line with the dates of the lot it draws from, while that lot exists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PickListItemView {
    #[serde(flatten)]
    pub item: pick_list_item::Model,
    pub mfg_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct PickListService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PickListService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a pick list and allocates stock for every line in one transaction.
    ///
    /// Lines are allocated in order, so a later line for the same product only
    /// sees what earlier lines left unreserved. Short lines are annotated, not failed.
    #[instrument(skip(self, input), fields(obd_number = %input.obd_number))]
    pub async fn create_pick_list(
        &self,
        input: CreatePickList,
        now: DateTime<Utc>,
    ) -> Result<PickListDetail, ServiceError> {
        input.validate()?;
        let mut lines = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            line.validate()?;
            let window: ShelfLifeWindow = line.shelf_life.parse()?;
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::QuantityViolation(format!(
                    "requested quantity for EAN {} must be positive, got {}",
                    line.ean, line.quantity
                )));
            }
            lines.push((line, window));
        }

        let obd_number = input.obd_number.trim().to_string();
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let pick_list = pick_list::ActiveModel {
            obd_number: Set(obd_number.clone()),
            customer_name: Set(input.customer_name.trim().to_string()),
            status: Set(PickListStatus::Pending),
            created_at: Set(now),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            ServiceError::from_insert(e, || format!("Pick list {} already exists", obd_number))
        })?;

        let mut items = Vec::new();
        let mut short_lines = 0usize;
        for (line, window) in lines {
            let product = find_product_by_ean(&txn, &line.ean).await?;
            let outcome = allocate_with(&txn, product.id, line.quantity, window, now).await?;
            if let Some(reason) = outcome.reason() {
                short_lines += 1;
                warn!(ean = %line.ean, %window, %reason, "Pick line not fully allocated");
            }
            for item in pick_items_for(pick_list.id, product.id, &outcome) {
                items.push(item.insert(&txn).await.map_err(ServiceError::db_error)?);
            }
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            pick_list_id = pick_list.id,
            items = items.len(),
            short_lines,
            "Pick list created"
        );
        self.event_sender
            .publish(Event::PickListCreated {
                pick_list_id: pick_list.id,
                obd_number: pick_list.obd_number.clone(),
                item_count: items.len(),
            })
            .await;

        let items = with_lot_dates(&*self.db_pool, items).await?;
        Ok(PickListDetail { pick_list, items })
    }

    #[instrument(skip(self))]
    pub async fn get_pick_list(&self, id: i32) -> Result<PickListDetail, ServiceError> {
        let db = &*self.db_pool;
        let pick_list = pick_list::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Pick list {} not found", id)))?;

        let items = pick_list_item::Entity::find()
            .filter(pick_list_item::Column::PickListId.eq(id))
            .order_by_asc(pick_list_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let items = with_lot_dates(db, items).await?;
        Ok(PickListDetail { pick_list, items })
    }

    /// Pick lists with work left, newest first.
    pub async fn pending_pick_lists(&self) -> Result<Vec<PickListDetail>, ServiceError> {
        let db = &*self.db_pool;
        let pick_lists = pick_list::Entity::find()
            .filter(pick_list::Column::Status.eq(PickListStatus::Pending))
            .order_by_desc(pick_list::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if pick_lists.is_empty() {
            return Ok(Vec::new());
        }

        let items = pick_list_item::Entity::find()
            .filter(
                pick_list_item::Column::PickListId
                    .is_in(pick_lists.iter().map(|p| p.id).collect::<Vec<_>>()),
            )
            .order_by_asc(pick_list_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut lines: HashMap<i32, Vec<PickListItemView>> = HashMap::new();
        for view in with_lot_dates(db, items).await? {
            lines.entry(view.item.pick_list_id).or_default().push(view);
        }

        Ok(pick_lists
            .into_iter()
            .map(|pick_list| PickListDetail {
                items: lines.remove(&pick_list.id).unwrap_or_default(),
                pick_list,
            })
            .collect())
    }
}

/// Turns one line's allocation outcome into pick list items.
///
/// Each reserved lot becomes its own pickable item. An outcome without any
/// allocation becomes a single annotated item; a partial one gets an extra
/// annotated item recording the shortfall.
fn pick_items_for(
    pick_list_id: i32,
    product_id: i32,
    outcome: &AllocationOutcome,
) -> Vec<pick_list_item::ActiveModel> {
    let base = |allocated: Decimal| pick_list_item::ActiveModel {
        pick_list_id: Set(pick_list_id),
        product_id: Set(product_id),
        required_quantity: Set(outcome.required),
        allocated_quantity: Set(allocated),
        picked_quantity: Set(Decimal::ZERO),
        status: Set(PickListItemStatus::Pending),
        inventory_lot_id: Set(None),
        location_id: Set(None),
        batch: Set(None),
        notes: Set(None),
        picked_by: Set(None),
        picked_at: Set(None),
        ..Default::default()
    };

    let mut items: Vec<_> = outcome
        .allocations
        .iter()
        .map(|allocation| {
            let mut item = base(allocation.quantity);
            item.inventory_lot_id = Set(Some(allocation.lot.id));
            item.location_id = Set(Some(allocation.lot.location_id));
            item.batch = Set(allocation.lot.batch.clone());
            item
        })
        .collect();

    if let Some(reason) = outcome.reason() {
        let mut annotation = base(outcome.allocated());
        annotation.notes = Set(Some(reason));
        items.push(annotation);
    }

    items
}

async fn with_lot_dates<C: ConnectionTrait>(
    conn: &C,
    items: Vec<pick_list_item::Model>,
) -> Result<Vec<PickListItemView>, ServiceError> {
    let lot_ids: Vec<i32> = items.iter().filter_map(|i| i.inventory_lot_id).collect();
    let lots: HashMap<i32, inventory_lot::Model> = if lot_ids.is_empty() {
        HashMap::new()
    } else {
        inventory_lot::Entity::find()
            .filter(inventory_lot::Column::Id.is_in(lot_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|lot| (lot.id, lot))
            .collect()
    };

    Ok(items
        .into_iter()
        .map(|item| {
            let lot = item.inventory_lot_id.and_then(|id| lots.get(&id));
            PickListItemView {
                mfg_date: lot.and_then(|l| l.mfg_date),
                exp_date: lot.and_then(|l| l.exp_date),
                item,
            }
        })
        .collect())
}
