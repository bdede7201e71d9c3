//! Lot selection and greedy stock allocation.
//!
//! Selection keeps lots with a positive unreserved balance whose remaining
//! shelf life falls inside the requested window, ordered earliest expiry
//! first (undated lots last), then smallest on-hand quantity, then lot id.
//! Allocation walks that order, reserving as much of each lot as is still
//! required. Reservations are written immediately and are kept even when the
//! request ends short.

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::entities::{inventory_lot, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::shelf_life::{shelf_life_percent, ShelfLifeWindow};

/// Why an allocation came back short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationNote {
    /// No lot of the product has unreserved stock.
    OutOfStock,
    /// Unreserved stock exists but none of it falls inside the shelf-life window.
    LowShelfLife,
    /// Candidates ran out before the requested quantity was covered.
    Shortfall(Decimal),
}

impl fmt::Display for AllocationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationNote::OutOfStock => write!(f, "Out of Stock"),
            AllocationNote::LowShelfLife => write!(f, "Low Shelf Life"),
            AllocationNote::Shortfall(qty) => write!(f, "Shortfall of {}", qty.normalize()),
        }
    }
}

/// Quantity reserved from one lot.
#[derive(Debug, Clone, PartialEq)]
pub struct LotAllocation {
    /// The lot as it was read, before this allocation.
    pub lot: inventory_lot::Model,
    pub quantity: Decimal,
    /// Reserved quantity on the lot once this allocation is applied.
    pub reserved_after: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub required: Decimal,
    pub allocations: Vec<LotAllocation>,
    pub shortfall: Decimal,
    pub note: Option<AllocationNote>,
}

impl AllocationOutcome {
    pub fn allocated(&self) -> Decimal {
        self.allocations.iter().map(|a| a.quantity).sum()
    }

    pub fn reason(&self) -> Option<String> {
        self.note.as_ref().map(ToString::to_string)
    }

    fn unallocated(required: Decimal, note: AllocationNote) -> Self {
        Self {
            required,
            allocations: Vec::new(),
            shortfall: required,
            note: Some(note),
        }
    }
}

/// Allocation report returned over the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AllocationReport {
    pub product_id: i32,
    pub required: Decimal,
    pub allocated: Decimal,
    pub shortfall: Decimal,
    pub reason: Option<String>,
    pub allocations: Vec<AllocationLine>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AllocationLine {
    pub inventory_lot_id: i32,
    pub location_id: i32,
    pub batch: Option<String>,
    pub exp_date: Option<NaiveDate>,
    pub quantity: Decimal,
}

impl AllocationReport {
    pub fn new(product_id: i32, outcome: &AllocationOutcome) -> Self {
        Self {
            product_id,
            required: outcome.required,
            allocated: outcome.allocated(),
            shortfall: outcome.shortfall,
            reason: outcome.reason(),
            allocations: outcome
                .allocations
                .iter()
                .map(|a| AllocationLine {
                    inventory_lot_id: a.lot.id,
                    location_id: a.lot.location_id,
                    batch: a.lot.batch.clone(),
                    exp_date: a.lot.exp_date,
                    quantity: a.quantity,
                })
                .collect(),
        }
    }
}

/// Earliest expiry first with undated lots last, then smaller on-hand quantity, then lot id.
fn pick_order(a: &inventory_lot::Model, b: &inventory_lot::Model) -> Ordering {
    let by_expiry = match (a.exp_date, b.exp_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_expiry
        .then_with(|| a.quantity.cmp(&b.quantity))
        .then_with(|| a.id.cmp(&b.id))
}

fn unreserved(lots: Vec<inventory_lot::Model>) -> Vec<inventory_lot::Model> {
    lots.into_iter()
        .filter(|lot| lot.available() > Decimal::ZERO)
        .collect()
}

fn within_window(
    lots: Vec<inventory_lot::Model>,
    window: ShelfLifeWindow,
    today: NaiveDate,
) -> Vec<inventory_lot::Model> {
    let mut lots: Vec<_> = lots
        .into_iter()
        .filter(|lot| window.contains(shelf_life_percent(lot.mfg_date, lot.exp_date, today)))
        .collect();
    lots.sort_by(pick_order);
    lots
}

/// Ordered allocation candidates among `lots` (all lots of a single product).
pub fn select_lots(
    lots: Vec<inventory_lot::Model>,
    window: ShelfLifeWindow,
    today: NaiveDate,
) -> Vec<inventory_lot::Model> {
    within_window(unreserved(lots), window, today)
}

/// Plans a greedy allocation of `required` over `lots` without touching storage.
pub fn plan_allocation(
    lots: Vec<inventory_lot::Model>,
    required: Decimal,
    window: ShelfLifeWindow,
    today: NaiveDate,
) -> AllocationOutcome {
    let unreserved = unreserved(lots);
    if unreserved.is_empty() {
        return AllocationOutcome::unallocated(required, AllocationNote::OutOfStock);
    }

    let candidates = within_window(unreserved, window, today);
    if candidates.is_empty() {
        return AllocationOutcome::unallocated(required, AllocationNote::LowShelfLife);
    }

    let mut remaining = required;
    let mut allocations = Vec::new();
    for lot in candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        let mut reserved = lot.reserved_quantity;
        let take = remaining.min(lot.quantity - reserved);
        reserved += take;
        remaining -= take;
        allocations.push(LotAllocation {
            lot,
            quantity: take,
            reserved_after: reserved,
        });
    }

    let note = (remaining > Decimal::ZERO).then(|| AllocationNote::Shortfall(remaining));
    AllocationOutcome {
        required,
        allocations,
        shortfall: remaining.max(Decimal::ZERO),
        note,
    }
}

/// Loads every lot of `product_id`, plans the allocation and writes the new
/// reservations through `conn`.
pub(crate) async fn allocate_with<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    required: Decimal,
    window: ShelfLifeWindow,
    now: DateTime<Utc>,
) -> Result<AllocationOutcome, ServiceError> {
    if required <= Decimal::ZERO {
        return Err(ServiceError::QuantityViolation(format!(
            "requested quantity must be positive, got {}",
            required
        )));
    }

    let lots = inventory_lot::Entity::find()
        .filter(inventory_lot::Column::ProductId.eq(product_id))
        .order_by_asc(inventory_lot::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let outcome = plan_allocation(lots, required, window, now.date_naive());

    for allocation in &outcome.allocations {
        let mut lot: inventory_lot::ActiveModel = allocation.lot.clone().into();
        lot.reserved_quantity = Set(allocation.reserved_after);
        lot.updated_at = Set(now);
        lot.update(conn).await.map_err(ServiceError::db_error)?;
    }

    counter!("warehouse.allocation.runs", 1);
    if outcome.note.is_some() {
        counter!("warehouse.allocation.short", 1);
    }

    Ok(outcome)
}

pub(crate) async fn require_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
}

/// Reserves stock for ad-hoc requests and answers lot-candidate queries.
#[derive(Clone)]
pub struct AllocationService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AllocationService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Read-only view of the lots an allocation would draw from, in draw order.
    #[instrument(skip(self))]
    pub async fn candidate_lots(
        &self,
        product_id: i32,
        window: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<inventory_lot::Model>, ServiceError> {
        let window: ShelfLifeWindow = window.parse()?;
        let db = &*self.db_pool;
        require_product(db, product_id).await?;

        let lots = inventory_lot::Entity::find()
            .filter(inventory_lot::Column::ProductId.eq(product_id))
            .order_by_asc(inventory_lot::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(select_lots(lots, window, now.date_naive()))
    }

    /// Reserves up to `required` of `product_id` from lots inside `window`.
    ///
    /// A short result is not an error; inspect `shortfall` and `reason`.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        product_id: i32,
        required: Decimal,
        window: &str,
        now: DateTime<Utc>,
    ) -> Result<AllocationReport, ServiceError> {
        let window: ShelfLifeWindow = window.parse()?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        require_product(&txn, product_id).await?;
        let outcome = allocate_with(&txn, product_id, required, window, now).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        let report = AllocationReport::new(product_id, &outcome);
        match &report.reason {
            None => info!(
                product_id,
                allocated = %report.allocated,
                lots = report.allocations.len(),
                "Stock allocated"
            ),
            Some(reason) => warn!(
                product_id,
                allocated = %report.allocated,
                shortfall = %report.shortfall,
                %reason,
                "Allocation short"
            ),
        }

        if !report.allocations.is_empty() {
            self.event_sender
                .publish(Event::StockAllocated {
                    product_id,
                    requested: required,
                    allocated: report.allocated,
                    lots: report
                        .allocations
                        .iter()
                        .map(|a| a.inventory_lot_id)
                        .collect(),
                })
                .await;
        }
        if let Some(reason) = &report.reason {
            self.event_sender
                .publish(Event::AllocationShortfall {
                    product_id,
                    requested: required,
                    reason: reason.clone(),
                })
                .await;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn lot(id: i32, quantity: Decimal, reserved: Decimal, exp_in_days: Option<i64>) -> inventory_lot::Model {
        let stamp = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        inventory_lot::Model {
            id,
            product_id: 1,
            location_id: 1,
            batch: Some(format!("B{id}")),
            mfg_date: Some(today()),
            exp_date: exp_in_days.map(|d| today() + Duration::days(d)),
            quantity,
            reserved_quantity: reserved,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn taken(outcome: &AllocationOutcome) -> Vec<(i32, Decimal)> {
        outcome
            .allocations
            .iter()
            .map(|a| (a.lot.id, a.quantity))
            .collect()
    }

    #[test]
    fn earlier_expiry_is_consumed_first() {
        let lots = vec![
            lot(1, dec!(10), dec!(0), Some(10)),
            lot(2, dec!(5), dec!(0), Some(5)),
        ];

        let outcome = plan_allocation(lots, dec!(12), ShelfLifeWindow::ANY, today());

        assert_eq!(taken(&outcome), vec![(2, dec!(5)), (1, dec!(7))]);
        assert_eq!(outcome.shortfall, Decimal::ZERO);
        assert_eq!(outcome.note, None);
        assert_eq!(outcome.allocations[1].reserved_after, dec!(7));
    }

    #[test]
    fn smaller_lot_breaks_expiry_tie() {
        let lots = vec![
            lot(1, dec!(8), dec!(0), Some(30)),
            lot(2, dec!(3), dec!(0), Some(30)),
        ];

        let outcome = plan_allocation(lots, dec!(4), ShelfLifeWindow::ANY, today());
        assert_eq!(taken(&outcome), vec![(2, dec!(3)), (1, dec!(1))]);
    }

    #[test]
    fn undated_lots_sort_last() {
        let mut undated = lot(1, dec!(1), dec!(0), None);
        undated.mfg_date = None;
        let lots = vec![undated, lot(2, dec!(50), dec!(0), Some(90))];

        let ordered = select_lots(lots, ShelfLifeWindow::ANY, today());
        assert_eq!(ordered.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn reserved_stock_is_not_available() {
        let lots = vec![
            lot(1, dec!(10), dec!(10), Some(5)),
            lot(2, dec!(10), dec!(6), Some(8)),
        ];

        let outcome = plan_allocation(lots, dec!(3), ShelfLifeWindow::ANY, today());
        assert_eq!(taken(&outcome), vec![(2, dec!(3))]);
        assert_eq!(outcome.allocations[0].reserved_after, dec!(9));
    }

    #[test]
    fn no_unreserved_stock_is_out_of_stock() {
        let lots = vec![lot(1, dec!(4), dec!(4), Some(5))];

        let outcome = plan_allocation(lots, dec!(2), ShelfLifeWindow::ANY, today());
        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.reason().as_deref(), Some("Out of Stock"));
        assert_eq!(outcome.shortfall, dec!(2));

        let outcome = plan_allocation(Vec::new(), dec!(2), ShelfLifeWindow::ANY, today());
        assert_eq!(outcome.note, Some(AllocationNote::OutOfStock));
    }

    #[test]
    fn stock_outside_window_is_low_shelf_life() {
        // Made 1 day ago, expires in 19: 95% left.
        let mut fresh = lot(1, dec!(10), dec!(0), Some(19));
        fresh.mfg_date = Some(today() - Duration::days(1));
        let window: ShelfLifeWindow = "40-90".parse().unwrap();

        let outcome = plan_allocation(vec![fresh], dec!(1), window, today());
        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.reason().as_deref(), Some("Low Shelf Life"));
    }

    #[test]
    fn shortfall_keeps_partial_allocations() {
        let lots = vec![lot(1, dec!(2), dec!(0), Some(5)), lot(2, dec!(1), dec!(0), Some(6))];

        let outcome = plan_allocation(lots, dec!(5), ShelfLifeWindow::ANY, today());
        assert_eq!(taken(&outcome), vec![(1, dec!(2)), (2, dec!(1))]);
        assert_eq!(outcome.shortfall, dec!(2));
        assert_eq!(outcome.reason().as_deref(), Some("Shortfall of 2"));
    }

    #[test]
    fn shortfall_note_drops_trailing_zeros() {
        assert_eq!(
            AllocationNote::Shortfall(dec!(2.5000)).to_string(),
            "Shortfall of 2.5"
        );
    }

    #[test]
    fn stops_once_requirement_is_met() {
        let lots = vec![
            lot(1, dec!(5), dec!(0), Some(1)),
            lot(2, dec!(5), dec!(0), Some(2)),
            lot(3, dec!(5), dec!(0), Some(3)),
        ];

        let outcome = plan_allocation(lots, dec!(5), ShelfLifeWindow::ANY, today());
        assert_eq!(taken(&outcome), vec![(1, dec!(5))]);
    }

    fn arb_lot() -> impl Strategy<Value = (u32, u32, Option<i64>)> {
        (1u32..50, 0u32..50, proptest::option::of(0i64..120))
    }

    proptest! {
        #[test]
        fn allocated_plus_shortfall_equals_required(
            specs in proptest::collection::vec(arb_lot(), 0..8),
            required in 1u32..200,
        ) {
            let lots: Vec<_> = specs
                .iter()
                .enumerate()
                .map(|(i, (qty, res, exp))| {
                    let qty = Decimal::from(*qty);
                    let reserved = Decimal::from(*res).min(qty);
                    lot(i as i32 + 1, qty, reserved, *exp)
                })
                .collect();
            let required = Decimal::from(required);

            let outcome = plan_allocation(lots, required, ShelfLifeWindow::ANY, today());

            prop_assert_eq!(outcome.allocated() + outcome.shortfall, required);
            prop_assert!(outcome.allocated() <= required);
            for a in &outcome.allocations {
                prop_assert!(a.quantity > Decimal::ZERO);
                prop_assert!(a.reserved_after <= a.lot.quantity);
            }
        }

        #[test]
        fn selection_is_repeatable(specs in proptest::collection::vec(arb_lot(), 0..8)) {
            let lots: Vec<_> = specs
                .iter()
                .enumerate()
                .map(|(i, (qty, res, exp))| {
                    lot(i as i32 + 1, Decimal::from(*qty), Decimal::from(*res).min(Decimal::from(*qty)), *exp)
                })
                .collect();

            let first = select_lots(lots.clone(), ShelfLifeWindow::ANY, today());
            let mut reversed = lots;
            reversed.reverse();
            let second = select_lots(reversed, ShelfLifeWindow::ANY, today());
            prop_assert_eq!(first, second);
        }
    }
}
