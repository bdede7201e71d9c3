use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Condition;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// On-hand stock of one product at one location, split by batch and dates.
///
/// Rows are unique on (product, location, batch, mfg_date, exp_date) and are
/// deleted rather than kept at a zero balance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "inventory_lots")]
#[schema(as = InventoryLot)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub location_id: i32,
    pub batch: Option<String>,
    pub mfg_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reserved_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Quantity not yet promised to a pick line.
    pub fn available(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }
}

/// Identity of a lot: at most one row exists per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotKey {
    pub product_id: i32,
    pub location_id: i32,
    pub batch: Option<String>,
    pub mfg_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
}

impl LotKey {
    /// Filter matching this key, treating absent batch or dates as `IS NULL`.
    pub fn condition(&self) -> Condition {
        Condition::all()
            .add(Column::ProductId.eq(self.product_id))
            .add(Column::LocationId.eq(self.location_id))
            .add(match &self.batch {
                Some(batch) => Column::Batch.eq(batch.as_str()),
                None => Column::Batch.is_null(),
            })
            .add(match self.mfg_date {
                Some(date) => Column::MfgDate.eq(date),
                None => Column::MfgDate.is_null(),
            })
            .add(match self.exp_date {
                Some(date) => Column::ExpDate.eq(date),
                None => Column::ExpDate.is_null(),
            })
    }
}

impl From<&Model> for LotKey {
    fn from(lot: &Model) -> Self {
        Self {
            product_id: lot.product_id,
            location_id: lot.location_id,
            batch: lot.batch.clone(),
            mfg_date: lot.mfg_date,
            exp_date: lot.exp_date,
        }
    }
}

/// Trims a user-supplied batch code, mapping blank input to no batch.
pub fn normalize_batch(batch: Option<String>) -> Option<String> {
    batch
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
}
