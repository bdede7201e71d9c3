use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalogue entry addressed by its EAN barcode and the supplier's material code.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub ean: String,
    #[sea_orm(unique)]
    pub material_code: String,
    pub name: String,
    pub brand: String,
    pub uom: UnitOfMeasure,
    /// Maximum retail price
    pub mrp: Decimal,
    /// Eaches per case
    pub case_size: i32,
    /// Replenishment bounds; zero means unset
    pub min_qty: Decimal,
    pub max_qty: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_lot::Entity")]
    InventoryLots,
}

impl Related<super::inventory_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UnitOfMeasure {
    #[default]
    #[sea_orm(string_value = "EA")]
    #[serde(rename = "EA")]
    Each,
    #[sea_orm(string_value = "CASE")]
    #[serde(rename = "CASE")]
    Case,
}
