use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "locations")]
#[schema(as = Location)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Bin / rack code printed on the shelf label
    #[sea_orm(unique)]
    pub code: String,
    pub location_type: LocationType,
    pub description: Option<String>,
    pub max_weight: Option<Decimal>,
    pub max_volume: Option<Decimal>,
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

/// What a location is used for on the floor.
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
pub enum LocationType {
    #[default]
    #[sea_orm(string_value = "Storage Bin")]
    #[serde(rename = "Storage Bin")]
    StorageBin,
    #[sea_orm(string_value = "Picking Location")]
    #[serde(rename = "Picking Location")]
    PickingLocation,
    #[sea_orm(string_value = "Receiving Dock")]
    #[serde(rename = "Receiving Dock")]
    ReceivingDock,
    #[sea_orm(string_value = "Packing Station")]
    #[serde(rename = "Packing Station")]
    PackingStation,
    #[sea_orm(string_value = "QC Area")]
    #[serde(rename = "QC Area")]
    QcArea,
    #[sea_orm(string_value = "Damaged Goods Area")]
    #[serde(rename = "Damaged Goods Area")]
    DamagedGoodsArea,
    #[sea_orm(string_value = "Short Stock Location")]
    #[serde(rename = "Short Stock Location")]
    ShortStockLocation,
}
