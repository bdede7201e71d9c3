use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line of a pick list.
///
/// Lines produced by a successful allocation point at the reserved lot through
/// `inventory_lot_id`; annotation lines ("Out of Stock", "Low Shelf Life",
/// "Shortfall of N") carry no lot and can only be force-closed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "pick_list_items")]
#[schema(as = PickListItem)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub pick_list_id: i32,
    pub product_id: i32,
    pub inventory_lot_id: Option<i32>,
    pub location_id: Option<i32>,
    pub batch: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub required_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub allocated_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub picked_quantity: Decimal,
    pub notes: Option<String>,
    pub status: PickListItemStatus,
    pub picked_by: Option<String>,
    pub picked_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pick_list::Entity",
        from = "Column::PickListId",
        to = "super::pick_list::Column::Id"
    )]
    PickList,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::pick_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickList.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PickListItemStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Picked")]
    Picked,
}

impl std::fmt::Display for PickListItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickListItemStatus::Pending => write!(f, "Pending"),
            PickListItemStatus::Picked => write!(f, "Picked"),
        }
    }
}
