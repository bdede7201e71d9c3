use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Append-only record of one putaway action.
///
/// `inventory_lot_id` is not a foreign key: the lot may be picked empty and
/// deleted later while the log entry stays.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "putaway_logs")]
#[schema(as = PutawayLog)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub goods_receipt_item_id: i32,
    pub inventory_lot_id: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_receipt_item::Entity",
        from = "Column::GoodsReceiptItemId",
        to = "super::goods_receipt_item::Column::Id"
    )]
    GoodsReceiptItem,
}

impl Related<super::goods_receipt_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceiptItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
