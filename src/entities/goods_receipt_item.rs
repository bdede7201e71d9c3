use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "goods_receipt_items")]
#[schema(as = GoodsReceiptItem)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub goods_receipt_id: i32,
    pub product_id: i32,
    /// Expected quantity from the supplier document
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub putaway_quantity: Decimal,
    pub batch: Option<String>,
    pub status: GrnItemStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_receipt::Entity",
        from = "Column::GoodsReceiptId",
        to = "super::goods_receipt::Column::Id"
    )]
    GoodsReceipt,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::putaway_log::Entity")]
    PutawayLogs,
}

impl Related<super::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceipt.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::putaway_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PutawayLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GrnItemStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl std::fmt::Display for GrnItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrnItemStatus::Pending => write!(f, "Pending"),
            GrnItemStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl Model {
    /// Quantity still waiting to be put away.
    pub fn outstanding(&self) -> Decimal {
        self.quantity - self.putaway_quantity
    }
}
