use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "goods_receipts")]
#[schema(as = GoodsReceipt)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub po_number: String,
    pub supplier_name: String,
    pub status: GoodsReceiptStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goods_receipt_item::Entity")]
    Items,
}

impl Related<super::goods_receipt_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GoodsReceiptStatus {
    #[sea_orm(string_value = "Pending Putaway")]
    #[serde(rename = "Pending Putaway")]
    PendingPutaway,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl std::fmt::Display for GoodsReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoodsReceiptStatus::PendingPutaway => write!(f, "Pending Putaway"),
            GoodsReceiptStatus::Completed => write!(f, "Completed"),
        }
    }
}
