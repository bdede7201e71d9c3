use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_master_data_tables::Migration),
            Box::new(m20240601_000002_create_inventory_lots_table::Migration),
            Box::new(m20240601_000003_create_goods_receipt_tables::Migration),
            Box::new(m20240601_000004_create_pick_list_tables::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Ean,
    MaterialCode,
    Name,
    Brand,
    Uom,
    Mrp,
    CaseSize,
    MinQty,
    MaxQty,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Code,
    LocationType,
    Description,
    MaxWeight,
    MaxVolume,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InventoryLots {
    Table,
    Id,
    ProductId,
    LocationId,
    Batch,
    MfgDate,
    ExpDate,
    Quantity,
    ReservedQuantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GoodsReceipts {
    Table,
    Id,
    PoNumber,
    SupplierName,
    Status,
    CreatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum GoodsReceiptItems {
    Table,
    Id,
    GoodsReceiptId,
    ProductId,
    Quantity,
    PutawayQuantity,
    Batch,
    Status,
}

#[derive(DeriveIden)]
enum PutawayLogs {
    Table,
    Id,
    GoodsReceiptItemId,
    InventoryLotId,
    Quantity,
    PerformedBy,
    PerformedAt,
}

#[derive(DeriveIden)]
enum PickLists {
    Table,
    Id,
    ObdNumber,
    CustomerName,
    Status,
    CreatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum PickListItems {
    Table,
    Id,
    PickListId,
    ProductId,
    InventoryLotId,
    LocationId,
    Batch,
    RequiredQuantity,
    AllocatedQuantity,
    PickedQuantity,
    Notes,
    Status,
    PickedBy,
    PickedAt,
}

fn id_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

mod m20240601_000001_create_master_data_tables {
    use super::{id_column, Locations, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_master_data_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(id_column(Products::Id))
                        .col(ColumnDef::new(Products::Ean).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Products::MaterialCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Brand).string().not_null())
                        .col(
                            ColumnDef::new(Products::Uom)
                                .string()
                                .not_null()
                                .default("EA"),
                        )
                        .col(ColumnDef::new(Products::Mrp).decimal().not_null())
                        .col(
                            ColumnDef::new(Products::CaseSize)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Products::MinQty).decimal().not_null().default(0))
                        .col(ColumnDef::new(Products::MaxQty).decimal().not_null().default(0))
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(id_column(Locations::Id))
                        .col(ColumnDef::new(Locations::Code).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Locations::LocationType)
                                .string()
                                .not_null()
                                .default("Storage Bin"),
                        )
                        .col(ColumnDef::new(Locations::Description).string().null())
                        .col(ColumnDef::new(Locations::MaxWeight).decimal().null())
                        .col(ColumnDef::new(Locations::MaxVolume).decimal().null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000002_create_inventory_lots_table {
    use super::{id_column, InventoryLots, Locations, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_inventory_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLots::Table)
                        .if_not_exists()
                        .col(id_column(InventoryLots::Id))
                        .col(ColumnDef::new(InventoryLots::ProductId).integer().not_null())
                        .col(ColumnDef::new(InventoryLots::LocationId).integer().not_null())
                        .col(ColumnDef::new(InventoryLots::Batch).string().null())
                        .col(ColumnDef::new(InventoryLots::MfgDate).date().null())
                        .col(ColumnDef::new(InventoryLots::ExpDate).date().null())
                        .col(
                            ColumnDef::new(InventoryLots::Quantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::ReservedQuantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_lots_product_id")
                                .from(InventoryLots::Table, InventoryLots::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_lots_location_id")
                                .from(InventoryLots::Table, InventoryLots::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // Same key the putaway find-or-create matches on.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_inventory_lots_identity")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::ProductId)
                        .col(InventoryLots::LocationId)
                        .col(InventoryLots::Batch)
                        .col(InventoryLots::MfgDate)
                        .col(InventoryLots::ExpDate)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_lots_location_id")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLots::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000003_create_goods_receipt_tables {
    use super::{id_column, GoodsReceiptItems, GoodsReceipts, Products, PutawayLogs};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_goods_receipt_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(id_column(GoodsReceipts::Id))
                        .col(ColumnDef::new(GoodsReceipts::PoNumber).string().not_null())
                        .col(ColumnDef::new(GoodsReceipts::SupplierName).string().not_null())
                        .col(ColumnDef::new(GoodsReceipts::Status).string().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_receipts_po_number")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::PoNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptItems::Table)
                        .if_not_exists()
                        .col(id_column(GoodsReceiptItems::Id))
                        .col(
                            ColumnDef::new(GoodsReceiptItems::GoodsReceiptId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::ProductId).integer().not_null())
                        .col(ColumnDef::new(GoodsReceiptItems::Quantity).decimal().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptItems::PutawayQuantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::Batch).string().null())
                        .col(ColumnDef::new(GoodsReceiptItems::Status).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipt_items_receipt_id")
                                .from(GoodsReceiptItems::Table, GoodsReceiptItems::GoodsReceiptId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipt_items_product_id")
                                .from(GoodsReceiptItems::Table, GoodsReceiptItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PutawayLogs::Table)
                        .if_not_exists()
                        .col(id_column(PutawayLogs::Id))
                        .col(
                            ColumnDef::new(PutawayLogs::GoodsReceiptItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PutawayLogs::InventoryLotId).integer().not_null())
                        .col(ColumnDef::new(PutawayLogs::Quantity).decimal().not_null())
                        .col(ColumnDef::new(PutawayLogs::PerformedBy).string().not_null())
                        .col(
                            ColumnDef::new(PutawayLogs::PerformedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_putaway_logs_receipt_item_id")
                                .from(PutawayLogs::Table, PutawayLogs::GoodsReceiptItemId)
                                .to(GoodsReceiptItems::Table, GoodsReceiptItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PutawayLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceiptItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceipts::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000004_create_pick_list_tables {
    use super::{id_column, PickListItems, PickLists, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_pick_list_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PickLists::Table)
                        .if_not_exists()
                        .col(id_column(PickLists::Id))
                        .col(
                            ColumnDef::new(PickLists::ObdNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PickLists::CustomerName).string().not_null())
                        .col(ColumnDef::new(PickLists::Status).string().not_null())
                        .col(
                            ColumnDef::new(PickLists::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickLists::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // No foreign key on inventory_lot_id: picked-out lots are deleted.
            manager
                .create_table(
                    Table::create()
                        .table(PickListItems::Table)
                        .if_not_exists()
                        .col(id_column(PickListItems::Id))
                        .col(ColumnDef::new(PickListItems::PickListId).integer().not_null())
                        .col(ColumnDef::new(PickListItems::ProductId).integer().not_null())
                        .col(ColumnDef::new(PickListItems::InventoryLotId).integer().null())
                        .col(ColumnDef::new(PickListItems::LocationId).integer().null())
                        .col(ColumnDef::new(PickListItems::Batch).string().null())
                        .col(
                            ColumnDef::new(PickListItems::RequiredQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickListItems::AllocatedQuantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PickListItems::PickedQuantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PickListItems::Notes).string().null())
                        .col(ColumnDef::new(PickListItems::Status).string().not_null())
                        .col(ColumnDef::new(PickListItems::PickedBy).string().null())
                        .col(
                            ColumnDef::new(PickListItems::PickedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pick_list_items_pick_list_id")
                                .from(PickListItems::Table, PickListItems::PickListId)
                                .to(PickLists::Table, PickLists::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pick_list_items_product_id")
                                .from(PickListItems::Table, PickListItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_list_items_pick_list_id")
                        .table(PickListItems::Table)
                        .col(PickListItems::PickListId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PickListItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PickLists::Table).to_owned())
                .await
        }
    }
}
