use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse API",
        version = "0.1.0",
        description = r#"
# Warehouse Management API

Inbound putaway, shelf-life aware stock allocation and outbound picking.

## Operator identity

Stock movements (putaway, pick, force-close) require an `x-user-id` header naming the
operator. Requests without it are rejected with `401`.

## Shelf-life windows

Allocation endpoints take a `shelf_life` window of the form `min-max`, both bounds in
percent of total shelf life remaining, e.g. `60-100`.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Quantity violation: putaway of 61 exceeds outstanding quantity 60",
  "request_id": "3c1d...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "master-data", description = "Products and shelf locations"),
        (name = "inbound", description = "Goods receipts and putaway"),
        (name = "allocation", description = "Lot selection and stock reservation"),
        (name = "outbound", description = "Pick lists and picking"),
        (name = "inventory", description = "Lot views and corrections"),
    ),
    paths(
        crate::handlers::master_data::create_product,
        crate::handlers::master_data::list_products,
        crate::handlers::master_data::update_product,
        crate::handlers::master_data::delete_product,
        crate::handlers::master_data::create_location,
        crate::handlers::master_data::list_locations,
        crate::handlers::master_data::update_location,
        crate::handlers::master_data::delete_location,
        crate::handlers::receipts::create_goods_receipt,
        crate::handlers::receipts::pending_receipts,
        crate::handlers::receipts::get_goods_receipt,
        crate::handlers::putaway::putaway,
        crate::handlers::allocations::allocate,
        crate::handlers::allocations::candidate_lots,
        crate::handlers::pick_lists::create_pick_list,
        crate::handlers::pick_lists::pending_pick_lists,
        crate::handlers::pick_lists::get_pick_list,
        crate::handlers::picking::execute_pick,
        crate::handlers::picking::force_close,
        crate::handlers::inventory::lots_at_location,
        crate::handlers::inventory::correct_lot,
        crate::handlers::inventory::delete_lot,
    ),
    components(
        schemas(
            crate::entities::product::Model,
            crate::entities::location::Model,
            crate::entities::inventory_lot::Model,
            crate::entities::goods_receipt::Model,
            crate::entities::goods_receipt_item::Model,
            crate::entities::putaway_log::Model,
            crate::entities::pick_list::Model,
            crate::entities::pick_list_item::Model,
            crate::entities::product::UnitOfMeasure,
            crate::entities::location::LocationType,
            crate::services::master_data::CreateProduct,
            crate::services::master_data::UpdateProduct,
            crate::services::master_data::CreateLocation,
            crate::services::master_data::UpdateLocation,
            crate::services::receipts::CreateGoodsReceipt,
            crate::services::receipts::ReceiptLineRecord,
            crate::services::receipts::GoodsReceiptDetail,
            crate::services::putaway::PutawayRequest,
            crate::services::putaway::PutawayConfirmation,
            crate::services::allocation::AllocationReport,
            crate::services::allocation::AllocationLine,
            crate::handlers::allocations::AllocateRequest,
            crate::services::pick_lists::CreatePickList,
            crate::services::pick_lists::PickLineRecord,
            crate::services::pick_lists::PickListDetail,
            crate::services::pick_lists::PickListItemView,
            crate::services::picking::PickConfirmation,
            crate::services::corrections::LotCorrection,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
