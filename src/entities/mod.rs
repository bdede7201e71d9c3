//! sea-orm entities for the warehouse schema.

pub mod goods_receipt;
pub mod goods_receipt_item;
pub mod inventory_lot;
pub mod location;
pub mod pick_list;
pub mod pick_list_item;
pub mod product;
pub mod putaway_log;
