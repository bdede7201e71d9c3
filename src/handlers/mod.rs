//! HTTP handlers for the `/api/v1` surface.

pub mod allocations;
pub mod common;
pub mod inventory;
pub mod master_data;
pub mod pick_lists;
pub mod picking;
pub mod putaway;
pub mod receipts;
