// Stock placement and selection
pub mod allocation;
pub mod shelf_life;

// Inbound
pub mod putaway;
pub mod receipts;

// Outbound
pub mod pick_lists;
pub mod picking;

// Maintenance
pub mod corrections;
pub mod master_data;

// Service factory for dependency injection
pub mod factory;
