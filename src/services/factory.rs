use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        allocation::AllocationService, corrections::InventoryCorrectionService,
        master_data::MasterDataService, pick_lists::PickListService, picking::PickingService,
        putaway::PutawayService, receipts::GoodsReceiptService,
    },
};

/// Factory for creating service instances with shared dependencies
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ServiceFactory {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub fn master_data(&self) -> MasterDataService {
        MasterDataService::new(self.db_pool.clone())
    }

    pub fn receipts(&self) -> GoodsReceiptService {
        GoodsReceiptService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn putaway(&self) -> PutawayService {
        PutawayService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn allocation(&self) -> AllocationService {
        AllocationService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn pick_lists(&self) -> PickListService {
        PickListService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn picking(&self) -> PickingService {
        PickingService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn corrections(&self) -> InventoryCorrectionService {
        InventoryCorrectionService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }
}

/// Service container holding all service instances
#[derive(Clone)]
pub struct ServiceContainer {
    pub master_data: Arc<MasterDataService>,
    pub receipts: Arc<GoodsReceiptService>,
    pub putaway: Arc<PutawayService>,
    pub allocation: Arc<AllocationService>,
    pub pick_lists: Arc<PickListService>,
    pub picking: Arc<PickingService>,
    pub corrections: Arc<InventoryCorrectionService>,
}

impl ServiceContainer {
    pub fn new(factory: &ServiceFactory) -> Self {
        Self {
            master_data: Arc::new(factory.master_data()),
            receipts: Arc::new(factory.receipts()),
            putaway: Arc::new(factory.putaway()),
            allocation: Arc::new(factory.allocation()),
            pick_lists: Arc::new(factory.pick_lists()),
            picking: Arc::new(factory.picking()),
            corrections: Arc::new(factory.corrections()),
        }
    }
}
