use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events published after a unit of work commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Inbound
    GoodsReceiptCreated {
        goods_receipt_id: i32,
        po_number: String,
        line_count: usize,
    },
    PutawayCompleted {
        goods_receipt_item_id: i32,
        inventory_lot_id: i32,
        quantity: Decimal,
        line_completed: bool,
    },
    GoodsReceiptCompleted(i32),

    // Allocation
    StockAllocated {
        product_id: i32,
        requested: Decimal,
        allocated: Decimal,
        lots: Vec<i32>,
    },
    AllocationShortfall {
        product_id: i32,
        requested: Decimal,
        reason: String,
    },
    PickListCreated {
        pick_list_id: i32,
        obd_number: String,
        item_count: usize,
    },

    // Outbound
    PickConfirmed {
        pick_list_item_id: i32,
        inventory_lot_id: i32,
        quantity: Decimal,
        lot_depleted: bool,
    },
    PickLineForceClosed {
        pick_list_item_id: i32,
        actor: String,
    },
    PickListCompleted(i32),

    // Corrections
    InventoryLotCorrected {
        inventory_lot_id: i32,
        old_quantity: Decimal,
        new_quantity: Decimal,
    },
    InventoryLotDeleted(i32),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after the owning transaction committed; a failure is only logged.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::AllocationShortfall {
                product_id,
                requested,
                reason,
            } => {
                warn!(product_id, %requested, %reason, "Allocation short");
            }
            Event::PickListCompleted(id) => info!(pick_list_id = id, "Pick list completed"),
            Event::GoodsReceiptCompleted(id) => {
                info!(goods_receipt_id = id, "Goods receipt fully put away")
            }
            other => info!(event = ?other, "Domain event"),
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
