use super::aggregate::Order;
use super::value_objects::{OrderId, OrderStatus};
use crate::health::ReportsHealth;
use crate::storage::PersistenceError;

// ============================================================================
// Collection Events
// ============================================================================
//
// Every committed mutation of the order collection raises exactly one
// `CollectionChanged` event carrying the complete new collection. The
// write-through sink reacts to it synchronously; async observers receive the
// same snapshot over a watch channel.
//
// ============================================================================

/// One status step taken by one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Why the collection changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeCause {
    Submitted { order_id: OrderId },
    StatusAdvanced { transitions: Vec<StatusTransition> },
}

impl ChangeCause {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeCause::Submitted { .. } => "OrderSubmitted",
            ChangeCause::StatusAdvanced { .. } => "StatusAdvanced",
        }
    }
}

/// Borrowed view of a committed change
#[derive(Debug, Clone, Copy)]
pub struct CollectionChanged<'a> {
    pub cause: &'a ChangeCause,
    pub orders: &'a [Order],
}

/// Synchronous reaction to a committed change (write-through persistence)
pub trait ChangeSink: ReportsHealth + Send {
    fn collection_changed(&mut self, change: CollectionChanged<'_>) -> Result<(), PersistenceError>;
}
