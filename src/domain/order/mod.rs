// ============================================================================
// Order Domain - Lifecycle of submitted orders
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderId, OrderStatus, OrderItem)
// - Aggregate (Order with its one-way status machine)
// - Progression policy (per-transition probabilities)
// - Events (CollectionChanged and the ChangeSink seam)
// - Errors (EmptyCartError)
// - Order book (owner of the collection, submission, commit)
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod order_book;
pub mod progression;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use errors::*;
pub use events::*;
pub use order_book::{OrderBook, Submission};
pub use progression::*;
pub use value_objects::*;
