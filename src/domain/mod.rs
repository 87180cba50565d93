// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - cart:  draft line items owned by the session, never persisted
// - order: sealed orders, their status machine and the collection owner
//
// Persistence plugs in through the `ChangeSink` seam.
//
// ============================================================================

pub mod cart;
pub mod order;
