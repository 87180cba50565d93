// ============================================================================
// Dawak Orders - Pharmacy order lifecycle engine
// ============================================================================
//
// A pharmacy fills a cart of drug line items, seals it into an order, and
// watches the order move PENDING → ACCEPTED → ON_DELIVERY → DELIVERED under a
// simulated fulfilment timer. Every change to the order collection is written
// through to a durable key-value store.
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod health;
pub mod metrics;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod utils;
