// ============================================================================
// Storage - Durable client-side persistence
// ============================================================================
//
// - store/:         key-value contract plus file and in-memory backends
// - snapshot:       the order collection as one JSON document under one key
// - write_through:  ChangeSink that mirrors every commit to the snapshot
//
// ============================================================================

pub mod errors;
pub mod snapshot;
pub mod store;
pub mod write_through;

pub use errors::PersistenceError;
pub use snapshot::{decode_collection, OrderSnapshotStore};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use write_through::WriteThrough;
