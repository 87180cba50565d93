// ============================================================================
// Key-Value Store - Durable client-side storage
// ============================================================================
//
// A tiny synchronous key-value contract, the shape of a browser's local
// storage. Every call either completes or fails immediately; nothing here
// blocks waiting on a remote party.
//
// ============================================================================

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use super::errors::PersistenceError;

pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replaces the whole value in one call
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Keys double as file names, so only `[A-Za-z0-9_-]` is accepted.
pub(crate) fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}
