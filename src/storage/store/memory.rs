use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::KeyValueStore;
use crate::storage::errors::PersistenceError;

const UNLIMITED: usize = usize::MAX;

/// In-process store with an optional byte quota
///
/// The quota counts value bytes across all keys, like a browser storage
/// quota. A write that would cross it fails with `QuotaExceeded` and leaves
/// the previous value in place.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: AtomicUsize::new(UNLIMITED),
        }
    }

    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::new();
        store.set_quota(Some(bytes));
        store
    }

    /// `None` lifts the quota
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota.store(bytes.unwrap_or(UNLIMITED), Ordering::SeqCst);
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.values().map(String::len).sum())
            .unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.read().map_err(|_| PersistenceError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().map_err(|_| PersistenceError::Poisoned)?;

        let quota = self.quota.load(Ordering::SeqCst);
        if quota != UNLIMITED {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(others);

            if value.len() > available {
                return Err(PersistenceError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().map_err(|_| PersistenceError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
