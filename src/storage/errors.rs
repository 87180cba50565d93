// ============================================================================
// Persistence Errors
// ============================================================================
//
// None of these are fatal. The order book keeps its in-memory state and the
// error travels back to the caller as a warning.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode order snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Persistence disabled after {failures} consecutive failures, running in memory only")]
    InMemoryOnly { failures: u32 },
}

impl PersistenceError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            PersistenceError::Io { .. } => "io",
            PersistenceError::Encode(_) => "encode",
            PersistenceError::QuotaExceeded { .. } => "quota_exceeded",
            PersistenceError::InvalidKey(_) => "invalid_key",
            PersistenceError::Poisoned => "poisoned",
            PersistenceError::InMemoryOnly { .. } => "in_memory_only",
        }
    }
}
