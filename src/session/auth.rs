use std::sync::Arc;

use thiserror::Error;

use crate::storage::{KeyValueStore, PersistenceError};
use crate::utils::Clock;

// ============================================================================
// Auth Gate - Single pharmacy account, token marker in the store
// ============================================================================
//
// The gate only decides whether a session may open. A successful login
// leaves a `pharmacy-token-<millis>` marker under the token key; the marker's
// presence is what "logged in" means, across restarts too.
//
// ============================================================================

const TOKEN_PREFIX: &str = "pharmacy-token-";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials! Please use the provided pharmacy login.")]
    InvalidCredentials,

    #[error("Session token storage failed: {0}")]
    Storage(#[from] PersistenceError),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct AuthGate {
    store: Arc<dyn KeyValueStore>,
    token_key: String,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl AuthGate {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        token_key: impl Into<String>,
        credentials: Credentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            token_key: token_key.into(),
            credentials,
            clock,
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if email != self.credentials.email || password != self.credentials.password {
            tracing::info!(email, "🔒 Rejected pharmacy login");
            return Err(AuthError::InvalidCredentials);
        }

        let token = format!("{TOKEN_PREFIX}{}", self.clock.now().timestamp_millis());
        self.store.set(&self.token_key, &token)?;

        tracing::info!(email, "🔓 Pharmacy logged in");
        Ok(())
    }

    /// True while a token marker is stored
    ///
    /// An unreadable store counts as logged out.
    pub fn is_active(&self) -> bool {
        match self.store.get(&self.token_key) {
            Ok(token) => token.is_some_and(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(key = %self.token_key, error = %err, "Session token unreadable");
                false
            }
        }
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(&self.token_key)?;
        tracing::info!("Pharmacy logged out");
        Ok(())
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("token_key", &self.token_key)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::utils::FixedClock;

    const TOKEN_KEY: &str = "dawak_token";

    fn gate() -> (Arc<MemoryStore>, AuthGate) {
        let store = Arc::new(MemoryStore::new());
        let gate = AuthGate::new(
            store.clone(),
            TOKEN_KEY,
            Credentials::new("pharmacy@dawak.com", "123456"),
            Arc::new(FixedClock::at_millis(1_735_689_600_000)),
        );
        (store, gate)
    }

    #[test]
    fn test_login_stores_token_marker() {
        let (store, gate) = gate();
        assert!(!gate.is_active());

        gate.login("pharmacy@dawak.com", "123456").unwrap();

        assert!(gate.is_active());
        assert_eq!(
            store.get(TOKEN_KEY).unwrap().as_deref(),
            Some("pharmacy-token-1735689600000")
        );
    }

    #[test]
    fn test_wrong_credentials_are_rejected() {
        let (store, gate) = gate();

        let result = gate.login("pharmacy@dawak.com", "654321");

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!gate.is_active());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_logout_removes_marker() {
        let (_, gate) = gate();
        gate.login("pharmacy@dawak.com", "123456").unwrap();

        gate.logout().unwrap();

        assert!(!gate.is_active());
    }

    #[test]
    fn test_token_write_failure_is_a_storage_error() {
        let store = Arc::new(MemoryStore::with_quota(0));
        let gate = AuthGate::new(
            store,
            TOKEN_KEY,
            Credentials::new("a@b.c", "pw"),
            Arc::new(FixedClock::at_millis(0)),
        );

        let result = gate.login("a@b.c", "pw");
        assert!(matches!(result, Err(AuthError::Storage(PersistenceError::QuotaExceeded { .. }))));
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let debug = format!("{:?}", Credentials::new("a@b.c", "secret"));
        assert!(!debug.contains("secret"));
    }
}
