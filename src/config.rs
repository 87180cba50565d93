use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::order::ProgressionPolicy;
use crate::session::Credentials;

// ============================================================================
// Configuration - Environment variables with defaults
// ============================================================================
//
// Every setting has a default, so an empty environment yields a working
// session. Unparseable values fall back to the default with a warning.
//
// ============================================================================

pub const DEFAULT_DATA_DIR: &str = "./dawak-data";
pub const DEFAULT_ORDERS_KEY: &str = "dawak_orders";
pub const DEFAULT_TOKEN_KEY: &str = "dawak_token";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_PHARMACY_EMAIL: &str = "pharmacy@dawak.com";
pub const DEFAULT_PHARMACY_PASSWORD: &str = "123456";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub progression: ProgressionConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Directory for the file-backed store
    pub data_dir: PathBuf,
    pub orders_key: String,
    pub token_key: String,
    /// Consecutive write failures before the session runs in memory only
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionConfig {
    pub tick_interval: Duration,
    pub policy: ProgressionPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name → value lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tick_interval_ms = parsed(&lookup, "DAWAK_TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS);
        let tick_interval_ms = if tick_interval_ms == 0 {
            tracing::warn!("DAWAK_TICK_INTERVAL_MS is 0, using the default");
            DEFAULT_TICK_INTERVAL_MS
        } else {
            tick_interval_ms
        };

        Self {
            storage: StorageConfig {
                data_dir: lookup("DAWAK_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
                orders_key: lookup("DAWAK_ORDERS_KEY").unwrap_or_else(|| DEFAULT_ORDERS_KEY.to_string()),
                token_key: lookup("DAWAK_TOKEN_KEY").unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
                failure_threshold: parsed(&lookup, "DAWAK_PERSIST_FAILURE_THRESHOLD", DEFAULT_FAILURE_THRESHOLD)
                    .max(1),
            },
            progression: ProgressionConfig {
                tick_interval: Duration::from_millis(tick_interval_ms),
                policy: ProgressionPolicy::new(
                    parsed(&lookup, "DAWAK_P_ACCEPT", ProgressionPolicy::DEFAULT_ACCEPT),
                    parsed(&lookup, "DAWAK_P_DISPATCH", ProgressionPolicy::DEFAULT_DISPATCH),
                    parsed(&lookup, "DAWAK_P_DELIVER", ProgressionPolicy::DEFAULT_DELIVER),
                ),
            },
            auth: AuthConfig {
                credentials: Credentials::new(
                    lookup("DAWAK_PHARMACY_EMAIL").unwrap_or_else(|| DEFAULT_PHARMACY_EMAIL.to_string()),
                    lookup("DAWAK_PHARMACY_PASSWORD").unwrap_or_else(|| DEFAULT_PHARMACY_PASSWORD.to_string()),
                ),
            },
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "Unparseable setting, using the default");
                default
            }
        },
        None => default,
    }
}
