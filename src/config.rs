//! Configuration Module
//!
//! Handles cache configuration with validation and environment-variable loading.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be loaded from environment variables with sensible defaults,
/// or set directly on the struct before calling [`Config::validate`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL (0 = no expiry)
    pub default_ttl_secs: u64,
    /// Whether expired entries are physically removed on access/sweep
    pub delete_on_expire: bool,
    /// How many previous values to retain per key (0 = no history)
    pub version_history: usize,
    /// Background sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Optional path for periodic backups
    pub backup_path: Option<PathBuf>,
    /// Whether persisted snapshots are encrypted
    pub encrypt: bool,
    /// Secret used to derive the encryption key
    pub secret: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds, 0 = no expiry (default: 0)
    /// - `CACHE_DELETE_ON_EXPIRE` - Purge expired entries (default: true)
    /// - `CACHE_VERSION_HISTORY` - Previous values kept per key (default: 0)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_BACKUP_PATH` - Periodic backup destination (default: unset)
    /// - `CACHE_ENCRYPT` - Encrypt persisted snapshots (default: false)
    /// - `CACHE_SECRET` - Encryption secret (default: empty)
    pub fn from_env() -> Self {
        Self {
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            default_ttl_secs: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            delete_on_expire: env::var("CACHE_DELETE_ON_EXPIRE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            version_history: env::var("CACHE_VERSION_HISTORY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            sweep_interval_secs: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            backup_path: env::var("CACHE_BACKUP_PATH").ok().map(PathBuf::from),
            encrypt: env::var("CACHE_ENCRYPT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            secret: env::var("CACHE_SECRET").unwrap_or_default(),
        }
    }

    /// Validates the configuration.
    ///
    /// Fails with [`CacheError::Config`] on contradictory options; must be
    /// called before the config is handed to a cache constructor.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::Config(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if self.encrypt && self.secret.is_empty() {
            return Err(CacheError::Config(
                "encryption enabled but no secret provided".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CacheError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_secs: 0,
            delete_on_expire: true,
            version_history: 0,
            sweep_interval_secs: 60,
            backup_path: None,
            encrypt: false,
            secret: String::new(),
        }
    }
}
