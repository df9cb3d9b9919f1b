//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL, tag and
//! history support.

use std::collections::{HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// TTL in milliseconds, None = never expires
    pub ttl_ms: Option<u64>,
    /// Tags attached to this entry, replaced wholesale on overwrite
    #[serde(default)]
    pub tags: HashSet<String>,
    /// Previous values, oldest at the front, newest at the back
    #[serde(default)]
    pub history: VecDeque<Value>,
    /// Creation timestamp (Unix milliseconds), reset on every overwrite
    pub created_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL and tags.
    ///
    /// A TTL of zero seconds means "no expiry" and is stored as `None`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_secs` - Optional TTL in seconds (0 = no expiry)
    /// * `tags` - Tags to attach; empty set when None
    pub fn new(value: Value, ttl_secs: Option<u64>, tags: Option<HashSet<String>>) -> Self {
        let ttl_ms = match ttl_secs {
            Some(0) | None => None,
            Some(secs) => Some(secs.saturating_mul(1000)),
        };

        Self {
            value,
            ttl_ms,
            tags: tags.unwrap_or_default(),
            history: VecDeque::new(),
            created_at: current_timestamp_ms(),
        }
    }

    // == Is Live ==
    /// Checks whether the entry is still live.
    ///
    /// Liveness is derived, never stored: an entry is live if it has no TTL,
    /// or if the current time is strictly before `created_at + ttl_ms`.
    pub fn is_live(&self) -> bool {
        match self.ttl_ms {
            Some(ttl) => current_timestamp_ms() < self.created_at.saturating_add(ttl),
            None => true,
        }
    }

    // == Push History ==
    /// Appends a previous value to the history, trimming the oldest values
    /// beyond `max_history`.
    ///
    /// With `max_history == 0` the entry keeps no history at all.
    pub fn push_history(&mut self, previous: Value, max_history: usize) {
        if max_history == 0 {
            return;
        }
        self.history.push_back(previous);
        while self.history.len() > max_history {
            self.history.pop_front();
        }
    }

    // == Time To Live ==
    /// Returns remaining whole seconds until expiry, rounded up.
    ///
    /// # Returns
    /// - `Some(secs)` if the entry has a TTL and is still live
    /// - `None` if the entry has no TTL or has already expired
    pub fn ttl_remaining_secs(&self) -> Option<u64> {
        let ttl = self.ttl_ms?;
        let expires_at = self.created_at.saturating_add(ttl);
        let now = current_timestamp_ms();
        if now < expires_at {
            Some((expires_at - now).div_ceil(1000))
        } else {
            None
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
