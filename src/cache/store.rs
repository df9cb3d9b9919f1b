//! Cache Store Module
//!
//! Base cache layer: an authoritative TTL-aware key/value map with bounded
//! per-key value history and a drained event queue. Tag indexing and LRU
//! eviction are separate layers composed on top of this one.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Event};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Authoritative key/value storage with TTL expiry and bounded history.
#[derive(Debug)]
pub struct Store {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Pending mutation events, drained by the caller
    events: VecDeque<Event>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL (0 = no expiry)
    default_ttl_secs: u64,
    /// Whether expired entries are physically removed on access/sweep
    delete_on_expire: bool,
    /// How many previous values to retain per key
    version_history: usize,
}

impl Store {
    // == Constructor ==
    /// Creates a new Store from a validated [`Config`].
    pub fn new(config: &Config) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            events: VecDeque::new(),
            max_entries: config.max_entries,
            default_ttl_secs: config.default_ttl_secs,
            delete_on_expire: config.delete_on_expire,
            version_history: config.version_history,
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL and tags.
    ///
    /// If the key already exists, the previous value is appended to the
    /// entry's history (trimmed to the configured depth from the oldest end)
    /// and the TTL, tags and creation time are replaced. Tags are replaced,
    /// never merged.
    ///
    /// Fails with [`CacheError::Capacity`] when the map is full and `key` is
    /// not already present; the cache is left unchanged in that case.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_secs` - Optional TTL in seconds (uses the default when None,
    ///   0 = no expiry)
    /// * `tags` - Tags to attach (empty set when None)
    pub fn set(
        &mut self,
        key: String,
        value: Value,
        ttl_secs: Option<u64>,
        tags: Option<HashSet<String>>,
    ) -> Result<()> {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            return Err(CacheError::Capacity(format!(
                "cache holds {} entries, limit is {}",
                self.entries.len(),
                self.max_entries
            )));
        }

        let effective_ttl = ttl_secs.unwrap_or(self.default_ttl_secs);

        if let Some(entry) = self.entries.get_mut(&key) {
            let previous = std::mem::replace(&mut entry.value, value.clone());
            entry.push_history(previous, self.version_history);
            entry.ttl_ms = match effective_ttl {
                0 => None,
                secs => Some(secs * 1000),
            };
            entry.tags = tags.unwrap_or_default();
            entry.created_at = crate::cache::entry::current_timestamp_ms();
        } else {
            let entry = CacheEntry::new(value.clone(), Some(effective_ttl), tags);
            self.entries.insert(key.clone(), entry);
        }

        debug!(key = %key, "cache set");
        self.events.push_back(Event::Set {
            key,
            value,
        });
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if present and live. An entry whose TTL has elapsed
    /// is treated as a miss; with `delete_on_expire` enabled it is silently
    /// removed. No event fires in that case, since lazy expiry at lookup
    /// time is distinct from sweep-time `Expired` events.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_live() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                // Present but dead
                if self.delete_on_expire {
                    self.entries.remove(key);
                    self.stats.set_total_entries(self.entries.len());
                }
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks whether a key is present and live.
    ///
    /// Shares the lazy-expiry side effects and hit/miss accounting of
    /// [`Store::get`].
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns whether something was removed. Fires a `Del` event on success;
    /// a miss is a silent no-op.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            debug!(key = %key, "cache delete");
            self.events.push_back(Event::Del {
                key: key.to_string(),
            });
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes all entries and fires a `Clear` event.
    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("cache cleared");
        self.events.push_back(Event::Clear);
        self.stats.set_total_entries(0);
    }

    // == Get TTL ==
    /// Returns the remaining whole seconds until expiry (rounded up), or
    /// `None` if the entry has no TTL, does not exist, or has already expired.
    pub fn get_ttl(&self, key: &str) -> Option<u64> {
        self.entries.get(key).and_then(|e| e.ttl_remaining_secs())
    }

    // == Get History ==
    /// Returns historical values for a key, newest first.
    ///
    /// Empty when the key is absent or has no history.
    pub fn get_history(&self, key: &str) -> Vec<Value> {
        self.entries
            .get(key)
            .map(|e| e.history.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    // == Sweep Expired ==
    /// Removes all expired entries when `delete_on_expire` is enabled,
    /// firing an `Expired` event per removal.
    ///
    /// With `delete_on_expire` disabled nothing is removed: dead entries stay
    /// physically present (lookups still treat them as absent).
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        if !self.delete_on_expire {
            return 0;
        }

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            if let Some(entry) = self.entries.remove(&key) {
                debug!(key = %key, "cache entry expired");
                self.events.push_back(Event::Expired {
                    key,
                    last_value: entry.value,
                });
                self.stats.record_expiration();
            }
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Tag Access ==
    /// Returns the tag set of a physically present entry.
    pub fn tags_of(&self, key: &str) -> Option<&HashSet<String>> {
        self.entries.get(key).map(|e| &e.tags)
    }

    /// Adds a tag to an existing entry's tag set.
    ///
    /// Returns false when the key is absent. Idempotent.
    pub fn add_tag(&mut self, key: &str, tag: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.tags.insert(tag.to_string());
                true
            }
            None => false,
        }
    }

    // == Introspection ==
    /// Returns whether a key is physically present, ignoring liveness.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates all physically present keys, including logically dead ones
    /// when `delete_on_expire` is disabled.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Records an LRU eviction in the statistics. Called by the LRU layer.
    pub(crate) fn record_eviction(&mut self) {
        self.stats.record_eviction();
    }

    // == Events ==
    /// Drains and returns all pending mutation events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    // == Snapshot / Restore ==
    /// Returns a consistent copy of all entries for persistence.
    ///
    /// Taken synchronously so later mutations cannot corrupt a write already
    /// in flight.
    pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replaces the cache contents with a previously saved snapshot.
    pub fn restore(&mut self, entries: Vec<(String, CacheEntry)>) {
        self.entries = entries.into_iter().collect();
        self.stats.set_total_entries(self.entries.len());
    }

    /// Rewinds an entry's creation time past its TTL so it reads as expired,
    /// letting tests exercise expiry without sleeping.
    #[cfg(test)]
    pub(crate) fn force_expire(&mut self, key: &str) {
        let entry = self.entries.get_mut(key).expect("key must exist");
        let ttl = entry.ttl_ms.expect("entry needs a TTL to expire");
        entry.created_at -= ttl + 1;
    }
}
