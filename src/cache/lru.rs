//! LRU Layer Module
//!
//! Wraps a [`Store`] with a recency-ordered working set, evicting the
//! least-recently-used key when a write would overflow the configured
//! capacity.
//!
//! The recency structure is a doubly-linked list backed by an arena of nodes
//! addressed by `usize` handles (with a free list for slot reuse), plus a
//! key → handle lookup. Handles instead of pointers keep the list safe and
//! O(1) for touch, unlink and tail eviction.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheStats, Event, Store};
use crate::config::Config;
use crate::error::Result;

/// Sentinel handle marking the end of the list.
const NIL: usize = usize::MAX;

// == Recency Node ==
#[derive(Debug)]
struct Node {
    key: String,
    prev: usize,
    next: usize,
}

// == Recency List ==
/// Arena-backed doubly-linked recency list: head = MRU, tail = LRU.
#[derive(Debug)]
struct RecencyList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    head: usize,
    tail: usize,
}

impl RecencyList {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            map: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Marks a key as most recently used, creating a node if needed.
    fn touch(&mut self, key: &str) {
        if let Some(&idx) = self.map.get(key) {
            // Promoting the head to head is a no-op
            if self.head == idx {
                return;
            }
            self.detach(idx);
            self.attach_head(idx);
        } else {
            let idx = self.alloc(key.to_string());
            self.attach_head(idx);
            self.map.insert(key.to_string(), idx);
        }
    }

    /// Unlinks and discards the node for a key, if tracked.
    fn remove(&mut self, key: &str) -> bool {
        match self.map.remove(key) {
            Some(idx) => {
                self.detach(idx);
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the least-recently-used key.
    fn pop_tail(&mut self) -> Option<String> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let key = self.nodes[idx].key.clone();
        self.map.remove(&key);
        self.detach(idx);
        self.free.push(idx);
        Some(key)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.map.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    #[allow(dead_code)]
    fn len(&self) -> usize {
        self.map.len()
    }

    #[allow(dead_code)]
    fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Keys currently tracked, in no particular order.
    fn tracked_keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Unlinks a node from the list without freeing its slot.
    fn detach(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    /// Links a detached node in at the head (MRU) position.
    fn attach_head(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    /// Allocates a node slot, reusing a freed one when available.
    fn alloc(&mut self, key: String) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Node {
                    key,
                    prev: NIL,
                    next: NIL,
                };
                idx
            }
            None => {
                self.nodes.push(Node {
                    key,
                    prev: NIL,
                    next: NIL,
                });
                self.nodes.len() - 1
            }
        }
    }
}

// == LRU Cache ==
/// A cache bounded to a recency-ordered working set.
///
/// Where the plain [`Store`] rejects a new key at capacity with a capacity
/// error, this layer evicts the least-recently-used key first and lets the
/// write succeed.
#[derive(Debug)]
pub struct LruCache {
    /// Underlying authoritative store
    store: Store,
    /// Recency order over the store's key set
    order: RecencyList,
    /// Working-set bound, mirrors the store's entry limit
    capacity: usize,
}

impl LruCache {
    // == Constructor ==
    /// Creates a new LruCache from a validated [`Config`].
    pub fn new(config: &Config) -> Self {
        Self {
            store: Store::new(config),
            order: RecencyList::new(),
            capacity: config.max_entries,
        }
    }

    // == Set ==
    /// Stores a key-value pair, evicting the least-recently-used entry first
    /// when the write would overflow capacity.
    ///
    /// The evicted key goes through [`Store::delete`], so observers see a
    /// `Del` event for it and the eviction is counted in the statistics.
    pub fn set(
        &mut self,
        key: String,
        value: Value,
        ttl_secs: Option<u64>,
        tags: Option<std::collections::HashSet<String>>,
    ) -> Result<()> {
        if !self.store.contains_key(&key) {
            // Keep popping in case a tail node no longer maps to a stored
            // entry; only an actual removal counts as an eviction.
            while self.store.len() >= self.capacity {
                match self.order.pop_tail() {
                    Some(victim) => {
                        if self.store.delete(&victim) {
                            self.store.record_eviction();
                        }
                    }
                    None => break,
                }
            }
        }

        self.store.set(key.clone(), value, ttl_secs, tags)?;
        self.order.touch(&key);
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most-recently-used on a hit.
    ///
    /// A miss performs no reordering. When the miss is due to lazy expiry
    /// physically removing the entry, the key's recency node is dropped so
    /// it can never be picked as an eviction victim.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let value = self.store.get(key);
        if value.is_some() {
            self.order.touch(key);
        } else if !self.store.contains_key(key) {
            self.order.remove(key);
        }
        value
    }

    // == Has ==
    /// Checks presence with the same promotion and expiry side effects as
    /// [`LruCache::get`].
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry and its recency node.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.store.delete(key);
        self.order.remove(key);
        removed
    }

    // == Clear ==
    /// Removes all entries and discards the entire recency structure.
    pub fn clear(&mut self) {
        self.store.clear();
        self.order.clear();
    }

    // == Sweep Expired ==
    /// Sweeps the store, then purges recency nodes orphaned by the sweep.
    pub fn sweep_expired(&mut self) -> usize {
        let removed = self.store.sweep_expired();
        if removed > 0 {
            let orphans: Vec<String> = self
                .order
                .tracked_keys()
                .filter(|key| !self.store.contains_key(key))
                .cloned()
                .collect();
            for key in orphans {
                self.order.remove(&key);
            }
        }
        removed
    }

    // == Pass-throughs ==
    /// See [`Store::get_ttl`].
    pub fn get_ttl(&self, key: &str) -> Option<u64> {
        self.store.get_ttl(key)
    }

    /// See [`Store::get_history`].
    pub fn get_history(&self, key: &str) -> Vec<Value> {
        self.store.get_history(key)
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Drains and returns all pending mutation events.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.store.drain_events()
    }

    /// Whether a key has a recency node. Test support.
    #[cfg(test)]
    pub(crate) fn tracked(&self, key: &str) -> bool {
        self.order.contains(key)
    }
}
