//! Tag Index Module
//!
//! Wraps a [`Store`] with a tag → keys index kept consistent across set,
//! delete, clear and sweep. The index holds only back-references; the store
//! remains the sole owner of entry data.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::cache::{CacheStats, Event, Store};
use crate::config::Config;
use crate::error::Result;

// == Tagged Cache ==
/// A cache whose entries can be grouped and looked up by tag.
///
/// Every mutating operation re-synchronizes the index, so after `set`,
/// `delete`, `clear`, `delete_tag` or a sweep the tag → keys mapping and the
/// entries' own tag sets agree in both directions. The one accepted exception
/// is lazy expiry through `get`/`get_values_by_tag`: the store may purge an
/// expired key while its index entry survives until the tag is next mutated.
#[derive(Debug)]
pub struct TaggedCache {
    /// Underlying authoritative store
    store: Store,
    /// Tag → keys back-reference index
    index: HashMap<String, HashSet<String>>,
}

impl TaggedCache {
    // == Constructor ==
    /// Creates a new TaggedCache from a validated [`Config`].
    pub fn new(config: &Config) -> Self {
        Self {
            store: Store::new(config),
            index: HashMap::new(),
        }
    }

    // == Set ==
    /// Stores a key-value pair and replaces its tags.
    ///
    /// An existing key is first removed from every tag-set it belongs to
    /// (pruning tag-sets that become empty), so tags are fully replaced,
    /// never merged, on overwrite.
    pub fn set(
        &mut self,
        key: String,
        value: Value,
        ttl_secs: Option<u64>,
        tags: Option<HashSet<String>>,
    ) -> Result<()> {
        if self.store.contains_key(&key) {
            self.unindex_key(&key);
        }

        self.store.set(key.clone(), value, ttl_secs, tags)?;

        if let Some(new_tags) = self.store.tags_of(&key) {
            for tag in new_tags.clone() {
                self.index.entry(tag).or_default().insert(key.clone());
            }
        }

        Ok(())
    }

    // == Add Tag To Key ==
    /// Adds a single tag to an existing entry and the index.
    ///
    /// Returns false (no-op) when the key is absent from the store.
    /// Idempotent.
    pub fn add_tag_to_key(&mut self, key: &str, tag: &str) -> bool {
        if !self.store.add_tag(key, tag) {
            return false;
        }
        self.index
            .entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
        true
    }

    // == Delete ==
    /// Removes a key from all its tag-sets, then from the store.
    pub fn delete(&mut self, key: &str) -> bool {
        self.unindex_key(key);
        self.store.delete(key)
    }

    // == Clear ==
    /// Removes all entries and empties the entire tag index.
    pub fn clear(&mut self) {
        self.store.clear();
        self.index.clear();
    }

    // == Get Keys By Tag ==
    /// Returns the set of keys currently indexed under a tag.
    ///
    /// Empty when the tag is unknown. May momentarily include a key the store
    /// has already lazily expired; see the type-level documentation.
    pub fn get_keys_by_tag(&self, tag: &str) -> HashSet<String> {
        self.index.get(tag).cloned().unwrap_or_default()
    }

    // == Get Values By Tag ==
    /// Returns the live values of every key indexed under a tag.
    ///
    /// Keys that come back absent (lazily expired) are silently dropped from
    /// the result; the index itself is not pruned here.
    pub fn get_values_by_tag(&mut self, tag: &str) -> Vec<Value> {
        let keys = self.get_keys_by_tag(tag);
        keys.iter().filter_map(|key| self.store.get(key)).collect()
    }

    // == Delete Tag ==
    /// Deletes every key indexed under a tag, then drops the tag itself.
    ///
    /// Returns the number of keys removed.
    pub fn delete_tag(&mut self, tag: &str) -> usize {
        let keys = self.get_keys_by_tag(tag);
        let mut removed = 0;
        for key in keys {
            if self.delete(&key) {
                removed += 1;
            }
        }
        self.index.remove(tag);
        removed
    }

    // == Sweep Expired ==
    /// Sweeps the store, then drops index references to purged keys.
    pub fn sweep_expired(&mut self) -> usize {
        let removed = self.store.sweep_expired();
        if removed > 0 {
            let survivors: HashSet<String> = self.store.keys().cloned().collect();
            self.index.retain(|_, keys| {
                keys.retain(|key| survivors.contains(key));
                !keys.is_empty()
            });
        }
        removed
    }

    // == Pass-throughs ==
    /// See [`Store::get`].
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// See [`Store::has`].
    pub fn has(&mut self, key: &str) -> bool {
        self.store.has(key)
    }

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

    /// Returns the set of tags currently present in the index.
    pub fn tags(&self) -> HashSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Keys whose stored tag-set is non-empty. Test support.
    #[cfg(test)]
    pub(crate) fn keys_with_tags(&self) -> Vec<String> {
        self.store
            .keys()
            .filter(|k| self.store.tags_of(k).is_some_and(|t| !t.is_empty()))
            .cloned()
            .collect()
    }

    /// Whether an entry's own tag set contains a tag. Test support.
    #[cfg(test)]
    pub(crate) fn entry_has_tag(&self, key: &str, tag: &str) -> bool {
        self.store.tags_of(key).is_some_and(|t| t.contains(tag))
    }

    // == Internal ==
    /// Removes a key from every tag-set it belongs to, pruning tag-sets that
    /// become empty.
    fn unindex_key(&mut self, key: &str) {
        self.index.retain(|_, keys| {
            keys.remove(key);
            !keys.is_empty()
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagset(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn cache() -> TaggedCache {
        TaggedCache::new(&Config::default())
    }

    fn force_expire(cache: &mut TaggedCache, key: &str) {
        cache.store.force_expire(key);
    }

    #[test]
    fn test_tags_set_indexes_key() {
        let mut cache = cache();

        cache
            .set("k1".to_string(), json!("v1"), None, Some(tagset(&["users", "hot"])))
            .unwrap();

        assert_eq!(cache.get_keys_by_tag("users"), tagset(&["k1"]));
        assert_eq!(cache.get_keys_by_tag("hot"), tagset(&["k1"]));
        assert!(cache.get_keys_by_tag("unknown").is_empty());
    }

    #[test]
    fn test_tags_overwrite_replaces_tags() {
        let mut cache = cache();

        cache
            .set("k".to_string(), json!("v1"), None, Some(tagset(&["t1"])))
            .unwrap();
        cache
            .set("k".to_string(), json!("v2"), None, Some(tagset(&["t2"])))
            .unwrap();

        // k moved from t1 to t2 and the emptied t1 was pruned
        assert!(cache.get_keys_by_tag("t1").is_empty());
        assert!(!cache.tags().contains("t1"));
        assert_eq!(cache.get_keys_by_tag("t2"), tagset(&["k"]));
    }

    #[test]
    fn test_tags_overwrite_without_tags_unindexes() {
        let mut cache = cache();

        cache
            .set("k".to_string(), json!("v1"), None, Some(tagset(&["t1"])))
            .unwrap();
        cache.set("k".to_string(), json!("v2"), None, None).unwrap();

        assert!(cache.tags().is_empty());
        assert_eq!(cache.get("k"), Some(json!("v2")));
    }

    #[test]
    fn test_tags_add_tag_to_key() {
        let mut cache = cache();

        cache.set("k".to_string(), json!("v"), None, None).unwrap();

        assert!(cache.add_tag_to_key("k", "extra"));
        assert_eq!(cache.get_keys_by_tag("extra"), tagset(&["k"]));

        // Idempotent
        assert!(cache.add_tag_to_key("k", "extra"));
        assert_eq!(cache.get_keys_by_tag("extra"), tagset(&["k"]));

        // Absent key is a no-op
        assert!(!cache.add_tag_to_key("missing", "extra"));
        assert!(cache.get_keys_by_tag("extra").contains("k"));
    }

    #[test]
    fn test_tags_delete_unindexes_key() {
        let mut cache = cache();

        cache
            .set("k1".to_string(), json!(1), None, Some(tagset(&["shared"])))
            .unwrap();
        cache
            .set("k2".to_string(), json!(2), None, Some(tagset(&["shared"])))
            .unwrap();

        assert!(cache.delete("k1"));

        assert_eq!(cache.get_keys_by_tag("shared"), tagset(&["k2"]));
        assert_eq!(cache.get("k1"), None);

        // Last key under the tag prunes the tag entirely
        assert!(cache.delete("k2"));
        assert!(!cache.tags().contains("shared"));
    }

    #[test]
    fn test_tags_delete_tag_removes_entries() {
        let mut cache = cache();

        cache
            .set("k1".to_string(), json!(1), None, Some(tagset(&["batch", "keep"])))
            .unwrap();
        cache
            .set("k2".to_string(), json!(2), None, Some(tagset(&["batch"])))
            .unwrap();
        cache
            .set("k3".to_string(), json!(3), None, Some(tagset(&["keep"])))
            .unwrap();

        let removed = cache.delete_tag("batch");

        assert_eq!(removed, 2);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.get("k3"), Some(json!(3)));
        // k1 also vanished from its other tag
        assert_eq!(cache.get_keys_by_tag("keep"), tagset(&["k3"]));
        assert!(!cache.tags().contains("batch"));
    }

    #[test]
    fn test_tags_delete_unknown_tag_is_noop() {
        let mut cache = cache();
        assert_eq!(cache.delete_tag("ghost"), 0);
    }

    #[test]
    fn test_tags_get_values_by_tag() {
        let mut cache = cache();

        cache
            .set("k1".to_string(), json!("a"), None, Some(tagset(&["t"])))
            .unwrap();
        cache
            .set("k2".to_string(), json!("b"), None, Some(tagset(&["t"])))
            .unwrap();

        let mut values = cache.get_values_by_tag("t");
        values.sort_by_key(|v| v.as_str().unwrap().to_string());
        assert_eq!(values, vec![json!("a"), json!("b")]);

        assert!(cache.get_values_by_tag("unknown").is_empty());
    }

    #[test]
    fn test_tags_clear_empties_index() {
        let mut cache = cache();

        cache
            .set("k".to_string(), json!(1), None, Some(tagset(&["t"])))
            .unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.tags().is_empty());
        assert!(cache.get_keys_by_tag("t").is_empty());
    }

    #[test]
    fn test_tags_sweep_reconciles_index() {
        let mut cache = cache();

        cache
            .set("dead".to_string(), json!(1), Some(60), Some(tagset(&["t"])))
            .unwrap();
        cache
            .set("alive".to_string(), json!(2), Some(600), Some(tagset(&["t"])))
            .unwrap();

        force_expire(&mut cache, "dead");
        let removed = cache.sweep_expired();

        assert_eq!(removed, 1);
        assert_eq!(cache.get_keys_by_tag("t"), tagset(&["alive"]));
    }

    #[test]
    fn test_tags_lazy_expiry_leaves_index_stale() {
        let mut cache = cache();

        cache
            .set("k".to_string(), json!("v"), Some(60), Some(tagset(&["t"])))
            .unwrap();
        force_expire(&mut cache, "k");

        // Lazy expiry path: values drop the key silently...
        assert!(cache.get_values_by_tag("t").is_empty());
        // ...and the store has physically purged it...
        assert!(!cache.store.contains_key("k"));
        // ...but the index still lists it until the tag is next mutated.
        // This is the documented, bounded staleness window.
        assert_eq!(cache.get_keys_by_tag("t"), tagset(&["k"]));

        // Touching the key through delete reconciles the index
        cache.delete("k");
        assert!(cache.get_keys_by_tag("t").is_empty());
    }

    #[test]
    fn test_tags_index_matches_entry_tags_bidirectionally() {
        let mut cache = cache();

        cache
            .set("k1".to_string(), json!(1), None, Some(tagset(&["a", "b"])))
            .unwrap();
        cache
            .set("k2".to_string(), json!(2), None, Some(tagset(&["b"])))
            .unwrap();
        cache.add_tag_to_key("k2", "c");

        // Forward: every indexed key carries the tag in its entry
        for tag in cache.tags() {
            for key in cache.get_keys_by_tag(&tag) {
                assert!(cache.store.tags_of(&key).unwrap().contains(&tag));
            }
        }

        // Reverse: every entry tag appears in the index pointing back
        let keys: Vec<String> = cache.store.keys().cloned().collect();
        for key in keys {
            for tag in cache.store.tags_of(&key).unwrap().clone() {
                assert!(cache.get_keys_by_tag(&tag).contains(&key));
            }
        }
    }
}
