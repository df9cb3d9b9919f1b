//! Cache Module
//!
//! In-memory caching with TTL expiry, bounded value history, tag grouping
//! and LRU eviction.
//!
//! Three composable variants: the base [`Store`], the tag-indexed
//! [`TaggedCache`] and the recency-bounded [`LruCache`]. The wrapping layers
//! own a `Store` by composition and keep their auxiliary indexes consistent
//! with it; they are independent extensions and are not combined with each
//! other.

pub mod entry;
mod events;
mod lru;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use entry::CacheEntry;
pub use events::Event;
pub use lru::LruCache;
pub use stats::CacheStats;
pub use store::Store;
pub use tags::TaggedCache;
