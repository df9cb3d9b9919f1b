//! Cachette - an embedded key-value cache
//!
//! Provides TTL expiry, bounded value history, tag-based grouping, LRU
//! eviction and optional encrypted persistence, for use inside a single
//! process. Instantiate whichever layer fits: the base [`Store`], the
//! tag-indexed [`TaggedCache`] or the recency-bounded [`LruCache`].
//!
//! The cache itself is synchronous and single-threaded; embed it in an
//! `Arc<RwLock<_>>` (as the background tasks do) when sharing it across
//! tasks or threads.

pub mod cache;
pub mod config;
pub mod error;
pub mod persist;
pub mod tasks;

pub use cache::{CacheEntry, CacheStats, Event, LruCache, Store, TaggedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_backup_task, spawn_sweep_task, Sweep};
