//! Periodic Sweep and Backup Tasks
//!
//! Background tasks that trigger expiry sweeps and best-effort snapshot
//! backups at fixed intervals. The cache itself has no internal locking;
//! these tasks serialize access through the shared `RwLock` the caller
//! embeds the cache in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{LruCache, Store, TaggedCache};
use crate::persist;

// == Sweep Trait ==
/// A cache variant whose expired entries can be purged in one pass.
pub trait Sweep {
    /// Removes expired entries, returning how many were purged.
    fn sweep_expired(&mut self) -> usize;
}

impl Sweep for Store {
    fn sweep_expired(&mut self) -> usize {
        Store::sweep_expired(self)
    }
}

impl Sweep for TaggedCache {
    fn sweep_expired(&mut self) -> usize {
        TaggedCache::sweep_expired(self)
    }
}

impl Sweep for LruCache {
    fn sweep_expired(&mut self) -> usize {
        LruCache::sweep_expired(self)
    }
}

// == Sweep Task ==
/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. It acquires a write lock on the cache for each pass.
///
/// # Arguments
/// * `cache` - Shared reference to any sweepable cache variant
/// * `interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task; abort it during shutdown. Aborting
/// does not flush any state.
pub fn spawn_sweep_task<C>(cache: Arc<RwLock<C>>, interval_secs: u64) -> JoinHandle<()>
where
    C: Sweep + Send + Sync + 'static,
{
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!("Starting sweep task with interval of {} seconds", interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = cache.write().await;
                guard.sweep_expired()
            };

            if removed > 0 {
                info!("Sweep removed {} expired entries", removed);
            } else {
                debug!("Sweep found no expired entries");
            }
        }
    })
}

// == Backup Task ==
/// Spawns a background task that periodically saves a snapshot of the store.
///
/// Each pass takes a consistent snapshot copy synchronously under the lock,
/// then writes it out after releasing the lock so in-flight mutations cannot
/// corrupt the write. Failures are logged and swallowed; only an explicit
/// [`crate::persist::save`] call propagates errors to the caller.
///
/// # Arguments
/// * `store` - Shared reference to the base store
/// * `path` - Backup destination
/// * `interval_secs` - Interval in seconds between backups
/// * `encrypt` - Whether the snapshot is encrypted
/// * `secret` - Secret for key derivation when encrypting
pub fn spawn_backup_task(
    store: Arc<RwLock<Store>>,
    path: PathBuf,
    interval_secs: u64,
    encrypt: bool,
    secret: String,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting backup task to {} with interval of {} seconds",
            path.display(),
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let snapshot = {
                let guard = store.read().await;
                guard.snapshot()
            };

            match persist::save(&snapshot, &path, encrypt, &secret) {
                Ok(()) => debug!("Backup wrote {} entries", snapshot.len()),
                Err(e) => warn!("Periodic backup failed: {}", e),
            }
        }
    })
}
