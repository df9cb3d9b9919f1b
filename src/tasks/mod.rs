//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Sweep: purges expired entries at configured intervals
//! - Backup: best-effort periodic snapshots to disk

mod sweep;

pub use sweep::{spawn_backup_task, spawn_sweep_task, Sweep};
