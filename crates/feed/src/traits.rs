//! Core traits for the feed crate.

use crate::error::Result;

/// Synchronous key-value storage that survives restarts.
///
/// Every operation may fail (storage disabled, quota exceeded, disk errors).
/// Callers must catch and ignore such failures rather than surface them.
///
/// ## Design Note
/// - `&self` receivers with interior mutability so one store can be shared
///   behind an `Arc` between the progress store and the CLI
/// - `Send + Sync` so the pager that owns it can move across tasks
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
