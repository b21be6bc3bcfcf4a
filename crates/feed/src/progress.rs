//! Resumable feed position.
//!
//! Progress is keyed by session and filter signature:
//! `mm_prog:v1:{session_id}:{signature}` → `{"i": index}`.
//!
//! Everything here is best-effort. Storage errors and malformed records are
//! logged at debug level and otherwise behave as "no progress" (index 0).

use crate::traits::KeyValueStore;
use catalog::FilterSet;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Prefix of every progress key
pub const PROGRESS_KEY_PREFIX: &str = "mm_prog:v1";

#[derive(Serialize)]
struct ProgressRecord {
    i: usize,
}

/// Reads and writes feed positions in a [`KeyValueStore`].
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Composite key, or `None` without a session (nothing is stored then).
    pub fn key(session: Option<&str>, filters: &FilterSet) -> Option<String> {
        let session = session.filter(|s| !s.is_empty())?;
        Some(format!(
            "{}:{}:{}",
            PROGRESS_KEY_PREFIX,
            session,
            filters.signature()
        ))
    }

    pub fn save(&self, session: Option<&str>, filters: &FilterSet, index: usize) {
        let Some(key) = Self::key(session, filters) else {
            return;
        };
        let result = serde_json::to_string(&ProgressRecord { i: index })
            .map_err(Into::into)
            .and_then(|record| self.store.set(&key, &record));

        if let Err(err) = result {
            debug!("Could not save progress for {}: {}", key, err);
        }
    }

    /// Stored index, or 0 when absent, malformed, or unreadable.
    pub fn load(&self, session: Option<&str>, filters: &FilterSet) -> usize {
        let Some(key) = Self::key(session, filters) else {
            return 0;
        };

        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return 0,
            Err(err) => {
                debug!("Could not read progress for {}: {}", key, err);
                return 0;
            }
        };

        let index = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|record| record.get("i").and_then(Value::as_u64))
            .and_then(|i| usize::try_from(i).ok());

        match index {
            Some(index) => index,
            None => {
                debug!("Ignoring malformed progress record for {}: {}", key, raw);
                0
            }
        }
    }

    pub fn clear(&self, session: Option<&str>, filters: &FilterSet) {
        let Some(key) = Self::key(session, filters) else {
            return;
        };
        if let Err(err) = self.store.remove(&key) {
            debug!("Could not clear progress for {}: {}", key, err);
        }
    }
}
