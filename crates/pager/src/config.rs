//! Tunables for the feed pager.
//!
//! The retry count and page ceiling are heuristics, not invariants, so they
//! live here rather than as constants in the pager. Deserializable from JSON
//! with every field optional.

use feed::detail_cache::DEFAULT_DETAIL_CAPACITY;
use feed::DEFAULT_JITTER_STRENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Highest page number a reset burst may request
    pub page_ceiling: u32,
    /// Extra page numbers tried at the tail after an empty page
    pub tail_retries: u32,
    pub jitter_strength: f64,
    /// Capacity of the detail cache
    pub detail_capacity: usize,
    /// How many upcoming items `prefetch_details` warms
    pub prefetch_depth: usize,
    /// Per-call discovery timeout in milliseconds; `None` waits forever
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_ceiling: 30,
            tail_retries: 2,
            jitter_strength: DEFAULT_JITTER_STRENGTH,
            detail_capacity: DEFAULT_DETAIL_CAPACITY,
            prefetch_depth: 2,
            fetch_timeout_ms: None,
        }
    }
}

impl PagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(text).map(Self::validated)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(std::io::Error::from)
    }

    /// Configure the page ceiling (default: 30, minimum 1)
    pub fn with_page_ceiling(mut self, ceiling: u32) -> Self {
        self.page_ceiling = ceiling;
        self.validated()
    }

    /// Configure tail retries (default: 2)
    pub fn with_tail_retries(mut self, retries: u32) -> Self {
        self.tail_retries = retries;
        self
    }

    /// Configure jitter strength (default: 0.35)
    pub fn with_jitter_strength(mut self, strength: f64) -> Self {
        self.jitter_strength = strength;
        self.validated()
    }

    pub fn with_detail_capacity(mut self, capacity: usize) -> Self {
        self.detail_capacity = capacity;
        self
    }

    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout_ms = timeout.map(|t| t.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Clamp values that would break the pager.
    ///
    /// The jitter must stay below 1 so it can never move an item past its
    /// neighbours' page boundary, whatever the page size.
    fn validated(mut self) -> Self {
        self.page_ceiling = self.page_ceiling.max(1);
        if !self.jitter_strength.is_finite() || self.jitter_strength < 0.0 {
            self.jitter_strength = 0.0;
        }
        self.jitter_strength = self.jitter_strength.min(0.99);
        self
    }
}
