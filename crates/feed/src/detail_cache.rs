//! Bounded cache of movie details, keyed by catalog id.
//!
//! Eviction is oldest-inserted-first: re-inserting an existing key replaces the
//! value but keeps its original position in the eviction queue.

use catalog::CatalogId;
use discovery::MovieDetails;
use std::collections::{HashMap, VecDeque};

/// Default capacity
pub const DEFAULT_DETAIL_CAPACITY: usize = 300;

#[derive(Debug)]
pub struct DetailCache {
    capacity: usize,
    entries: HashMap<CatalogId, MovieDetails>,
    order: VecDeque<CatalogId>,
}

impl DetailCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(1024)),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, catalog_id: CatalogId) -> Option<&MovieDetails> {
        self.entries.get(&catalog_id)
    }

    pub fn contains(&self, catalog_id: CatalogId) -> bool {
        self.entries.contains_key(&catalog_id)
    }

    /// Insert details, evicting the oldest entries beyond capacity.
    pub fn insert(&mut self, catalog_id: CatalogId, details: MovieDetails) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(catalog_id, details).is_none() {
            self.order.push_back(catalog_id);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new(DEFAULT_DETAIL_CAPACITY)
    }
}
