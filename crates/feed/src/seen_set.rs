//! Tracks which items have already been admitted into the feed.

use catalog::{CandidateItem, ItemId};
use std::collections::HashSet;

/// Set of `ItemId`s admitted since the last reset.
///
/// Uses a HashSet for O(1) average membership tests; it is only ever cleared
/// by an explicit [`SeenSet::clear`].
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    ids: HashSet<ItemId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the candidate if unseen. Returns `false` if the caller must skip it.
    pub fn admit(&mut self, candidate: &CandidateItem) -> bool {
        self.ids.insert(candidate.item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.ids.contains(&item_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once() {
        let mut seen = SeenSet::new();
        let item = CandidateItem::new(1, 100, "A");

        assert!(seen.admit(&item));
        assert!(!seen.admit(&item));
        // Same item_id with a different catalog id is still a duplicate
        assert!(!seen.admit(&CandidateItem::new(1, 999, "A again")));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut seen = SeenSet::new();
        let item = CandidateItem::new(5, 500, "E");
        seen.admit(&item);
        seen.clear();

        assert!(seen.is_empty());
        assert!(seen.admit(&item));
    }

    #[test]
    fn test_large_set() {
        let mut seen = SeenSet::new();
        for id in 0..50_000 {
            assert!(seen.admit(&CandidateItem::new(id, id, "x")));
        }
        assert!(seen.contains(49_999));
        assert_eq!(seen.len(), 50_000);
    }
}
