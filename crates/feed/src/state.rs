//! Per-pager feed state.
//!
//! Append-only within a lifetime: items are only ever added by the page loader
//! and the cursor only moves through [`FeedState::set_cursor`]. A reset throws
//! the whole thing away.

use crate::seen_set::SeenSet;
use catalog::CandidateItem;

#[derive(Debug, Default)]
pub struct FeedState {
    items: Vec<CandidateItem>,
    cursor: usize,
    /// Highest page number that admitted at least one item (0 = none yet)
    last_page: u32,
    seen: SeenSet,
    /// Advisory hint from page 1 of the current lifetime
    hint: Option<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything (items, cursor, page counter, seen set, hint).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn items(&self) -> &[CandidateItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&CandidateItem> {
        self.items.get(self.cursor)
    }

    pub fn get(&self, index: usize) -> Option<&CandidateItem> {
        self.items.get(index)
    }

    /// Move the cursor, clamped to the last item (or 0 when empty).
    pub fn set_cursor(&mut self, index: usize) -> usize {
        self.cursor = index.min(self.items.len().saturating_sub(1));
        self.cursor
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub(crate) fn set_hint(&mut self, hint: Option<String>) {
        self.hint = hint;
    }

    pub(crate) fn mark_page(&mut self, page: u32) {
        self.last_page = self.last_page.max(page);
    }

    /// Append the candidate if it has not been seen. Returns whether it was admitted.
    pub(crate) fn admit(&mut self, candidate: CandidateItem) -> bool {
        if self.seen.admit(&candidate) {
            self.items.push(candidate);
            true
        } else {
            false
        }
    }
}
