//! Swipe side effects: likes, dislikes, undo and matches.
//!
//! A match is an item liked by at least `match_threshold` distinct users.
//! Matches are listed newest first; undoing a like that drops an item below
//! the threshold removes the match.

use std::collections::HashMap;

use catalog::ItemId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of distinct likes that make a match
pub const DEFAULT_MATCH_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    /// Stored value: `1` for a like, `-1` for a dislike
    pub fn value(self) -> i8 {
        match self {
            Reaction::Like => 1,
            Reaction::Dislike => -1,
        }
    }
}

/// An item that reached the match threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub item_id: ItemId,
    pub likes: usize,
    /// Monotonic; larger is newer
    pub sequence: u64,
}

#[derive(Debug)]
pub struct ReactionLedger {
    match_threshold: usize,
    reactions: HashMap<(String, ItemId), Reaction>,
    history: HashMap<String, Vec<ItemId>>,
    matched: HashMap<ItemId, u64>,
    sequence: u64,
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_MATCH_THRESHOLD)
    }

    /// Threshold is at least 1
    pub fn with_threshold(match_threshold: usize) -> Self {
        Self {
            match_threshold: match_threshold.max(1),
            reactions: HashMap::new(),
            history: HashMap::new(),
            matched: HashMap::new(),
            sequence: 0,
        }
    }

    pub fn match_threshold(&self) -> usize {
        self.match_threshold
    }

    /// Record (or replace) `user`'s reaction to `item_id`.
    ///
    /// Returns the match when this reaction creates one.
    pub fn record(&mut self, user: &str, item_id: ItemId, reaction: Reaction) -> Option<Match> {
        self.reactions.insert((user.to_string(), item_id), reaction);
        self.history.entry(user.to_string()).or_default().push(item_id);

        let was_match = self.matched.contains_key(&item_id);
        self.refresh(item_id);

        match self.matched.get(&item_id) {
            Some(&sequence) if !was_match => {
                debug!("Item {} matched", item_id);
                Some(Match {
                    item_id,
                    likes: self.likes(item_id),
                    sequence,
                })
            }
            _ => None,
        }
    }

    /// Undo `user`'s most recent reaction, returning the item it was for.
    pub fn undo_last(&mut self, user: &str) -> Option<ItemId> {
        let item_id = self.history.get_mut(user)?.pop()?;
        self.reactions.remove(&(user.to_string(), item_id));
        self.refresh(item_id);
        Some(item_id)
    }

    pub fn reaction(&self, user: &str, item_id: ItemId) -> Option<Reaction> {
        self.reactions.get(&(user.to_string(), item_id)).copied()
    }

    /// Distinct users currently liking `item_id`
    pub fn likes(&self, item_id: ItemId) -> usize {
        self.reactions
            .iter()
            .filter(|((_, id), reaction)| *id == item_id && **reaction == Reaction::Like)
            .count()
    }

    pub fn is_match(&self, item_id: ItemId) -> bool {
        self.matched.contains_key(&item_id)
    }

    /// Current matches, newest first
    pub fn matches(&self) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .matched
            .iter()
            .map(|(&item_id, &sequence)| Match {
                item_id,
                likes: self.likes(item_id),
                sequence,
            })
            .collect();
        matches.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        matches
    }

    fn refresh(&mut self, item_id: ItemId) {
        let qualifies = self.likes(item_id) >= self.match_threshold;
        match (qualifies, self.matched.contains_key(&item_id)) {
            (true, false) => {
                self.sequence += 1;
                self.matched.insert(item_id, self.sequence);
            }
            (false, true) => {
                debug!("Item {} no longer matched", item_id);
                self.matched.remove(&item_id);
            }
            _ => {}
        }
    }
}

impl Default for ReactionLedger {
    fn default() -> Self {
        Self::new()
    }
}
