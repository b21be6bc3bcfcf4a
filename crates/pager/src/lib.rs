//! Pager crate for the MovieMatch discovery feed.
//!
//! [`FeedPager`] coordinates the feed building blocks: it resets and resumes
//! the feed for a filter set, advances and retreats the cursor, loads more at
//! the tail and discards work superseded by a newer reset.
//! [`ReactionLedger`] keeps the swipe side effects (likes, undo, matches).

pub mod config;
pub mod notice;
pub mod pager;
pub mod reactions;

pub use config::PagerConfig;
pub use notice::Notice;
pub use pager::{FeedPager, LoadReport, PagerState};
pub use reactions::{Match, Reaction, ReactionLedger, DEFAULT_MATCH_THRESHOLD};
