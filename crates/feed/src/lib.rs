//! Building blocks of the discovery feed.
//!
//! This crate provides:
//! - A deterministic per-user jitter function
//! - A seen-set for de-duplication across pages
//! - The page loader that fetches, orders, de-duplicates and appends a page
//! - A best-effort progress store over durable key-value storage
//! - A bounded detail cache
//!
//! ## Architecture
//! A page moves through the loader in stages:
//! 1. Fetch from the discovery source (the only suspension point)
//! 2. Order the page by position plus jitter
//! 3. Drop items the seen-set already knows
//! 4. Append survivors to the feed state
//!
//! Orchestration (when to load, where the cursor goes, generations) lives in
//! the `pager` crate.
//!
//! ## Example Usage
//! ```ignore
//! use feed::{FeedState, Jitter, PageLoader};
//!
//! let loader = PageLoader::new(source, Jitter::new(session, user));
//! let mut state = FeedState::new();
//! let outcome = loader.load_page(&mut state, 1, &filters).await;
//! println!("admitted {}", outcome.admitted);
//! ```

pub mod detail_cache;
pub mod error;
pub mod jitter;
pub mod page_loader;
pub mod progress;
pub mod seen_set;
pub mod state;
pub mod store;
pub mod traits;

// Re-export main types
pub use detail_cache::DetailCache;
pub use error::StorageError;
pub use jitter::{Jitter, DEFAULT_JITTER_STRENGTH};
pub use page_loader::{FetchFailure, PageLoader, PageOutcome};
pub use progress::ProgressStore;
pub use seen_set::SeenSet;
pub use state::FeedState;
pub use store::{JsonFileStore, MemoryStore};
pub use traits::KeyValueStore;
