//! # Feed Pager
//!
//! Owns one viewer's feed: the ordered, de-duplicated list of candidates, the
//! cursor into it, and the loading state machine.
//!
//! ```text
//!            reset_and_load
//!   Idle ──────────────────▶ Loading ──┬──▶ Ready ──(advance past tail: load more)
//!                               ▲      └──▶ Exhausted
//!                               └──────── reset_and_load (from any state)
//! ```
//!
//! ## Generations
//! Every `reset_and_load` bumps a generation token before clearing state.
//! Asynchronous work captures the token when it starts and re-checks it,
//! under the state lock, before each mutation. A load that finds the token
//! moved on drops its result, so a slow page from an old filter set can never
//! land in the new feed.
//!
//! ## Learning Goals
//! - `AtomicU64` as a cheap cancellation token across `.await` points
//! - Keeping a `parking_lot::Mutex` guard out of any scope that awaits
//! - A drop guard that releases a per-generation "busy" mark on every exit path

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use catalog::{CandidateItem, CatalogId, FilterSet};
use discovery::{DiscoverySource, MetadataSource, MovieDetails};
use feed::{DetailCache, FeedState, FetchFailure, Jitter, KeyValueStore, PageLoader, ProgressStore};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::PagerConfig;
use crate::notice::Notice;

/// Lifecycle of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// Nothing requested yet
    Idle,
    /// A reset burst is in flight
    Loading,
    /// At least one item is available
    Ready,
    /// The last reset admitted nothing
    Exhausted,
}

/// How a `reset_and_load` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Ready { cursor: usize, len: usize },
    Exhausted,
    /// A newer reset started while this one was in flight; nothing was applied
    Superseded,
}

/// Mutable state behind the lock
struct Inner {
    feed: FeedState,
    state: PagerState,
    filters: FilterSet,
    notices: Vec<Notice>,
}

/// No tail load in flight
const NO_TAIL_LOAD: u64 = 0;

/// Marks a tail load as owned by one generation.
///
/// A mark left by an older generation counts as free, so a superseded load
/// that never resolves cannot block the current feed. Dropping the guard
/// releases the mark only if this generation still holds it.
struct TailLoad<'a> {
    owner: &'a AtomicU64,
    generation: u64,
}

impl<'a> TailLoad<'a> {
    fn acquire(owner: &'a AtomicU64, generation: u64) -> Option<Self> {
        let mut held = owner.load(Ordering::Acquire);
        loop {
            if held >= generation {
                return None;
            }
            match owner.compare_exchange(held, generation, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(Self { owner, generation }),
                Err(actual) => held = actual,
            }
        }
    }
}

impl Drop for TailLoad<'_> {
    fn drop(&mut self) {
        let _ = self.owner.compare_exchange(
            self.generation,
            NO_TAIL_LOAD,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Per-viewer paginated discovery feed.
///
/// All methods take `&self`; share it with `Arc<FeedPager>` when several
/// tasks drive the same feed.
pub struct FeedPager {
    loader: PageLoader,
    progress: ProgressStore,
    metadata: Option<Arc<dyn MetadataSource>>,
    config: PagerConfig,
    session: Option<String>,
    generation: AtomicU64,
    /// Generation of the tail load in flight, or `NO_TAIL_LOAD`
    tail_load: AtomicU64,
    inner: Mutex<Inner>,
    details: Arc<Mutex<DetailCache>>,
    /// Set when the caller supplied the detail cache
    shared_details: bool,
}

impl FeedPager {
    /// Create a pager with default configuration.
    ///
    /// `session` and `user` seed the jitter; without a session, progress is
    /// neither saved nor restored.
    pub fn new(
        source: Arc<dyn DiscoverySource>,
        store: Arc<dyn KeyValueStore>,
        session: Option<String>,
        user: Option<String>,
    ) -> Self {
        let config = PagerConfig::default();
        let jitter = Jitter::new(session.clone(), user).with_strength(config.jitter_strength);
        Self {
            loader: PageLoader::new(source, jitter).with_timeout(config.fetch_timeout()),
            progress: ProgressStore::new(store),
            metadata: None,
            details: Arc::new(Mutex::new(DetailCache::new(config.detail_capacity))),
            config,
            session: session.filter(|s| !s.is_empty()),
            generation: AtomicU64::new(0),
            tail_load: AtomicU64::new(NO_TAIL_LOAD),
            shared_details: false,
            inner: Mutex::new(Inner {
                feed: FeedState::new(),
                state: PagerState::Idle,
                filters: FilterSet::default(),
                notices: Vec::new(),
            }),
        }
    }

    /// Apply a configuration (jitter strength, timeout, ceilings, cache size).
    ///
    /// A cache supplied through `with_detail_cache` is kept as is; otherwise
    /// the pager's own cache is rebuilt with the configured capacity.
    pub fn with_config(mut self, config: PagerConfig) -> Self {
        let jitter = self.loader.jitter().clone().with_strength(config.jitter_strength);
        self.loader = self.loader.with_jitter(jitter).with_timeout(config.fetch_timeout());
        if !self.shared_details {
            self.details = Arc::new(Mutex::new(DetailCache::new(config.detail_capacity)));
        }
        self.config = config;
        self
    }

    /// Use a caller-owned detail cache, e.g. one shared by several pagers
    pub fn with_detail_cache(mut self, cache: Arc<Mutex<DetailCache>>) -> Self {
        self.details = cache;
        self.shared_details = true;
        self
    }

    /// Attach a metadata source for `current_details` / `prefetch_details`
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Discard the feed and load it again for `filters`.
    ///
    /// With `resume`, pages are loaded in a burst until the feed is longer
    /// than the saved index (or a page admits nothing, or the page ceiling is
    /// hit) and the cursor lands on `min(saved, len - 1)`. Without it, a
    /// single page is loaded and the cursor starts at 0.
    #[instrument(skip(self, filters), fields(signature = %filters.signature()))]
    pub async fn reset_and_load(&self, resume: bool, filters: FilterSet) -> LoadReport {
        let start_time = Instant::now();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        {
            let mut inner = self.inner.lock();
            inner.feed.clear();
            inner.state = PagerState::Loading;
            inner.filters = filters.clone();
            inner.notices.clear();
        }

        let target = if resume {
            self.progress.load(self.session(), &filters)
        } else {
            0
        };
        debug!("Reset generation {} (resume target {})", generation, target);

        let mut total = 0;
        let mut page = 1;
        loop {
            let fetched = self.loader.fetch(page, &filters).await;
            let Some(admitted) = self.admit_if_current(generation, page, fetched) else {
                debug!("Generation {} superseded while loading page {}", generation, page);
                return LoadReport::Superseded;
            };

            if admitted == 0 {
                break;
            }
            total += admitted;
            if total > target {
                break;
            }
            page += 1;
            if page > self.config.page_ceiling {
                debug!("Resume burst stopped at page ceiling {}", self.config.page_ceiling);
                break;
            }
        }

        let mut inner = self.inner.lock();
        if !self.is_current(generation) {
            return LoadReport::Superseded;
        }

        let len = inner.feed.len();
        let report = if len == 0 {
            inner.state = PagerState::Exhausted;
            LoadReport::Exhausted
        } else {
            let cursor = inner.feed.set_cursor(target.min(len - 1));
            inner.state = PagerState::Ready;
            LoadReport::Ready { cursor, len }
        };

        info!(
            "Feed reset to {:?} with {} items in {:.2?}",
            inner.state,
            len,
            start_time.elapsed()
        );
        report
    }

    /// Move to the next item, loading more at the tail.
    ///
    /// Returns the new current item, or `None` when not `Ready`, when a tail
    /// load is already running, or when the tail produced nothing after
    /// `tail_retries` extra pages. The cursor does not move in that case.
    pub async fn advance(&self) -> Option<CandidateItem> {
        let (generation, filters, next_page) = {
            let mut inner = self.inner.lock();
            if inner.state != PagerState::Ready {
                return None;
            }

            let next = inner.feed.cursor() + 1;
            if next < inner.feed.len() {
                inner.feed.set_cursor(next);
                let item = inner.feed.current().cloned();
                let filters = inner.filters.clone();
                drop(inner);
                self.progress.save(self.session(), &filters, next);
                return item;
            }

            (
                self.generation.load(Ordering::Acquire),
                inner.filters.clone(),
                inner.feed.last_page() + 1,
            )
        };

        let Some(_tail_load) = TailLoad::acquire(&self.tail_load, generation) else {
            debug!("Tail load already in flight");
            return None;
        };

        let mut page = next_page;
        let mut tries = 0;
        loop {
            let fetched = self.loader.fetch(page, &filters).await;

            let moved = {
                let mut inner = self.inner.lock();
                if !self.is_current(generation) {
                    debug!("Dropping tail page {} from generation {}", page, generation);
                    return None;
                }
                let before = inner.feed.len();
                let admitted = Self::admit(&self.loader, &mut inner, page, fetched);
                if admitted > 0 {
                    inner.feed.set_cursor(before);
                    inner.feed.current().cloned().map(|item| (before, item))
                } else {
                    None
                }
            };

            if let Some((index, item)) = moved {
                self.progress.save(self.session(), &filters, index);
                return Some(item);
            }

            if tries >= self.config.tail_retries {
                break;
            }
            tries += 1;
            page = next_page + tries;
        }

        info!("No more items after page {}", page);
        None
    }

    /// Move to the previous item (never below 0) and persist the position.
    ///
    /// Only from `Ready`: during a reset burst the partial feed must not
    /// overwrite the progress being resumed.
    pub fn retreat(&self) -> Option<CandidateItem> {
        let (index, item, filters) = {
            let mut inner = self.inner.lock();
            if inner.state != PagerState::Ready || inner.feed.is_empty() {
                return None;
            }
            let index = inner.feed.cursor().saturating_sub(1);
            inner.feed.set_cursor(index);
            (index, inner.feed.current().cloned(), inner.filters.clone())
        };
        self.progress.save(self.session(), &filters, index);
        item
    }

    /// Forget saved progress for `filters` in this session
    pub fn clear_progress(&self, filters: &FilterSet) {
        self.progress.clear(self.session(), filters);
    }

    /// Apply a fetched page if `generation` is still current.
    ///
    /// `None` means superseded. The check and the mutation happen under the
    /// same lock.
    fn admit_if_current(
        &self,
        generation: u64,
        page: u32,
        fetched: Result<discovery::DiscoverResponse, FetchFailure>,
    ) -> Option<usize> {
        let mut inner = self.inner.lock();
        if !self.is_current(generation) {
            return None;
        }
        Some(Self::admit(&self.loader, &mut inner, page, fetched))
    }

    fn admit(
        loader: &PageLoader,
        inner: &mut Inner,
        page: u32,
        fetched: Result<discovery::DiscoverResponse, FetchFailure>,
    ) -> usize {
        match fetched {
            Ok(response) => {
                let hint = if page == 1 { response.hint.clone() } else { None };
                let admitted = loader.admit_page(&mut inner.feed, page, response);
                if let Some(hint) = hint {
                    inner.notices.push(Notice::Hint(hint));
                }
                admitted
            }
            Err(failure) => {
                inner.notices.push(Notice::from_failure(page, failure));
                0
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn state(&self) -> PagerState {
        self.inner.lock().state
    }

    pub fn current(&self) -> Option<CandidateItem> {
        self.inner.lock().feed.current().cloned()
    }

    pub fn cursor(&self) -> usize {
        self.inner.lock().feed.cursor()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().feed.is_empty()
    }

    /// Snapshot of the feed in display order
    pub fn items(&self) -> Vec<CandidateItem> {
        self.inner.lock().feed.items().to_vec()
    }

    /// Hint returned with page 1 of the current generation
    pub fn hint(&self) -> Option<String> {
        self.inner.lock().feed.hint().map(str::to_string)
    }

    pub fn last_page(&self) -> u32 {
        self.inner.lock().feed.last_page()
    }

    pub fn filters(&self) -> FilterSet {
        self.inner.lock().filters.clone()
    }

    /// Current generation token; bumped by every reset
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Take the notices accumulated since the last drain
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.lock().notices)
    }

    // ========================================================================
    // Details
    // ========================================================================

    /// Details for the current item, from cache or the metadata source.
    pub async fn current_details(&self) -> Option<MovieDetails> {
        let catalog_id = self.current()?.catalog_id;
        self.details_for(catalog_id).await
    }

    /// Warm the detail cache for the next `prefetch_depth` items.
    ///
    /// Returns how many lookups were made. Failures are logged and skipped.
    pub async fn prefetch_details(&self) -> usize {
        if self.metadata.is_none() {
            return 0;
        }

        let upcoming: Vec<CatalogId> = {
            let inner = self.inner.lock();
            let start = inner.feed.cursor() + 1;
            (start..start.saturating_add(self.config.prefetch_depth))
                .map_while(|index| inner.feed.get(index))
                .map(|item| item.catalog_id)
                .collect()
        };

        let mut fetched = 0;
        for catalog_id in upcoming {
            let cached = self.details.lock().contains(catalog_id);
            if cached {
                continue;
            }
            if self.details_for(catalog_id).await.is_some() {
                fetched += 1;
            }
        }
        fetched
    }

    async fn details_for(&self, catalog_id: CatalogId) -> Option<MovieDetails> {
        let cached = self.details.lock().get(catalog_id).cloned();
        if cached.is_some() {
            return cached;
        }

        let metadata = self.metadata.as_ref()?;
        match metadata.details(catalog_id).await {
            Ok(details) => {
                self.details.lock().insert(catalog_id, details.clone());
                Some(details)
            }
            Err(err) => {
                warn!("Details for {} unavailable: {}", catalog_id, err);
                None
            }
        }
    }

    /// Number of cached detail entries
    pub fn cached_details(&self) -> usize {
        self.details.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery::{FixtureDiscovery, StaticMetadata};
    use feed::MemoryStore;

    fn catalog(count: u64) -> Vec<CandidateItem> {
        (1..=count)
            .map(|id| CandidateItem::new(id, 1000 + id, format!("Movie {}", id)).with_year(2000))
            .collect()
    }

    fn pager(count: u64) -> FeedPager {
        FeedPager::new(
            Arc::new(FixtureDiscovery::new(catalog(count))),
            Arc::new(MemoryStore::new()),
            Some("s1".to_string()),
            Some("u1".to_string()),
        )
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let pager = pager(5);
        assert_eq!(pager.state(), PagerState::Idle);
        assert!(pager.current().is_none());
        assert!(pager.advance().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_loads_first_page() {
        let pager = pager(25);
        let report = pager.reset_and_load(false, FilterSet::new()).await;

        assert_eq!(report, LoadReport::Ready { cursor: 0, len: 20 });
        assert_eq!(pager.state(), PagerState::Ready);
        assert_eq!(pager.last_page(), 1);
        assert_eq!(pager.generation(), 1);
    }

    #[tokio::test]
    async fn test_empty_catalog_exhausts() {
        let pager = pager(0);
        let report = pager.reset_and_load(false, FilterSet::new()).await;

        assert_eq!(report, LoadReport::Exhausted);
        assert_eq!(pager.state(), PagerState::Exhausted);
        assert!(pager.retreat().is_none());
    }

    #[tokio::test]
    async fn test_retreat_floors_at_zero() {
        let pager = pager(5);
        pager.reset_and_load(false, FilterSet::new()).await;
        pager.advance().await;
        assert_eq!(pager.cursor(), 1);

        pager.retreat();
        pager.retreat();
        assert_eq!(pager.cursor(), 0);
    }

    #[tokio::test]
    async fn test_details_are_cached() {
        let metadata = Arc::new(StaticMetadata::default().with_details(
            1001,
            MovieDetails {
                runtime: Some(101),
                ..Default::default()
            },
        ));
        let pager = pager(3).with_metadata(metadata.clone());
        pager.reset_and_load(false, FilterSet::new()).await;

        let first = pager.current_details().await;
        let second = pager.current_details().await;

        assert_eq!(first.and_then(|d| d.runtime), Some(101));
        assert_eq!(second.and_then(|d| d.runtime), Some(101));
        assert_eq!(metadata.lookups(), 1);
    }

    #[tokio::test]
    async fn test_details_without_metadata() {
        let pager = pager(3);
        pager.reset_and_load(false, FilterSet::new()).await;
        assert!(pager.current_details().await.is_none());
        assert_eq!(pager.prefetch_details().await, 0);
    }

    fn metadata_for(count: u64) -> Arc<StaticMetadata> {
        let mut metadata = StaticMetadata::default();
        for id in 1..=count {
            metadata = metadata.with_details(1000 + id, MovieDetails::default());
        }
        Arc::new(metadata)
    }

    #[tokio::test]
    async fn test_prefetch_with_huge_depth_stops_at_feed_end() {
        let metadata = metadata_for(4);
        let pager = pager(4)
            .with_config(PagerConfig::new().with_prefetch_depth(usize::MAX))
            .with_metadata(metadata.clone());
        pager.reset_and_load(false, FilterSet::new()).await;

        assert_eq!(pager.prefetch_details().await, 3);
        assert_eq!(metadata.lookups(), 3);
    }

    #[tokio::test]
    async fn test_config_keeps_supplied_cache() {
        let cache = Arc::new(Mutex::new(DetailCache::new(5)));
        let pager = pager(2)
            .with_detail_cache(cache.clone())
            .with_config(PagerConfig::new().with_detail_capacity(1))
            .with_metadata(metadata_for(2));
        pager.reset_and_load(false, FilterSet::new()).await;

        assert!(pager.current_details().await.is_some());
        assert_eq!(cache.lock().len(), 1);
        assert_eq!(cache.lock().capacity(), 5);
    }

    #[test]
    fn test_tail_load_mark_is_per_generation() {
        let owner = AtomicU64::new(NO_TAIL_LOAD);

        let stale = TailLoad::acquire(&owner, 1).unwrap();
        assert!(TailLoad::acquire(&owner, 1).is_none());

        // A newer generation takes over a mark left by an older one
        let fresh = TailLoad::acquire(&owner, 2).unwrap();
        drop(stale);
        assert_eq!(owner.load(Ordering::Acquire), 2);

        drop(fresh);
        assert_eq!(owner.load(Ordering::Acquire), NO_TAIL_LOAD);
    }

    #[tokio::test]
    async fn test_retreat_needs_ready() {
        let pager = pager(5);
        assert!(pager.retreat().is_none());
        assert_eq!(pager.cursor(), 0);
    }
}
