//! Loads one discovery page into the feed.
//!
//! ## Algorithm
//! 1. Ask the discovery source for `page` (optionally bounded by a timeout)
//! 2. Compute a jitter value per item from (session, user, catalog id)
//! 3. Sort by `page * PAGE_ORDER_SCALE + position + jitter` (ascending)
//! 4. Drop items already in the seen set
//! 5. Append the survivors and record the page as fetched
//!
//! Loading is split into [`PageLoader::fetch`] (async, touches no state) and
//! [`PageLoader::admit_page`] (sync, mutates state). A caller that can be
//! superseded while the fetch is in flight checks its generation between the two.
//!
//! Collaborator failures never escape this module: they come back as a
//! [`FetchFailure`] and count as a page with zero results.

use crate::jitter::Jitter;
use crate::state::FeedState;
use catalog::{CandidateItem, FilterSet};
use discovery::{DiscoverRequest, DiscoverResponse, DiscoverySource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Distance between consecutive pages in sort-key space.
///
/// Must exceed any realistic page size plus the jitter strength so that items
/// of page N always sort before items of page N+1.
pub const PAGE_ORDER_SCALE: f64 = 10_000.0;

/// Why a fetch produced no response
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// The collaborator returned an error
    Error(String),
    /// The collaborator did not answer within the configured timeout
    TimedOut(Duration),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Error(message) => write!(f, "{}", message),
            FetchFailure::TimedOut(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

/// Result of loading one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub page: u32,
    /// Newly admitted items (0 = empty page, all duplicates, or failure)
    pub admitted: usize,
    pub hint: Option<String>,
    pub failure: Option<FetchFailure>,
}

impl PageOutcome {
    fn failed(page: u32, failure: FetchFailure) -> Self {
        Self {
            page,
            admitted: 0,
            hint: None,
            failure: Some(failure),
        }
    }
}

/// Fetches pages from a discovery source and admits them into a [`FeedState`].
#[derive(Clone)]
pub struct PageLoader {
    source: Arc<dyn DiscoverySource>,
    jitter: Jitter,
    timeout: Option<Duration>,
}

impl PageLoader {
    pub fn new(source: Arc<dyn DiscoverySource>, jitter: Jitter) -> Self {
        Self {
            source,
            jitter,
            timeout: None,
        }
    }

    /// Bound every discovery call (default: no timeout)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the jitter (e.g. to change its strength)
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }

    /// Fetch one page. Never touches feed state.
    #[instrument(skip(self, filters), fields(source = self.source.name()))]
    pub async fn fetch(
        &self,
        page: u32,
        filters: &FilterSet,
    ) -> Result<DiscoverResponse, FetchFailure> {
        let request = DiscoverRequest::new(page, filters.clone());
        let call = self.source.discover(request);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Discovery page {} timed out after {:?}", page, limit);
                    return Err(FetchFailure::TimedOut(limit));
                }
            },
            None => call.await,
        };

        result.map_err(|err| {
            warn!("Discovery page {} failed: {}", page, err);
            FetchFailure::Error(err.to_string())
        })
    }

    /// Order a fetched page and append its unseen items to `state`.
    ///
    /// Returns the number of newly admitted items. The hint of page 1 replaces
    /// the stored hint.
    pub fn admit_page(&self, state: &mut FeedState, page: u32, response: DiscoverResponse) -> usize {
        if page == 1 {
            state.set_hint(response.hint.clone());
        }

        let received = response.results.len();
        let ordered = self.order_page(page, response.results);

        let mut admitted = 0;
        for item in ordered {
            if state.admit(item) {
                admitted += 1;
            }
        }

        if admitted > 0 {
            state.mark_page(page);
        }

        debug!(
            "Page {}: received {}, admitted {} (feed length {})",
            page,
            received,
            admitted,
            state.len()
        );
        admitted
    }

    /// Fetch and admit in one step, for callers that cannot be superseded.
    pub async fn load_page(
        &self,
        state: &mut FeedState,
        page: u32,
        filters: &FilterSet,
    ) -> PageOutcome {
        match self.fetch(page, filters).await {
            Ok(response) => {
                let hint = response.hint.clone();
                let admitted = self.admit_page(state, page, response);
                PageOutcome {
                    page,
                    admitted,
                    hint,
                    failure: None,
                }
            }
            Err(failure) => PageOutcome::failed(page, failure),
        }
    }

    /// Sort a page by `page * PAGE_ORDER_SCALE + position + jitter`.
    fn order_page(&self, page: u32, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let base = f64::from(page) * PAGE_ORDER_SCALE;
        let mut keyed: Vec<(f64, CandidateItem)> = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                let key = base + position as f64 + self.jitter.value(item.catalog_id);
                (key, item)
            })
            .collect();

        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        keyed.into_iter().map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use discovery::{DiscoveryError, FixtureDiscovery, ScriptedPage};

    fn items(ids: std::ops::RangeInclusive<u64>) -> Vec<CandidateItem> {
        ids.map(|i| CandidateItem::new(i, 10_000 + i, format!("Movie {}", i)))
            .collect()
    }

    fn loader(source: FixtureDiscovery, strength: f64) -> PageLoader {
        let jitter = Jitter::new(Some("session".to_string()), Some("user".to_string()))
            .with_strength(strength);
        PageLoader::new(Arc::new(source), jitter)
    }

    #[tokio::test]
    async fn test_load_page_appends_and_marks_page() {
        let loader = loader(
            FixtureDiscovery::scripted(vec![(1, ScriptedPage::Items(items(1..=5)))]),
            0.35,
        );
        let mut state = FeedState::new();

        let outcome = loader.load_page(&mut state, 1, &FilterSet::new()).await;

        assert_eq!(outcome.admitted, 5);
        assert!(outcome.failure.is_none());
        assert_eq!(state.len(), 5);
        assert_eq!(state.last_page(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_dropped() {
        let loader = loader(
            FixtureDiscovery::scripted(vec![
                (1, ScriptedPage::Items(items(1..=10))),
                (2, ScriptedPage::Items(items(6..=15))),
                (3, ScriptedPage::Items(items(1..=15))),
            ]),
            0.35,
        );
        let mut state = FeedState::new();
        let filters = FilterSet::new();

        assert_eq!(loader.load_page(&mut state, 1, &filters).await.admitted, 10);
        assert_eq!(loader.load_page(&mut state, 2, &filters).await.admitted, 5);
        assert_eq!(loader.load_page(&mut state, 3, &filters).await.admitted, 0);

        let mut ids: Vec<u64> = state.items().iter().map(|m| m.item_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), state.len());
        // A fully duplicated page does not advance the page counter
        assert_eq!(state.last_page(), 2);
    }

    #[tokio::test]
    async fn test_page_order_is_monotonic_with_strong_jitter() {
        let loader = loader(
            FixtureDiscovery::scripted(vec![
                (1, ScriptedPage::Items(items(1..=20))),
                (2, ScriptedPage::Items(items(21..=40))),
            ]),
            0.99,
        );
        let mut state = FeedState::new();
        loader.load_page(&mut state, 1, &FilterSet::new()).await;
        loader.load_page(&mut state, 2, &FilterSet::new()).await;

        let (first, second) = state.items().split_at(20);
        assert!(first.iter().all(|m| m.item_id <= 20));
        assert!(second.iter().all(|m| m.item_id > 20));
    }

    #[tokio::test]
    async fn test_zero_jitter_keeps_collaborator_order() {
        let loader = loader(
            FixtureDiscovery::scripted(vec![(1, ScriptedPage::Items(items(1..=20)))]),
            0.0,
        );
        let mut state = FeedState::new();
        loader.load_page(&mut state, 1, &FilterSet::new()).await;

        let ids: Vec<u64> = state.items().iter().map(|m| m.item_id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failure_is_zero_items() {
        let loader = loader(
            FixtureDiscovery::scripted(vec![(1, ScriptedPage::Fail("boom".to_string()))]),
            0.35,
        );
        let mut state = FeedState::new();

        let outcome = loader.load_page(&mut state, 1, &FilterSet::new()).await;
        assert_eq!(outcome.admitted, 0);
        assert_eq!(
            outcome.failure,
            Some(FetchFailure::Error("Collaborator unavailable: boom".to_string()))
        );
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_hint_from_first_page_only() {
        let source = FixtureDiscovery::new(items(1..=30))
            .with_page_size(10)
            .with_hint("relax providers");
        let loader = loader(source, 0.35);
        let mut state = FeedState::new();
        let filters = FilterSet::new().with_year_range(None, None);

        let outcome = loader.load_page(&mut state, 1, &filters).await;
        assert_eq!(outcome.hint.as_deref(), Some("relax providers"));
        loader.load_page(&mut state, 2, &filters).await;
        assert_eq!(state.hint(), Some("relax providers"));
    }

    struct NeverAnswers;

    #[async_trait]
    impl DiscoverySource for NeverAnswers {
        fn name(&self) -> &str {
            "never"
        }

        async fn discover(
            &self,
            _request: DiscoverRequest,
        ) -> Result<DiscoverResponse, DiscoveryError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let loader = PageLoader::new(Arc::new(NeverAnswers), Jitter::new(None, None))
            .with_timeout(Some(Duration::from_millis(20)));
        let mut state = FeedState::new();

        let outcome = loader.load_page(&mut state, 1, &FilterSet::new()).await;
        assert_eq!(
            outcome.failure,
            Some(FetchFailure::TimedOut(Duration::from_millis(20)))
        );
        assert!(state.is_empty());
    }
}
