//! In-memory discovery source.
//!
//! Pages through a fixed catalog, applying the subset of filters that can be
//! evaluated on a candidate (genres and year range). Individual pages can be
//! scripted to return specific items or to fail, which is how the pager tests
//! reproduce sparse pages, repeated rows and collaborator outages.
//!
//! ## Learning Goals
//! - Interior mutability with `parking_lot::Mutex` behind `&self`
//! - Builder pattern for test fixtures
//! - Implementing an `async_trait` for a synchronous backend

use crate::traits::{DiscoverRequest, DiscoverResponse, DiscoverySource, DiscoveryError};
use async_trait::async_trait;
use catalog::normalize::load_catalog_file;
use catalog::{CandidateItem, FilterSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Default number of results per page (matches the catalog API)
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// What a scripted page returns instead of the computed slice
#[derive(Debug, Clone)]
pub enum ScriptedPage {
    Items(Vec<CandidateItem>),
    Fail(String),
}

/// Discovery source backed by an in-memory catalog
pub struct FixtureDiscovery {
    catalog: Vec<CandidateItem>,
    page_size: usize,
    scripted: HashMap<u32, ScriptedPage>,
    hint: Option<String>,
    /// Every page number requested, in call order
    requests: Mutex<Vec<u32>>,
}

impl FixtureDiscovery {
    /// Create a source over `catalog` with the default page size.
    pub fn new(catalog: Vec<CandidateItem>) -> Self {
        Self {
            catalog,
            page_size: DEFAULT_PAGE_SIZE,
            scripted: HashMap::new(),
            hint: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Load the catalog from a JSON dump (see `catalog::normalize`).
    pub fn from_json_file(path: &Path) -> Result<Self, DiscoveryError> {
        Ok(Self::new(load_catalog_file(path)?))
    }

    /// Create a source that only serves scripted pages; every other page is empty.
    pub fn scripted(pages: Vec<(u32, ScriptedPage)>) -> Self {
        let mut source = Self::new(Vec::new());
        source.scripted = pages.into_iter().collect();
        source
    }

    /// Configure the page size (default: 20). Zero is treated as 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Configure the advisory hint returned with page 1
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Override what a single page returns
    pub fn with_page(mut self, page: u32, scripted: ScriptedPage) -> Self {
        self.scripted.insert(page, scripted);
        self
    }

    /// Page numbers requested so far, in call order
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().clone()
    }

    fn matches(item: &CandidateItem, filters: &FilterSet) -> bool {
        if !filters.genres.iter().all(|g| item.genre_ids.contains(g)) {
            return false;
        }
        if filters.exclude_genres.iter().any(|g| item.genre_ids.contains(g)) {
            return false;
        }
        if filters.year_min.is_some() || filters.year_max.is_some() {
            let Some(year) = item.year else {
                return false;
            };
            if filters.year_min.is_some_and(|min| year < min) {
                return false;
            }
            if filters.year_max.is_some_and(|max| year > max) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl DiscoverySource for FixtureDiscovery {
    fn name(&self) -> &str {
        "fixture"
    }

    #[instrument(skip(self, request), fields(page = request.page))]
    async fn discover(
        &self,
        request: DiscoverRequest,
    ) -> Result<DiscoverResponse, DiscoveryError> {
        self.requests.lock().push(request.page);

        if request.page == 0 {
            return Err(DiscoveryError::InvalidRequest(
                "pages are 1-based".to_string(),
            ));
        }

        let hint = if request.page == 1 { self.hint.clone() } else { None };

        if let Some(scripted) = self.scripted.get(&request.page) {
            return match scripted {
                ScriptedPage::Items(items) => Ok(DiscoverResponse {
                    hint,
                    results: items.clone(),
                }),
                ScriptedPage::Fail(message) => Err(DiscoveryError::Unavailable(message.clone())),
            };
        }

        let start = (request.page as usize - 1).saturating_mul(self.page_size);
        let results: Vec<CandidateItem> = self
            .catalog
            .iter()
            .filter(|item| Self::matches(item, &request.filters))
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();

        debug!("Fixture page {} returned {} results", request.page, results.len());
        Ok(DiscoverResponse { hint, results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: u64) -> Vec<CandidateItem> {
        (1..=n)
            .map(|i| {
                CandidateItem::new(i, 1000 + i, format!("Movie {}", i))
                    .with_year(1990 + (i % 30) as u16)
                    .with_genres(if i % 2 == 0 { vec![28] } else { vec![35] })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_paging() {
        let source = FixtureDiscovery::new(catalog(45)).with_page_size(20);
        let filters = FilterSet::new();

        let p1 = source.discover(DiscoverRequest::new(1, filters.clone())).await.unwrap();
        let p3 = source.discover(DiscoverRequest::new(3, filters.clone())).await.unwrap();
        let p4 = source.discover(DiscoverRequest::new(4, filters)).await.unwrap();

        assert_eq!(p1.results.len(), 20);
        assert_eq!(p1.results[0].item_id, 1);
        assert_eq!(p3.results.len(), 5);
        assert!(p4.results.is_empty());
        assert_eq!(source.requested_pages(), vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_genre_filter() {
        let source = FixtureDiscovery::new(catalog(10));
        let action = FilterSet::new().with_genres(vec![28]);
        let no_action = FilterSet::new().with_excluded_genres(vec![28]);

        let a = source.discover(DiscoverRequest::new(1, action)).await.unwrap();
        let b = source.discover(DiscoverRequest::new(1, no_action)).await.unwrap();

        assert_eq!(a.results.len(), 5);
        assert!(a.results.iter().all(|m| m.item_id % 2 == 0));
        assert_eq!(b.results.len(), 5);
    }

    #[tokio::test]
    async fn test_hint_only_on_first_page() {
        let source = FixtureDiscovery::new(catalog(30)).with_hint("try without providers");
        let p1 = source.discover(DiscoverRequest::new(1, FilterSet::new())).await.unwrap();
        let p2 = source.discover(DiscoverRequest::new(2, FilterSet::new())).await.unwrap();

        assert_eq!(p1.hint.as_deref(), Some("try without providers"));
        assert!(p2.hint.is_none());
    }

    #[tokio::test]
    async fn test_scripted_pages() {
        let source = FixtureDiscovery::scripted(vec![
            (1, ScriptedPage::Items(catalog(3))),
            (2, ScriptedPage::Fail("timeout".to_string())),
        ]);

        let p1 = source.discover(DiscoverRequest::new(1, FilterSet::new())).await.unwrap();
        let p2 = source.discover(DiscoverRequest::new(2, FilterSet::new())).await;
        let p3 = source.discover(DiscoverRequest::new(3, FilterSet::new())).await.unwrap();

        assert_eq!(p1.results.len(), 3);
        assert!(matches!(p2, Err(DiscoveryError::Unavailable(_))));
        assert!(p3.results.is_empty());
    }

    #[tokio::test]
    async fn test_page_zero_is_rejected() {
        let source = FixtureDiscovery::new(catalog(3));
        let result = source.discover(DiscoverRequest::new(0, FilterSet::new())).await;
        assert!(matches!(result, Err(DiscoveryError::InvalidRequest(_))));
    }
}
