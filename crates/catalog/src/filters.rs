//! Filter sets sent to the discovery collaborator.
//!
//! A `FilterSet` is an immutable value: changing a filter means building a new
//! set (builder pattern, `with_*` methods consume and return `Self`). Only a
//! subset of fields decides whether two sets share stored progress; that subset
//! is rendered by [`FilterSet::signature`].

use crate::types::GenreId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lower bound for release year
pub const DEFAULT_YEAR_MIN: u16 = 1990;

/// Default sort key understood by the discovery collaborator
pub const DEFAULT_SORT: &str = "popularity.desc";

/// Default watch region
pub const DEFAULT_REGION: &str = "BR";

/// Query parameters for one discovery feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub genres: Vec<GenreId>,
    pub exclude_genres: Vec<GenreId>,
    pub year_min: Option<u16>,
    /// `None` means "up to the present"
    pub year_max: Option<u16>,
    pub rating_min: f32,
    pub vote_count_min: u32,
    pub runtime_min: Option<u16>,
    pub runtime_max: Option<u16>,
    /// `None` means any original language
    pub language: Option<String>,
    pub sort_by: String,
    pub include_adult: bool,
    pub providers: Vec<u32>,
    pub watch_region: Option<String>,
    pub monetization: Vec<String>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            exclude_genres: Vec::new(),
            year_min: Some(DEFAULT_YEAR_MIN),
            year_max: None,
            rating_min: 0.0,
            vote_count_min: 0,
            runtime_min: Some(60),
            runtime_max: Some(220),
            language: None,
            sort_by: DEFAULT_SORT.to_string(),
            include_adult: false,
            providers: Vec::new(),
            watch_region: Some(DEFAULT_REGION.to_string()),
            monetization: vec!["flatrate".to_string()],
        }
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genres(mut self, genres: Vec<GenreId>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_excluded_genres(mut self, genres: Vec<GenreId>) -> Self {
        self.exclude_genres = genres;
        self
    }

    pub fn with_year_range(mut self, min: Option<u16>, max: Option<u16>) -> Self {
        self.year_min = min;
        self.year_max = max;
        self
    }

    pub fn with_rating_min(mut self, rating: f32) -> Self {
        self.rating_min = rating;
        self
    }

    pub fn with_vote_count_min(mut self, votes: u32) -> Self {
        self.vote_count_min = votes;
        self
    }

    pub fn with_runtime_range(mut self, min: Option<u16>, max: Option<u16>) -> Self {
        self.runtime_min = min;
        self.runtime_max = max;
        self
    }

    /// Empty strings clear the language filter.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.language = if language.trim().is_empty() {
            None
        } else {
            Some(language)
        };
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = sort_by.into();
        self
    }

    pub fn with_adult(mut self, include_adult: bool) -> Self {
        self.include_adult = include_adult;
        self
    }

    pub fn with_providers(mut self, providers: Vec<u32>, region: Option<String>) -> Self {
        self.providers = providers;
        self.watch_region = region;
        self
    }

    pub fn with_monetization(mut self, types: Vec<String>) -> Self {
        self.monetization = types;
        self
    }

    /// Compute the signature used to key stored progress.
    ///
    /// Format: `genres|year_min|year_max|rating_min|language|sort_by`, with
    /// genres comma-joined in the order given and absent values left empty.
    pub fn signature(&self) -> FilterSignature {
        let genres = self
            .genres
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let parts = [
            genres,
            self.year_min.map(|y| y.to_string()).unwrap_or_default(),
            self.year_max.map(|y| y.to_string()).unwrap_or_default(),
            self.rating_min.to_string(),
            self.language.clone().unwrap_or_default(),
            self.sort_by.clone(),
        ];

        FilterSignature(parts.join("|"))
    }

    /// Number of filters the user has actively set (the "N filters" badge).
    pub fn active_count(&self) -> usize {
        let mut count = self.genres.len() + self.exclude_genres.len();
        count += usize::from(self.year_min.is_some());
        count += usize::from(self.year_max.is_some());
        count += usize::from(self.rating_min > 0.0);
        count += usize::from(self.language.is_some());
        count += usize::from(self.sort_by != DEFAULT_SORT);
        count += usize::from(self.watch_region.is_some());
        count += usize::from(!self.providers.is_empty());
        count += usize::from(!self.monetization.is_empty());
        count
    }
}

/// Stable rendering of the progress-relevant subset of a [`FilterSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSignature(String);

impl FilterSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_signature() {
        let filters = FilterSet::default();
        assert_eq!(filters.signature().as_str(), "|1990||0||popularity.desc");
    }

    #[test]
    fn test_signature_includes_relevant_fields() {
        let filters = FilterSet::new()
            .with_genres(vec![28, 12])
            .with_year_range(Some(2000), Some(2010))
            .with_rating_min(6.5)
            .with_language("en")
            .with_sort("vote_average.desc");

        assert_eq!(
            filters.signature().as_str(),
            "28,12|2000|2010|6.5|en|vote_average.desc"
        );
    }

    #[test]
    fn test_signature_ignores_other_fields() {
        let base = FilterSet::new().with_genres(vec![35]);
        let tweaked = base
            .clone()
            .with_excluded_genres(vec![27])
            .with_runtime_range(Some(90), Some(120))
            .with_vote_count_min(500)
            .with_adult(true)
            .with_providers(vec![8, 119], Some("US".to_string()))
            .with_monetization(vec!["rent".to_string()]);

        assert_ne!(base, tweaked);
        assert_eq!(base.signature(), tweaked.signature());
    }

    #[test]
    fn test_empty_language_is_cleared() {
        let filters = FilterSet::new().with_language("en").with_language("  ");
        assert!(filters.language.is_none());
    }

    #[test]
    fn test_active_count() {
        // Defaults: year_min, watch_region and monetization are set
        assert_eq!(FilterSet::default().active_count(), 3);

        let filters = FilterSet::new()
            .with_genres(vec![28, 12])
            .with_rating_min(7.0)
            .with_sort("revenue.desc");
        assert_eq!(filters.active_count(), 3 + 2 + 1 + 1);
    }
}
