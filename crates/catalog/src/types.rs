//! Core domain types for the discovery feed.
//!
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (ItemId vs CatalogId)
//! - Structs with public fields
//! - `Option<T>` for values the collaborator may omit

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================
// Two different id spaces flow through the feed. Mixing them up would silently
// break de-duplication, so they get their own names.

/// Identifier of a movie row in the session datastore (source of truth for dedup)
pub type ItemId = u64;

/// Identifier of a movie in the external catalog (details, jitter seeds)
pub type CatalogId = u64;

/// Catalog genre identifier (e.g. 28 = Action)
pub type GenreId = u32;

// =============================================================================
// Candidate Item
// =============================================================================

/// One movie surfaced for swiping.
///
/// `item_id` is unique within a single discovery response. Uniqueness across
/// pages is the feed's job, not the collaborator's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub item_id: ItemId,
    pub catalog_id: CatalogId,
    pub title: String,
    /// Release year, when the catalog knows it
    pub year: Option<u16>,
    pub poster_url: Option<String>,
    /// Genre ids in the order the collaborator returned them
    pub genre_ids: Vec<GenreId>,
}

impl CandidateItem {
    /// Create a candidate with only the required fields set.
    pub fn new(item_id: ItemId, catalog_id: CatalogId, title: impl Into<String>) -> Self {
        Self {
            item_id,
            catalog_id,
            title: title.into(),
            year: None,
            poster_url: None,
            genre_ids: Vec::new(),
        }
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_poster(mut self, url: impl Into<String>) -> Self {
        self.poster_url = Some(url.into());
        self
    }

    pub fn with_genres(mut self, genre_ids: Vec<GenreId>) -> Self {
        self.genre_ids = genre_ids;
        self
    }

    /// Title with the year appended, e.g. "Heat (1995)"
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_optional_fields() {
        let item = CandidateItem::new(7, 949, "Heat")
            .with_year(1995)
            .with_poster("https://image.tmdb.org/t/p/w500/heat.jpg")
            .with_genres(vec![28, 80, 18]);

        assert_eq!(item.item_id, 7);
        assert_eq!(item.catalog_id, 949);
        assert_eq!(item.year, Some(1995));
        assert_eq!(item.genre_ids, vec![28, 80, 18]);
        assert!(item.poster_url.is_some());
    }

    #[test]
    fn test_display_title() {
        let dated = CandidateItem::new(1, 1, "Heat").with_year(1995);
        let undated = CandidateItem::new(2, 2, "Untitled");

        assert_eq!(dated.display_title(), "Heat (1995)");
        assert_eq!(undated.display_title(), "Untitled");
    }
}
