//! # Discovery Crate
//!
//! Collaborator contracts consumed by the feed, plus in-memory implementations.
//!
//! ## Components
//!
//! ### DiscoverySource
//! Paginated "discover" query: `(page, filters) -> { hint, results }`.
//! An empty page is a valid answer, not an error.
//!
//! ### MetadataSource
//! Per-movie details (rating, genres, runtime, overview, trailer) shown next to
//! the current card.
//!
//! ### Fixtures
//! - `FixtureDiscovery`: pages an in-memory catalog, with scriptable pages
//! - `StaticMetadata`: details from a map
//!
//! ## Example Usage
//!
//! ```ignore
//! use discovery::{DiscoverRequest, DiscoverySource, FixtureDiscovery};
//! use catalog::FilterSet;
//!
//! let source = FixtureDiscovery::from_json_file(Path::new("data/catalog.json"))?;
//! let page = source.discover(DiscoverRequest::new(1, FilterSet::new())).await?;
//! println!("{} results", page.results.len());
//! ```

pub mod fixture;
pub mod metadata;
pub mod traits;

// Re-export commonly used types
pub use fixture::{FixtureDiscovery, ScriptedPage};
pub use metadata::StaticMetadata;
pub use traits::{
    DiscoverRequest, DiscoverResponse, DiscoveryError, DiscoverySource, MetadataSource,
    MovieDetails,
};
