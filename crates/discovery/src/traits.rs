//! Contracts for the external collaborators the feed consumes.
//!
//! The feed never talks to the network itself. It calls these traits, and the
//! application wires in whatever backend client it uses (or the fixtures in
//! this crate for tests and the CLI).

use async_trait::async_trait;
use catalog::{CandidateItem, CatalogError, CatalogId, FilterSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a collaborator call.
///
/// None of these are fatal to the feed: the page loader turns every one of them
/// into "zero results" plus a notification.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Network failure, service down, rate limited...
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator rejected the request (e.g. page 0, bad filter combination)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No details exist for this catalog id
    #[error("No details for catalog id {0}")]
    NotFound(CatalogId),

    /// The response could not be normalized
    #[error("Malformed response: {0}")]
    Malformed(#[from] CatalogError),
}

/// One page request. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    pub page: u32,
    pub filters: FilterSet,
}

impl DiscoverRequest {
    pub fn new(page: u32, filters: FilterSet) -> Self {
        Self { page, filters }
    }
}

/// One page of results, already in canonical shape.
///
/// An empty `results` list is a valid, non-error response.
#[derive(Debug, Clone, Default)]
pub struct DiscoverResponse {
    /// Advisory text such as "relax the provider filter to get more results"
    pub hint: Option<String>,
    pub results: Vec<CandidateItem>,
}

/// Extra details shown next to the current card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub rating: Option<f32>,
    pub genres: Option<Vec<String>>,
    /// Minutes
    pub runtime: Option<u32>,
    pub overview: Option<String>,
    pub trailer: Option<String>,
}

/// Paginated discovery query.
///
/// ## Design Note
/// - `Send + Sync` so a source can be shared behind an `Arc` by the pager
/// - Implementations must not retry internally; the pager decides what to do
///   with an empty or failed page
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Returns the name of this source (for logging)
    fn name(&self) -> &str;

    async fn discover(&self, request: DiscoverRequest)
        -> Result<DiscoverResponse, DiscoveryError>;
}

/// Per-movie detail lookup.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn details(&self, catalog_id: CatalogId) -> Result<MovieDetails, DiscoveryError>;
}
