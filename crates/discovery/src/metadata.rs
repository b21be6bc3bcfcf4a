//! Map-backed metadata source used by tests and the CLI.

use crate::traits::{DiscoveryError, MetadataSource, MovieDetails};
use async_trait::async_trait;
use catalog::CatalogId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Serves details from a fixed map; unknown ids are `NotFound`.
#[derive(Default)]
pub struct StaticMetadata {
    details: HashMap<CatalogId, MovieDetails>,
    lookups: Mutex<usize>,
}

impl StaticMetadata {
    pub fn new(details: HashMap<CatalogId, MovieDetails>) -> Self {
        Self {
            details,
            lookups: Mutex::new(0),
        }
    }

    pub fn with_details(mut self, catalog_id: CatalogId, details: MovieDetails) -> Self {
        self.details.insert(catalog_id, details);
        self
    }

    /// How many times `details` has been called
    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn details(&self, catalog_id: CatalogId) -> Result<MovieDetails, DiscoveryError> {
        *self.lookups.lock() += 1;
        self.details
            .get(&catalog_id)
            .cloned()
            .ok_or(DiscoveryError::NotFound(catalog_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_metadata() {
        let source = StaticMetadata::default().with_details(
            603,
            MovieDetails {
                runtime: Some(136),
                ..Default::default()
            },
        );

        assert_eq!(source.details(603).await.unwrap().runtime, Some(136));
        assert!(matches!(
            source.details(1).await,
            Err(DiscoveryError::NotFound(1))
        ));
        assert_eq!(source.lookups(), 2);
    }
}
