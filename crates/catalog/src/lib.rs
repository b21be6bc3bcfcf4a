//! # Catalog Crate
//!
//! Domain types shared by every other crate in the workspace.
//!
//! ## Main Components
//!
//! - **types**: Candidate items and the id aliases they use
//! - **filters**: Filter sets and the signature that keys stored progress
//! - **normalize**: Turn raw discovery rows (of varying shape) into candidates
//! - **error**: Error types for normalization
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{FilterSet, normalize};
//! use std::path::Path;
//!
//! let items = normalize::load_catalog_file(Path::new("data/catalog.json"))?;
//! let filters = FilterSet::new().with_genres(vec![28]).with_language("en");
//!
//! println!("{} candidates, signature {}", items.len(), filters.signature());
//! ```

pub mod error;
pub mod filters;
pub mod normalize;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use filters::{FilterSet, FilterSignature};
pub use types::{CandidateItem, CatalogId, GenreId, ItemId};
