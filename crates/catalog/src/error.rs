//! Error types for the catalog crate.
//!
//! Normalization errors carry enough context (row number, field name) to be
//! logged and skipped by callers; a single malformed row never poisons a page.

use thiserror::Error;

/// Errors that can occur while turning raw discovery rows into candidates
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog dump could not be read
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catalog dump or row was not valid JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A required field was absent from the row and its joined movie row
    #[error("Row {row} is missing required field {field}")]
    MissingField { row: usize, field: &'static str },

    /// A field was present but could not be interpreted
    #[error("Row {row} has invalid value for {field}: {value}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    /// The dump was neither an array of rows nor an object with a `results` array
    #[error("Unexpected catalog shape: {0}")]
    UnexpectedShape(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
