//! Normalization of raw discovery rows into [`CandidateItem`]s.
//!
//! Rows coming back from the datastore join are not uniform:
//! - the joined movie row may be an object or a one-element array
//! - ids may be JSON numbers or numeric strings
//! - the year may be a number, a "1999" string or a "1999-05-01" release date
//!
//! Everything downstream only ever sees the canonical shape.

use crate::error::{CatalogError, Result};
use crate::types::{CandidateItem, GenreId};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Field names that may hold the joined movie row
const JOINED_KEYS: [&str; 2] = ["movie", "movies"];

/// Parse a catalog dump into raw rows.
///
/// Accepts either a top-level array of rows or an object with a `results` array
/// (the discovery response shape).
pub fn parse_rows(text: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(CatalogError::UnexpectedShape(
                "object without a results array".to_string(),
            )),
        },
        other => Err(CatalogError::UnexpectedShape(format!(
            "top-level {}",
            json_kind(&other)
        ))),
    }
}

/// Normalize a single raw row.
///
/// `row` is the position of the row in its batch, used for error context only.
pub fn normalize_row(row: usize, value: &Value) -> Result<CandidateItem> {
    let top = value.as_object().ok_or_else(|| CatalogError::InvalidValue {
        row,
        field: "row",
        value: json_kind(value).to_string(),
    })?;
    let joined = joined_row(top);

    let item_id = lookup(top, joined, &["item_id", "movie_id", "id"])
        .ok_or(CatalogError::MissingField { row, field: "item_id" })
        .and_then(|v| as_id(v).ok_or_else(|| invalid(row, "item_id", v)))?;

    let catalog_id = lookup(top, joined, &["catalog_id", "tmdb_id"])
        .ok_or(CatalogError::MissingField { row, field: "catalog_id" })
        .and_then(|v| as_id(v).ok_or_else(|| invalid(row, "catalog_id", v)))?;

    let title = lookup(top, joined, &["title", "name"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(CatalogError::MissingField { row, field: "title" })?
        .to_string();

    let year = lookup(top, joined, &["year", "release_date"]).and_then(as_year);

    let poster_url = lookup(top, joined, &["poster_url", "poster_path"])
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let genre_ids = lookup(top, joined, &["genre_ids", "genres"])
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(as_genre).collect())
        .unwrap_or_default();

    Ok(CandidateItem {
        item_id,
        catalog_id,
        title,
        year,
        poster_url,
        genre_ids,
    })
}

/// Normalize a batch of rows, skipping (and logging) rows that fail.
///
/// Rows are processed in parallel with Rayon; `collect` on an indexed parallel
/// iterator keeps the input order, so the returned candidates are in row order.
pub fn normalize_all(rows: &[Value]) -> (Vec<CandidateItem>, Vec<CatalogError>) {
    let results: Vec<Result<CandidateItem>> = rows
        .par_iter()
        .enumerate()
        .map(|(row, value)| normalize_row(row, value))
        .collect();

    let mut items = Vec::with_capacity(results.len());
    let mut rejected = Vec::new();
    for result in results {
        match result {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!("Skipping catalog row: {}", err);
                rejected.push(err);
            }
        }
    }

    debug!(
        "Normalized {} rows ({} rejected)",
        items.len(),
        rejected.len()
    );
    (items, rejected)
}

/// Load and normalize a catalog dump from disk.
pub fn load_catalog_file(path: &Path) -> Result<Vec<CandidateItem>> {
    let text = fs::read_to_string(path)?;
    let rows = parse_rows(&text)?;
    let (items, _rejected) = normalize_all(&rows);
    Ok(items)
}

// =============================================================================
// Helpers
// =============================================================================

/// The joined movie row: an object, or the first element of an array.
fn joined_row(top: &Map<String, Value>) -> Option<&Map<String, Value>> {
    JOINED_KEYS.iter().find_map(|key| match top.get(*key)? {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.first()?.as_object(),
        _ => None,
    })
}

/// First non-null value among `names`, looking at the top row before the joined row.
fn lookup<'a>(
    top: &'a Map<String, Value>,
    joined: Option<&'a Map<String, Value>>,
    names: &[&str],
) -> Option<&'a Value> {
    let find = |obj: &'a Map<String, Value>| {
        names
            .iter()
            .find_map(|name| obj.get(*name).filter(|v| !v.is_null()))
    };
    find(top).or_else(|| joined.and_then(find))
}

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_year(value: &Value) -> Option<u16> {
    let year: Option<u16> = match value {
        Value::Number(n) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
        Value::String(s) => s.get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    };
    year.filter(|y| *y > 0)
}

/// Genres arrive either as bare ids or as `{ "id": 28, "name": "Action" }` objects.
fn as_genre(value: &Value) -> Option<GenreId> {
    let id = match value {
        Value::Object(obj) => obj.get("id")?,
        other => other,
    };
    as_id(id).and_then(|g| GenreId::try_from(g).ok())
}

fn invalid(row: usize, field: &'static str, value: &Value) -> CatalogError {
    CatalogError::InvalidValue {
        row,
        field,
        value: value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
