//! Deterministic per-user jitter.
//!
//! Two members of the same session should walk the same pages in slightly
//! different orders. The offset for an item is derived from a seed built from
//! the session id, user id and catalog id, so it is identical across calls and
//! process restarts and needs no stored state.
//!
//! ## Algorithm
//! 1. Seed string: `"{session}:{user}:{catalog_id}"` (placeholders for missing ids)
//! 2. BLAKE3 the seed, take the first 4 bytes as a little-endian `u32`
//! 3. Map to `[0, 1)` with `% 10_000 / 10_000`
//! 4. Rescale linearly to `[-strength, +strength]`

use catalog::CatalogId;

/// Default jitter strength
pub const DEFAULT_JITTER_STRENGTH: f64 = 0.35;

/// Placeholder used when the session id is missing or empty
pub const ANON_SESSION: &str = "anon-session";

/// Placeholder used when the user id is missing or empty
pub const ANON_USER: &str = "anon-user";

const BUCKETS: u32 = 10_000;

/// Stable 32-bit fingerprint of a (session, user, catalog id) triple.
pub fn fingerprint(session: Option<&str>, user: Option<&str>, catalog_id: CatalogId) -> u32 {
    let session = session.filter(|s| !s.is_empty()).unwrap_or(ANON_SESSION);
    let user = user.filter(|u| !u.is_empty()).unwrap_or(ANON_USER);
    let seed = format!("{}:{}:{}", session, user, catalog_id);

    let hash = blake3::hash(seed.as_bytes());
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Jitter value in `[-strength, +strength]`.
///
/// Negative or non-finite strengths are treated as zero, so the result is
/// always finite.
pub fn jitter(
    session: Option<&str>,
    user: Option<&str>,
    catalog_id: CatalogId,
    strength: f64,
) -> f64 {
    let strength = sanitize_strength(strength);
    let unit = f64::from(fingerprint(session, user, catalog_id) % BUCKETS) / f64::from(BUCKETS);
    (unit * 2.0 - 1.0) * strength
}

fn sanitize_strength(strength: f64) -> f64 {
    if strength.is_finite() && strength > 0.0 {
        strength
    } else {
        0.0
    }
}

/// Jitter bound to one viewer (session + user), as used by the page loader.
#[derive(Debug, Clone)]
pub struct Jitter {
    session: Option<String>,
    user: Option<String>,
    strength: f64,
}

impl Jitter {
    pub fn new(session: Option<String>, user: Option<String>) -> Self {
        Self {
            session,
            user,
            strength: DEFAULT_JITTER_STRENGTH,
        }
    }

    /// Configure the jitter strength (default: 0.35)
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = sanitize_strength(strength);
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Offset for one catalog item
    pub fn value(&self, catalog_id: CatalogId) -> f64 {
        jitter(self.session(), self.user(), catalog_id, self.strength)
    }
}
