//! Business records and the strong identifiers attached to them.
//!
//! Directory payloads are schemaless; nothing in this module is built
//! directly from the wire. The only way in is the validating mapping in
//! `clients::directory`, so every `Business` held by the engine is known
//! to carry an id, a name, and in-range coordinates and rating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
///
/// Both components are always present together; an unknown position is
/// `Option<Coordinates>` at the use site, never a half-filled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Validity per WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Unique identifier for a business in the directory.
///
/// Newtype wrapper so business ids cannot be mixed with other opaque
/// strings (suggestion ids, cache keys).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<BusinessId> for String {
    fn from(id: BusinessId) -> Self {
        id.0
    }
}

/// A validated business record from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub address: String,
    pub location: Option<Coordinates>,
    pub average_rating: f64,
    pub review_count: u32,
    pub price_level: Option<u8>,
    pub is_open: bool,
    #[serde(default)]
    pub has_delivery: bool,
    #[serde(default)]
    pub has_parking: bool,
    #[serde(default)]
    pub accepts_cards: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_bounds() {
        assert!(Coordinates::new(52.52, 13.405).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn business_id_roundtrip() {
        let id = BusinessId::new("biz-42");
        assert_eq!(id.to_string(), "biz-42");
        assert_eq!(String::from(id), "biz-42");
    }
}
