//! Business directory client.
//!
//! The directory is the sole source of candidate records. Its payload is
//! schemaless on the wire, so every record passes through a validating
//! mapping (`RawBusiness` → `Business`) at ingestion; records without an
//! id or name, or with out-of-range coordinates or ratings, are skipped
//! with a warning rather than failing the whole search.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::SearchError;
use crate::models::{Business, BusinessId, Coordinates};

/// Structured query accepted by the directory. Ranged constraints
/// (rating, distance, price) are enforced locally after ingestion.
#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    pub free_text: String,
    pub category: Option<String>,
    pub open_now: bool,
    pub has_delivery: bool,
    pub has_parking: bool,
    pub accepts_cards: bool,
}

#[async_trait::async_trait]
pub trait BusinessDirectory: Send + Sync {
    /// Unordered candidate set for a query.
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<Business>, SearchError>;

    /// Category names starting with the prefix.
    async fn categories(&self, prefix: &str, limit: usize) -> Result<Vec<String>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    businesses: Vec<RawBusiness>,
}

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(default)]
    average: f64,
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct RawBusiness {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    rating: Option<RawRating>,
    price_level: Option<u8>,
    #[serde(default)]
    is_open: bool,
    #[serde(default)]
    has_delivery: bool,
    #[serde(default)]
    has_parking: bool,
    #[serde(default)]
    accepts_cards: bool,
    created_at: Option<DateTime<Utc>>,
}

impl RawBusiness {
    /// Validation boundary: only well-formed records become `Business`.
    fn into_business(self) -> Option<Business> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let name = self.name.filter(|name| !name.trim().is_empty())?;

        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                let coords = Coordinates::new(lat, lon);
                if coords.is_valid() { Some(coords) } else { None }
            }
            _ => None,
        };

        let rating = self.rating.unwrap_or(RawRating {
            average: 0.0,
            count: 0,
        });
        if !(0.0..=5.0).contains(&rating.average) {
            return None;
        }

        Some(Business {
            id: BusinessId::new(id),
            name,
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            location,
            average_rating: rating.average,
            review_count: rating.count,
            price_level: self.price_level,
            is_open: self.is_open,
            has_delivery: self.has_delivery,
            has_parking: self.has_parking,
            accepts_cards: self.accepts_cards,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Clone)]
pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
}

impl HttpDirectoryClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        Url::parse(&format!("{}/{path}", self.base_url.trim_end_matches('/')))
            .map_err(|e| SearchError::Network(format!("invalid directory URL: {e}")))
    }
}

#[async_trait::async_trait]
impl BusinessDirectory for HttpDirectoryClient {
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<Business>, SearchError> {
        let mut url = self.endpoint("businesses/search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.free_text);
            if let Some(ref category) = query.category {
                pairs.append_pair("category", category);
            }
            if query.open_now {
                pairs.append_pair("open_now", "true");
            }
            if query.has_delivery {
                pairs.append_pair("has_delivery", "true");
            }
            if query.has_parking {
                pairs.append_pair("has_parking", "true");
            }
            if query.accepts_cards {
                pairs.append_pair("accepts_cards", "true");
            }
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Network(format!(
                "directory returned {status}: {body}"
            )));
        }

        let payload: DirectoryResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Network(format!("malformed directory payload: {e}")))?;

        let total = payload.businesses.len();
        let businesses: Vec<Business> = payload
            .businesses
            .into_iter()
            .filter_map(RawBusiness::into_business)
            .collect();

        let skipped = total - businesses.len();
        if skipped > 0 {
            warn!("skipped {skipped} malformed directory records");
        }

        Ok(businesses)
    }

    async fn categories(&self, prefix: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let mut url = self.endpoint("categories")?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Network(format!(
                "category lookup returned {}",
                response.status()
            )));
        }

        let categories: Vec<String> = response
            .json()
            .await
            .map_err(|e| SearchError::Network(format!("malformed category payload: {e}")))?;

        Ok(categories)
    }
}
