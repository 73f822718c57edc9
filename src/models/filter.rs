use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Sort key for result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Distance,
    Rating,
    Popularity,
    Newest,
    #[default]
    Relevance,
}

/// Sort direction. Comparators are ascending in their key; `Desc` reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Structured constraints applied to a search.
///
/// `category` and the boolean flags travel to the directory; `min_rating`,
/// `max_distance_m` and `price_range` are enforced locally after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub category: Option<String>,
    pub min_rating: f64,
    pub max_distance_m: Option<f64>,
    pub price_range: Option<(u8, u8)>,
    pub open_now: bool,
    pub has_delivery: bool,
    pub has_parking: bool,
    pub accepts_cards: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            category: None,
            min_rating: 0.0,
            max_distance_m: None,
            price_range: None,
            open_now: false,
            has_delivery: false,
            has_parking: false,
            accepts_cards: false,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl SearchFilter {
    /// Rejects malformed filters before any network call.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(0.0..=5.0).contains(&self.min_rating) {
            return Err(SearchError::InvalidFilter(format!(
                "min_rating must be within 0..=5, got {}",
                self.min_rating
            )));
        }

        if let Some(distance) = self.max_distance_m {
            if !distance.is_finite() || distance <= 0.0 {
                return Err(SearchError::InvalidFilter(format!(
                    "max_distance_m must be a positive number, got {distance}"
                )));
            }
        }

        if let Some((min, max)) = self.price_range {
            if min > max {
                return Err(SearchError::InvalidFilter(format!(
                    "price_range minimum {min} exceeds maximum {max}"
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(min_rating) = update.min_rating {
            self.min_rating = min_rating;
        }
        if let Some(max_distance_m) = update.max_distance_m {
            self.max_distance_m = max_distance_m;
        }
        if let Some(price_range) = update.price_range {
            self.price_range = price_range;
        }
        if let Some(open_now) = update.open_now {
            self.open_now = open_now;
        }
        if let Some(has_delivery) = update.has_delivery {
            self.has_delivery = has_delivery;
        }
        if let Some(has_parking) = update.has_parking {
            self.has_parking = has_parking;
        }
        if let Some(accepts_cards) = update.accepts_cards {
            self.accepts_cards = accepts_cards;
        }
        if let Some(sort_by) = update.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// Partial filter change. `None` leaves the field untouched; optional
/// fields use the inner `Option` to distinguish "clear" from "keep".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterUpdate {
    pub category: Option<Option<String>>,
    pub min_rating: Option<f64>,
    pub max_distance_m: Option<Option<f64>>,
    pub price_range: Option<Option<(u8, u8)>>,
    pub open_now: Option<bool>,
    pub has_delivery: Option<bool>,
    pub has_parking: Option<bool>,
    pub accepts_cards: Option<bool>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}
