use serde::{Deserialize, Serialize};

use crate::models::Business;

/// Business field that matched the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Name,
    Description,
    Category,
    Address,
}

impl MatchField {
    /// Relative weight of the field in the text component of the score.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Name => 3.0,
            Self::Description | Self::Category => 2.0,
            Self::Address => 1.0,
        }
    }

    pub const ALL: [Self; 4] = [Self::Name, Self::Description, Self::Category, Self::Address];
}

/// A scored candidate produced for one query. Never persisted on its own;
/// cache entries hold whole result sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub business: Business,
    pub distance_m: Option<f64>,
    pub relevance_score: f64,
    pub matched_fields: Vec<MatchField>,
}

impl SearchResult {
    #[must_use]
    pub fn average_rating(&self) -> f64 {
        self.business.average_rating
    }

    #[must_use]
    pub const fn review_count(&self) -> u32 {
        self.business.review_count
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.business.is_open
    }
}
