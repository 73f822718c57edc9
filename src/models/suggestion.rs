use serde::{Deserialize, Serialize};

use crate::models::{BusinessId, Coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Business,
    Category,
    Location,
    Recent,
}

/// Kind-specific payload carried by a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuggestionPayload {
    Business { business_id: BusinessId },
    Category { category: String },
    Location { coordinates: Coordinates },
    None,
}

/// One autocomplete entry shown while the user types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: String,
    pub text: String,
    pub kind: SuggestionKind,
    pub payload: SuggestionPayload,
}

impl SearchSuggestion {
    #[must_use]
    pub fn new(text: impl Into<String>, kind: SuggestionKind, payload: SuggestionPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            kind,
            payload,
        }
    }

    #[must_use]
    pub fn recent(text: impl Into<String>) -> Self {
        Self::new(text, SuggestionKind::Recent, SuggestionPayload::None)
    }
}
