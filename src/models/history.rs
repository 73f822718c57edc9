use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SearchFilter;

/// One completed search in the recent-query log.
///
/// Created only for searches that applied (not cancelled, not failed) and
/// immutable afterward; the store removes whole entries, never edits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub query: String,
    pub filters: SearchFilter,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

impl HistoryItem {
    #[must_use]
    pub fn new(query: impl Into<String>, filters: SearchFilter, result_count: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            filters,
            timestamp: Utc::now(),
            result_count,
        }
    }
}
