use thiserror::Error;

/// Errors produced by the search core.
///
/// `Cancelled` is internal plumbing: it marks a request that lost the
/// sequence race and is discarded before reaching callers.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("directory request failed: {0}")]
    Network(String),

    #[error("location permission denied")]
    LocationPermissionDenied,

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("corrupt cache payload: {0}")]
    CacheCorruption(String),

    #[error("superseded by a newer request")]
    Cancelled,
}

impl SearchError {
    /// True when the error must never mutate visible search state.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::CacheCorruption(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SearchError::InvalidFilter("min_rating out of range".to_string());
        assert_eq!(err.to_string(), "invalid filter: min_rating out of range");

        assert!(SearchError::Cancelled.is_cancellation());
        assert!(!SearchError::LocationPermissionDenied.is_cancellation());
    }
}
