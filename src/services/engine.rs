//! Top-level wiring. [`Engine`] owns the two services plus their shared
//! collaborators and is the only type callers construct; everything below
//! it takes its dependencies explicitly.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::analytics::AnalyticsSink;
use crate::cache::ResultCache;
use crate::clients::{BusinessDirectory, PlaceAutocomplete};
use crate::config::Config;
use crate::error::SearchError;
use crate::geo;
use crate::history::HistoryStore;
use crate::models::{
    Coordinates, FilterUpdate, HistoryItem, SearchFilter, SearchResult, SearchSuggestion,
    SuggestionPayload,
};
use crate::ranking::RankingConfig;
use crate::services::search::SearchService;
use crate::services::suggestions::SuggestionService;
use crate::storage::KeyValueStore;

pub struct Engine {
    search: Arc<SearchService>,
    suggestions: Arc<SuggestionService>,
    cache: Arc<ResultCache>,
    history: Arc<HistoryStore>,
}

impl Engine {
    pub fn new(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn BusinessDirectory>,
        places: Arc<dyn PlaceAutocomplete>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let cache = Arc::new(ResultCache::new(
            Arc::clone(&store),
            config.cache.ttl_seconds,
            config.cache.capacity,
        ));
        let history = Arc::new(HistoryStore::new(store, config.history.capacity));

        let ranking = RankingConfig {
            review_count_cap: config.search.review_count_cap,
            distance_cap_m: config.search.distance_cap_m,
        };

        let search = Arc::new(SearchService::new(
            Arc::clone(&directory),
            Arc::clone(&cache),
            Arc::clone(&history),
            analytics,
            ranking,
            config.cache.grid_decimals,
            Duration::from_millis(config.search.debounce_ms),
        ));

        let suggestions = Arc::new(SuggestionService::new(
            directory,
            places,
            Arc::clone(&history),
            config.cache.ttl_seconds,
            Duration::from_millis(config.search.suggestion_debounce_ms),
        ));

        Self {
            search,
            suggestions,
            cache,
            history,
        }
    }

    /// Runs a search immediately. Cancellation is an internal signal, not
    /// a user-facing failure; a superseded call just reports whatever the
    /// newer call left in place.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        match self.search.search(query).await {
            Ok(results) => Ok(results),
            Err(e) if e.is_cancellation() => Ok(self.search.results().await),
            Err(e) => Err(e),
        }
    }

    pub fn search_debounced(&self, query: &str) {
        self.search.search_debounced(query);
    }

    pub async fn suggestions(&self, input: &str) -> Result<Vec<SearchSuggestion>, SearchError> {
        let location = self.search.location().await;
        self.suggestions.suggestions(input, location).await
    }

    /// Debounced suggestion lookup. The active location is read when the
    /// timer fires, so a location set during the quiet period is honored.
    pub fn suggest_debounced(&self, input: &str) {
        let search = Arc::clone(&self.search);
        self.suggestions
            .suggest_debounced(input, async move { search.location().await });
    }

    pub async fn current_suggestions(&self) -> Vec<SearchSuggestion> {
        self.suggestions.current().await
    }

    /// Picking a suggestion commits it: payload-specific state is applied
    /// first, then a full search runs on the suggestion text.
    pub async fn select_suggestion(
        &self,
        suggestion: &SearchSuggestion,
    ) -> Result<Vec<SearchResult>, SearchError> {
        match &suggestion.payload {
            SuggestionPayload::Category { category } => {
                self.search
                    .update_filters(FilterUpdate {
                        category: Some(Some(category.clone())),
                        ..FilterUpdate::default()
                    })
                    .await;
            }
            SuggestionPayload::Location { coordinates } => {
                self.search.set_location(Some(*coordinates)).await;
            }
            SuggestionPayload::Business { .. } | SuggestionPayload::None => {}
        }
        self.search(&suggestion.text).await
    }

    pub async fn update_filters(&self, update: FilterUpdate) {
        self.search.update_filters(update).await;
    }

    pub async fn clear_filters(&self) {
        self.search.clear_filters().await;
    }

    pub async fn set_location(&self, location: Option<Coordinates>) {
        self.search.set_location(location).await;
    }

    /// Feeds the outcome of a platform location request into the engine.
    /// A denied permission is an expected condition; searches continue
    /// without distance data.
    pub async fn apply_location(&self, outcome: Result<Coordinates, SearchError>) {
        match outcome {
            Ok(coordinates) => self.search.set_location(Some(coordinates)).await,
            Err(e) => {
                warn!("location unavailable: {e}");
                self.search.set_location(None).await;
            }
        }
    }

    pub async fn location(&self) -> Option<Coordinates> {
        self.search.location().await
    }

    pub async fn filters(&self) -> SearchFilter {
        self.search.filters().await
    }

    pub async fn results(&self) -> Vec<SearchResult> {
        self.search.results().await
    }

    pub async fn error_message(&self) -> Option<String> {
        self.search.error_message().await
    }

    pub async fn is_loading(&self) -> bool {
        self.search.is_loading().await
    }

    pub async fn history(&self, limit: usize) -> Vec<HistoryItem> {
        self.history.recent(limit).await
    }

    pub async fn clear_history(&self) {
        self.history.clear().await;
    }

    pub async fn clear_cache(&self) {
        self.suggestions.clear_cache().await;
        self.cache.clear().await;
    }

    /// Whether a point falls inside `radius_m` of the active location.
    /// Without a location nothing is considered in range.
    pub async fn is_within_radius(&self, point: Coordinates, radius_m: f64) -> bool {
        match self.search.location().await {
            Some(origin) => geo::is_within_radius(origin, point, radius_m),
            None => false,
        }
    }

    pub fn cancel(&self) {
        self.search.cancel();
        self.suggestions.cancel();
    }
}
