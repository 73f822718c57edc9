//! Suggestion aggregator.
//!
//! Empty input falls back to recent history. Otherwise three independent,
//! capped lookups run concurrently (business names, category names, and,
//! only with a known location, place autocomplete) and are concatenated
//! in that order. Each source degrades to empty on failure so one flaky
//! collaborator cannot blank the whole dropdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::clients::{BusinessDirectory, DirectoryQuery, PlaceAutocomplete};
use crate::error::SearchError;
use crate::history::HistoryStore;
use crate::models::{Coordinates, SearchSuggestion, SuggestionKind, SuggestionPayload};
use crate::services::sequence::{Debouncer, SequenceCounter};

const BUSINESS_CAP: usize = 5;
const CATEGORY_CAP: usize = 3;
const LOCATION_CAP: usize = 3;
const RECENT_CAP: usize = 5;

// Category names are deduplicated case-insensitively after the fetch, so
// the lookup asks for a wider window than the cap to keep it filled.
const CATEGORY_FETCH_WINDOW: usize = 12;

pub struct SuggestionService {
    directory: Arc<dyn BusinessDirectory>,
    places: Arc<dyn PlaceAutocomplete>,
    history: Arc<HistoryStore>,
    cache: TtlCache<Vec<SearchSuggestion>>,
    debouncer: Debouncer,
    seq: SequenceCounter,
    current: RwLock<Vec<SearchSuggestion>>,
}

impl SuggestionService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn BusinessDirectory>,
        places: Arc<dyn PlaceAutocomplete>,
        history: Arc<HistoryStore>,
        ttl_seconds: u64,
        debounce: Duration,
    ) -> Self {
        Self {
            directory,
            places,
            history,
            cache: TtlCache::new(ttl_seconds),
            debouncer: Debouncer::new(debounce),
            seq: SequenceCounter::new(),
            current: RwLock::new(Vec::new()),
        }
    }

    /// Immediate suggestion lookup; the debounced path goes through
    /// [`Self::suggest_debounced`].
    pub async fn suggestions(
        self: &Arc<Self>,
        input: &str,
        location: Option<Coordinates>,
    ) -> Result<Vec<SearchSuggestion>, SearchError> {
        self.debouncer.cancel();
        let seq = self.seq.next();
        let suggestions = self.fetch(input, location).await?;

        if self.seq.is_current(seq) {
            *self.current.write().await = suggestions.clone();
        }
        Ok(suggestions)
    }

    /// Debounced path: replaces any pending lookup for this query class.
    /// The sequence number is taken now, so anything issued afterwards
    /// supersedes this lookup even if its timer has already woken. The
    /// location is resolved when the timer fires, not when it is set.
    pub fn suggest_debounced<L>(self: &Arc<Self>, input: &str, location: L)
    where
        L: Future<Output = Option<Coordinates>> + Send + 'static,
    {
        let service = Arc::clone(self);
        let input = input.to_string();
        let seq = self.seq.next();
        self.debouncer.schedule(async move {
            let location = location.await;
            match service.fetch(&input, location).await {
                Ok(suggestions) => {
                    if service.seq.is_current(seq) {
                        *service.current.write().await = suggestions;
                    }
                }
                Err(e) => debug!("suggestion lookup failed: {e}"),
            }
        });
    }

    /// Last applied suggestion list.
    pub async fn current(&self) -> Vec<SearchSuggestion> {
        self.current.read().await.clone()
    }

    async fn fetch(
        &self,
        input: &str,
        location: Option<Coordinates>,
    ) -> Result<Vec<SearchSuggestion>, SearchError> {
        let input = input.trim();

        if input.is_empty() {
            let recent = self.history.recent(RECENT_CAP).await;
            return Ok(recent
                .into_iter()
                .map(|item| SearchSuggestion::recent(item.query))
                .collect());
        }

        let key = input.to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("suggestion cache hit");
            return Ok(cached);
        }

        let business_lookup = self.business_suggestions(input);
        let category_lookup = self.category_suggestions(input);
        let location_lookup = self.location_suggestions(input, location);

        let (businesses, categories, locations) =
            tokio::join!(business_lookup, category_lookup, location_lookup);

        // A failed source degrades to empty for this response, but the
        // aggregation is only cached when every source succeeded; a
        // transient outage must not pin a hollow entry for the whole TTL.
        let mut complete = true;
        let mut suggestions = businesses.unwrap_or_else(|e| {
            warn!("business suggestion lookup failed: {e}");
            complete = false;
            Vec::new()
        });
        suggestions.extend(categories.unwrap_or_else(|e| {
            warn!("category suggestion lookup failed: {e}");
            complete = false;
            Vec::new()
        }));
        suggestions.extend(locations.unwrap_or_else(|e| {
            warn!("place autocomplete failed: {e}");
            complete = false;
            Vec::new()
        }));

        if complete {
            self.cache.insert(&key, suggestions.clone()).await;
        }
        Ok(suggestions)
    }

    async fn business_suggestions(
        &self,
        input: &str,
    ) -> Result<Vec<SearchSuggestion>, SearchError> {
        let query = DirectoryQuery {
            free_text: input.to_string(),
            ..DirectoryQuery::default()
        };
        let businesses = self.directory.search(&query).await?;

        Ok(businesses
            .into_iter()
            .take(BUSINESS_CAP)
            .map(|business| {
                SearchSuggestion::new(
                    business.name.clone(),
                    SuggestionKind::Business,
                    SuggestionPayload::Business {
                        business_id: business.id,
                    },
                )
            })
            .collect())
    }

    async fn category_suggestions(
        &self,
        input: &str,
    ) -> Result<Vec<SearchSuggestion>, SearchError> {
        let categories = self
            .directory
            .categories(input, CATEGORY_FETCH_WINDOW)
            .await?;

        let mut seen = Vec::new();
        let mut suggestions = Vec::new();
        for category in categories {
            let folded = category.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            suggestions.push(SearchSuggestion::new(
                category.clone(),
                SuggestionKind::Category,
                SuggestionPayload::Category { category },
            ));
            if suggestions.len() == CATEGORY_CAP {
                break;
            }
        }

        Ok(suggestions)
    }

    async fn location_suggestions(
        &self,
        input: &str,
        location: Option<Coordinates>,
    ) -> Result<Vec<SearchSuggestion>, SearchError> {
        // External place lookup only makes sense near a known location.
        let Some(bias) = location else {
            return Ok(Vec::new());
        };

        let matches = self.places.autocomplete(input, Some(bias), None).await?;

        Ok(matches
            .into_iter()
            .take(LOCATION_CAP)
            .map(|place| {
                let payload = place.location.map_or(SuggestionPayload::None, |coordinates| {
                    SuggestionPayload::Location { coordinates }
                });
                SearchSuggestion::new(place.description, SuggestionKind::Location, payload)
            })
            .collect())
    }

    /// Cancels pending suggestion work; used on teardown.
    pub fn cancel(&self) {
        self.debouncer.cancel();
        self.seq.invalidate();
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
