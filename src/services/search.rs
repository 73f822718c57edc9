//! Query coordinator for the search path.
//!
//! Per query class the lifecycle is Idle → Debouncing → InFlight →
//! Applied | Cancelled | Failed. Input while debouncing replaces the
//! timer; input while in flight aborts the task and re-debounces. A
//! completion may only mutate visible state while its sequence number is
//! still the latest issued, so a stale response can never clobber a newer
//! one regardless of resolution order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::analytics::{AnalyticsSink, SearchEvent};
use crate::cache::{ResultCache, cache_key};
use crate::clients::{BusinessDirectory, DirectoryQuery};
use crate::error::SearchError;
use crate::geo;
use crate::history::HistoryStore;
use crate::models::{Business, Coordinates, FilterUpdate, SearchFilter, SearchResult};
use crate::ranking::{self, RankingConfig};
use crate::services::sequence::{Debouncer, SequenceCounter};

#[derive(Default)]
struct SearchState {
    filters: SearchFilter,
    location: Option<Coordinates>,
    results: Vec<SearchResult>,
    error: Option<String>,
    loading_seq: Option<u64>,
}

pub struct SearchService {
    directory: Arc<dyn BusinessDirectory>,
    cache: Arc<ResultCache>,
    history: Arc<HistoryStore>,
    analytics: Arc<dyn AnalyticsSink>,
    ranking: RankingConfig,
    grid_decimals: usize,
    debouncer: Debouncer,
    seq: SequenceCounter,
    state: RwLock<SearchState>,
}

impl SearchService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn BusinessDirectory>,
        cache: Arc<ResultCache>,
        history: Arc<HistoryStore>,
        analytics: Arc<dyn AnalyticsSink>,
        ranking: RankingConfig,
        grid_decimals: usize,
        debounce: Duration,
    ) -> Self {
        Self {
            directory,
            cache,
            history,
            analytics,
            ranking,
            grid_decimals,
            debouncer: Debouncer::new(debounce),
            seq: SequenceCounter::new(),
            state: RwLock::new(SearchState::default()),
        }
    }

    /// Manual search: bypasses the debounce delay but first cancels any
    /// pending timer or in-flight request. Losing the sequence race to an
    /// even newer request yields `Cancelled`, which the engine maps to
    /// "no change" and never surfaces.
    pub async fn search(self: &Arc<Self>, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.debouncer.cancel();
        let seq = self.seq.next();
        Arc::clone(self).run(query.to_string(), seq).await
    }

    /// Debounced search: replaces the pending timer, cancels in-flight
    /// work, and issues the request once input pauses.
    pub fn search_debounced(self: &Arc<Self>, query: &str) {
        let service = Arc::clone(self);
        let query = query.to_string();
        // The sequence number is taken at schedule time: it marks anything
        // already issued stale, and anything issued during the quiet period
        // supersedes this request even if its timer has already woken.
        let seq = self.seq.next();
        self.debouncer.schedule(async move {
            if let Err(e) = Arc::clone(&service).run(query, seq).await {
                if !e.is_cancellation() {
                    debug!("debounced search failed: {e}");
                }
            }
        });
    }

    async fn run(self: Arc<Self>, query: String, seq: u64) -> Result<Vec<SearchResult>, SearchError> {
        let (filters, location) = {
            let mut state = self.state.write().await;
            if !self.seq.is_current(seq) {
                return Err(SearchError::Cancelled);
            }
            state.loading_seq = Some(seq);
            (state.filters.clone(), state.location)
        };

        let outcome = self.execute(&query, &filters, location, seq).await;

        match outcome {
            Ok(results) => {
                self.apply_success(seq, &query, &filters, results.clone())
                    .await?;
                Ok(results)
            }
            Err(err) if err.is_cancellation() => {
                // No state mutation; only release the loading flag if this
                // was still the active request.
                let mut state = self.state.write().await;
                if state.loading_seq == Some(seq) {
                    state.loading_seq = None;
                }
                Err(err)
            }
            Err(err) => {
                self.apply_failure(seq, &err).await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        query: &str,
        filters: &SearchFilter,
        location: Option<Coordinates>,
        seq: u64,
    ) -> Result<Vec<SearchResult>, SearchError> {
        filters.validate()?;

        let key = cache_key(query, filters, location, self.grid_decimals);
        if let Some(results) = self.cache.get(&key).await {
            debug!("result cache hit");
            return Ok(results);
        }

        let directory_query = DirectoryQuery {
            free_text: query.to_string(),
            category: filters.category.clone(),
            open_now: filters.open_now,
            has_delivery: filters.has_delivery,
            has_parking: filters.has_parking,
            accepts_cards: filters.accepts_cards,
        };

        let candidates = self.directory.search(&directory_query).await?;

        if !self.seq.is_current(seq) {
            return Err(SearchError::Cancelled);
        }

        let results = self.build_results(candidates, query, filters, location);
        self.cache.insert(&key, results.clone()).await;
        Ok(results)
    }

    fn build_results(
        &self,
        candidates: Vec<Business>,
        query: &str,
        filters: &SearchFilter,
        location: Option<Coordinates>,
    ) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|business| {
                let distance_m = match (location, business.location) {
                    (Some(here), Some(there)) => Some(geo::distance_meters(here, there)),
                    _ => None,
                };

                if business.average_rating < filters.min_rating {
                    return None;
                }
                if let Some(max) = filters.max_distance_m {
                    // Unknown distance keeps the candidate; only a known
                    // excess excludes it.
                    if distance_m.is_some_and(|d| d > max) {
                        return None;
                    }
                }
                if let Some((min, max)) = filters.price_range {
                    if business.price_level.is_some_and(|p| p < min || p > max) {
                        return None;
                    }
                }

                let relevance_score = ranking::score(&business, query, distance_m, &self.ranking);
                let matched_fields = ranking::matched_fields(&business, query);

                Some(SearchResult {
                    business,
                    distance_m,
                    relevance_score,
                    matched_fields,
                })
            })
            .collect();

        ranking::sort_results(&mut results, filters.sort_by, filters.sort_order);
        results
    }

    async fn apply_success(
        &self,
        seq: u64,
        query: &str,
        filters: &SearchFilter,
        results: Vec<SearchResult>,
    ) -> Result<(), SearchError> {
        {
            let mut state = self.state.write().await;
            if !self.seq.is_current(seq) {
                if state.loading_seq == Some(seq) {
                    state.loading_seq = None;
                }
                return Err(SearchError::Cancelled);
            }
            state.results = results.clone();
            state.error = None;
            state.loading_seq = None;
        }

        self.history.add(query, filters, results.len()).await;

        let event = SearchEvent {
            query: query.to_string(),
            result_count: results.len(),
            filters: filters.clone(),
        };
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(e) = analytics.record(event).await {
                warn!("analytics sink failed: {e}");
            }
        });

        Ok(())
    }

    async fn apply_failure(&self, seq: u64, err: &SearchError) {
        let mut state = self.state.write().await;
        if !self.seq.is_current(seq) {
            if state.loading_seq == Some(seq) {
                state.loading_seq = None;
            }
            return;
        }

        error!("search failed: {err}");
        state.results.clear();
        state.error = Some(match err {
            SearchError::InvalidFilter(reason) => format!("Invalid search filter: {reason}"),
            _ => "Search failed. Please try again.".to_string(),
        });
        state.loading_seq = None;
    }

    pub async fn update_filters(&self, update: FilterUpdate) {
        self.state.write().await.filters.apply(update);
    }

    pub async fn clear_filters(&self) {
        self.state.write().await.filters = SearchFilter::default();
    }

    pub async fn set_location(&self, location: Option<Coordinates>) {
        self.state.write().await.location = location;
    }

    pub async fn location(&self) -> Option<Coordinates> {
        self.state.read().await.location
    }

    pub async fn filters(&self) -> SearchFilter {
        self.state.read().await.filters.clone()
    }

    pub async fn results(&self) -> Vec<SearchResult> {
        self.state.read().await.results.clone()
    }

    pub async fn error_message(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading_seq.is_some()
    }

    /// Cancels pending and in-flight work without issuing anything new.
    /// Used on teardown or navigation away.
    pub fn cancel(&self) {
        self.debouncer.cancel();
        self.seq.invalidate();
    }
}
