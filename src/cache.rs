//! TTL-bounded result cache.
//!
//! Two tiers: an in-memory map checked first, backed by the injected
//! key-value store. Persisted hits are promoted into memory. Expiry is
//! checked lazily at read time; there is no background sweep. Capacity is
//! enforced across both tiers through a persisted key index ordered by
//! write time, evicting the oldest writes first.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{Coordinates, SearchFilter, SearchResult};
use crate::storage::KeyValueStore;

const ENTRY_PREFIX: &str = "cache:";
const INDEX_KEY: &str = "cache:index";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    results: Vec<SearchResult>,
    written_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    key: String,
    written_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    memory: HashMap<String, CacheEntry>,
    index: Vec<IndexEntry>,
    index_loaded: bool,
}

/// Composite key: normalized query, serialized filters, and the location
/// rounded onto a coarse grid so nearby requests share entries.
#[must_use]
pub fn cache_key(
    query: &str,
    filters: &SearchFilter,
    location: Option<Coordinates>,
    grid_decimals: usize,
) -> String {
    let normalized = query.trim().to_lowercase();
    let filters = serde_json::to_string(filters).unwrap_or_default();
    let cell = location.map_or_else(
        || "-".to_string(),
        |c| {
            format!(
                "{:.prec$},{:.prec$}",
                c.latitude,
                c.longitude,
                prec = grid_decimals
            )
        },
    );

    format!("{normalized}|{filters}|{cell}")
}

pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<CacheState>,
    ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64, capacity: usize) -> Self {
        Self {
            store,
            state: Mutex::new(CacheState::default()),
            ttl: Duration::seconds(ttl_seconds.min(i64::MAX as u64) as i64),
            capacity: capacity.max(1),
        }
    }

    async fn ensure_index(&self, state: &mut CacheState) {
        if state.index_loaded {
            return;
        }
        state.index_loaded = true;

        match self.store.get(INDEX_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(index) => state.index = index,
                Err(e) => warn!("discarding corrupt cache index: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("failed to read cache index: {e}"),
        }
    }

    async fn persist_index(&self, state: &CacheState) {
        let Ok(raw) = serde_json::to_string(&state.index) else {
            return;
        };
        if let Err(e) = self.store.set(INDEX_KEY, &raw).await {
            warn!("failed to persist cache index: {e}");
        }
    }

    async fn drop_entry(&self, state: &mut CacheState, key: &str) {
        state.memory.remove(key);
        state.index.retain(|e| e.key != key);
        if let Err(e) = self.store.remove(&format!("{ENTRY_PREFIX}{key}")).await {
            warn!("failed to remove persisted cache entry: {e}");
        }
    }

    /// Looks up a result set; expired entries are treated as absent and
    /// removed, malformed persisted payloads degrade to a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        self.ensure_index(&mut state).await;

        match state.memory.get(key).map(|e| e.is_expired(now)) {
            Some(true) => {
                self.drop_entry(&mut state, key).await;
                self.persist_index(&state).await;
                return None;
            }
            Some(false) => {
                return state.memory.get(key).map(|e| e.results.clone());
            }
            None => {}
        }

        let raw = match self.store.get(&format!("{ENTRY_PREFIX}{key}")).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("cache read failed, treating as miss: {e}");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("corrupt cache entry, treating as miss: {e}");
                self.drop_entry(&mut state, key).await;
                self.persist_index(&state).await;
                return None;
            }
        };

        if entry.is_expired(now) {
            self.drop_entry(&mut state, key).await;
            self.persist_index(&state).await;
            return None;
        }

        debug!("promoted persisted cache entry into memory");
        let results = entry.results.clone();
        state.memory.insert(key.to_string(), entry);
        Some(results)
    }

    /// Write-through insert; evicts the oldest writes once over capacity.
    pub async fn insert(&self, key: &str, results: Vec<SearchResult>) {
        let now = Utc::now();
        let entry = CacheEntry {
            results,
            written_at: now,
            expires_at: now + self.ttl,
        };

        let mut state = self.state.lock().await;
        self.ensure_index(&mut state).await;

        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&format!("{ENTRY_PREFIX}{key}"), &raw).await {
                    warn!("failed to persist cache entry: {e}");
                }
            }
            Err(e) => warn!("failed to serialize cache entry: {e}"),
        }

        state.memory.insert(key.to_string(), entry);
        state.index.retain(|e| e.key != key);
        state.index.push(IndexEntry {
            key: key.to_string(),
            written_at: now,
        });

        while state.index.len() > self.capacity {
            let oldest = state
                .index
                .iter()
                .min_by_key(|e| e.written_at)
                .map(|e| e.key.clone());
            match oldest {
                Some(key) => self.drop_entry(&mut state, &key).await,
                None => break,
            }
        }

        self.persist_index(&state).await;
    }

    /// Empties both tiers.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        self.ensure_index(&mut state).await;

        let keys: Vec<String> = state.index.iter().map(|e| e.key.clone()).collect();
        for key in keys {
            self.drop_entry(&mut state, &key).await;
        }
        state.memory.clear();
        state.index.clear();
        if let Err(e) = self.store.remove(INDEX_KEY).await {
            warn!("failed to remove cache index: {e}");
        }
    }

    /// Number of live entries across both tiers.
    pub async fn len(&self) -> usize {
        let mut state = self.state.lock().await;
        self.ensure_index(&mut state).await;
        state.index.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Plain in-memory TTL map used for suggestion caching.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (V, DateTime<Utc>)>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds.min(i64::MAX as u64) as i64),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if now <= *expires_at => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: &str, value: V) {
        let expires_at = Utc::now() + self.ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value, expires_at));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
