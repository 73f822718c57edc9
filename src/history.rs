//! Bounded recent-query log.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::models::{HistoryItem, SearchFilter};
use crate::storage::KeyValueStore;

const HISTORY_KEY: &str = "history";

/// Persisted list of recent searches, newest first. Entries are
/// deduplicated by exact query string: re-adding moves a query to the
/// front rather than duplicating it.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    items: Mutex<Option<Vec<HistoryItem>>>,
    capacity: usize,
}

impl HistoryStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            items: Mutex::new(None),
            capacity: capacity.max(1),
        }
    }

    async fn load(&self, items: &mut Option<Vec<HistoryItem>>) {
        if items.is_some() {
            return;
        }

        let loaded = match self.store.get(HISTORY_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("discarding corrupt history payload: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read history: {e}");
                Vec::new()
            }
        };

        *items = Some(loaded);
    }

    async fn persist(&self, items: &[HistoryItem]) {
        let Ok(raw) = serde_json::to_string(items) else {
            return;
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &raw).await {
            warn!("failed to persist history: {e}");
        }
    }

    pub async fn add(&self, query: &str, filters: &SearchFilter, result_count: usize) {
        let mut guard = self.items.lock().await;
        self.load(&mut guard).await;
        let items = guard.get_or_insert_with(Vec::new);

        items.retain(|item| item.query != query);
        items.insert(0, HistoryItem::new(query, filters.clone(), result_count));
        items.truncate(self.capacity);

        self.persist(items).await;
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<HistoryItem> {
        let mut guard = self.items.lock().await;
        self.load(&mut guard).await;
        guard
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        let mut guard = self.items.lock().await;
        self.load(&mut guard).await;
        guard.as_deref().map_or(0, <[HistoryItem]>::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Empties the persisted list.
    pub async fn clear(&self) {
        let mut guard = self.items.lock().await;
        *guard = Some(Vec::new());
        if let Err(e) = self.store.remove(HISTORY_KEY).await {
            warn!("failed to clear history: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStore::new()), 50)
    }

    #[tokio::test]
    async fn newest_entries_come_first() {
        let history = store();
        let filters = SearchFilter::default();

        history.add("plumber", &filters, 3).await;
        history.add("bakery", &filters, 7).await;

        let recent = history.recent(5).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "bakery");
        assert_eq!(recent[1].query, "plumber");
        assert_eq!(recent[1].result_count, 3);
    }

    #[tokio::test]
    async fn readding_moves_to_front_without_duplicating() {
        let history = store();
        let filters = SearchFilter::default();

        history.add("plumber", &filters, 3).await;
        history.add("bakery", &filters, 7).await;
        history.add("plumber", &filters, 5).await;

        let recent = history.recent(10).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "plumber");
        assert_eq!(recent[0].result_count, 5);
    }

    #[tokio::test]
    async fn truncates_to_capacity() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()), 50);
        let filters = SearchFilter::default();

        for i in 0..60 {
            history.add(&format!("query {i}"), &filters, i).await;
        }

        assert_eq!(history.len().await, 50);
        let recent = history.recent(1).await;
        assert_eq!(recent[0].query, "query 59");
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let kv = Arc::new(MemoryStore::new());
        {
            let history = HistoryStore::new(kv.clone(), 50);
            history.add("plumber", &SearchFilter::default(), 3).await;
        }

        let reopened = HistoryStore::new(kv, 50);
        assert_eq!(reopened.recent(5).await[0].query, "plumber");
    }

    #[tokio::test]
    async fn clear_empties_persisted_list() {
        let kv = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(kv.clone(), 50);
        history.add("plumber", &SearchFilter::default(), 3).await;
        history.clear().await;

        assert!(history.is_empty().await);
        assert_eq!(kv.get("history").await.unwrap(), None);
    }
}
