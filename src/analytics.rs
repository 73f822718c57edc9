//! Fire-and-forget analytics.

use serde::Serialize;
use tracing::info;

use crate::models::SearchFilter;

/// What gets reported after a search applies.
#[derive(Debug, Clone, Serialize)]
pub struct SearchEvent {
    pub query: String,
    pub result_count: usize,
    pub filters: SearchFilter,
}

/// Analytics collaborator. Failures are logged by the caller and
/// otherwise ignored; nothing in the search path waits on this.
#[async_trait::async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: SearchEvent) -> anyhow::Result<()>;
}

/// Default sink: structured log line, no external delivery.
#[derive(Default)]
pub struct TracingSink;

#[async_trait::async_trait]
impl AnalyticsSink for TracingSink {
    async fn record(&self, event: SearchEvent) -> anyhow::Result<()> {
        info!(
            query = %event.query,
            result_count = event.result_count,
            "search completed"
        );
        Ok(())
    }
}
