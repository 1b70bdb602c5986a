//! Read-side projection of the two stores into summary figures.

use serde::Serialize;

use gatepass_core::{ScanLogEntry, Stats};
use gatepass_sync::{ScanLogStore, TokenStore};

/// Figures plus the log entries they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub stats: Stats,
    /// Newest first.
    pub logs: Vec<ScanLogEntry>,
}

/// Recomputes stats from the stores on every call. Nothing is cached here.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    tokens: TokenStore,
    logs: ScanLogStore,
}

impl StatsAggregator {
    pub fn new(tokens: TokenStore, logs: ScanLogStore) -> Self {
        StatsAggregator { tokens, logs }
    }

    pub async fn compute(&self, prefer_remote: bool) -> Stats {
        self.snapshot(prefer_remote).await.stats
    }

    pub async fn snapshot(&self, prefer_remote: bool) -> StatsSnapshot {
        let tokens = self.tokens.get_all(prefer_remote).await;
        let logs = self.logs.get_recent(None, prefer_remote).await;
        StatsSnapshot {
            stats: Stats::compute(tokens.values(), &logs),
            logs,
        }
    }
}
