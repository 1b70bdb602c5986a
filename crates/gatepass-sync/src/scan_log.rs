//! # Scan Log Store
//!
//! The dual-tier scan history, newest first.
//!
//! The local cache keeps every entry. Remote reads return at most
//! `page_size` rows, and a successful one replaces the local cache, so
//! older history held only on this device is dropped at that point.

use tracing::{debug, error, info, warn};

use gatepass_core::ScanLogEntry;
use gatepass_db::{Database, ScanLogCacheRepository};

use crate::policy::Reconciler;
use crate::remote::RemoteScanLogRow;
use crate::writer::RemoteWrite;

/// Scan log entries, kept locally and mirrored remotely.
#[derive(Debug, Clone)]
pub struct ScanLogStore {
    cache: ScanLogCacheRepository,
    reconciler: Reconciler,
    page_size: usize,
}

impl ScanLogStore {
    pub fn new(db: &Database, reconciler: Reconciler, page_size: usize) -> Self {
        ScanLogStore {
            cache: db.scan_log_cache(),
            reconciler,
            page_size,
        }
    }

    /// Records one scan attempt.
    ///
    /// The local write happens first; the remote insert is queued. Neither
    /// failure reaches the caller.
    pub async fn append(&self, entry: ScanLogEntry) {
        if let Err(e) = self.cache.prepend(&entry).await {
            error!(token_id = %entry.token_id, error = %e, "Failed to cache scan log entry");
        }
        self.reconciler
            .submit(RemoteWrite::InsertScanLog(RemoteScanLogRow::from(&entry)));
    }

    /// Returns up to `limit` entries (all when `None`), newest first.
    pub async fn get_recent(&self, limit: Option<usize>, prefer_remote: bool) -> Vec<ScanLogEntry> {
        let page_size = self.page_size;
        let fetched = self
            .reconciler
            .fetch("scan_logs", prefer_remote, |remote| async move {
                remote.fetch_scan_logs(page_size).await
            })
            .await;

        let mut entries = match fetched {
            Some(rows) => {
                let entries = Self::decode_rows(rows);
                if let Err(e) = self.cache.replace(&entries).await {
                    error!(error = %e, "Failed to overwrite scan log cache with remote page");
                }
                entries
            }
            None => self.cache.load().await.unwrap_or_else(|e| {
                error!(error = %e, "Failed to read scan log cache, treating it as empty");
                Vec::new()
            }),
        };

        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    fn decode_rows(rows: Vec<RemoteScanLogRow>) -> Vec<ScanLogEntry> {
        let total = rows.len();
        let entries: Vec<ScanLogEntry> = rows
            .into_iter()
            .filter_map(|row| {
                let token_id = row.token_id.clone();
                ScanLogEntry::try_from(row)
                    .map_err(|e| warn!(token_id = %token_id, error = %e, "Skipping remote scan log row"))
                    .ok()
            })
            .collect();
        debug!(total, kept = entries.len(), "Decoded remote scan logs");
        entries
    }

    /// Deletes every entry, locally and remotely.
    ///
    /// A local failure is logged; the remote delete is queued regardless.
    pub async fn clear(&self) {
        if let Err(e) = self.cache.clear().await {
            error!(error = %e, "Failed to clear local scan log");
        }
        self.reconciler.submit(RemoteWrite::DeleteAllScanLogs);

        info!("Scan log cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ReconcilePolicy;
    use crate::remote::memory::MemoryRemote;
    use crate::remote::RemoteStore;
    use chrono::{Duration, Utc};
    use gatepass_core::ScanOutcome;
    use gatepass_db::DbConfig;
    use std::sync::Arc;

    async fn setup(page_size: usize) -> (ScanLogStore, Arc<MemoryRemote>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let reconciler = Reconciler::new(remote.clone(), ReconcilePolicy::RemoteFirst);
        (ScanLogStore::new(&db, reconciler, page_size), remote)
    }

    fn entry(id: &str, offset_secs: i64, outcome: ScanOutcome) -> ScanLogEntry {
        ScanLogEntry::new(id, Utc::now() + Duration::seconds(offset_secs), outcome)
    }

    #[tokio::test]
    async fn test_append_newest_first() {
        let (store, _) = setup(50).await;
        store.append(entry("TOKEN_0001", 0, ScanOutcome::Valid)).await;
        store.append(entry("TOKEN_0001", 1, ScanOutcome::Duplicate)).await;

        let logs = store.get_recent(None, true).await;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].outcome, ScanOutcome::Duplicate);
        assert_eq!(logs[1].outcome, ScanOutcome::Valid);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let (store, _) = setup(50).await;
        for i in 0..4 {
            store.append(entry("Unknown", i, ScanOutcome::Invalid)).await;
        }
        assert_eq!(store.get_recent(Some(2), false).await.len(), 2);
    }

    #[tokio::test]
    async fn test_offline_appends_stay_local() {
        let (store, remote) = setup(50).await;
        remote.set_available(false);

        store.append(entry("TOKEN_0001", 0, ScanOutcome::Valid)).await;
        let logs = store.get_recent(None, true).await;
        assert_eq!(logs.len(), 1);
        assert!(remote.scan_log_rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_remote_read_replaces_larger_cache() {
        let (store, remote) = setup(3).await;
        remote.set_available(false);
        for i in 0..5 {
            store.append(entry(&format!("TOKEN_{:04}", i + 1), i, ScanOutcome::Valid)).await;
        }
        assert_eq!(store.get_recent(None, false).await.len(), 5);

        remote.set_available(true);
        for i in 5..7 {
            store.append(entry(&format!("TOKEN_{:04}", i + 1), i, ScanOutcome::Valid)).await;
        }

        // Remote holds 2 rows; they replace the 7 cached entries.
        let logs = store.get_recent(None, true).await;
        let ids: Vec<_> = logs.iter().map(|e| e.token_id.as_str()).collect();
        assert_eq!(ids, vec!["TOKEN_0007", "TOKEN_0006"]);
        assert_eq!(store.get_recent(None, false).await.len(), 2);
    }

    #[tokio::test]
    async fn test_remote_read_capped_at_page_size() {
        let (store, _) = setup(3).await;
        for i in 0..5 {
            store.append(entry(&format!("TOKEN_{:04}", i + 1), i, ScanOutcome::Valid)).await;
        }

        let logs = store.get_recent(None, true).await;
        let ids: Vec<_> = logs.iter().map(|e| e.token_id.as_str()).collect();
        assert_eq!(ids, vec!["TOKEN_0005", "TOKEN_0004", "TOKEN_0003"]);
    }

    #[tokio::test]
    async fn test_unknown_remote_status_skipped() {
        let (store, remote) = setup(50).await;
        remote
            .insert_scan_log(&RemoteScanLogRow {
                token_id: "TOKEN_0001".into(),
                status: "teleported".into(),
                scanned_at: Utc::now(),
            })
            .await
            .unwrap();
        store.append(entry("TOKEN_0002", 5, ScanOutcome::Valid)).await;

        let logs = store.get_recent(None, true).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].token_id, "TOKEN_0002");
    }

    #[tokio::test]
    async fn test_clear_empties_both_tiers() {
        let (store, remote) = setup(50).await;
        store.append(entry("TOKEN_0001", 0, ScanOutcome::Valid)).await;

        store.clear().await;
        assert!(store.get_recent(None, true).await.is_empty());
        assert!(remote.scan_log_rows().await.is_empty());
    }
}
