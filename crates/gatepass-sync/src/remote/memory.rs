//! # In-Memory Remote
//!
//! A remote store living in process memory. Tests flip it offline and back
//! with [`MemoryRemote::set_available`] to drive the fallback paths, and cap
//! rows per response with [`MemoryRemote::set_row_cap`] the way a hosted API
//! does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{RemoteScanLogRow, RemoteStore, RemoteTokenRow, RowPage};
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Default)]
struct Tables {
    tokens: BTreeMap<String, RemoteTokenRow>,
    /// Insertion order; reads sort by time.
    scan_logs: Vec<RemoteScanLogRow>,
}

/// In-process [`RemoteStore`].
#[derive(Debug)]
pub struct MemoryRemote {
    tables: Mutex<Tables>,
    available: AtomicBool,
    calls: AtomicUsize,
    /// Most rows one page may carry. `usize::MAX` means uncapped.
    row_cap: AtomicUsize,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Creates an empty, reachable remote.
    pub fn new() -> Self {
        MemoryRemote {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            row_cap: AtomicUsize::new(usize::MAX),
        }
    }

    /// Simulates an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Limits rows per page regardless of the requested limit.
    pub fn set_row_cap(&self, cap: Option<usize>) {
        self.row_cap.store(cap.unwrap_or(usize::MAX), Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of operations attempted, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the token table, for assertions.
    pub async fn token_rows(&self) -> Vec<RemoteTokenRow> {
        self.tables.lock().await.tokens.values().cloned().collect()
    }

    /// Snapshot of the scan log table in insertion order, for assertions.
    pub async fn scan_log_rows(&self) -> Vec<RemoteScanLogRow> {
        self.tables.lock().await.scan_logs.clone()
    }

    fn check(&self) -> SyncResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_available() {
            Ok(())
        } else {
            Err(SyncError::RemoteUnavailable("memory remote is offline".into()))
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_token_page(&self, offset: usize, limit: usize) -> SyncResult<RowPage<RemoteTokenRow>> {
        self.check()?;
        let tables = self.tables.lock().await;
        let take = limit.min(self.row_cap.load(Ordering::SeqCst));
        let rows = tables.tokens.values().skip(offset).take(take).cloned().collect();
        Ok(RowPage::new(rows, Some(tables.tokens.len())))
    }

    async fn upsert_tokens(&self, rows: &[RemoteTokenRow]) -> SyncResult<()> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        for row in rows {
            tables.tokens.insert(row.id.clone(), row.clone());
        }
        Ok(())
    }

    async fn mark_token_used(&self, token_id: &str, at: DateTime<Utc>) -> SyncResult<()> {
        self.check()?;
        if let Some(row) = self.tables.lock().await.tokens.get_mut(token_id) {
            row.is_used = true;
            row.scanned_at = Some(at);
        }
        Ok(())
    }

    async fn reset_token_usage(&self) -> SyncResult<()> {
        self.check()?;
        for row in self.tables.lock().await.tokens.values_mut() {
            row.is_used = false;
            row.scanned_at = None;
        }
        Ok(())
    }

    async fn delete_all_tokens(&self) -> SyncResult<()> {
        self.check()?;
        self.tables.lock().await.tokens.clear();
        Ok(())
    }

    async fn insert_scan_log(&self, row: &RemoteScanLogRow) -> SyncResult<()> {
        self.check()?;
        self.tables.lock().await.scan_logs.push(row.clone());
        Ok(())
    }

    async fn fetch_scan_logs(&self, limit: usize) -> SyncResult<Vec<RemoteScanLogRow>> {
        self.check()?;
        let mut rows = self.scan_log_rows().await;
        // Stable sort keeps insertion order for equal timestamps; reverse
        // puts the latest insert first among them.
        rows.sort_by_key(|row| row.scanned_at);
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn delete_all_scan_logs(&self) -> SyncResult<()> {
        self.check()?;
        self.tables.lock().await.scan_logs.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn log_at(id: &str, at: DateTime<Utc>) -> RemoteScanLogRow {
        RemoteScanLogRow {
            token_id: id.into(),
            status: "valid".into(),
            scanned_at: at,
        }
    }

    #[tokio::test]
    async fn test_offline_rejects_every_call() {
        let remote = MemoryRemote::new();
        remote.set_available(false);

        assert!(remote.fetch_tokens().await.unwrap_err().is_remote_unavailable());
        assert!(remote.delete_all_scan_logs().await.is_err());
        assert_eq!(remote.call_count(), 2);
    }

    #[tokio::test]
    async fn test_row_cap_limits_pages_not_full_reads() {
        let remote = MemoryRemote::new();
        let rows: Vec<_> = (1..=5)
            .map(|i| RemoteTokenRow {
                id: format!("TOKEN_{:04}", i),
                hash: "h".into(),
                is_used: false,
                scanned_at: None,
                title: "Gala".into(),
                event_name: "GALA".into(),
            })
            .collect();
        remote.upsert_tokens(&rows).await.unwrap();
        remote.set_row_cap(Some(2));

        let page = remote.fetch_token_page(0, 1000).await.unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.total, Some(5));

        let page = remote.fetch_token_page(4, 1000).await.unwrap();
        assert_eq!(page.rows[0].id, "TOKEN_0005");

        assert_eq!(remote.fetch_tokens().await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_scan_logs_newest_first_and_capped() {
        let remote = MemoryRemote::new();
        let base = Utc::now();
        for i in 0..5 {
            remote
                .insert_scan_log(&log_at(&format!("TOKEN_{:04}", i), base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let rows = remote.fetch_scan_logs(3).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.token_id.as_str()).collect();
        assert_eq!(ids, vec!["TOKEN_0004", "TOKEN_0003", "TOKEN_0002"]);
    }

    #[tokio::test]
    async fn test_usage_reset_keeps_rows() {
        let remote = MemoryRemote::new();
        remote
            .upsert_tokens(&[RemoteTokenRow {
                id: "TOKEN_0001".into(),
                hash: "h".into(),
                is_used: false,
                scanned_at: None,
                title: "Gala".into(),
                event_name: "GALA".into(),
            }])
            .await
            .unwrap();
        remote.mark_token_used("TOKEN_0001", Utc::now()).await.unwrap();
        assert!(remote.token_rows().await[0].is_used);

        remote.reset_token_usage().await.unwrap();
        let rows = remote.token_rows().await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_used);
        assert!(rows[0].scanned_at.is_none());
    }
}
