//! # Remote Store
//!
//! The remote source of truth, behind an async trait.
//!
//! ## Schema
//! ```text
//! tokens                              scan_logs
//! ───────────────────────────         ───────────────────────────
//! id          TEXT  PK                token_id    TEXT
//! hash        TEXT                    status      TEXT  valid|duplicate|invalid
//! is_used     BOOL                    scanned_at  TIMESTAMPTZ
//! scanned_at  TIMESTAMPTZ NULL
//! title       TEXT                    read newest first, capped per request
//! event_name  TEXT
//! ```
//!
//! ## Paged Reads
//! Servers cap how many rows one response may carry, so the token table is
//! read in pages of [`TOKEN_PAGE_SIZE`] until an empty page comes back or the
//! reported total is reached. A read that ends short of the reported total
//! fails with [`SyncError::IncompleteRead`] rather than passing off a partial
//! table as the whole.
//!
//! ## Implementations
//! - [`MemoryRemote`](memory::MemoryRemote) - in-process, with a switchable outage
//! - [`RestRemote`](rest::RestRemote) - PostgREST-style HTTP API via `reqwest`

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use gatepass_core::{ScanLogEntry, ScanOutcome, TokenRecord, ValidationError};

use crate::error::{SyncError, SyncResult};

/// Rows requested per page when reading the token table.
pub const TOKEN_PAGE_SIZE: usize = 1000;

// =============================================================================
// Rows
// =============================================================================

/// A row of the remote `tokens` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTokenRow {
    pub id: String,
    pub hash: String,
    pub is_used: bool,
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
    pub title: String,
    pub event_name: String,
}

impl RemoteTokenRow {
    pub fn from_record(record: &TokenRecord, event_name: &str) -> Self {
        RemoteTokenRow {
            id: record.id.clone(),
            hash: record.hash.clone(),
            is_used: record.used,
            scanned_at: record.scanned_at,
            title: record.title.clone(),
            event_name: event_name.to_string(),
        }
    }

    /// Converts to a local record, keeping `used` and `scanned_at` in step.
    ///
    /// A redemption time on an unused row is dropped. A used row with no
    /// redemption time gets the current time.
    pub fn into_record(self) -> TokenRecord {
        let scanned_at = match (self.is_used, self.scanned_at) {
            (true, Some(at)) => Some(at),
            (true, None) => {
                warn!(token_id = %self.id, "Remote token is used but has no scan time");
                Some(Utc::now())
            }
            (false, _) => None,
        };

        TokenRecord {
            scanned_at,
            id: self.id,
            hash: self.hash,
            used: self.is_used,
            title: self.title,
        }
    }
}

/// A row of the remote `scan_logs` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScanLogRow {
    pub token_id: String,
    pub status: String,
    pub scanned_at: DateTime<Utc>,
}

impl From<&ScanLogEntry> for RemoteScanLogRow {
    fn from(entry: &ScanLogEntry) -> Self {
        RemoteScanLogRow {
            token_id: entry.token_id.clone(),
            status: entry.outcome.as_str().to_string(),
            scanned_at: entry.time,
        }
    }
}

impl TryFrom<RemoteScanLogRow> for ScanLogEntry {
    type Error = ValidationError;

    fn try_from(row: RemoteScanLogRow) -> Result<Self, Self::Error> {
        let outcome: ScanOutcome = row.status.parse()?;
        Ok(ScanLogEntry::new(row.token_id, row.scanned_at, outcome))
    }
}

// =============================================================================
// Pages
// =============================================================================

/// One page of a paged read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPage<T> {
    pub rows: Vec<T>,
    /// Row count of the whole collection, when the server reports it.
    pub total: Option<usize>,
}

impl<T> RowPage<T> {
    pub fn new(rows: Vec<T>, total: Option<usize>) -> Self {
        RowPage { rows, total }
    }
}

/// Reads a whole collection page by page.
///
/// `fetch_page(offset, limit)` is called with `offset` equal to the rows
/// received so far. Reading stops at the first empty page or once the latest
/// reported total is reached. A page shorter than `limit` does not end the
/// read.
pub async fn collect_pages<T, F, Fut>(page_size: usize, mut fetch_page: F) -> SyncResult<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = SyncResult<RowPage<T>>>,
{
    let page_size = page_size.max(1);
    let mut rows = Vec::new();
    let mut total = None;

    loop {
        let page = fetch_page(rows.len(), page_size).await?;
        if page.total.is_some() {
            total = page.total;
        }
        if page.rows.is_empty() {
            break;
        }

        rows.extend(page.rows);
        debug!(received = rows.len(), ?total, "Fetched page");

        if total.is_some_and(|t| rows.len() >= t) {
            break;
        }
    }

    match total {
        Some(expected) if expected != rows.len() => Err(SyncError::IncompleteRead {
            expected,
            received: rows.len(),
        }),
        _ => Ok(rows),
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Operations the stores need from the remote tier.
///
/// Every required method is a single attempt. Callers decide what a failure
/// means.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Up to `limit` token rows ordered by id, skipping the first `offset`.
    async fn fetch_token_page(&self, offset: usize, limit: usize) -> SyncResult<RowPage<RemoteTokenRow>>;

    /// All token rows, read page by page.
    async fn fetch_tokens(&self) -> SyncResult<Vec<RemoteTokenRow>> {
        collect_pages(TOKEN_PAGE_SIZE, |offset, limit| self.fetch_token_page(offset, limit)).await
    }

    /// Inserts or replaces rows by id.
    async fn upsert_tokens(&self, rows: &[RemoteTokenRow]) -> SyncResult<()>;

    /// Sets `is_used` and `scanned_at` on one row.
    async fn mark_token_used(&self, token_id: &str, at: DateTime<Utc>) -> SyncResult<()>;

    /// Clears `is_used` and `scanned_at` on every row.
    async fn reset_token_usage(&self) -> SyncResult<()>;

    /// Deletes every token row. There is no soft delete.
    async fn delete_all_tokens(&self) -> SyncResult<()>;

    async fn insert_scan_log(&self, row: &RemoteScanLogRow) -> SyncResult<()>;

    /// At most `limit` rows, newest first.
    async fn fetch_scan_logs(&self, limit: usize) -> SyncResult<Vec<RemoteScanLogRow>>;

    /// Deletes every scan log row. There is no soft delete.
    async fn delete_all_scan_logs(&self) -> SyncResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_core::HashAuthenticator;

    #[test]
    fn test_token_row_conversion() {
        let auth = HashAuthenticator::new("k", "GALA");
        let mut record = TokenRecord::issue(&auth, "TOKEN_0001", "Gala");
        record.redeem(Utc::now());

        let row = RemoteTokenRow::from_record(&record, "GALA");
        assert!(row.is_used);
        assert_eq!(row.event_name, "GALA");
        assert_eq!(row.into_record(), record);
    }

    #[test]
    fn test_unused_row_drops_stray_timestamp() {
        let row = RemoteTokenRow {
            id: "TOKEN_0001".into(),
            hash: "ab".into(),
            is_used: false,
            scanned_at: Some(Utc::now()),
            title: "Gala".into(),
            event_name: "GALA".into(),
        };
        assert!(row.into_record().scanned_at.is_none());
    }

    #[test]
    fn test_used_row_without_timestamp_gets_one() {
        let row = RemoteTokenRow {
            id: "TOKEN_0001".into(),
            hash: "ab".into(),
            is_used: true,
            scanned_at: None,
            title: "Gala".into(),
            event_name: "GALA".into(),
        };
        let before = Utc::now();
        let record = row.into_record();

        assert!(record.used);
        assert!(record.scanned_at.is_some_and(|at| at >= before));
    }

    /// Serves `rows` in pages of at most `cap`, like a server row limit.
    async fn capped_page(
        rows: &[u32],
        cap: usize,
        total: Option<usize>,
        offset: usize,
        limit: usize,
    ) -> SyncResult<RowPage<u32>> {
        let page = rows.iter().skip(offset).take(limit.min(cap)).copied().collect();
        Ok(RowPage::new(page, total))
    }

    #[tokio::test]
    async fn test_collect_pages_reads_past_server_cap() {
        let rows: Vec<u32> = (1..=7).collect();
        let mut calls = 0;

        let all = collect_pages(5, |offset, limit| {
            calls += 1;
            capped_page(&rows, 3, Some(rows.len()), offset, limit)
        })
        .await
        .unwrap();

        assert_eq!(all, rows);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_collect_pages_without_total_reads_to_empty_page() {
        let rows: Vec<u32> = (1..=4).collect();
        let all = collect_pages(2, |offset, limit| capped_page(&rows, 10, None, offset, limit))
            .await
            .unwrap();
        assert_eq!(all, rows);
    }

    #[tokio::test]
    async fn test_collect_pages_short_of_total_fails() {
        let rows: Vec<u32> = (1..=3).collect();
        let err = collect_pages(2, |offset, limit| capped_page(&rows, 10, Some(5), offset, limit))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::IncompleteRead {
                expected: 5,
                received: 3
            }
        ));
        assert!(err.is_remote_unavailable());
    }

    #[tokio::test]
    async fn test_collect_pages_empty_collection() {
        let all = collect_pages(2, |offset, limit| capped_page(&[], 10, Some(0), offset, limit))
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_scan_log_row_status() {
        let entry = ScanLogEntry::new("Unknown", Utc::now(), ScanOutcome::Invalid);
        let row = RemoteScanLogRow::from(&entry);
        assert_eq!(row.status, "invalid");
        assert_eq!(ScanLogEntry::try_from(row).unwrap(), entry);

        let bad = RemoteScanLogRow {
            token_id: "TOKEN_0001".into(),
            status: "maybe".into(),
            scanned_at: Utc::now(),
        };
        assert!(ScanLogEntry::try_from(bad).is_err());
    }
}
