//! # Scan Log Cache Repository
//!
//! Local copy of the scan history, stored newest first.

use gatepass_core::ScanLogEntry;
use tracing::debug;

use super::blob::{BlobKey, BlobRepository};
use crate::error::DbResult;

/// Repository for the cached scan log.
#[derive(Debug, Clone)]
pub struct ScanLogCacheRepository {
    blobs: BlobRepository,
}

impl ScanLogCacheRepository {
    pub fn new(blobs: BlobRepository) -> Self {
        ScanLogCacheRepository { blobs }
    }

    /// Loads all cached entries, newest first.
    pub async fn load(&self) -> DbResult<Vec<ScanLogEntry>> {
        Ok(self
            .blobs
            .get_json(BlobKey::ScanLogs)
            .await?
            .unwrap_or_default())
    }

    /// Puts `entry` at the head of the log.
    pub async fn prepend(&self, entry: &ScanLogEntry) -> DbResult<()> {
        let mut entries = self.load().await?;
        entries.insert(0, entry.clone());
        self.replace(&entries).await?;

        debug!(token_id = %entry.token_id, total = entries.len(), "Scan log entry cached");
        Ok(())
    }

    /// Overwrites the whole log.
    pub async fn replace(&self, entries: &[ScanLogEntry]) -> DbResult<()> {
        self.blobs.put_json(BlobKey::ScanLogs, entries).await
    }

    pub async fn clear(&self) -> DbResult<()> {
        self.blobs.remove(BlobKey::ScanLogs).await
    }
}
