//! # Token Store
//!
//! The dual-tier home of token records.
//!
//! ## Write Path
//! ```text
//! generate_batch / mark_used / reset_usage / wipe_all
//!       │
//!       ├─► local cache (generatedTokens + usedTokens, one transaction)
//!       │
//!       └─► reconciler.submit(RemoteWrite)   best effort, not awaited
//! ```
//! A failed local write is logged and the remote write still goes out, so
//! an operator action always completes.
//!
//! ## Read Path
//! `get_all(true)` asks the remote first and overwrites the cache with a
//! non-empty answer; anything else serves the cache. A cache that cannot be
//! read is logged and served as empty.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use gatepass_core::validation::{format_token_id, sequence_range, validate_generation_count};
use gatepass_core::{HashAuthenticator, IssuedToken, ScanPayload, TokenMap, TokenRecord};
use gatepass_db::{BlobKey, BlobRepository, Database, TokenCacheRepository};

use crate::error::SyncResult;
use crate::policy::Reconciler;
use crate::remote::RemoteTokenRow;
use crate::writer::RemoteWrite;

/// Token records, kept locally and mirrored remotely.
#[derive(Debug, Clone)]
pub struct TokenStore {
    cache: TokenCacheRepository,
    blobs: BlobRepository,
    reconciler: Reconciler,
    auth: HashAuthenticator,
    batch: i64,
}

impl TokenStore {
    /// Creates a store over `db`'s cache.
    ///
    /// `batch` is the marker written into every issued payload.
    pub fn new(db: &Database, reconciler: Reconciler, auth: HashAuthenticator, batch: i64) -> Self {
        TokenStore {
            cache: db.token_cache(),
            blobs: db.blobs(),
            reconciler,
            auth,
            batch,
        }
    }

    pub fn authenticator(&self) -> &HashAuthenticator {
        &self.auth
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns every known token.
    ///
    /// With `prefer_remote`, a non-empty remote answer replaces the local
    /// cache wholesale and is returned. Otherwise the last local snapshot is
    /// returned.
    pub async fn get_all(&self, prefer_remote: bool) -> TokenMap {
        let fetched = self
            .reconciler
            .fetch("tokens", prefer_remote, |remote| async move {
                remote.fetch_tokens().await
            })
            .await;

        if let Some(rows) = fetched {
            let tokens: TokenMap = rows
                .into_iter()
                .map(|row| {
                    let record = row.into_record();
                    (record.id.clone(), record)
                })
                .collect();

            if let Err(e) = self.cache.save_tokens(&tokens).await {
                error!(error = %e, "Failed to overwrite token cache with remote snapshot");
            }
            return tokens;
        }

        self.load_local().await
    }

    /// Returns true if `token_id` is in the local used index.
    pub async fn is_used(&self, token_id: &str) -> bool {
        match self.cache.load_used().await {
            Ok(used) => used.get(token_id).copied().unwrap_or(false),
            Err(e) => {
                error!(token_id = %token_id, error = %e, "Failed to read used index");
                false
            }
        }
    }

    async fn load_local(&self) -> TokenMap {
        self.cache.load_tokens().await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to read token cache, treating it as empty");
            TokenMap::new()
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Issues `count` new tokens titled `title`.
    ///
    /// Ids continue after the highest sequence currently known (remote first),
    /// so a batch never reuses an id. Only invalid input fails the call: a
    /// local write failure is logged and the batch is still mirrored remotely
    /// and returned.
    pub async fn generate_batch(&self, count: u32, title: &str) -> SyncResult<Vec<IssuedToken>> {
        let count = validate_generation_count(i64::from(count))?;

        let mut tokens = self.get_all(true).await;
        let sequences = sequence_range(tokens.keys().map(String::as_str), count)?;
        let first = sequences.start;

        let issued: Vec<IssuedToken> = sequences
            .map(|sequence| {
                let id = format_token_id(sequence);
                IssuedToken {
                    record: TokenRecord::issue(&self.auth, id.clone(), title),
                    payload: ScanPayload::issue(&self.auth, &id, self.batch),
                }
            })
            .collect();

        for token in &issued {
            tokens.insert(token.record.id.clone(), token.record.clone());
        }
        if let Err(e) = self.cache.save_tokens(&tokens).await {
            error!(count, error = %e, "Failed to store generated batch locally");
        }

        let rows = issued
            .iter()
            .map(|t| RemoteTokenRow::from_record(&t.record, self.auth.event_name()))
            .collect();
        self.reconciler.submit(RemoteWrite::UpsertTokens(rows));

        info!(
            count,
            first = %format_token_id(first),
            title = %title,
            "Token batch generated"
        );
        Ok(issued)
    }

    /// Redeems `token_id`.
    ///
    /// Unknown ids are logged and ignored. Redeeming an already used token
    /// changes nothing.
    pub async fn mark_used(&self, token_id: &str) {
        let mut tokens = self.load_local().await;
        let Some(record) = tokens.get_mut(token_id) else {
            warn!(token_id = %token_id, "mark_used on unknown token ignored");
            return;
        };

        let at = Utc::now();
        if !record.redeem(at) {
            debug!(token_id = %token_id, "Token already used");
            return;
        }

        if let Err(e) = self.cache.save_tokens(&tokens).await {
            error!(token_id = %token_id, error = %e, "Failed to persist redemption locally");
        }

        self.reconciler.submit(RemoteWrite::MarkTokenUsed {
            token_id: token_id.to_string(),
            at,
        });
        debug!(token_id = %token_id, "Token marked used");
    }

    /// Returns every token to the unscanned state, keeping ids, hashes and
    /// titles.
    pub async fn reset_usage(&self) {
        let mut tokens = self.load_local().await;
        for record in tokens.values_mut() {
            record.clear_usage();
        }
        if let Err(e) = self.cache.save_tokens(&tokens).await {
            error!(error = %e, "Failed to reset token usage locally");
        }
        self.reconciler.submit(RemoteWrite::ResetTokenUsage);

        info!(tokens = tokens.len(), "Token usage reset");
    }

    /// Deletes every token and every scan log, locally and remotely.
    ///
    /// The three local blobs are removed in one transaction.
    pub async fn wipe_all(&self) {
        if let Err(e) = self.blobs.remove_many(&BlobKey::ALL).await {
            error!(error = %e, "Failed to wipe local cache");
        }
        self.reconciler.submit(RemoteWrite::DeleteAllTokens);
        self.reconciler.submit(RemoteWrite::DeleteAllScanLogs);

        info!("All tokens and scan logs deleted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ReconcilePolicy;
    use crate::remote::memory::MemoryRemote;
    use crate::remote::RemoteStore;
    use gatepass_core::PayloadClaim;
    use gatepass_db::DbConfig;
    use std::sync::Arc;

    async fn setup() -> (TokenStore, Arc<MemoryRemote>, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let reconciler = Reconciler::new(remote.clone(), ReconcilePolicy::RemoteFirst);
        let auth = HashAuthenticator::new("SECRET_KEY_123", "FRESHERS2025");
        (TokenStore::new(&db, reconciler, auth, 1), remote, db)
    }

    #[tokio::test]
    async fn test_generate_sequential_ids() {
        let (store, _, _) = setup().await;

        let first = store.generate_batch(3, "Gala").await.unwrap();
        let ids: Vec<_> = first.iter().map(|t| t.record.id.as_str()).collect();
        assert_eq!(ids, vec!["TOKEN_0001", "TOKEN_0002", "TOKEN_0003"]);

        let second = store.generate_batch(2, "Gala").await.unwrap();
        assert_eq!(second[0].record.id, "TOKEN_0004");
        assert_eq!(second[1].record.id, "TOKEN_0005");
    }

    #[tokio::test]
    async fn test_generated_payloads_verify() {
        let (store, _, _) = setup().await;
        let issued = store.generate_batch(2, "Gala").await.unwrap();

        for token in &issued {
            assert_eq!(token.payload.token, token.record.id);
            assert_eq!(token.payload.hash, token.record.hash);
            assert_eq!(token.payload.batch, 1);
            let claim = PayloadClaim::parse(&token.payload.to_qr_text()).unwrap();
            assert!(store.authenticator().verify(&claim));
        }
    }

    #[tokio::test]
    async fn test_zero_count_rejected() {
        let (store, _, _) = setup().await;
        assert!(store.generate_batch(0, "Gala").await.is_err());
        assert!(store.get_all(false).await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_mirrors_to_remote() {
        let (store, remote, _) = setup().await;
        store.generate_batch(2, "Gala").await.unwrap();
        store.reconciler.writer().flush().await;

        let rows = remote.token_rows().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event_name, "FRESHERS2025");
        assert_eq!(rows[0].title, "Gala");
    }

    #[tokio::test]
    async fn test_mark_used_sets_index_and_timestamp() {
        let (store, remote, _) = setup().await;
        store.generate_batch(2, "Gala").await.unwrap();

        assert!(!store.is_used("TOKEN_0002").await);
        store.mark_used("TOKEN_0002").await;
        assert!(store.is_used("TOKEN_0002").await);
        assert!(!store.is_used("TOKEN_0001").await);

        let tokens = store.get_all(false).await;
        let record = &tokens["TOKEN_0002"];
        assert!(record.used);
        assert!(record.scanned_at.is_some());

        store.reconciler.writer().flush().await;
        let rows = remote.token_rows().await;
        assert!(rows.iter().any(|r| r.id == "TOKEN_0002" && r.is_used));
    }

    #[tokio::test]
    async fn test_mark_used_twice_keeps_first_timestamp() {
        let (store, _, _) = setup().await;
        store.generate_batch(1, "Gala").await.unwrap();

        store.mark_used("TOKEN_0001").await;
        let first = store.get_all(false).await["TOKEN_0001"].scanned_at;
        store.mark_used("TOKEN_0001").await;
        let second = store.get_all(false).await["TOKEN_0001"].scanned_at;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mark_used_unknown_is_ignored() {
        let (store, _, _) = setup().await;
        store.generate_batch(1, "Gala").await.unwrap();

        store.mark_used("TOKEN_9999").await;
        let tokens = store.get_all(false).await;
        assert_eq!(tokens.len(), 1);
        assert!(!store.is_used("TOKEN_9999").await);
    }

    #[tokio::test]
    async fn test_remote_unavailable_serves_last_snapshot() {
        let (store, remote, _) = setup().await;
        store.generate_batch(3, "Gala").await.unwrap();
        let before = store.get_all(true).await;
        assert_eq!(before.len(), 3);

        remote.set_available(false);
        let after = store.get_all(true).await;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_remote_read_overwrites_local() {
        let (store, remote, _) = setup().await;
        store.generate_batch(2, "Gala").await.unwrap();
        store.reconciler.writer().flush().await;

        // Another station redeemed TOKEN_0001.
        remote.mark_token_used("TOKEN_0001", Utc::now()).await.unwrap();

        let tokens = store.get_all(true).await;
        assert!(tokens["TOKEN_0001"].used);
        assert!(store.is_used("TOKEN_0001").await);
    }

    #[tokio::test]
    async fn test_offline_redemption_is_overwritten_by_remote() {
        let (store, remote, _) = setup().await;
        store.generate_batch(1, "Gala").await.unwrap();
        store.reconciler.writer().flush().await;

        remote.set_available(false);
        store.mark_used("TOKEN_0001").await;
        store.reconciler.writer().flush().await;
        remote.set_available(true);

        // The remote never heard about the redemption; its snapshot wins.
        let tokens = store.get_all(true).await;
        assert!(!tokens["TOKEN_0001"].used);
    }

    #[tokio::test]
    async fn test_reset_usage_keeps_records() {
        let (store, remote, _) = setup().await;
        store.generate_batch(2, "Gala").await.unwrap();
        store.mark_used("TOKEN_0001").await;
        let before = store.get_all(false).await;

        store.reset_usage().await;

        let after = store.get_all(true).await;
        assert_eq!(after.len(), 2);
        for (id, record) in &after {
            assert!(!record.used);
            assert!(record.scanned_at.is_none());
            assert_eq!(record.hash, before[id].hash);
            assert_eq!(record.title, before[id].title);
        }
        assert!(!store.is_used("TOKEN_0001").await);
        assert!(remote.token_rows().await.iter().all(|r| !r.is_used));
    }

    #[tokio::test]
    async fn test_wipe_then_generate_restarts_numbering() {
        let (store, remote, _) = setup().await;
        store.generate_batch(3, "Gala").await.unwrap();

        store.wipe_all().await;
        let issued = store.generate_batch(2, "Gala").await.unwrap();

        let ids: Vec<_> = issued.iter().map(|t| t.record.id.as_str()).collect();
        assert_eq!(ids, vec!["TOKEN_0001", "TOKEN_0002"]);
        store.reconciler.writer().flush().await;
        assert_eq!(remote.token_rows().await.len(), 2);
    }

    #[tokio::test]
    async fn test_wipe_removes_every_blob_together() {
        let (store, remote, db) = setup().await;
        store.generate_batch(2, "Gala").await.unwrap();
        store.mark_used("TOKEN_0001").await;
        db.blobs().put_raw("scanLogs", "[]").await.unwrap();
        store.reconciler.writer().flush().await;
        remote
            .insert_scan_log(&crate::remote::RemoteScanLogRow {
                token_id: "TOKEN_0001".into(),
                status: "valid".into(),
                scanned_at: Utc::now(),
            })
            .await
            .unwrap();

        store.wipe_all().await;
        store.reconciler.writer().flush().await;

        let blobs = db.blobs();
        for key in BlobKey::ALL {
            assert!(blobs.get_raw(key.as_str()).await.unwrap().is_none(), "{key} left behind");
        }
        assert!(remote.token_rows().await.is_empty());
        assert!(remote.scan_log_rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_reads_every_remote_page() {
        let (store, remote, _) = setup().await;
        remote.set_row_cap(Some(3));

        store.generate_batch(3, "Gala").await.unwrap();
        store.reconciler.writer().flush().await;
        store.generate_batch(2, "Gala").await.unwrap();
        store.reconciler.writer().flush().await;
        store.mark_used("TOKEN_0004").await;
        store.reconciler.writer().flush().await;

        let tokens = store.get_all(true).await;
        assert_eq!(tokens.len(), 5);
        assert!(tokens["TOKEN_0004"].used);

        let next = store.generate_batch(1, "After").await.unwrap();
        assert_eq!(next[0].record.id, "TOKEN_0006");
        store.reconciler.writer().flush().await;

        let rows = remote.token_rows().await;
        assert_eq!(rows.len(), 6);
        let redeemed = rows.iter().find(|r| r.id == "TOKEN_0004").unwrap();
        assert!(redeemed.is_used);
        assert_eq!(redeemed.title, "Gala");
    }

    #[tokio::test]
    async fn test_generation_past_last_sequence_is_rejected() {
        let (store, remote, _) = setup().await;
        remote
            .upsert_tokens(&[RemoteTokenRow {
                id: "TOKEN_18446744073709551615".into(),
                hash: "h".into(),
                is_used: false,
                scanned_at: None,
                title: "Gala".into(),
                event_name: "FRESHERS2025".into(),
            }])
            .await
            .unwrap();

        let err = store.generate_batch(1, "Gala").await.unwrap_err();
        assert!(matches!(err, crate::SyncError::Validation(_)));
    }

    #[tokio::test]
    async fn test_local_write_failure_still_issues_and_mirrors() {
        let (store, remote, db) = setup().await;
        db.close().await;

        let issued = store.generate_batch(2, "Gala").await.unwrap();
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[0].record.id, "TOKEN_0001");

        store.reset_usage().await;
        store.reconciler.writer().flush().await;
        assert_eq!(remote.token_rows().await.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupted_cache_reads_as_empty() {
        let (store, remote, db) = setup().await;
        remote.set_available(false);
        db.blobs().put_raw("generatedTokens", "{oops").await.unwrap();

        assert!(store.get_all(true).await.is_empty());
    }

    #[tokio::test]
    async fn test_local_only_never_touches_remote() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let auth = HashAuthenticator::new("k", "EVT");
        let store = TokenStore::new(&db, Reconciler::local_only(), auth, 1);

        store.generate_batch(2, "Gala").await.unwrap();
        store.mark_used("TOKEN_0001").await;
        assert_eq!(store.get_all(true).await.len(), 2);
    }
}
