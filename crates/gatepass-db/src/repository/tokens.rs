//! # Token Cache Repository
//!
//! Local copy of the token map and the used index.
//!
//! ## Two Blobs, One Write
//! ```text
//! generatedTokens  {"TOKEN_0001": {id, hash, used, scannedAt, title}, ...}
//! usedTokens       {"TOKEN_0001": true, ...}
//! ```
//! The used index is a lookup table derived from the token map. Both blobs
//! are written together by [`TokenCacheRepository::save_all`] so a crash can
//! never leave one updated without the other.

use std::collections::BTreeMap;

use gatepass_core::TokenMap;
use tracing::debug;

use super::blob::{encode, BlobKey, BlobRepository};
use crate::error::DbResult;

/// Token id → `true` for every redeemed token.
pub type UsedIndex = BTreeMap<String, bool>;

/// Builds the used index for `tokens`.
pub fn used_index_of(tokens: &TokenMap) -> UsedIndex {
    tokens
        .values()
        .filter(|record| record.used)
        .map(|record| (record.id.clone(), true))
        .collect()
}

/// Repository for the cached token map.
#[derive(Debug, Clone)]
pub struct TokenCacheRepository {
    blobs: BlobRepository,
}

impl TokenCacheRepository {
    pub fn new(blobs: BlobRepository) -> Self {
        TokenCacheRepository { blobs }
    }

    /// Loads the token map. Empty when nothing has been generated yet.
    pub async fn load_tokens(&self) -> DbResult<TokenMap> {
        Ok(self
            .blobs
            .get_json(BlobKey::GeneratedTokens)
            .await?
            .unwrap_or_default())
    }

    /// Loads the used index. Empty when nothing has been redeemed yet.
    pub async fn load_used(&self) -> DbResult<UsedIndex> {
        Ok(self
            .blobs
            .get_json(BlobKey::UsedTokens)
            .await?
            .unwrap_or_default())
    }

    /// Replaces both blobs in one transaction.
    pub async fn save_all(&self, tokens: &TokenMap, used: &UsedIndex) -> DbResult<()> {
        let entries = [
            (BlobKey::GeneratedTokens, encode(BlobKey::GeneratedTokens, tokens)?),
            (BlobKey::UsedTokens, encode(BlobKey::UsedTokens, used)?),
        ];
        self.blobs.put_many(&entries).await?;

        debug!(tokens = tokens.len(), used = used.len(), "Token cache saved");
        Ok(())
    }

    /// Replaces the token map and rebuilds the used index from it.
    pub async fn save_tokens(&self, tokens: &TokenMap) -> DbResult<()> {
        self.save_all(tokens, &used_index_of(tokens)).await
    }
}
