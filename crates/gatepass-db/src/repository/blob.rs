//! # Blob Repository
//!
//! Named JSON documents stored in `local_blobs`.
//!
//! Every local collection is kept as a single document that is read and
//! written whole. Documents are addressed by [`BlobKey`].

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Well-known blob names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKey {
    /// Map of token id to token record.
    GeneratedTokens,
    /// Map of token id to `true` for redeemed tokens.
    UsedTokens,
    /// Scan log entries, newest first.
    ScanLogs,
}

impl BlobKey {
    /// Every key, in the order a full wipe removes them.
    pub const ALL: [BlobKey; 3] = [BlobKey::GeneratedTokens, BlobKey::UsedTokens, BlobKey::ScanLogs];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKey::GeneratedTokens => "generatedTokens",
            BlobKey::UsedTokens => "usedTokens",
            BlobKey::ScanLogs => "scanLogs",
        }
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const UPSERT_SQL: &str = r#"
    INSERT INTO local_blobs (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

/// Repository for raw blob access.
#[derive(Debug, Clone)]
pub struct BlobRepository {
    pool: SqlitePool,
}

impl BlobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BlobRepository { pool }
    }

    /// Reads a blob as text. `None` when the key has never been written.
    pub async fn get_raw(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM local_blobs WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Writes a blob as text, replacing any previous value.
    pub async fn put_raw(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(key = %key, bytes = value.len(), "Blob written");
        Ok(())
    }

    /// Reads and decodes a blob.
    ///
    /// ## Returns
    /// * `Ok(None)` - key absent
    /// * `Err(DbError::Serialization)` - stored text is not a valid document
    pub async fn get_json<T: DeserializeOwned>(&self, key: BlobKey) -> DbResult<Option<T>> {
        match self.get_raw(key.as_str()).await? {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| DbError::serialization(key.as_str(), e)),
        }
    }

    /// Encodes and writes a blob.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: BlobKey, value: &T) -> DbResult<()> {
        let text = encode(key, value)?;
        self.put_raw(key.as_str(), &text).await
    }

    /// Writes several pre-encoded blobs atomically.
    pub async fn put_many(&self, entries: &[(BlobKey, String)]) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        for (key, text) in entries {
            sqlx::query(UPSERT_SQL)
                .bind(key.as_str())
                .bind(text)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = entries.len(), "Blobs written in one transaction");
        Ok(())
    }

    /// Deletes a blob. Deleting an absent key is not an error.
    pub async fn remove(&self, key: BlobKey) -> DbResult<()> {
        sqlx::query("DELETE FROM local_blobs WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        debug!(key = %key, "Blob removed");
        Ok(())
    }

    /// Deletes several blobs atomically.
    pub async fn remove_many(&self, keys: &[BlobKey]) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for key in keys {
            sqlx::query("DELETE FROM local_blobs WHERE key = ?1")
                .bind(key.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

/// Encodes a value for storage under `key`.
pub(crate) fn encode<T: Serialize + ?Sized>(key: BlobKey, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::serialization(key.as_str(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::collections::BTreeMap;

    async fn repo() -> BlobRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().blobs()
    }

    #[test]
    fn test_key_names() {
        assert_eq!(BlobKey::GeneratedTokens.as_str(), "generatedTokens");
        assert_eq!(BlobKey::UsedTokens.as_str(), "usedTokens");
        assert_eq!(BlobKey::ScanLogs.to_string(), "scanLogs");
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let repo = repo().await;
        let value: Option<Vec<u32>> = repo.get_json(BlobKey::ScanLogs).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let repo = repo().await;
        repo.put_json(BlobKey::ScanLogs, &vec![1, 2]).await.unwrap();
        repo.put_json(BlobKey::ScanLogs, &vec![3]).await.unwrap();

        let value: Option<Vec<u32>> = repo.get_json(BlobKey::ScanLogs).await.unwrap();
        assert_eq!(value, Some(vec![3]));
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_serialization_error() {
        let repo = repo().await;
        repo.put_raw("usedTokens", "{not json").await.unwrap();

        let err = repo
            .get_json::<BTreeMap<String, bool>>(BlobKey::UsedTokens)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Serialization { ref key, .. } if key == "usedTokens"));
    }

    #[tokio::test]
    async fn test_put_many_and_remove_many() {
        let repo = repo().await;
        repo.put_many(&[
            (BlobKey::GeneratedTokens, "{}".to_string()),
            (BlobKey::UsedTokens, "{}".to_string()),
            (BlobKey::ScanLogs, "[]".to_string()),
        ])
        .await
        .unwrap();

        repo.remove_many(&[BlobKey::GeneratedTokens, BlobKey::UsedTokens])
            .await
            .unwrap();

        assert!(repo.get_raw("generatedTokens").await.unwrap().is_none());
        assert!(repo.get_raw("usedTokens").await.unwrap().is_none());
        assert_eq!(repo.get_raw("scanLogs").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_remove_all_keys() {
        let repo = repo().await;
        repo.put_many(&[
            (BlobKey::GeneratedTokens, "{}".to_string()),
            (BlobKey::ScanLogs, "[]".to_string()),
        ])
        .await
        .unwrap();

        repo.remove_many(&BlobKey::ALL).await.unwrap();

        for key in BlobKey::ALL {
            assert!(repo.get_raw(key.as_str()).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let repo = repo().await;
        repo.remove(BlobKey::ScanLogs).await.unwrap();
    }
}
