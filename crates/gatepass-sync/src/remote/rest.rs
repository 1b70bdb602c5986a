//! # REST Remote
//!
//! [`RemoteStore`] over a PostgREST-style HTTP API.
//!
//! ## Requests
//! ```text
//! fetch_token_page      GET    /rest/v1/tokens?select=*&order=id.asc&limit=<n>&offset=<k>
//!                              Prefer: count=exact  → Content-Range: 0-999/2500
//! upsert_tokens         POST   /rest/v1/tokens?on_conflict=id   (merge-duplicates)
//! mark_token_used       PATCH  /rest/v1/tokens?id=eq.<id>
//! reset_token_usage     PATCH  /rest/v1/tokens?is_used=eq.true
//! delete_all_tokens     DELETE /rest/v1/tokens?id=not.is.null
//! insert_scan_log       POST   /rest/v1/scan_logs
//! fetch_scan_logs       GET    /rest/v1/scan_logs?select=*&order=scanned_at.desc&limit=<n>
//! delete_all_scan_logs  DELETE /rest/v1/scan_logs?token_id=not.is.null
//! ```
//! Bulk deletes need a filter that matches every row; the API refuses an
//! unfiltered DELETE.
//!
//! The server caps rows per response, so `fetch_tokens` walks pages and
//! checks the count against the `Content-Range` total.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{RemoteScanLogRow, RemoteStore, RemoteTokenRow, RowPage};
use crate::error::{SyncError, SyncResult};

const TOKENS_TABLE: &str = "tokens";
const SCAN_LOGS_TABLE: &str = "scan_logs";

/// HTTP client for the remote REST API.
#[derive(Debug, Clone)]
pub struct RestRemote {
    http: reqwest::Client,
    base_url: Url,
}

impl RestRemote {
    /// Creates a client for `base_url` authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: Option<&str>) -> SyncResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "Remote URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let invalid = |_| SyncError::InvalidConfig("api_key contains invalid characters".into());
            headers.insert(
                HeaderName::from_static("apikey"),
                HeaderValue::from_str(key).map_err(invalid)?,
            );
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(RestRemote { http, base_url })
    }

    /// Builds `<base>/rest/v1/<table>?<query>`.
    fn table_url(&self, table: &str, query: &[(&str, String)]) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends a request, mapping non-success statuses to `RemoteStatus`.
    async fn send(&self, request: reqwest::RequestBuilder) -> SyncResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
            return Err(SyncError::RemoteStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

/// Reads the collection size from a `Content-Range` value such as
/// `0-999/2500` or `*/0`. `None` when the server did not count.
fn content_range_total(value: &str) -> Option<usize> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl RemoteStore for RestRemote {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_token_page(&self, offset: usize, limit: usize) -> SyncResult<RowPage<RemoteTokenRow>> {
        let url = self.table_url(
            TOKENS_TABLE,
            &[
                ("select", "*".into()),
                ("order", "id.asc".into()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )?;
        let response = self
            .send(self.http.get(url).header("Prefer", "count=exact"))
            .await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        let rows: Vec<RemoteTokenRow> = response.json().await?;

        debug!(rows = rows.len(), offset, ?total, "Fetched remote token page");
        Ok(RowPage::new(rows, total))
    }

    async fn upsert_tokens(&self, rows: &[RemoteTokenRow]) -> SyncResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(TOKENS_TABLE, &[("on_conflict", "id".into())])?;
        self.send(
            self.http
                .post(url)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(rows),
        )
        .await?;
        Ok(())
    }

    async fn mark_token_used(&self, token_id: &str, at: DateTime<Utc>) -> SyncResult<()> {
        let url = self.table_url(TOKENS_TABLE, &[("id", format!("eq.{}", token_id))])?;
        self.send(
            self.http
                .patch(url)
                .json(&json!({ "is_used": true, "scanned_at": at })),
        )
        .await?;
        Ok(())
    }

    async fn reset_token_usage(&self) -> SyncResult<()> {
        let url = self.table_url(TOKENS_TABLE, &[("is_used", "eq.true".into())])?;
        self.send(
            self.http
                .patch(url)
                .json(&json!({ "is_used": false, "scanned_at": null })),
        )
        .await?;
        Ok(())
    }

    async fn delete_all_tokens(&self) -> SyncResult<()> {
        let url = self.table_url(TOKENS_TABLE, &[("id", "not.is.null".into())])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn insert_scan_log(&self, row: &RemoteScanLogRow) -> SyncResult<()> {
        let url = self.table_url(SCAN_LOGS_TABLE, &[])?;
        self.send(
            self.http
                .post(url)
                .header("Prefer", "return=minimal")
                .json(row),
        )
        .await?;
        Ok(())
    }

    async fn fetch_scan_logs(&self, limit: usize) -> SyncResult<Vec<RemoteScanLogRow>> {
        let url = self.table_url(
            SCAN_LOGS_TABLE,
            &[
                ("select", "*".into()),
                ("order", "scanned_at.desc".into()),
                ("limit", limit.to_string()),
            ],
        )?;
        let rows: Vec<RemoteScanLogRow> = self.send(self.http.get(url)).await?.json().await?;
        debug!(rows = rows.len(), limit, "Fetched remote scan logs");
        Ok(rows)
    }

    async fn delete_all_scan_logs(&self) -> SyncResult<()> {
        let url = self.table_url(SCAN_LOGS_TABLE, &[("token_id", "not.is.null".into())])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}
