//! # Domain Types
//!
//! Core domain types used throughout Gatepass.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  TokenRecord    │   │  ScanPayload    │   │  ScanLogEntry   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  event          │   │  tokenId        │       │
//! │  │  hash           │   │  token ─────────┼──►│  time           │       │
//! │  │  used           │   │  batch          │   │  type           │       │
//! │  │  scannedAt      │   │  hash           │   │                 │       │
//! │  │  title          │   │  (QR contents)  │   │  (append-only)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ScanOutcome    │   │     Signal      │   │     Stats       │       │
//! │  │  Valid          │──►│  Success        │   │  (derived only, │       │
//! │  │  Duplicate      │──►│  Warning        │   │   never stored) │       │
//! │  │  Invalid        │──►│  Error          │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token Record Invariants
//! - `used == true` exactly when `scanned_at` is set
//! - `hash == digest(secret + id)`; records are only built through
//!   [`TokenRecord::issue`], which computes it

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::HashAuthenticator;

/// All known token records keyed by token id, in id order.
pub type TokenMap = BTreeMap<String, TokenRecord>;

// =============================================================================
// Token Record
// =============================================================================

/// A single-use entry credential.
///
/// The serialized shape (camelCase, millisecond timestamps) is the shape kept
/// in the local `generatedTokens` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// `TOKEN_<zero-padded sequence>`.
    pub id: String,

    /// Hex digest binding the id to the installation secret.
    pub hash: String,

    /// Whether the token has been redeemed.
    pub used: bool,

    /// When the token was redeemed.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub scanned_at: Option<DateTime<Utc>>,

    /// Display label printed above the QR code.
    pub title: String,
}

impl TokenRecord {
    /// Creates a fresh, unused record for `id`.
    pub fn issue(auth: &HashAuthenticator, id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        TokenRecord {
            hash: auth.digest(&id),
            id,
            used: false,
            scanned_at: None,
            title: title.into(),
        }
    }

    /// Redeems the record. Returns `false` if it was already used.
    pub fn redeem(&mut self, at: DateTime<Utc>) -> bool {
        if self.used {
            return false;
        }
        self.used = true;
        self.scanned_at = Some(at);
        true
    }

    /// Returns the record to the unscanned state, keeping id, hash and title.
    pub fn clear_usage(&mut self) {
        self.used = false;
        self.scanned_at = None;
    }
}

/// A freshly generated token together with the payload to encode as a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IssuedToken {
    pub record: TokenRecord,
    pub payload: ScanPayload,
}

// =============================================================================
// Scan Payload
// =============================================================================

/// The JSON document carried by a QR code: `{event, token, batch, hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanPayload {
    pub event: String,
    pub token: String,
    pub batch: i64,
    pub hash: String,
}

impl ScanPayload {
    /// Builds the authentic payload for `token_id`.
    pub fn issue(auth: &HashAuthenticator, token_id: &str, batch: i64) -> Self {
        ScanPayload {
            event: auth.event_name().to_string(),
            token: token_id.to_string(),
            batch,
            hash: auth.digest(token_id),
        }
    }

    /// Renders the text handed to a QR encoder.
    pub fn to_qr_text(&self) -> String {
        // A struct of strings and an integer always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// What a scanned document claims to be, before any of it is trusted.
///
/// Every field is optional: a structurally valid JSON object with missing or
/// extra fields still parses, and [`HashAuthenticator::verify`] decides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayloadClaim {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub batch: Option<serde_json::Value>,
}

/// Why a scanned string could not be read as a payload claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    /// The text is not JSON at all.
    NotJson,
    /// The text is JSON but not a payload-shaped object.
    Malformed,
}

impl PayloadClaim {
    /// Parses decoded QR text.
    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let value: serde_json::Value =
            serde_json::from_str(raw.trim()).map_err(|_| ClaimError::NotJson)?;
        // Serde would otherwise accept a positional array for a struct.
        if !value.is_object() {
            return Err(ClaimError::Malformed);
        }
        serde_json::from_value(value).map_err(|_| ClaimError::Malformed)
    }
}

impl From<ScanPayload> for PayloadClaim {
    fn from(p: ScanPayload) -> Self {
        PayloadClaim {
            event: Some(p.event),
            token: Some(p.token),
            hash: Some(p.hash),
            batch: Some(serde_json::Value::from(p.batch)),
        }
    }
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// Terminal classification of one scan attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Authentic, known, and redeemed by this scan.
    Valid,
    /// Authentic and known, but already redeemed.
    Duplicate,
    /// Unreadable, tampered, or never issued.
    Invalid,
}

impl ScanOutcome {
    /// The user-facing signal class for this outcome.
    pub fn signal(&self) -> Signal {
        match self {
            ScanOutcome::Valid => Signal::Success,
            ScanOutcome::Duplicate => Signal::Warning,
            ScanOutcome::Invalid => Signal::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Valid => "valid",
            ScanOutcome::Duplicate => "duplicate",
            ScanOutcome::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanOutcome {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(ScanOutcome::Valid),
            "duplicate" => Ok(ScanOutcome::Duplicate),
            "invalid" => Ok(ScanOutcome::Invalid),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown scan status '{}'", other),
            }),
        }
    }
}

/// Feedback class a front-end renders for an outcome (green/amber/red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Success,
    Warning,
    Error,
}

// =============================================================================
// Scan Log Entry
// =============================================================================

/// One scan attempt. Immutable once created.
///
/// The serialized shape matches the local `scanLogs` blob: `{tokenId, time, type}`
/// with `time` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanLogEntry {
    /// The token id, or a sentinel for unreadable input.
    pub token_id: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub time: DateTime<Utc>,

    #[serde(rename = "type")]
    pub outcome: ScanOutcome,
}

impl ScanLogEntry {
    pub fn new(token_id: impl Into<String>, time: DateTime<Utc>, outcome: ScanOutcome) -> Self {
        ScanLogEntry {
            token_id: token_id.into(),
            time,
            outcome,
        }
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Summary figures recomputed from the stores on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_generated: usize,
    pub remaining: usize,
    pub valid_scans: usize,
    pub duplicate_scans: usize,
    pub invalid_scans: usize,
}

impl Stats {
    /// Derives the figures from token records and log entries.
    pub fn compute<'a>(
        tokens: impl IntoIterator<Item = &'a TokenRecord>,
        logs: impl IntoIterator<Item = &'a ScanLogEntry>,
    ) -> Self {
        let mut stats = Stats::default();

        let mut used = 0;
        for token in tokens {
            stats.total_generated += 1;
            if token.used {
                used += 1;
            }
        }
        stats.remaining = stats.total_generated - used;

        for entry in logs {
            match entry.outcome {
                ScanOutcome::Valid => stats.valid_scans += 1,
                ScanOutcome::Duplicate => stats.duplicate_scans += 1,
                ScanOutcome::Invalid => stats.invalid_scans += 1,
            }
        }

        stats
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn auth() -> HashAuthenticator {
        HashAuthenticator::new("SECRET_KEY_123", "FRESHERS2025")
    }

    #[test]
    fn test_issue_record_is_unused_with_digest() {
        let record = TokenRecord::issue(&auth(), "TOKEN_0001", "Gala");
        assert!(!record.used);
        assert!(record.scanned_at.is_none());
        assert_eq!(record.hash, auth().digest("TOKEN_0001"));
        assert_eq!(record.title, "Gala");
    }

    #[test]
    fn test_redeem_sets_scanned_at_once() {
        let mut record = TokenRecord::issue(&auth(), "TOKEN_0001", "Gala");
        let first = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let second = Utc.timestamp_millis_opt(1_700_000_100_000).unwrap();

        assert!(record.redeem(first));
        assert!(!record.redeem(second));
        assert!(record.used);
        assert_eq!(record.scanned_at, Some(first));

        record.clear_usage();
        assert!(!record.used);
        assert!(record.scanned_at.is_none());
        assert_eq!(record.hash, auth().digest("TOKEN_0001"));
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = ScanPayload::issue(&auth(), "TOKEN_0007", 1);
        let text = payload.to_qr_text();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "FRESHERS2025");
        assert_eq!(value["token"], "TOKEN_0007");
        assert_eq!(value["batch"], 1);
        assert_eq!(value["hash"], auth().digest("TOKEN_0007"));
    }

    #[test]
    fn test_claim_parse_classification() {
        assert_eq!(PayloadClaim::parse("not json"), Err(ClaimError::NotJson));
        assert_eq!(PayloadClaim::parse(""), Err(ClaimError::NotJson));
        assert_eq!(PayloadClaim::parse("null"), Err(ClaimError::Malformed));
        assert_eq!(PayloadClaim::parse("[1,2]"), Err(ClaimError::Malformed));
        assert_eq!(
            PayloadClaim::parse(r#"["FRESHERS2025","TOKEN_0001","abc",1]"#),
            Err(ClaimError::Malformed)
        );
        assert_eq!(PayloadClaim::parse(r#"{"token": 5}"#), Err(ClaimError::Malformed));

        let claim = PayloadClaim::parse(r#"{"token":"TOKEN_0001","extra":true}"#).unwrap();
        assert_eq!(claim.token.as_deref(), Some("TOKEN_0001"));
        assert!(claim.hash.is_none());
    }

    #[test]
    fn test_log_entry_blob_shape() {
        let time = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let entry = ScanLogEntry::new("TOKEN_0001", time, ScanOutcome::Duplicate);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["tokenId"], "TOKEN_0001");
        assert_eq!(value["time"], 1_700_000_000_123i64);
        assert_eq!(value["type"], "duplicate");

        let back: ScanLogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_outcome_signals() {
        assert_eq!(ScanOutcome::Valid.signal(), Signal::Success);
        assert_eq!(ScanOutcome::Duplicate.signal(), Signal::Warning);
        assert_eq!(ScanOutcome::Invalid.signal(), Signal::Error);
        assert_eq!("duplicate".parse::<ScanOutcome>().unwrap(), ScanOutcome::Duplicate);
        assert!("bogus".parse::<ScanOutcome>().is_err());
    }

    #[test]
    fn test_stats_compute() {
        let auth = auth();
        let mut a = TokenRecord::issue(&auth, "TOKEN_0001", "Gala");
        let b = TokenRecord::issue(&auth, "TOKEN_0002", "Gala");
        let c = TokenRecord::issue(&auth, "TOKEN_0003", "Gala");
        a.redeem(Utc::now());

        let now = Utc::now();
        let logs = vec![
            ScanLogEntry::new("TOKEN_0001", now, ScanOutcome::Valid),
            ScanLogEntry::new("TOKEN_0001", now, ScanOutcome::Duplicate),
            ScanLogEntry::new("Unknown", now, ScanOutcome::Invalid),
            ScanLogEntry::new("Raw Data", now, ScanOutcome::Invalid),
        ];

        let stats = Stats::compute([&a, &b, &c], &logs);
        assert_eq!(
            stats,
            Stats {
                total_generated: 3,
                remaining: 2,
                valid_scans: 1,
                duplicate_scans: 1,
                invalid_scans: 2,
            }
        );
    }
}
