//! # Scan Processor
//!
//! The per-scan state machine.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Received → {Invalid, Duplicate, Valid}               │
//! │                                                                         │
//! │  raw text                                                              │
//! │     │ 1. parse JSON ─────────── not JSON ──► Invalid  "Raw Data"       │
//! │     ▼                                                                   │
//! │  claim                                                                 │
//! │     │ 2. verify hash ─── malformed / bad hash ──► Invalid  "Unknown"   │
//! │     ▼                                                                   │
//! │  token id (authentic)                                                  │
//! │     │ 3. known token? ───────── no ──► Invalid  <claimed id>           │
//! │     ▼                                                                   │
//! │     │ 4. used? ──────────────── yes ─► Duplicate <id>                  │
//! │     ▼                                                                   │
//! │     5. mark used ──────────────────► Valid <id>                        │
//! │                                                                         │
//! │  Every branch appends exactly one scan log entry.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use gatepass_core::{
    ClaimError, CoreError, PayloadClaim, ScanLogEntry, ScanOutcome, Signal, RAW_DATA_SENTINEL,
    UNKNOWN_TOKEN_SENTINEL,
};
use gatepass_sync::{ScanLogStore, TokenStore};

/// Result of one processed scan, for the front end to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Token id as logged (may be a sentinel).
    pub token_id: String,
    pub signal: Signal,
    pub time: DateTime<Utc>,
    /// Why the scan was rejected; `None` for a valid scan.
    pub reason: Option<String>,
}

impl ScanReport {
    /// Headline shown to the operator.
    pub fn headline(&self) -> &'static str {
        match self.outcome {
            ScanOutcome::Valid => "Valid Token",
            ScanOutcome::Duplicate => "Already Used",
            ScanOutcome::Invalid => "Invalid QR",
        }
    }
}

struct Verdict {
    outcome: ScanOutcome,
    token_id: String,
    reason: Option<CoreError>,
}

impl Verdict {
    fn invalid(token_id: impl Into<String>, reason: CoreError) -> Self {
        Verdict {
            outcome: ScanOutcome::Invalid,
            token_id: token_id.into(),
            reason: Some(reason),
        }
    }
}

/// Classifies scans and records them.
#[derive(Debug, Clone)]
pub struct ScanProcessor {
    tokens: TokenStore,
    logs: ScanLogStore,
}

impl ScanProcessor {
    pub fn new(tokens: TokenStore, logs: ScanLogStore) -> Self {
        ScanProcessor { tokens, logs }
    }

    /// Processes one scanned string to a terminal outcome and logs it.
    pub async fn process(&self, raw: &str) -> ScanReport {
        let time = Utc::now();
        let verdict = self.classify(raw).await;

        self.logs
            .append(ScanLogEntry::new(verdict.token_id.clone(), time, verdict.outcome))
            .await;

        info!(
            outcome = %verdict.outcome,
            token_id = %verdict.token_id,
            "Scan processed"
        );

        ScanReport {
            signal: verdict.outcome.signal(),
            outcome: verdict.outcome,
            token_id: verdict.token_id,
            time,
            reason: verdict.reason.map(|e| e.to_string()),
        }
    }

    async fn classify(&self, raw: &str) -> Verdict {
        let claim = match PayloadClaim::parse(raw) {
            Ok(claim) => claim,
            Err(ClaimError::NotJson) => {
                debug!("Scan is not a JSON payload");
                return Verdict::invalid(RAW_DATA_SENTINEL, CoreError::AuthenticationFailure);
            }
            Err(ClaimError::Malformed) => {
                debug!("Scan payload is not a payload object");
                return Verdict::invalid(UNKNOWN_TOKEN_SENTINEL, CoreError::AuthenticationFailure);
            }
        };

        if !self.tokens.authenticator().verify(&claim) {
            debug!(claimed = ?claim.token, "Scan payload failed authentication");
            return Verdict::invalid(UNKNOWN_TOKEN_SENTINEL, CoreError::AuthenticationFailure);
        }

        // verify() rejects claims without a token.
        let Some(token_id) = claim.token else {
            return Verdict::invalid(UNKNOWN_TOKEN_SENTINEL, CoreError::AuthenticationFailure);
        };

        let tokens = self.tokens.get_all(true).await;
        if !tokens.contains_key(&token_id) {
            let reason = CoreError::NotFound(token_id.clone());
            return Verdict::invalid(token_id, reason);
        }

        if self.tokens.is_used(&token_id).await {
            return Verdict {
                outcome: ScanOutcome::Duplicate,
                reason: Some(CoreError::AlreadyUsed(token_id.clone())),
                token_id,
            };
        }

        self.tokens.mark_used(&token_id).await;
        Verdict {
            outcome: ScanOutcome::Valid,
            token_id,
            reason: None,
        }
    }
}
