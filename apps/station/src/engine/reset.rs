//! # Reset Controller
//!
//! Password-gated bulk resets.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reset Operations                                     │
//! │                                                                         │
//! │                 tokens               used flags         scan logs      │
//! │  Full Reset     deleted              -                  deleted        │
//! │  Limited Reset  kept (hash, title)   false, no time     deleted        │
//! │                                                                         │
//! │  Both apply locally first, then queue the remote bulk operation.       │
//! │  A full reset drops every local blob in one transaction.               │
//! │  Remote deletes are hard deletes: there is no undo.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};

use gatepass_core::CoreError;
use gatepass_sync::{ScanLogStore, TokenStore};

use crate::error::StationResult;

/// Which reset to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Delete every token and every log entry.
    Full,
    /// Keep the tokens, clear their usage and delete the logs.
    Limited,
}

impl std::fmt::Display for ResetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetKind::Full => f.write_str("full"),
            ResetKind::Limited => f.write_str("limited"),
        }
    }
}

#[derive(Clone)]
pub struct ResetController {
    tokens: TokenStore,
    logs: ScanLogStore,
    admin_password: String,
}

impl std::fmt::Debug for ResetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetController")
            .field("admin_password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ResetController {
    pub fn new(tokens: TokenStore, logs: ScanLogStore, admin_password: impl Into<String>) -> Self {
        ResetController {
            tokens,
            logs,
            admin_password: admin_password.into(),
        }
    }

    /// Deletes all tokens and logs. Numbering restarts at `TOKEN_0001`.
    pub async fn full_reset(&self, credential: &str) -> StationResult<()> {
        self.run(ResetKind::Full, credential).await
    }

    /// Clears usage on every token and deletes all logs.
    pub async fn limited_reset(&self, credential: &str) -> StationResult<()> {
        self.run(ResetKind::Limited, credential).await
    }

    pub async fn run(&self, kind: ResetKind, credential: &str) -> StationResult<()> {
        self.authorize(kind, credential)?;

        match kind {
            ResetKind::Full => self.tokens.wipe_all().await,
            ResetKind::Limited => {
                self.logs.clear().await;
                self.tokens.reset_usage().await;
            }
        }

        info!(%kind, "Reset complete");
        Ok(())
    }

    // Verbatim comparison: the credential is a single shared string.
    fn authorize(&self, kind: ResetKind, credential: &str) -> StationResult<()> {
        if credential != self.admin_password {
            warn!(%kind, "Reset rejected: incorrect password");
            return Err(CoreError::Unauthorized.into());
        }
        Ok(())
    }
}
