//! # gatepass-core: Pure Token Logic for Gatepass
//!
//! This crate is the **heart** of Gatepass. It contains the token model and
//! the authentication rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gatepass Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Station (scan engine, reset, stats, CLI)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          gatepass-sync (TokenStore, ScanLogStore)               │   │
//! │  │          gatepass-db   (local cache blobs)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gatepass-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   auth    │  │ validation│  │  export   │  │   │
//! │  │   │  Token    │  │  digest   │  │  count    │  │   CSV     │  │   │
//! │  │   │  Payload  │  │  verify   │  │  ids      │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Token records, scan payloads, scan log entries, stats
//! - [`auth`] - Keyed digest and payload verification
//! - [`error`] - Domain error types
//! - [`validation`] - Generation input rules and token id numbering
//! - [`export`] - CSV rendering of the scan log
//!
//! ## Example Usage
//!
//! ```rust
//! use gatepass_core::auth::HashAuthenticator;
//! use gatepass_core::types::{PayloadClaim, ScanPayload};
//!
//! let auth = HashAuthenticator::new("SECRET_KEY_123", "FRESHERS2025");
//! let payload = ScanPayload::issue(&auth, "TOKEN_0001", 1);
//!
//! let claim = PayloadClaim::parse(&payload.to_qr_text()).unwrap();
//! assert!(auth.verify(&claim));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod export;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::HashAuthenticator;
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix shared by every issued token id (`TOKEN_0001`, `TOKEN_0002`, ...).
pub const TOKEN_ID_PREFIX: &str = "TOKEN_";

/// Minimum width of the zero-padded sequence number in a token id.
pub const TOKEN_ID_WIDTH: usize = 4;

/// Event name written into payloads when none is configured.
pub const DEFAULT_EVENT_NAME: &str = "FRESHERS2025";

/// Batch marker written into payloads when none is configured.
pub const DEFAULT_BATCH: i64 = 1;

/// Log sentinel for scans whose text was not a JSON document at all.
pub const RAW_DATA_SENTINEL: &str = "Raw Data";

/// Log sentinel for scans whose payload failed authentication.
pub const UNKNOWN_TOKEN_SENTINEL: &str = "Unknown";

/// Maximum number of scan log rows pulled from the remote store per read.
pub const REMOTE_LOG_PAGE_SIZE: usize = 50;

/// Window during which a new scan signal is ignored after one is accepted.
pub const SCAN_COOLDOWN_MS: u64 = 2_000;
