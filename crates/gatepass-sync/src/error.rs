//! # Sync Error Types
//!
//! Error types for remote access, configuration and the dual-tier stores.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Remote      │  │     Local / Input       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │ RemoteUnavail.  │  │  DatabaseError          │ │
//! │  │  MissingDeviceId│  │ RemoteStatus    │  │  Validation             │ │
//! │  │  InvalidUrl     │  │ Deserialization │  │  SerializationFailed    │ │
//! │  │                 │  │ IncompleteRead  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Remote errors never reach the operator: the stores log them and       │
//! │  serve the local cache instead.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gatepass_core::ValidationError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing device ID.
    #[error("Device ID not configured")]
    MissingDeviceId,

    /// Invalid remote URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote store could not be reached (network, TLS, timeout, or a
    /// simulated outage).
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote store answered with a non-success status.
    #[error("Remote store returned {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    /// A remote response could not be decoded.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// A paged read ended before the row count the server reported.
    #[error("Remote read incomplete: expected {expected} rows, received {received}")]
    IncompleteRead { expected: usize, received: usize },

    // =========================================================================
    // Local / Input Errors
    // =========================================================================
    /// Local cache failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Caller supplied an invalid value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failed to serialize a value.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Background writer channel closed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<gatepass_db::DbError> for SyncError {
    fn from(err: gatepass_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::RemoteStatus {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SyncError::RemoteUnavailable(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if this error came from the remote tier.
    ///
    /// Remote errors are absorbed by the stores (local fallback), never
    /// surfaced to the operator.
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable(_)
                | SyncError::RemoteStatus { .. }
                | SyncError::DeserializationFailed(_)
                | SyncError::IncompleteRead { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingDeviceId
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
