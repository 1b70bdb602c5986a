//! # Station Error Type
//!
//! Unified error type for station operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Station                            │
//! │                                                                         │
//! │  CoreError (bad count, bad password, no data)  ──┐                     │
//! │  SyncError (config, token ids exhausted)       ──┼──► StationError     │
//! │  DbError   (cache cannot be opened)            ──┤    { code, message }│
//! │  io::Error (stdin, output file)                ──┘         │           │
//! │                                                            ▼           │
//! │                                          main: "error: <message>"     │
//! │                                          exit status from code        │
//! │                                                                         │
//! │  Scan rejections are NOT errors: they are outcomes in a ScanReport.    │
//! │  Remote failures are NOT errors: the stores fall back to the cache.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use gatepass_core::{CoreError, ValidationError};
use gatepass_db::DbError;
use gatepass_sync::SyncError;

/// Error returned from station operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "UNAUTHORIZED",
///   "message": "Incorrect password"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct StationError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the operator
    pub message: String,
}

/// Error codes for station failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad operator input (generation count, flags)
    InvalidArgument,

    /// Reset credential mismatch
    Unauthorized,

    /// Export with an empty scan log
    NoData,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Local cache failure
    DatabaseError,

    /// Reading input or writing output failed
    IoError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_status(&self) -> u8 {
        match self {
            ErrorCode::InvalidArgument => 2,
            ErrorCode::Unauthorized => 3,
            ErrorCode::NoData => 4,
            ErrorCode::ConfigError => 5,
            ErrorCode::DatabaseError => 6,
            ErrorCode::IoError => 7,
            ErrorCode::Internal => 1,
        }
    }
}

impl StationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        StationError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StationError::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        StationError::new(ErrorCode::Internal, message)
    }
}

/// Result type for station operations.
pub type StationResult<T> = Result<T, StationError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for StationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidArgument(message) => StationError::invalid_argument(message),
            CoreError::Validation(e) => StationError::invalid_argument(e.to_string()),
            CoreError::Unauthorized => StationError::new(ErrorCode::Unauthorized, err.to_string()),
            CoreError::NoData => StationError::new(ErrorCode::NoData, err.to_string()),
            CoreError::AuthenticationFailure | CoreError::NotFound(_) | CoreError::AlreadyUsed(_) => {
                StationError::invalid_argument(err.to_string())
            }
            CoreError::Export(e) => {
                error!(error = %e, "CSV export failed");
                StationError::internal("Export failed")
            }
        }
    }
}

impl From<ValidationError> for StationError {
    fn from(err: ValidationError) -> Self {
        StationError::invalid_argument(err.to_string())
    }
}

impl From<DbError> for StationError {
    fn from(err: DbError) -> Self {
        error!(error = %err, "Local cache error");
        match err {
            DbError::ConnectionFailed(_) => {
                StationError::new(ErrorCode::DatabaseError, "Could not open the local cache")
            }
            DbError::MigrationFailed(_) => {
                StationError::new(ErrorCode::DatabaseError, "Local cache migration failed")
            }
            _ => StationError::new(ErrorCode::DatabaseError, "Local cache operation failed"),
        }
    }
}

impl From<SyncError> for StationError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(e) => e.into(),
            SyncError::DatabaseError(e) => {
                error!(error = %e, "Local cache error");
                StationError::new(ErrorCode::DatabaseError, "Local cache operation failed")
            }
            e if e.is_config_error() => StationError::new(ErrorCode::ConfigError, e.to_string()),
            e => {
                error!(error = %e, "Sync layer error");
                StationError::internal(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for StationError {
    fn from(err: std::io::Error) -> Self {
        StationError::new(ErrorCode::IoError, err.to_string())
    }
}
