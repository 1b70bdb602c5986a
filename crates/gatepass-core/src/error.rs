//! # Error Types
//!
//! Domain-specific error types for gatepass-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gatepass-core errors (this file)                                      │
//! │  ├── CoreError        - Domain errors (bad count, bad credential, ...)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gatepass-db errors (separate crate)                                   │
//! │  └── DbError          - Local persistence failures                     │
//! │                                                                         │
//! │  gatepass-sync errors (separate crate)                                 │
//! │  └── SyncError        - Remote unavailable, config problems            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StationError → operator notice    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scan-time failures (`AuthenticationFailure`, `NotFound`, `AlreadyUsed`) are
//! normally absorbed into a scan outcome rather than returned; the variants
//! exist so callers outside the scan path can name them.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad caller input (e.g. a generation count that is zero or not a number).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload hash mismatch or malformed payload.
    #[error("Payload failed authentication")]
    AuthenticationFailure,

    /// Token id was never issued.
    #[error("Token not found: {0}")]
    NotFound(String),

    /// Token was already redeemed.
    #[error("Token already used: {0}")]
    AlreadyUsed(String),

    /// Reset credential did not match.
    #[error("Incorrect password")]
    Unauthorized,

    /// Export requested with an empty scan log.
    #[error("No scan logs to export")]
    NoData,

    /// CSV rendering failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a non-numeric count).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
