//! # gatepass-db: Local Cache for Gatepass
//!
//! This crate provides the device-local half of the dual-tier storage model.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gatepass Data Flow                               │
//! │                                                                         │
//! │  TokenStore / ScanLogStore (gatepass-sync)                             │
//! │       │                                                                 │
//! │       │  local-first writes, fallback reads                            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     gatepass-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌─────────────┐  │   │
//! │  │   │   Database    │    │  Repositories    │   │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │   │ (embedded)  │  │   │
//! │  │   │               │    │ BlobRepository   │   │             │  │   │
//! │  │   │ SqlitePool    │◄───│ TokenCacheRepo   │   │ 001_local_  │  │   │
//! │  │   │               │    │ ScanLogCacheRepo │   │   blobs.sql │  │   │
//! │  │   └───────────────┘    └──────────────────┘   └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  local_blobs: generatedTokens | usedTokens | scanLogs           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Blob, token cache and scan log cache repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatepass_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/gatepass.db")).await?;
//!
//! let tokens = db.token_cache().load_tokens().await?;
//! let logs = db.scan_log_cache().load().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::blob::{BlobKey, BlobRepository};
pub use repository::scan_log::ScanLogCacheRepository;
pub use repository::tokens::{used_index_of, TokenCacheRepository, UsedIndex};
