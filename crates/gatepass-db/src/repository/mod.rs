//! # Repository Module
//!
//! Local cache repositories for Gatepass.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Blob-backed Repositories                             │
//! │                                                                         │
//! │  TokenStore (gatepass-sync)                                            │
//! │       │  db.token_cache().save_all(&tokens, &used)                     │
//! │       ▼                                                                 │
//! │  TokenCacheRepository ──┐                                              │
//! │  ScanLogCacheRepository ┤  typed views over named JSON documents        │
//! │                         ▼                                               │
//! │  BlobRepository         get_json / put_json / remove                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  local_blobs (key, value, updated_at)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BlobRepository`](blob::BlobRepository) - Raw keyed JSON documents
//! - [`TokenCacheRepository`](tokens::TokenCacheRepository) - Generated token map and used index
//! - [`ScanLogCacheRepository`](scan_log::ScanLogCacheRepository) - Newest-first scan history

pub mod blob;
pub mod scan_log;
pub mod tokens;
