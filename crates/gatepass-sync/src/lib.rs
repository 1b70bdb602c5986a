//! # gatepass-sync: Dual-Tier Stores for Gatepass
//!
//! This crate keeps the local cache and the remote source of truth in step.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Layer Architecture                          │
//! │                                                                         │
//! │  ┌────────────────────┐              ┌────────────────────┐            │
//! │  │    TokenStore      │              │   ScanLogStore     │            │
//! │  │                    │              │                    │            │
//! │  │ generate_batch     │              │ append             │            │
//! │  │ get_all / is_used  │              │ get_recent         │            │
//! │  │ mark_used          │              │ clear              │            │
//! │  │ reset_usage        │              │                    │            │
//! │  │ wipe_all           │              │                    │            │
//! │  └─────────┬──────────┘              └─────────┬──────────┘            │
//! │            │         shared Reconciler         │                       │
//! │            └───────────────┬───────────────────┘                       │
//! │                            ▼                                            │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Reconciler (policy.rs)                                         │   │
//! │  │  RemoteFirst: remote read, replace cache on non-empty success   │   │
//! │  │  LocalOnly:   cache only                                        │   │
//! │  └───────────────┬─────────────────────────────┬───────────────────┘   │
//! │                  ▼                             ▼                        │
//! │  ┌────────────────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ RemoteWriter (writer.rs)   │  │ RemoteStore (remote/)            │  │
//! │  │ FIFO, one attempt, outcome │─►│ MemoryRemote | RestRemote        │  │
//! │  │ broadcast                  │  │                                  │  │
//! │  └────────────────────────────┘  └──────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Station configuration (event, secrets, remote, scanner)
//! - [`error`] - Sync error types
//! - [`policy`] - Reconcile policy and the shared reconciler
//! - [`remote`] - Remote store trait and backends
//! - [`writer`] - Background remote writer
//! - [`token_store`] - Token records
//! - [`scan_log`] - Scan history
//!
//! ## Failure Policy
//! Remote failures never reach callers; reads fall back to the cache and
//! writes are logged and dropped. Local read failures are logged and served
//! as empty. Operator-initiated writes (generation, resets) return local
//! failures as errors.

pub mod config;
pub mod error;
pub mod policy;
pub mod remote;
pub mod scan_log;
pub mod token_store;
pub mod writer;

pub use config::StationConfig;
pub use error::{SyncError, SyncResult};
pub use policy::{ReconcilePolicy, Reconciler};
pub use remote::memory::MemoryRemote;
pub use remote::rest::RestRemote;
pub use remote::{RemoteScanLogRow, RemoteStore, RemoteTokenRow, RowPage};
pub use scan_log::ScanLogStore;
pub use token_store::TokenStore;
pub use writer::{RemoteWrite, RemoteWriter, WriteOutcome};
