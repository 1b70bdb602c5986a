//! # Reconcile Policy
//!
//! How the local cache and the remote store are merged.
//!
//! ## Replace-on-Success
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Read Path (RemoteFirst)                          │
//! │                                                                         │
//! │  store.get_all(prefer_remote = true)                                   │
//! │       │                                                                 │
//! │       ├─► writer.flush()        our own queued writes land first       │
//! │       │                                                                 │
//! │       ├─► remote.fetch_*()                                             │
//! │       │      │                                                          │
//! │       │      ├── Ok(rows), rows non-empty ──► overwrite local cache,   │
//! │       │      │                                 return rows             │
//! │       │      ├── Ok([])  ───────────────┐                               │
//! │       │      └── Err(e)  ── warn! ──────┤                               │
//! │       │                                 ▼                               │
//! │       └──────────────────────────► local cache (last snapshot)         │
//! │                                                                         │
//! │                        Write Path (both policies)                       │
//! │                                                                         │
//! │  local cache write ──► (RemoteFirst only) writer.submit(write)         │
//! │                         one attempt, outcome logged, never awaited     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The last successful remote read wins. Pending local state that the
//! remote never received is overwritten by that read.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use crate::writer::{RemoteWrite, RemoteWriter};

// =============================================================================
// Policy
// =============================================================================

/// Merge policy between the local cache and the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Reads try the remote first and replace the cache on success; writes
    /// are mirrored to the remote in the background.
    #[default]
    RemoteFirst,

    /// The remote is never contacted.
    LocalOnly,
}

impl ReconcilePolicy {
    /// Returns true if a read with this preference should try the remote.
    pub fn reads_remote(&self, prefer_remote: bool) -> bool {
        prefer_remote && self.writes_remote()
    }

    /// Returns true if local writes are mirrored to the remote.
    pub fn writes_remote(&self) -> bool {
        matches!(self, ReconcilePolicy::RemoteFirst)
    }
}

impl std::fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePolicy::RemoteFirst => write!(f, "remote_first"),
            ReconcilePolicy::LocalOnly => write!(f, "local_only"),
        }
    }
}

impl std::str::FromStr for ReconcilePolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "remote_first" | "remote" | "online" => Ok(ReconcilePolicy::RemoteFirst),
            "local_only" | "local" | "offline" => Ok(ReconcilePolicy::LocalOnly),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown remote mode: '{}'. Valid options: remote_first, local_only",
                other
            ))),
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// The remote half of a store: backend, background writer and policy.
///
/// Cheap to clone; the token and scan log stores share one instance so their
/// writes reach the remote in the order they were made.
#[derive(Clone)]
pub struct Reconciler {
    remote: Option<Arc<dyn RemoteStore>>,
    writer: RemoteWriter,
    policy: ReconcilePolicy,
}

impl Reconciler {
    /// Creates a reconciler. Under `RemoteFirst` this spawns the background
    /// writer, so it must be called inside a tokio runtime.
    pub fn new(remote: Arc<dyn RemoteStore>, policy: ReconcilePolicy) -> Self {
        if !policy.writes_remote() {
            return Self::local_only();
        }
        let writer = RemoteWriter::spawn(Arc::clone(&remote));
        Reconciler {
            remote: Some(remote),
            writer,
            policy,
        }
    }

    /// A reconciler that never contacts a remote.
    pub fn local_only() -> Self {
        Reconciler {
            remote: None,
            writer: RemoteWriter::disabled(),
            policy: ReconcilePolicy::LocalOnly,
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn writer(&self) -> &RemoteWriter {
        &self.writer
    }

    /// Runs a remote read under the replace-on-success policy.
    ///
    /// ## Returns
    /// * `Some(rows)` - the remote answered with at least one row; the caller
    ///   must overwrite its cache with them
    /// * `None` - use the local cache (policy, preference, failure or empty)
    pub async fn fetch<T, F, Fut>(&self, what: &'static str, prefer_remote: bool, read: F) -> Option<Vec<T>>
    where
        F: FnOnce(Arc<dyn RemoteStore>) -> Fut,
        Fut: Future<Output = SyncResult<Vec<T>>>,
    {
        let remote = match (&self.remote, self.policy.reads_remote(prefer_remote)) {
            (Some(remote), true) => Arc::clone(remote),
            _ => return None,
        };

        self.writer.flush().await;

        match read(remote).await {
            Ok(rows) if rows.is_empty() => {
                debug!(what, "Remote returned no rows, using local cache");
                None
            }
            Ok(rows) => {
                debug!(what, rows = rows.len(), "Remote read succeeded");
                Some(rows)
            }
            Err(e) => {
                warn!(what, error = %e, "Remote read failed, using local cache");
                None
            }
        }
    }

    /// Queues a best-effort remote write. No-op under `LocalOnly`.
    pub fn submit(&self, write: RemoteWrite) {
        if self.policy.writes_remote() {
            self.writer.enqueue(write);
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("policy", &self.policy)
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .finish()
    }
}
