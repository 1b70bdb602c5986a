//! # Remote Writer
//!
//! Background task that mirrors local writes to the remote store.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RemoteWriter                                     │
//! │                                                                         │
//! │  TokenStore / ScanLogStore                                             │
//! │       │  enqueue(RemoteWrite)        returns immediately               │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐                                              │
//! │  │ mpsc (FIFO)          │  Write(seq, op) | Flush(ack)                  │
//! │  └──────────┬───────────┘                                              │
//! │             ▼                                                           │
//! │  writer task: one attempt per write, in enqueue order                  │
//! │       │                                                                 │
//! │       ├── Ok  ──► WriteOutcome::Applied ─┐                              │
//! │       └── Err ──► WriteOutcome::Failed  ─┴─► broadcast (subscribers)   │
//! │                                                                         │
//! │  No retry, no backoff. A failed write is logged and dropped; the next  │
//! │  successful remote read decides what both tiers hold.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteScanLogRow, RemoteStore, RemoteTokenRow};

/// Capacity of the outcome broadcast. Slow subscribers miss old outcomes.
const OUTCOME_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Writes and Outcomes
// =============================================================================

/// One remote mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWrite {
    UpsertTokens(Vec<RemoteTokenRow>),
    MarkTokenUsed { token_id: String, at: DateTime<Utc> },
    ResetTokenUsage,
    DeleteAllTokens,
    InsertScanLog(RemoteScanLogRow),
    DeleteAllScanLogs,
}

impl RemoteWrite {
    /// Short operation name for logs and outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteWrite::UpsertTokens(_) => "upsert_tokens",
            RemoteWrite::MarkTokenUsed { .. } => "mark_token_used",
            RemoteWrite::ResetTokenUsage => "reset_token_usage",
            RemoteWrite::DeleteAllTokens => "delete_all_tokens",
            RemoteWrite::InsertScanLog(_) => "insert_scan_log",
            RemoteWrite::DeleteAllScanLogs => "delete_all_scan_logs",
        }
    }

    async fn apply(&self, remote: &dyn RemoteStore) -> SyncResult<()> {
        match self {
            RemoteWrite::UpsertTokens(rows) => remote.upsert_tokens(rows).await,
            RemoteWrite::MarkTokenUsed { token_id, at } => {
                remote.mark_token_used(token_id, *at).await
            }
            RemoteWrite::ResetTokenUsage => remote.reset_token_usage().await,
            RemoteWrite::DeleteAllTokens => remote.delete_all_tokens().await,
            RemoteWrite::InsertScanLog(row) => remote.insert_scan_log(row).await,
            RemoteWrite::DeleteAllScanLogs => remote.delete_all_scan_logs().await,
        }
    }
}

/// Result of one write attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied { seq: u64, kind: &'static str },
    Failed { seq: u64, kind: &'static str, error: String },
}

impl WriteOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            WriteOutcome::Applied { seq, .. } | WriteOutcome::Failed { seq, .. } => *seq,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

enum Command {
    Write { seq: u64, write: RemoteWrite },
    Flush(oneshot::Sender<()>),
}

// =============================================================================
// Writer Handle
// =============================================================================

/// Handle to the background writer task.
///
/// Clones share the same queue. The task stops once every handle is dropped
/// and the queue is drained.
#[derive(Debug, Clone)]
pub struct RemoteWriter {
    tx: Option<mpsc::UnboundedSender<Command>>,
    outcomes: broadcast::Sender<WriteOutcome>,
    next_seq: Arc<AtomicU64>,
}

impl RemoteWriter {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);

        info!(remote = remote.name(), "Starting remote writer");
        tokio::spawn(run(remote, rx, outcomes.clone()));

        RemoteWriter {
            tx: Some(tx),
            outcomes,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A writer that drops every write. Used when there is no remote.
    pub fn disabled() -> Self {
        let (outcomes, _) = broadcast::channel(1);
        RemoteWriter {
            tx: None,
            outcomes,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues a write and returns its sequence number. Never blocks.
    pub fn enqueue(&self, write: RemoteWrite) -> Option<u64> {
        let tx = self.tx.as_ref()?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let kind = write.kind();

        if tx.send(Command::Write { seq, write }).is_err() {
            warn!(seq, kind, "Remote writer has stopped; write dropped");
            return None;
        }
        debug!(seq, kind, "Remote write queued");
        Some(seq)
    }

    /// Subscribes to write outcomes published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WriteOutcome> {
        self.outcomes.subscribe()
    }

    /// Waits until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        if let Err(e) = self.try_flush().await {
            warn!(error = %e, "Remote writer flush failed");
        }
    }

    async fn try_flush(&self) -> SyncResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Ok(());
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(Command::Flush(ack_tx))
            .map_err(|_| SyncError::ChannelError("remote writer stopped".into()))?;
        ack_rx
            .await
            .map_err(|_| SyncError::ChannelError("remote writer dropped flush".into()))
    }
}

async fn run(
    remote: Arc<dyn RemoteStore>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    outcomes: broadcast::Sender<WriteOutcome>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Write { seq, write } => {
                let kind = write.kind();
                let outcome = match write.apply(remote.as_ref()).await {
                    Ok(()) => {
                        debug!(seq, kind, "Remote write applied");
                        WriteOutcome::Applied { seq, kind }
                    }
                    Err(e) => {
                        warn!(seq, kind, error = %e, "Remote write failed; local state kept");
                        WriteOutcome::Failed {
                            seq,
                            kind,
                            error: e.to_string(),
                        }
                    }
                };
                // No subscribers is fine.
                let _ = outcomes.send(outcome);
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Remote writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;

    fn log_row(id: &str) -> RemoteScanLogRow {
        RemoteScanLogRow {
            token_id: id.into(),
            status: "valid".into(),
            scanned_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let remote = Arc::new(MemoryRemote::new());
        let writer = RemoteWriter::spawn(remote.clone());

        for id in ["TOKEN_0001", "TOKEN_0002", "TOKEN_0003"] {
            writer.enqueue(RemoteWrite::InsertScanLog(log_row(id)));
        }
        writer.flush().await;

        let ids: Vec<_> = remote
            .scan_log_rows()
            .await
            .into_iter()
            .map(|r| r.token_id)
            .collect();
        assert_eq!(ids, vec!["TOKEN_0001", "TOKEN_0002", "TOKEN_0003"]);
    }

    #[tokio::test]
    async fn test_failed_write_is_attempted_once_and_reported() {
        let remote = Arc::new(MemoryRemote::new());
        let writer = RemoteWriter::spawn(remote.clone());
        let mut outcomes = writer.subscribe();

        remote.set_available(false);
        let seq = writer.enqueue(RemoteWrite::DeleteAllScanLogs).unwrap();
        writer.flush().await;

        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(outcome.seq(), seq);
        assert!(!outcome.is_applied());
        assert!(matches!(outcome, WriteOutcome::Failed { kind: "delete_all_scan_logs", .. }));
        assert_eq!(remote.call_count(), 1);

        // Recovery does not replay the dropped write.
        remote.set_available(true);
        writer.flush().await;
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn test_applied_outcome_published() {
        let remote = Arc::new(MemoryRemote::new());
        let writer = RemoteWriter::spawn(remote);
        let mut outcomes = writer.subscribe();

        writer.enqueue(RemoteWrite::ResetTokenUsage);
        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Applied {
                seq: 1,
                kind: "reset_token_usage"
            }
        );
    }

    #[tokio::test]
    async fn test_disabled_writer_drops_writes() {
        let writer = RemoteWriter::disabled();
        assert!(!writer.is_enabled());
        assert!(writer.enqueue(RemoteWrite::DeleteAllTokens).is_none());
        writer.flush().await;
    }
}
