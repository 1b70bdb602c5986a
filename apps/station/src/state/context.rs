//! # Gate Context
//!
//! One explicit coordinator per station. Components never reach for global
//! state: everything they need is handed to them here.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use gatepass_core::validation::{parse_generation_count, resolve_title};
use gatepass_core::{
    export::scan_logs_to_csv, CoreError, HashAuthenticator, IssuedToken, ScanLogEntry, Stats,
};
use gatepass_db::{Database, DbConfig};
use gatepass_sync::{ReconcilePolicy, Reconciler, RestRemote, ScanLogStore, StationConfig, TokenStore};

use crate::engine::{
    CooldownGate, ResetController, ScanProcessor, ScanReport, StatsAggregator, StatsSnapshot,
};
use crate::error::StationResult;

/// Event and behaviour settings the context is built with.
#[derive(Clone)]
pub struct GateSettings {
    pub event_name: String,
    pub secret_key: String,
    pub admin_password: String,
    pub batch: i64,
    pub log_page_size: usize,
    pub cooldown: Duration,
}

impl GateSettings {
    pub fn from_config(config: &StationConfig) -> Self {
        GateSettings {
            event_name: config.event.name.clone(),
            secret_key: config.event.secret_key.clone(),
            admin_password: config.event.admin_password.clone(),
            batch: config.event.batch,
            log_page_size: config.remote.log_page_size,
            cooldown: config.scanner.cooldown(),
        }
    }
}

impl std::fmt::Debug for GateSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSettings")
            .field("event_name", &self.event_name)
            .field("batch", &self.batch)
            .field("log_page_size", &self.log_page_size)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Coordinator owning the stores, the engine components and the latest
/// stats snapshot.
#[derive(Debug)]
pub struct GateContext {
    db: Database,
    reconciler: Reconciler,
    tokens: TokenStore,
    logs: ScanLogStore,
    processor: ScanProcessor,
    resets: ResetController,
    aggregator: StatsAggregator,
    event_name: String,
    cooldown: Mutex<CooldownGate>,
    /// Held for the duration of every store operation.
    serial: Mutex<()>,
    snapshot: RwLock<StatsSnapshot>,
}

impl GateContext {
    /// Opens the local cache and wires the remote tier from config.
    pub async fn open(config: &StationConfig) -> StationResult<Self> {
        let db = Database::new(DbConfig::new(config.database_path()?)).await?;

        let reconciler = match (config.policy(), config.remote.url.as_deref()) {
            (ReconcilePolicy::RemoteFirst, Some(url)) => {
                let remote = RestRemote::new(url, config.remote.api_key.as_deref())?;
                Reconciler::new(Arc::new(remote), ReconcilePolicy::RemoteFirst)
            }
            _ => Reconciler::local_only(),
        };

        info!(
            device_id = %config.device_id(),
            device_name = %config.device.name,
            policy = %reconciler.policy(),
            "Station context opened"
        );

        Ok(Self::from_parts(db, reconciler, GateSettings::from_config(config)))
    }

    /// Builds a context from an open database and a reconciler.
    pub fn from_parts(db: Database, reconciler: Reconciler, settings: GateSettings) -> Self {
        let auth = HashAuthenticator::new(settings.secret_key, settings.event_name.clone());
        let tokens = TokenStore::new(&db, reconciler.clone(), auth, settings.batch);
        let logs = ScanLogStore::new(&db, reconciler.clone(), settings.log_page_size);

        GateContext {
            processor: ScanProcessor::new(tokens.clone(), logs.clone()),
            resets: ResetController::new(tokens.clone(), logs.clone(), settings.admin_password),
            aggregator: StatsAggregator::new(tokens.clone(), logs.clone()),
            cooldown: Mutex::new(CooldownGate::new(settings.cooldown)),
            serial: Mutex::new(()),
            snapshot: RwLock::new(StatsSnapshot::default()),
            event_name: settings.event_name,
            db,
            reconciler,
            tokens,
            logs,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.reconciler.policy()
    }

    /// Recomputes stats and the log window from the stores.
    pub async fn refresh(&self) -> StatsSnapshot {
        let snapshot = {
            let _serial = self.serial.lock().await;
            self.aggregator.snapshot(true).await
        };
        *self.snapshot.write().await = snapshot.clone();
        snapshot
    }

    /// Stats as of the last refresh.
    pub async fn stats(&self) -> Stats {
        self.snapshot.read().await.stats
    }

    /// Most recent log entries, newest first, read through the store.
    pub async fn recent_logs(&self, limit: Option<usize>) -> Vec<ScanLogEntry> {
        let _serial = self.serial.lock().await;
        self.logs.get_recent(limit, true).await
    }

    /// Issues a batch from operator input.
    ///
    /// A blank title falls back to the event name.
    pub async fn generate(&self, count_input: &str, title: Option<&str>) -> StationResult<Vec<IssuedToken>> {
        let count = parse_generation_count(count_input)
            .map_err(|e| CoreError::InvalidArgument(e.to_string()))?;
        let title = resolve_title(title, &self.event_name);

        let issued = {
            let _serial = self.serial.lock().await;
            self.tokens.generate_batch(count, &title).await?
        };

        self.refresh().await;
        Ok(issued)
    }

    /// Runs one scan signal through the cooldown gate and the processor.
    ///
    /// Returns `None` when the signal arrived inside the cooldown window.
    pub async fn handle_scan(&self, raw: &str) -> Option<ScanReport> {
        {
            let mut gate = self.cooldown.lock().await;
            if !gate.try_accept() {
                debug!(
                    remaining_ms = gate.remaining().as_millis() as u64,
                    window_ms = gate.window().as_millis() as u64,
                    "Scan ignored during cooldown"
                );
                return None;
            }
        }

        let report = {
            let _serial = self.serial.lock().await;
            self.processor.process(raw).await
        };

        self.refresh().await;
        Some(report)
    }

    /// Replaces the cooldown gate, e.g. to disable it for replayed input.
    pub async fn set_cooldown(&self, gate: CooldownGate) {
        *self.cooldown.lock().await = gate;
    }

    pub async fn full_reset(&self, credential: &str) -> StationResult<()> {
        {
            let _serial = self.serial.lock().await;
            self.resets.full_reset(credential).await?;
        }
        self.refresh().await;
        Ok(())
    }

    pub async fn limited_reset(&self, credential: &str) -> StationResult<()> {
        {
            let _serial = self.serial.lock().await;
            self.resets.limited_reset(credential).await?;
        }
        self.refresh().await;
        Ok(())
    }

    /// Renders the full scan log as CSV. An empty log is `NoData`.
    pub async fn export_csv(&self) -> StationResult<String> {
        let entries = self.recent_logs(None).await;
        Ok(scan_logs_to_csv(&entries)?)
    }

    /// Waits for queued remote writes, then closes the local cache.
    pub async fn shutdown(&self) {
        self.reconciler.writer().flush().await;
        self.db.close().await;
        info!("Station context closed");
    }
}
