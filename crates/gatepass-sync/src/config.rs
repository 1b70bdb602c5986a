//! # Station Configuration
//!
//! Configuration management for a scan station.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GATEPASS_REMOTE_MODE=local_only                                    │
//! │     GATEPASS_SECRET_KEY=...                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/gatepass/station.toml (Linux)                            │
//! │     ~/Library/Application Support/app.gatepass.gatepass/station.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     remote_first, FRESHERS2025, auto-generated device_id               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # station.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "North Gate"
//!
//! [event]
//! name = "FRESHERS2025"
//! secret_key = "change-me"
//! admin_password = "change-me-too"
//! batch = 1
//!
//! [remote]
//! mode = "remote_first"   # remote_first | local_only
//! url = "https://project.example.co"
//! api_key = "anon-key"
//! log_page_size = 50
//!
//! [scanner]
//! cooldown_ms = 2000
//!
//! [storage]
//! database_path = "/var/lib/gatepass/gatepass.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gatepass_core::{DEFAULT_BATCH, DEFAULT_EVENT_NAME, REMOTE_LOG_PAGE_SIZE, SCAN_COOLDOWN_MS};

use crate::error::{SyncError, SyncResult};
use crate::policy::ReconcilePolicy;

/// Digest key used when none is configured.
pub const DEFAULT_SECRET_KEY: &str = "SECRET_KEY_123";

/// Reset credential used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "gatepass-admin";

const DATABASE_FILE_NAME: &str = "gatepass.db";
const CONFIG_FILE_NAME: &str = "station.toml";

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (UUID v4).
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable station name (e.g., "North Gate").
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Scan Station".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Event Configuration
// =============================================================================

/// The event tokens are issued for, and the shared secrets of this installation.
#[derive(Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Event name written into every payload.
    #[serde(default = "default_event_name")]
    pub name: String,

    /// Key mixed into every token digest.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Credential required by both reset operations.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Batch marker written into payloads.
    #[serde(default = "default_batch")]
    pub batch: i64,
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

fn default_batch() -> i64 {
    DEFAULT_BATCH
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            name: default_event_name(),
            secret_key: default_secret_key(),
            admin_password: default_admin_password(),
            batch: default_batch(),
        }
    }
}

impl std::fmt::Debug for EventConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConfig")
            .field("name", &self.name)
            .field("secret_key", &"<redacted>")
            .field("admin_password", &"<redacted>")
            .field("batch", &self.batch)
            .finish()
    }
}

// =============================================================================
// Remote Settings
// =============================================================================

/// Remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Reconcile policy between the local cache and the remote store.
    #[serde(default)]
    pub mode: ReconcilePolicy,

    /// Base URL of the remote REST API. Without one, the station keeps its
    /// data on this device only.
    #[serde(default)]
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum number of scan log rows fetched per remote read.
    #[serde(default = "default_log_page_size")]
    pub log_page_size: usize,
}

fn default_log_page_size() -> usize {
    REMOTE_LOG_PAGE_SIZE
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            mode: ReconcilePolicy::default(),
            url: None,
            api_key: None,
            log_page_size: default_log_page_size(),
        }
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Scanner behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Window after an accepted scan during which new reads are ignored.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_cooldown_ms() -> u64 {
    SCAN_COOLDOWN_MS
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl ScannerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Local cache location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Station Configuration
// =============================================================================

/// Complete station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub event: EventConfig,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl StationConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (station.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading station config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        if config.event.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!("Reset password is the built-in default; set GATEPASS_ADMIN_PASSWORD");
        }
        if config.event.secret_key == DEFAULT_SECRET_KEY {
            warn!("Token secret is the built-in default; set GATEPASS_SECRET_KEY");
        }

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Station config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.id.is_empty() {
            return Err(SyncError::MissingDeviceId);
        }

        if self.event.secret_key.is_empty() {
            return Err(SyncError::InvalidConfig("secret_key must not be empty".into()));
        }

        if self.event.admin_password.is_empty() {
            return Err(SyncError::InvalidConfig(
                "admin_password must not be empty".into(),
            ));
        }

        if self.remote.log_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "log_page_size must be greater than 0".into(),
            ));
        }

        if self.remote.mode == ReconcilePolicy::RemoteFirst {
            if let Some(ref raw) = self.remote.url {
                let parsed = url::Url::parse(raw)?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(SyncError::InvalidUrl(format!(
                        "Remote URL must start with http:// or https://, got: {}",
                        raw
                    )));
                }
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("GATEPASS_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Ok(name) = std::env::var("GATEPASS_EVENT_NAME") {
            debug!(event = %name, "Overriding event name from environment");
            self.event.name = name;
        }

        if let Ok(secret) = std::env::var("GATEPASS_SECRET_KEY") {
            self.event.secret_key = secret;
        }

        if let Ok(password) = std::env::var("GATEPASS_ADMIN_PASSWORD") {
            self.event.admin_password = password;
        }

        if let Ok(url) = std::env::var("GATEPASS_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Ok(key) = std::env::var("GATEPASS_REMOTE_API_KEY") {
            self.remote.api_key = Some(key);
        }

        if let Ok(mode) = std::env::var("GATEPASS_REMOTE_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding remote mode from environment");
                    self.remote.mode = parsed;
                }
                Err(e) => warn!(mode = %mode, error = %e, "Ignoring remote mode from environment"),
            }
        }

        if let Ok(path) = std::env::var("GATEPASS_DB_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("app", "gatepass", "gatepass")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the device ID.
    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    /// Returns the effective reconcile policy.
    ///
    /// `remote_first` without a remote URL degrades to `local_only`.
    pub fn policy(&self) -> ReconcilePolicy {
        match self.remote.url {
            Some(_) => self.remote.mode,
            None => ReconcilePolicy::LocalOnly,
        }
    }

    /// Resolves the local cache location.
    pub fn database_path(&self) -> SyncResult<PathBuf> {
        if let Some(ref path) = self.storage.database_path {
            return Ok(path.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .ok_or_else(|| {
                SyncError::InvalidConfig(
                    "No home directory found; set storage.database_path".into(),
                )
            })
    }
}
