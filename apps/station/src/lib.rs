//! # Gatepass Station
//!
//! The scan station: the per-scan state machine, resets, stats, and the
//! command line that drives them.
//!
//! ## Module Organization
//! ```text
//! gatepass_station/
//! ├── lib.rs          ◄─── You are here (startup, tracing)
//! ├── engine/
//! │   ├── processor.rs ◄── Scan classification
//! │   ├── cooldown.rs  ◄── Debounce gate
//! │   ├── reset.rs     ◄── Full / limited reset
//! │   └── stats.rs     ◄── Summary figures
//! ├── state/
//! │   └── context.rs   ◄── GateContext coordinator
//! ├── commands/        ◄── clap subcommands
//! └── error.rs         ◄── StationError / ErrorCode
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize tracing (stderr, RUST_LOG or the default filter)        │
//! │     (`init` writes station.toml here and stops)                        │
//! │  2. Load StationConfig (env > station.toml > defaults)                 │
//! │  3. Open the local cache, run migrations                               │
//! │  4. Wire the remote tier (RestRemote when a URL is configured)         │
//! │  5. Dispatch the subcommand                                            │
//! │  6. Flush queued remote writes, close the cache                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod engine;
pub mod error;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use gatepass_sync::StationConfig;

pub use commands::{Cli, Command};
pub use error::{ErrorCode, StationError, StationResult};
pub use state::GateContext;

/// Loads config, opens the station and runs the parsed command.
pub async fn run(cli: Cli) -> StationResult<()> {
    let mut stdout = std::io::stdout();

    let command = match cli.command {
        Command::Init(args) => return commands::init::run(cli.config, args, &mut stdout),
        command => command,
    };

    let config = StationConfig::load(cli.config)?;
    let ctx = GateContext::open(&config).await?;

    info!(event = %ctx.event_name(), "Station ready");

    let result = commands::dispatch(&ctx, command, &mut stdout).await;

    ctx.shutdown().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=gatepass=trace` - Show trace for gatepass crates only
/// - Default: `info,gatepass=debug,sqlx=warn`
///
/// Logs go to stderr so stdout stays clean for payloads and CSV.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gatepass=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
