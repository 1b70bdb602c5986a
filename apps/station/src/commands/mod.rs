//! # CLI Commands Module
//!
//! Every operator action exposed on the command line.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (argument parsing, dispatch)
//! ├── init.rs      ◄─── Write a starter station.toml
//! ├── generate.rs  ◄─── Issue a batch, print QR payloads
//! ├── scan.rs      ◄─── Classify decoded payloads from stdin
//! ├── stats.rs     ◄─── Summary figures
//! ├── logs.rs      ◄─── Recent scan log entries
//! ├── export.rs    ◄─── Scan log as CSV
//! └── reset.rs     ◄─── Full / limited reset
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  $ gatepass-station scan < decoded.txt                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Cli::parse() ──► StationConfig::load ──► GateContext::open            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  dispatch(ctx, command, stdout)                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  scan::run ──► ctx.handle_scan(line) per line ──► report on stdout     │
//! │                                                                         │
//! │  Data goes to stdout. Logs go to stderr.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands write to a `&mut dyn Write` so tests can capture their output.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use crate::error::{StationError, StationResult};
use crate::state::GateContext;

pub mod export;
pub mod generate;
pub mod init;
pub mod logs;
pub mod reset;
pub mod scan;
pub mod stats;

/// Gatepass scan station.
#[derive(Debug, Parser)]
#[command(name = "gatepass-station", version, about)]
pub struct Cli {
    /// Path to station.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a starter config file with a new device id
    Init(init::InitArgs),
    /// Issue a new batch of tokens
    Generate(generate::GenerateArgs),
    /// Classify decoded QR payloads
    Scan(scan::ScanArgs),
    /// Show summary figures
    Stats(stats::StatsArgs),
    /// Show recent scan log entries
    Logs(logs::LogsArgs),
    /// Export the scan log as CSV
    Export(export::ExportArgs),
    /// Reset tokens and logs
    Reset(reset::ResetArgs),
}

/// Runs one command against an open context.
///
/// `init` is handled by [`crate::run`] before any context exists.
pub async fn dispatch(ctx: &GateContext, command: Command, out: &mut dyn Write) -> StationResult<()> {
    match command {
        Command::Init(_) => Err(StationError::invalid_argument(
            "init cannot run against an open station",
        )),
        Command::Generate(args) => generate::run(ctx, args, out).await,
        Command::Scan(args) => {
            let stdin = BufReader::new(tokio::io::stdin());
            scan::run(ctx, args, stdin, out).await
        }
        Command::Stats(args) => stats::run(ctx, args, out).await,
        Command::Logs(args) => logs::run(ctx, args, out).await,
        Command::Export(args) => export::run(ctx, args, out).await,
        Command::Reset(args) => reset::run(ctx, args, out).await,
    }
}
