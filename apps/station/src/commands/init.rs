//! `init`: write a starter station.toml.
//!
//! The file carries a freshly generated device id, so the station keeps the
//! same id across runs once it exists.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use gatepass_sync::StationConfig;

use crate::error::{ErrorCode, StationError, StationResult};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Writes a default config to `config_path` (or the platform location).
pub fn run(config_path: Option<PathBuf>, args: InitArgs, out: &mut dyn Write) -> StationResult<()> {
    let path = config_path
        .or_else(StationConfig::default_config_path)
        .ok_or_else(|| StationError::new(ErrorCode::ConfigError, "No config path available; pass --config"))?;

    if path.exists() && !args.force {
        return Err(StationError::new(
            ErrorCode::ConfigError,
            format!("{} already exists; pass --force to overwrite", path.display()),
        ));
    }

    let config = StationConfig::new();
    config.save(Some(path.clone()))?;

    writeln!(out, "Wrote {}", path.display())?;
    writeln!(out, "Device id: {}", config.device_id())?;
    Ok(())
}
