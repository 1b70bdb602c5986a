//! `stats`: summary figures.

use std::io::Write;

use clap::Args;

use crate::error::{StationError, StationResult};
use crate::state::GateContext;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &GateContext, args: StatsArgs, out: &mut dyn Write) -> StationResult<()> {
    let stats = ctx.refresh().await.stats;

    if args.json {
        let line = serde_json::to_string(&stats).map_err(|e| StationError::internal(e.to_string()))?;
        writeln!(out, "{}", line)?;
        return Ok(());
    }

    writeln!(out, "Event:           {}", ctx.event_name())?;
    writeln!(out, "Sync mode:       {}", ctx.policy())?;
    writeln!(out, "Total generated: {}", stats.total_generated)?;
    writeln!(out, "Remaining:       {}", stats.remaining)?;
    writeln!(out, "Valid scans:     {}", stats.valid_scans)?;
    writeln!(out, "Duplicate scans: {}", stats.duplicate_scans)?;
    writeln!(out, "Invalid scans:   {}", stats.invalid_scans)?;
    Ok(())
}
