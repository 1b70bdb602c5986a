//! `logs`: recent scan log entries, newest first.

use std::io::Write;

use chrono::SecondsFormat;
use clap::Args;

use crate::error::{StationError, StationResult};
use crate::state::GateContext;

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Show at most N entries
    #[arg(long, short = 'n', value_name = "N")]
    pub limit: Option<usize>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &GateContext, args: LogsArgs, out: &mut dyn Write) -> StationResult<()> {
    let entries = ctx.recent_logs(args.limit).await;

    if args.json {
        let line = serde_json::to_string(&entries).map_err(|e| StationError::internal(e.to_string()))?;
        writeln!(out, "{}", line)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(out, "No scans yet")?;
        return Ok(());
    }

    for entry in &entries {
        writeln!(
            out,
            "{}  {:<9}  {}",
            entry.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.outcome.as_str(),
            entry.token_id
        )?;
    }
    Ok(())
}
