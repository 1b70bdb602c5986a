//! `scan`: classify decoded QR payloads.
//!
//! Reads one payload per line from stdin (as a keyboard-wedge scanner or a
//! decoder pipe delivers them) or a single `--payload`.

use std::io::Write;

use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::engine::{CooldownGate, ScanReport};
use crate::error::{StationError, StationResult};
use crate::state::GateContext;

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Classify this payload instead of reading stdin
    #[arg(long)]
    pub payload: Option<String>,

    /// Process every line, ignoring the cooldown window (replayed input)
    #[arg(long)]
    pub no_cooldown: bool,

    /// Print each report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run<R>(ctx: &GateContext, args: ScanArgs, input: R, out: &mut dyn Write) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
{
    if args.no_cooldown {
        ctx.set_cooldown(CooldownGate::disabled()).await;
    }

    if let Some(payload) = &args.payload {
        return scan_one(ctx, payload, args.json, out).await;
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        scan_one(ctx, line, args.json, out).await?;
    }

    Ok(())
}

async fn scan_one(ctx: &GateContext, raw: &str, json: bool, out: &mut dyn Write) -> StationResult<()> {
    match ctx.handle_scan(raw).await {
        Some(report) => print_report(&report, json, out),
        None => {
            writeln!(out, "Ignored (cooldown)")?;
            Ok(())
        }
    }
}

fn print_report(report: &ScanReport, json: bool, out: &mut dyn Write) -> StationResult<()> {
    if json {
        let line = serde_json::to_string(report).map_err(|e| StationError::internal(e.to_string()))?;
        writeln!(out, "{}", line)?;
    } else {
        writeln!(out, "{}: {}", report.headline(), report.token_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, output};
    use gatepass_core::{HashAuthenticator, ScanPayload};

    fn payload(id: &str) -> String {
        let auth = HashAuthenticator::new("SECRET_KEY_123", "FRESHERS2025");
        ScanPayload::issue(&auth, id, 1).to_qr_text()
    }

    fn args() -> ScanArgs {
        ScanArgs {
            payload: None,
            no_cooldown: true,
            json: false,
        }
    }

    #[tokio::test]
    async fn test_reads_lines_and_skips_blanks() {
        let ctx = context().await;
        ctx.generate("2", None).await.unwrap();

        let input = format!("{}\n\n{}\nhello\n", payload("TOKEN_0001"), payload("TOKEN_0001"));
        let mut buf = Vec::new();
        run(&ctx, args(), input.as_bytes(), &mut buf).await.unwrap();

        assert_eq!(
            output(buf),
            "Valid Token: TOKEN_0001\nAlready Used: TOKEN_0001\nInvalid QR: Raw Data\n"
        );
    }

    #[tokio::test]
    async fn test_single_payload_json() {
        let ctx = context().await;
        ctx.generate("1", None).await.unwrap();

        let mut buf = Vec::new();
        let args = ScanArgs {
            payload: Some(payload("TOKEN_0001")),
            no_cooldown: false,
            json: true,
        };
        run(&ctx, args, tokio::io::empty(), &mut buf).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(output(buf).trim()).unwrap();
        assert_eq!(value["outcome"], "valid");
        assert_eq!(value["tokenId"], "TOKEN_0001");
        assert_eq!(value["signal"], "success");
    }
}
