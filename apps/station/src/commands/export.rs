//! `export`: write the scan log as CSV.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::error::StationResult;
use crate::state::GateContext;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write the CSV to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub async fn run(ctx: &GateContext, args: ExportArgs, out: &mut dyn Write) -> StationResult<()> {
    let csv = ctx.export_csv().await?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            info!(path = %path.display(), "Scan log exported");
            writeln!(out, "Scan log exported to {}", path.display())?;
        }
        None => out.write_all(csv.as_bytes())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, output};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_empty_log_is_no_data() {
        let ctx = context().await;
        let err = run(&ctx, ExportArgs { out: None }, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoData);
        assert_eq!(err.message, "No scan logs to export");
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let ctx = context().await;
        ctx.handle_scan("garbage").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_logs.csv");

        let mut buf = Vec::new();
        run(&ctx, ExportArgs { out: Some(path.clone()) }, &mut buf).await.unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("Token ID,Time,Status\nRaw Data,"));
        assert!(output(buf).starts_with("Scan log exported to"));
    }
}
