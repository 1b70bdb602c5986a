//! `generate`: issue a batch and print one QR payload per line.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gatepass_core::IssuedToken;

use crate::error::StationResult;
use crate::state::GateContext;

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of tokens to issue
    #[arg(long, short = 'n', allow_hyphen_values = true)]
    pub count: String,

    /// Batch title (defaults to the event name)
    #[arg(long, short)]
    pub title: Option<String>,

    /// Write the payloads to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub async fn run(ctx: &GateContext, args: GenerateArgs, out: &mut dyn Write) -> StationResult<()> {
    let issued = ctx.generate(&args.count, args.title.as_deref()).await?;

    match args.out {
        Some(path) => {
            let mut file = BufWriter::new(std::fs::File::create(&path)?);
            write_payloads(&issued, &mut file)?;
            file.flush()?;
            info!(path = %path.display(), count = issued.len(), "Payloads written");
            writeln!(out, "Issued {} tokens, payloads written to {}", issued.len(), path.display())?;
        }
        None => write_payloads(&issued, out)?,
    }

    Ok(())
}

fn write_payloads(issued: &[IssuedToken], out: &mut dyn Write) -> std::io::Result<()> {
    for token in issued {
        writeln!(out, "{}", token.payload.to_qr_text())?;
    }
    Ok(())
}
