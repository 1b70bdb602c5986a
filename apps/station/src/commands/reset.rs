//! `reset`: full or limited reset behind the admin password.

use std::io::Write;

use clap::{ArgGroup, Args};

use crate::engine::ResetKind;
use crate::error::StationResult;
use crate::state::GateContext;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("kind").required(true).args(["full", "limited"])))]
pub struct ResetArgs {
    /// Delete every token and every scan log entry
    #[arg(long)]
    pub full: bool,

    /// Keep the tokens, clear their usage and delete the scan logs
    #[arg(long)]
    pub limited: bool,

    /// Admin password
    #[arg(long)]
    pub password: String,
}

impl ResetArgs {
    fn kind(&self) -> ResetKind {
        if self.full {
            ResetKind::Full
        } else {
            ResetKind::Limited
        }
    }
}

pub async fn run(ctx: &GateContext, args: ResetArgs, out: &mut dyn Write) -> StationResult<()> {
    let kind = args.kind();
    match kind {
        ResetKind::Full => ctx.full_reset(&args.password).await?,
        ResetKind::Limited => ctx.limited_reset(&args.password).await?,
    }

    let stats = ctx.stats().await;
    writeln!(
        out,
        "{} reset complete: {} tokens, {} remaining",
        match kind {
            ResetKind::Full => "Full",
            ResetKind::Limited => "Limited",
        },
        stats.total_generated,
        stats.remaining
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, output, PASSWORD};
    use crate::error::ErrorCode;

    fn args(full: bool, password: &str) -> ResetArgs {
        ResetArgs {
            full,
            limited: !full,
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_limited_reset_output() {
        let ctx = context().await;
        ctx.generate("2", None).await.unwrap();

        let mut buf = Vec::new();
        run(&ctx, args(false, PASSWORD), &mut buf).await.unwrap();
        assert_eq!(output(buf), "Limited reset complete: 2 tokens, 2 remaining\n");
    }

    #[tokio::test]
    async fn test_full_reset_wrong_password() {
        let ctx = context().await;
        ctx.generate("2", None).await.unwrap();

        let err = run(&ctx, args(true, "wrong"), &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(ctx.refresh().await.stats.total_generated, 2);
    }
}
