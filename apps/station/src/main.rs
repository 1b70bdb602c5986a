//! `gatepass-station` entry point. Setup lives in `lib.rs`.

use std::process::ExitCode;

use clap::Parser;

use gatepass_station::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    gatepass_station::init_tracing();

    let cli = Cli::parse();
    match gatepass_station::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.code.exit_status())
        }
    }
}
