//! rebasebot CLI entry point

mod cli;

use clap::Parser;
use cli::Cli;
use cli::style::Stylize;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "rebasebot=debug"
    } else {
        "rebasebot=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli::run_bot(&cli).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            if e.is_policy_violation() {
                error!(error = %e, "policy violation");
            }
            anstream::eprintln!("{} {e}", "error:".warn());
            Ok(ExitCode::FAILURE)
        }
    }
}
