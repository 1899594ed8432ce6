//! Default command - one synchronization run

use crate::cli::Cli;
use crate::cli::context::build_run_context;
use crate::cli::style::{Stylize, attention, check};
use anstream::println;
use rebasebot::config::PartialConfig;
use rebasebot::error::Result;
use rebasebot::sync::{self, RunOutcome};
use tracing::debug;

/// Resolve configuration, run once and print the outcome
pub async fn run_bot(cli: &Cli) -> Result<RunOutcome> {
    let file_layer = match &cli.config {
        Some(path) => PartialConfig::load(path)?,
        None => PartialConfig::load_default()?,
    };
    let config = file_layer.merge(cli.to_partial()).resolve()?;
    debug!(
        source = %config.source,
        dest = %config.dest,
        rebase = %config.rebase,
        policy = %config.tag_policy,
        "resolved config"
    );

    println!(
        "{} {} {} {}",
        "Rebasing".muted(),
        config.source.emphasis(),
        "onto".muted(),
        config.dest.emphasis()
    );

    let ctx = build_run_context(config).await?;
    let outcome = sync::run(&ctx).await?;

    let marker = if outcome.needs_attention() {
        attention()
    } else {
        check()
    };
    match &outcome {
        RunOutcome::Created { url } | RunOutcome::Updated { url } => {
            println!("{marker} {}", outcome.success());
            debug!(%url, "rebase PR");
        }
        RunOutcome::ManualLabel { .. } | RunOutcome::ManualIntervention { .. } => {
            println!("{marker} {}", outcome.warn());
        }
        _ => println!("{marker} {}", outcome.accent()),
    }

    Ok(outcome)
}
