//! Shared command context for the CLI
//!
//! Turns a resolved [`Config`] into a [`RunContext`]: credentials, the
//! three platform services and the notifier.

use rebasebot::auth::{get_github_auth, get_push_token};
use rebasebot::config::Config;
use rebasebot::error::Result;
use rebasebot::notify::Notifier;
use rebasebot::platform::create_platform_service;
use rebasebot::repo::WorkspaceCredentials;
use rebasebot::sync::RunContext;
use rebasebot::types::PlatformConfig;
use tracing::debug;

/// Build the run context for `config`
///
/// - Discover the API token (env or gh CLI) for the destination host
/// - Pick the push token for the rebase repository
/// - Create platform services for dest, rebase and source
/// - Create the notifier
pub async fn build_run_context(config: Config) -> Result<RunContext> {
    let dest_platform = PlatformConfig::for_branch(&config.dest);
    let rebase_platform = PlatformConfig::for_branch(&config.rebase);
    let source_platform = PlatformConfig::for_branch(&config.source);

    let auth = get_github_auth(dest_platform.host.as_deref()).await?;
    debug!(source = ?auth.source, "authenticated");
    let push_auth = get_push_token(&auth);

    let dest = create_platform_service(&dest_platform, &auth.token)?;
    let rebase = create_platform_service(&rebase_platform, &push_auth.token)?;
    let source = create_platform_service(&source_platform, &auth.token)?;

    let notifier = Notifier::new(config.slack_webhook.clone())?;

    Ok(RunContext {
        credentials: WorkspaceCredentials {
            dest_token: Some(auth.token),
            rebase_token: Some(push_auth.token),
        },
        config,
        dest,
        rebase,
        source,
        notifier,
    })
}
