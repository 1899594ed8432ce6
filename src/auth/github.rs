//! GitHub token discovery

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variable holding a dedicated token for the rebase repository
pub const PUSH_TOKEN_ENV: &str = "REBASEBOT_PUSH_TOKEN";

const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

fn env_token(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Get GitHub authentication
///
/// Priority: `GITHUB_TOKEN`, `GH_TOKEN`, then `gh auth token` (scoped to
/// `host` for GitHub Enterprise).
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    for name in TOKEN_ENV_VARS {
        if let Some(token) = env_token(name) {
            debug!(var = name, "using GitHub token from environment");
            return Ok(GitHubAuthConfig {
                token,
                source: AuthSource::EnvVar,
            });
        }
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Auth(format!(
            "No GitHub token found. Set GITHUB_TOKEN or install and log in to gh ({e})"
        ))
    })?;

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || token.is_empty() {
        return Err(Error::Auth(
            "No GitHub token found. Set GITHUB_TOKEN or run `gh auth login`".to_string(),
        ));
    }

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}

/// Token used for the rebase repository: `REBASEBOT_PUSH_TOKEN` when set,
/// otherwise `fallback`
pub fn get_push_token(fallback: &GitHubAuthConfig) -> GitHubAuthConfig {
    env_token(PUSH_TOKEN_ENV).map_or_else(
        || fallback.clone(),
        |token| {
            debug!(var = PUSH_TOKEN_ENV, "using dedicated push token");
            GitHubAuthConfig {
                token,
                source: AuthSource::EnvVar,
            }
        },
    )
}
