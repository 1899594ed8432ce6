//! Authentication for GitHub
//!
//! Supports the gh CLI and environment variables. A separate push token
//! can be supplied for the rebase repository.

mod github;

pub use github::{GitHubAuthConfig, PUSH_TOKEN_ENV, get_github_auth, get_push_token};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from the gh CLI
    Cli,
    /// Token from environment variable
    EnvVar,
}
