//! Error types for rebasebot

use thiserror::Error;

/// Errors produced while synchronizing a downstream branch
#[derive(Debug, Error)]
pub enum Error {
    /// A git command exited unsuccessfully
    #[error("git {command} failed: {stderr}")]
    Git {
        /// Subcommand and arguments (credentials redacted)
        command: String,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// GitHub API request failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform failure (used by alternative `PlatformService` implementations)
    #[error("platform error: {0}")]
    Platform(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Branch spec could not be parsed
    #[error(
        "invalid branch reference '{0}': expected <namespace>/<repo>:<branch> or <url>:<branch>"
    )]
    InvalidBranchRef(String),

    /// Tag policy value is not one of none, soft, strict
    #[error("unknown tag policy: {0}")]
    UnknownTagPolicy(String),

    /// A carried commit uses an `UPSTREAM: <tag>:` prefix we don't understand
    #[error("unknown commit message tag '{tag}' in commit {sha}")]
    UnknownCommitTag {
        /// Offending commit
        sha: String,
        /// Tag text between `UPSTREAM: ` and the next `:`
        tag: String,
    },

    /// Cherry-pick conflict that needs a human
    #[error("cherry-pick of {sha} needs manual conflict resolution: {detail}")]
    UnresolvableConflict {
        /// Commit whose pick failed
        sha: String,
        /// What the conflict automaton saw
        detail: String,
    },

    /// Force push was rejected by the remote
    #[error("failed to push to {target}: {summary}")]
    Push {
        /// Remote and branch
        target: String,
        /// Summary reported by git
        summary: String,
    },

    /// Lockfile regeneration hook failed
    #[error("unable to update go modules: {0}")]
    LockfileUpdate(String),

    /// Filesystem or process spawning error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation inside rebasebot
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error means a human has to act on the destination repo.
    ///
    /// Such runs end successfully from the scheduler's point of view.
    pub const fn is_manual_intervention(&self) -> bool {
        matches!(self, Self::UnresolvableConflict { .. })
    }

    /// Whether this error is caused by bad configuration or commit content
    /// rather than a transient failure.
    pub const fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownTagPolicy(_) | Self::UnknownCommitTag { .. }
        )
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
