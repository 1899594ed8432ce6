//! Shared test helpers

#![allow(dead_code)]

pub mod mock_platform;
pub mod temp_git;

pub use mock_platform::{MockPlatformService, SharedMock};
pub use temp_git::TempRemotes;

use rebasebot::config::{Config, PartialConfig};
use rebasebot::notify::Notifier;
use rebasebot::repo::WorkspaceCredentials;
use rebasebot::sync::RunContext;
use rebasebot::types::{Commit, PullRequest};

/// Open PR with the given title on the rebase head
pub fn make_pr(number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/fork/project/pull/{number}"),
        base_ref: "main".to_string(),
        head_ref: "rebase".to_string(),
        title: title.to_string(),
        labels: vec![],
    }
}

/// Commit with a synthetic SHA
pub fn make_commit(sha: &str, message: &str) -> Commit {
    make_commit_by(sha, message, "dev@example.com")
}

/// Commit with a synthetic SHA and explicit author email
pub fn make_commit_by(sha: &str, message: &str, email: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        author_name: "Dev".to_string(),
        author_email: email.to_string(),
    }
}

/// Mocks for the three repositories of a run
pub struct Platforms {
    pub dest: SharedMock,
    pub rebase: SharedMock,
    pub source: SharedMock,
}

impl Platforms {
    pub fn new() -> Self {
        Self {
            dest: SharedMock::new("fork", "project"),
            rebase: SharedMock::new("bot", "project"),
            source: SharedMock::new("upstream", "project"),
        }
    }
}

/// Config layer pointing at `remotes`, rebasing `source_branch` onto `main`
pub fn partial_config(remotes: &TempRemotes, source_branch: &str) -> PartialConfig {
    PartialConfig {
        source: Some(remotes.source_spec(source_branch)),
        dest: Some(remotes.dest_spec("main")),
        rebase: Some(remotes.rebase_spec("rebase")),
        working_dir: Some(remotes.workdir()),
        git_username: Some("rebasebot".to_string()),
        git_email: Some("rebasebot@example.com".to_string()),
        ..PartialConfig::default()
    }
}

/// Run context over real remotes and mock platforms, notifications off
pub fn run_context(config: Config, platforms: &Platforms) -> RunContext {
    RunContext {
        config,
        dest: platforms.dest.boxed(),
        rebase: platforms.rebase.boxed(),
        source: platforms.source.boxed(),
        credentials: WorkspaceCredentials::default(),
        notifier: Notifier::disabled(),
    }
}
