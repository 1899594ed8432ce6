//! Command-line surface

mod context;
mod run;
pub mod style;

pub use run::run_bot;

use clap::Parser;
use rebasebot::config::PartialConfig;
use std::path::PathBuf;

/// Keep a downstream fork in sync with its upstream
#[derive(Debug, Parser)]
#[command(name = "rebasebot", version, about)]
pub struct Cli {
    /// Upstream branch: <namespace>/<repo>:<branch> or <url>:<branch>
    #[arg(short, long)]
    pub source: Option<String>,

    /// Downstream branch to keep in sync
    #[arg(short, long)]
    pub dest: Option<String>,

    /// Branch the rebase result is pushed to
    #[arg(short, long)]
    pub rebase: Option<String>,

    /// Directory for the working clone [default: rebasebot_repo]
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Committer name for picks and generated commits
    #[arg(long)]
    pub git_username: Option<String>,

    /// Committer email for picks and generated commits
    #[arg(long)]
    pub git_email: Option<String>,

    /// Slack incoming webhook for status messages
    #[arg(long)]
    pub slack_webhook: Option<String>,

    /// How untagged commits are treated: none, soft or strict
    #[arg(long)]
    pub tag_policy: Option<String>,

    /// Comma-separated bot emails whose commits get squashed
    #[arg(long, value_delimiter = ',')]
    pub bot_emails: Option<Vec<String>>,

    /// Comma-separated commit SHA prefixes to leave out
    #[arg(long, value_delimiter = ',')]
    pub exclude_commits: Option<Vec<String>>,

    /// Regenerate go.mod / go.sum / vendor after the rebase
    #[arg(long)]
    pub update_go_modules: bool,

    /// Rebase locally without pushing or touching PRs
    #[arg(long)]
    pub dry_run: bool,

    /// Run even when a PR carries the rebase/manual label
    #[arg(long)]
    pub ignore_manual_label: bool,

    /// Config file [default: <config dir>/rebasebot/config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags as a config layer; unset flags leave file values alone
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            source: self.source.clone(),
            dest: self.dest.clone(),
            rebase: self.rebase.clone(),
            working_dir: self.working_dir.clone(),
            git_username: self.git_username.clone(),
            git_email: self.git_email.clone(),
            slack_webhook: self.slack_webhook.clone(),
            tag_policy: self.tag_policy.clone(),
            bot_emails: self.bot_emails.clone(),
            exclude_commits: self.exclude_commits.clone(),
            update_go_modules: self.update_go_modules.then_some(true),
            dry_run: self.dry_run.then_some(true),
            ignore_manual_label: self.ignore_manual_label.then_some(true),
        }
    }
}
