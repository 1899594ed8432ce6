//! Run configuration: TOML file layered under command-line flags

use crate::error::{Error, Result};
use crate::types::{BranchRef, TagPolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default working directory for the clone
pub const DEFAULT_WORKING_DIR: &str = "rebasebot_repo";

/// Directory under the user config dir holding `config.toml`
const CONFIG_DIR: &str = "rebasebot";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Configuration as read from one layer; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialConfig {
    /// Upstream branch spec
    pub source: Option<String>,
    /// Downstream branch spec
    pub dest: Option<String>,
    /// Branch spec the rebase is pushed to
    pub rebase: Option<String>,
    /// Clone location
    pub working_dir: Option<PathBuf>,
    /// Committer name
    pub git_username: Option<String>,
    /// Committer email
    pub git_email: Option<String>,
    /// Slack incoming webhook
    pub slack_webhook: Option<String>,
    /// Tag policy name
    pub tag_policy: Option<String>,
    /// Bot emails whose commits get squashed
    pub bot_emails: Option<Vec<String>>,
    /// Commit SHA prefixes to leave out
    pub exclude_commits: Option<Vec<String>>,
    /// Regenerate Go module files after the rebase
    pub update_go_modules: Option<bool>,
    /// Stop before pushing
    pub dry_run: Option<bool>,
    /// Don't abort on a `rebase/manual` labeled PR
    pub ignore_manual_label: Option<bool>,
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream branch (or tag)
    pub source: BranchRef,
    /// Downstream branch
    pub dest: BranchRef,
    /// Branch the rebase is pushed to
    pub rebase: BranchRef,
    /// Clone location
    pub working_dir: PathBuf,
    /// Committer name
    pub git_username: Option<String>,
    /// Committer email
    pub git_email: Option<String>,
    /// Slack incoming webhook
    pub slack_webhook: Option<String>,
    /// How untagged commits are treated
    pub tag_policy: TagPolicy,
    /// Bot emails whose commits get squashed
    pub bot_emails: Vec<String>,
    /// Commit SHA prefixes to leave out
    pub exclude_commits: Vec<String>,
    /// Regenerate Go module files after the rebase
    pub update_go_modules: bool,
    /// Stop before pushing
    pub dry_run: bool,
    /// Don't abort on a `rebase/manual` labeled PR
    pub ignore_manual_label: bool,
}

impl PartialConfig {
    /// Load a config layer from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load the default config file if it exists, else an empty layer.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            source: other.source.or(self.source),
            dest: other.dest.or(self.dest),
            rebase: other.rebase.or(self.rebase),
            working_dir: other.working_dir.or(self.working_dir),
            git_username: other.git_username.or(self.git_username),
            git_email: other.git_email.or(self.git_email),
            slack_webhook: other.slack_webhook.or(self.slack_webhook),
            tag_policy: other.tag_policy.or(self.tag_policy),
            bot_emails: other.bot_emails.or(self.bot_emails),
            exclude_commits: other.exclude_commits.or(self.exclude_commits),
            update_go_modules: other.update_go_modules.or(self.update_go_modules),
            dry_run: other.dry_run.or(self.dry_run),
            ignore_manual_label: other.ignore_manual_label.or(self.ignore_manual_label),
        }
    }

    /// Validate and fill defaults.
    pub fn resolve(self) -> Result<Config> {
        let source = required_branch(self.source, "source")?;
        let dest = required_branch(self.dest, "dest")?;
        let rebase = required_branch(self.rebase, "rebase")?;

        let tag_policy = self
            .tag_policy
            .as_deref()
            .map(str::parse::<TagPolicy>)
            .transpose()?
            .unwrap_or_default();

        Ok(Config {
            source,
            dest,
            rebase,
            working_dir: self
                .working_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIR)),
            git_username: self.git_username.filter(|s| !s.is_empty()),
            git_email: self.git_email.filter(|s| !s.is_empty()),
            slack_webhook: self.slack_webhook.filter(|s| !s.is_empty()),
            tag_policy,
            bot_emails: clean_list(self.bot_emails),
            exclude_commits: clean_list(self.exclude_commits),
            update_go_modules: self.update_go_modules.unwrap_or(false),
            dry_run: self.dry_run.unwrap_or(false),
            ignore_manual_label: self.ignore_manual_label.unwrap_or(false),
        })
    }
}

fn required_branch(spec: Option<String>, name: &str) -> Result<BranchRef> {
    let spec = spec.ok_or_else(|| Error::Config(format!("missing required setting `{name}`")))?;
    BranchRef::parse(&spec)
}

fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Path of the per-user config file, `<config_dir>/rebasebot/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}
