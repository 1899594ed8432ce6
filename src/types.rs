//! Core types for rebasebot

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// Host used for `<namespace>/<repo>:<branch>` shorthand specs
pub const GITHUB_HOST: &str = "github.com";

static SHORT_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<ns>[A-Za-z0-9_.-]+)/(?P<name>[A-Za-z0-9_.-]+):(?P<branch>[^:\s]+)$")
        .expect("branch spec pattern is valid")
});

/// A named branch in a hosted repository
///
/// Three of these exist per run: source (upstream), destination (the
/// maintained fork) and rebase (where the rebase branch is pushed).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct BranchRef {
    /// Owner (user or organization)
    pub namespace: String,
    /// Repository name
    pub repo_name: String,
    /// Branch (or, for the source, possibly a tag)
    pub branch: String,
    /// Clone URL, also used in PR titles
    pub url: String,
}

impl BranchRef {
    /// Parse `<namespace>/<repo>:<branch>` or `<url>:<branch>`.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();

        if let Some(caps) = SHORT_SPEC.captures(spec) {
            let namespace = caps["ns"].to_string();
            let repo_name = caps["name"].trim_end_matches(".git").to_string();
            return Ok(Self {
                url: format!("https://{GITHUB_HOST}/{namespace}/{repo_name}"),
                namespace,
                repo_name,
                branch: caps["branch"].to_string(),
            });
        }

        let invalid = || Error::InvalidBranchRef(spec.to_string());

        let (url_part, branch) = spec.rsplit_once(':').ok_or_else(invalid)?;
        // "https://host/ns/repo" with no branch splits on the scheme colon
        if branch.is_empty() || branch.starts_with('/') || branch.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let url = Url::parse(url_part).map_err(|_| invalid())?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let [.., namespace, repo_name] = segments.as_slice() else {
            return Err(invalid());
        };

        Ok(Self {
            namespace: (*namespace).to_string(),
            repo_name: repo_name.trim_end_matches(".git").to_string(),
            branch: branch.to_string(),
            url: url_part.to_string(),
        })
    }

    /// Remote-tracking ref for this branch under `remote`, e.g. `dest/main`
    pub fn remote_ref(&self, remote: &str) -> String {
        format!("{remote}/{}", self.branch)
    }

    /// `owner:branch` form used to filter pull requests by head
    pub fn head_spec(&self) -> String {
        format!("{}:{}", self.namespace, self.branch)
    }

    /// API host when the repository isn't on github.com (GitHub Enterprise)
    pub fn enterprise_host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .filter(|h| h != GITHUB_HOST)
    }
}

impl TryFrom<String> for BranchRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl std::fmt::Display for BranchRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.repo_name, self.branch)
    }
}

/// A commit from the carried range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full hex SHA
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email as recorded in the commit
    pub author_email: String,
}

impl Commit {
    /// Abbreviated SHA for log output
    pub fn short_sha(&self) -> &str {
        &self.sha[..self.sha.len().min(7)]
    }
}

/// How untagged commits are treated during replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TagPolicy {
    /// Carry every commit, tags are not inspected
    #[default]
    None,
    /// Honour tags, carry untagged commits
    Soft,
    /// Honour tags, drop untagged commits
    Strict,
}

impl FromStr for TagPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "soft" => Ok(Self::Soft),
            "strict" => Ok(Self::Strict),
            other => Err(Error::UnknownTagPolicy(other.to_string())),
        }
    }
}

impl TryFrom<String> for TagPolicy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl std::fmt::Display for TagPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Soft => write!(f, "soft"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// One entry of `git status --porcelain` after a failed cherry-pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictStatusEntry {
    /// Two-character XY status code, e.g. `UD` or `M `
    pub code: String,
    /// Path relative to the workspace root
    pub path: String,
}

impl std::fmt::Display for ConflictStatusEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.path)
    }
}

/// A pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
    /// Label names
    pub labels: Vec<String>,
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Single-PR lookup result, enough to tell whether it merged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestDetails {
    /// PR number
    pub number: u64,
    /// Current state of the PR
    pub state: PrState,
}

/// Repository a platform service talks to
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// Platform config addressing the repository of `branch`
    pub fn for_branch(branch: &BranchRef) -> Self {
        Self {
            owner: branch.namespace.clone(),
            repo: branch.repo_name.clone(),
            host: branch.enterprise_host(),
        }
    }
}
