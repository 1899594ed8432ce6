//! Commit selection policy - which carried commits survive a replay
//!
//! Rules, first match wins:
//! 1. SHA matches an exclusion prefix → drop
//! 2. generated lockfile commit (when regeneration is on) → drop
//! 3. tag policy `none` → carry
//! 4. `UPSTREAM: <tag>:` prefix → `<drop>` drops, `<carry>` carries,
//!    a PR number drops once that PR merged in the source repository,
//!    anything else is an error
//! 5. untagged → carry under `soft`, drop under `strict`

use crate::error::{Error, Result};
use crate::lockfile::GENERATED_COMMIT_MESSAGE;
use crate::types::{Commit, TagPolicy};
use async_trait::async_trait;

/// Prefix that marks a tagged downstream commit
pub const UPSTREAM_PREFIX: &str = "UPSTREAM: ";

/// Answers "has this PR merged?" for the source repository
#[async_trait]
pub trait MergedPrLookup: Send + Sync {
    /// Whether PR `number` in the source repository is merged
    async fn is_merged(&self, number: u64) -> Result<bool>;
}

/// Why a commit was left out of the replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// SHA matches a configured exclusion prefix
    Excluded,
    /// Output of the previous run's lockfile regeneration
    GeneratedLockfileCommit,
    /// Tagged `<drop>`
    DropTag,
    /// Tagged with a source PR that has merged
    MergedUpstream(u64),
    /// Untagged under the strict policy
    Untagged,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excluded => write!(f, "explicitly excluded"),
            Self::GeneratedLockfileCommit => write!(f, "generated go modules commit"),
            Self::DropTag => write!(f, "tagged <drop>"),
            Self::MergedUpstream(n) => write!(f, "upstream PR #{n} is merged"),
            Self::Untagged => write!(f, "untagged under strict policy"),
        }
    }
}

/// Outcome of the policy for one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Replay the commit
    Carry,
    /// Leave it out
    Drop(DropReason),
}

impl Selection {
    /// Whether the commit is replayed
    pub const fn is_carry(&self) -> bool {
        matches!(self, Self::Carry)
    }
}

/// Tag found in an `UPSTREAM: <tag>: ...` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitTag<'a> {
    /// `<carry>`
    Carry,
    /// `<drop>`
    Drop,
    /// Source repository PR number
    PullRequest(u64),
    /// Anything else
    Unknown(&'a str),
}

/// Extract the tag from a commit subject, `None` when untagged
pub fn parse_commit_tag(message: &str) -> Option<CommitTag<'_>> {
    let rest = message.strip_prefix(UPSTREAM_PREFIX)?;
    let tag = rest.split(':').next().unwrap_or_default();
    Some(match tag {
        "<carry>" => CommitTag::Carry,
        "<drop>" => CommitTag::Drop,
        t if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) => t
            .parse()
            .map_or(CommitTag::Unknown(t), CommitTag::PullRequest),
        t => CommitTag::Unknown(t),
    })
}

/// Per-run selection settings
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    /// How untagged commits are treated
    pub tag_policy: TagPolicy,
    /// SHA prefixes that are always dropped
    pub exclude_commits: Vec<String>,
    /// Drop the previous run's generated lockfile commit
    pub prune_generated_commits: bool,
}

impl SelectionPolicy {
    fn is_excluded(&self, sha: &str) -> bool {
        self.exclude_commits
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| sha.starts_with(prefix.as_str()))
    }

    /// Decide whether `commit` is carried.
    ///
    /// Numeric tags cost one lookup through `prs`; nothing is cached.
    pub async fn select<L>(&self, commit: &Commit, prs: &L) -> Result<Selection>
    where
        L: MergedPrLookup + ?Sized,
    {
        if self.is_excluded(&commit.sha) {
            return Ok(Selection::Drop(DropReason::Excluded));
        }

        if self.prune_generated_commits && commit.message == GENERATED_COMMIT_MESSAGE {
            return Ok(Selection::Drop(DropReason::GeneratedLockfileCommit));
        }

        if self.tag_policy == TagPolicy::None {
            return Ok(Selection::Carry);
        }

        match parse_commit_tag(&commit.message) {
            Some(CommitTag::Carry) => Ok(Selection::Carry),
            Some(CommitTag::Drop) => Ok(Selection::Drop(DropReason::DropTag)),
            Some(CommitTag::PullRequest(number)) => {
                if prs.is_merged(number).await? {
                    Ok(Selection::Drop(DropReason::MergedUpstream(number)))
                } else {
                    Ok(Selection::Carry)
                }
            }
            Some(CommitTag::Unknown(tag)) => Err(Error::UnknownCommitTag {
                sha: commit.sha.clone(),
                tag: tag.to_string(),
            }),
            None if self.tag_policy == TagPolicy::Soft => Ok(Selection::Carry),
            None => Ok(Selection::Drop(DropReason::Untagged)),
        }
    }
}
