//! Replay of carried commits onto the rebase base
//!
//! Walks `(merge-base, dest head]` oldest first, applies the selection
//! policy and cherry-picks what survives. Commits by configured bots are
//! held back and folded into one commit per bot at the end of the branch,
//! so bot carries move behind every other carry.

use crate::error::Result;
use crate::rebase::conflict::pick_commit;
use crate::rebase::policy::{DropReason, MergedPrLookup, Selection, SelectionPolicy};
use crate::rebase::squash::{SquashGroups, bot_identity};
use crate::repo::GitWorkspace;
use crate::types::Commit;
use tracing::{debug, info};

/// Replay settings
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Commit selection policy
    pub policy: SelectionPolicy,
    /// Bot emails whose commits get squashed; empty disables squashing
    pub bot_emails: Vec<String>,
}

impl ReplayOptions {
    fn squash_identity<'a>(&self, commit: &'a Commit) -> Option<&'a str> {
        let identity = bot_identity(&commit.author_email);
        self.bot_emails
            .iter()
            .any(|bot| bot == identity)
            .then_some(identity)
    }
}

/// One consolidated bot commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashedGroup {
    /// Bot identity (normalized email)
    pub identity: String,
    /// Buffered commits folded into it
    pub commit_count: usize,
    /// Message used (the identity's last buffered commit)
    pub message: String,
}

/// What a replay did
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    /// Merge base of source and destination
    pub merge_base: String,
    /// Commits cherry-picked immediately, in order
    pub picked: Vec<Commit>,
    /// Commits left out and why
    pub dropped: Vec<(Commit, DropReason)>,
    /// Bot groups committed at the end of the branch
    pub squashed: Vec<SquashedGroup>,
}

/// Replay the carried commits of `dest_ref` onto the checked-out rebase branch
pub async fn replay_carried_commits<L>(
    ws: &GitWorkspace,
    source_ref: &str,
    dest_ref: &str,
    options: &ReplayOptions,
    prs: &L,
) -> Result<ReplaySummary>
where
    L: MergedPrLookup + ?Sized,
{
    info!("performing rebase");
    if !options.bot_emails.is_empty() {
        info!(bots = ?options.bot_emails, "bot squashing is enabled");
    }

    let merge_base = ws.merge_base(source_ref, dest_ref)?;
    info!(%merge_base, "rebasing from merge base");

    let commits = ws.ancestry_path_commits(&merge_base, dest_ref)?;
    info!(count = commits.len(), "identified carried commits");

    let mut summary = ReplaySummary {
        merge_base,
        ..ReplaySummary::default()
    };
    let mut groups = SquashGroups::new();

    for commit in commits {
        match options.policy.select(&commit, prs).await? {
            Selection::Drop(reason) => {
                info!(sha = %commit.short_sha(), message = %commit.message, %reason, "dropping commit");
                summary.dropped.push((commit, reason));
                continue;
            }
            Selection::Carry => {}
        }

        if let Some(identity) = options.squash_identity(&commit) {
            debug!(sha = %commit.short_sha(), identity, "deferring bot commit");
            let identity = identity.to_string();
            groups.push(&identity, commit);
            continue;
        }

        info!(sha = %commit.short_sha(), message = %commit.message, "picking commit");
        pick_commit(ws, &commit.sha)?;
        summary.picked.push(commit);
    }

    for (identity, commits) in groups.iter() {
        info!(identity, count = commits.len(), "squashing bot commits");
        if let Some(group) = squash_group(ws, identity, commits)? {
            summary.squashed.push(group);
        }
    }

    Ok(summary)
}

/// Pick every buffered commit for `identity`, then fold them into one commit
/// authored by the bot with the newest buffered message.
fn squash_group(
    ws: &GitWorkspace,
    identity: &str,
    commits: &[Commit],
) -> Result<Option<SquashedGroup>> {
    let Some(last) = commits.last() else {
        return Ok(None);
    };

    let mut created = 0;
    for commit in commits {
        if pick_commit(ws, &commit.sha)?.created_commit() {
            created += 1;
        }
    }

    if created == 0 {
        info!(identity, "bot commits are already applied, nothing to squash");
        return Ok(None);
    }

    ws.reset_soft(created)?;
    if !ws.has_staged_changes()? {
        info!(identity, "bot commits cancel out, nothing to squash");
        return Ok(None);
    }

    let author = format!("{} <{identity}>", last.author_name);
    ws.commit(&last.message, Some(&author))?;

    Ok(Some(SquashedGroup {
        identity: identity.to_string(),
        commit_count: commits.len(),
        message: last.message.clone(),
    }))
}
