//! Sync execution - effectful orchestration of one run
//!
//! Looks up the repositories, prepares the clone, rebases when needed and
//! then carries out the [`SyncPlan`] against git and the platform.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lockfile::update_go_modules;
use crate::notify::Notifier;
use crate::platform::PlatformService;
use crate::rebase::{
    ReplayOptions, ReplaySummary, SelectionPolicy, bridge_commit_message, prepare_rebase_branch,
    replay_carried_commits,
};
use crate::repo::{
    BranchSet, DEST_REMOTE, GitIdentity, GitWorkspace, REBASE_REMOTE, SOURCE_REMOTE,
    WorkspaceCredentials, init_workspace,
};
use crate::sync::oracle::{find_rebase_pr, is_push_required, needs_rebase};
use crate::sync::plan::{SyncPlan, SyncState, SyncStep, create_sync_plan};
use crate::sync::pr::{create_rebase_pr, rebase_pr_description};
use crate::types::PullRequest;
use tracing::{error, info, warn};

/// Label that tells the bot to keep its hands off the destination
pub const MANUAL_REBASE_LABEL: &str = "rebase/manual";

const SHORT_SHA_LEN: usize = 7;

/// Everything a run needs, built by the caller
pub struct RunContext {
    /// Resolved configuration
    pub config: Config,
    /// Destination repository (PRs are opened here)
    pub dest: Box<dyn PlatformService>,
    /// Repository holding the rebase branch
    pub rebase: Box<dyn PlatformService>,
    /// Upstream repository (merged-PR lookups)
    pub source: Box<dyn PlatformService>,
    /// Tokens for the git remotes
    pub credentials: WorkspaceCredentials,
    /// Where status messages go
    pub notifier: Notifier,
}

/// How a run ended, for every case that is not an operational failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A rebase PR was opened
    Created {
        /// PR URL
        url: String,
    },
    /// The existing rebase PR got new content
    Updated {
        /// PR URL
        url: String,
    },
    /// The existing rebase PR already carries this rebase
    AlreadyUpToDate {
        /// PR URL
        url: String,
    },
    /// Destination already contains the source head
    DestinationUpToDate {
        /// Destination repository URL
        dest_url: String,
    },
    /// Rebase computed, nothing published
    DryRun,
    /// An open PR carries the manual label
    ManualLabel {
        /// Labeled PR URL
        pr_url: String,
        /// Destination repository URL
        dest_url: String,
    },
    /// A conflict needs a human
    ManualIntervention {
        /// What went wrong
        reason: String,
    },
}

impl RunOutcome {
    /// Whether the outcome asks a human to act
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::ManualLabel { .. } | Self::ManualIntervention { .. })
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created { url } => write!(f, "I created a new rebase PR: {url}"),
            Self::Updated { url } => write!(f, "I updated existing rebase PR: {url}"),
            Self::AlreadyUpToDate { url } => {
                write!(f, "PR {url} already contains the latest changes")
            }
            Self::DestinationUpToDate { dest_url } => {
                write!(f, "Destination repo {dest_url} already contains the latest changes")
            }
            Self::DryRun => write!(f, "Dry run mode is enabled, no changes were pushed"),
            Self::ManualLabel { pr_url, dest_url } => write!(
                f,
                "Repo {dest_url} has PR {pr_url} with '{MANUAL_REBASE_LABEL}' label, aborting"
            ),
            Self::ManualIntervention { reason } => write!(f, "{reason}"),
        }
    }
}

/// Where in the run a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RepositoryLookup,
    WorkspaceInit,
    Rebase,
    Inspect,
    Push,
    UpdateTitle(u64),
    CreatePr,
}

impl RunContext {
    fn stage_message(&self, stage: Stage, err: &Error) -> String {
        let cfg = &self.config;
        match stage {
            Stage::RepositoryLookup => {
                format!("I got an error fetching repo information from GitHub: {err}")
            }
            Stage::WorkspaceInit => format!("I got an error initializing the git directory: {err}"),
            Stage::Rebase => format!(
                "I got an error trying to rebase {} into {}: {err}",
                cfg.source, cfg.dest
            ),
            Stage::Inspect => format!(
                "I got an error checking the state of {}: {err}",
                cfg.rebase
            ),
            Stage::Push => format!("I got an error pushing to {}: {err}", cfg.rebase),
            Stage::UpdateTitle(n) => {
                format!("I got an error changing title of PR #{n} in {}: {err}", cfg.dest)
            }
            Stage::CreatePr => format!(
                "I got an error creating a rebase PR in {}/{}: {err}",
                cfg.dest.namespace, cfg.dest.repo_name
            ),
        }
    }

    /// Log and notify a failed stage, handing the error back
    async fn fail(&self, stage: Stage, err: Error) -> Error {
        let message = self.stage_message(stage, &err);
        error!(?stage, error = %err, "run failed");
        self.notifier.send(&message).await;
        err
    }

    fn branches(&self) -> BranchSet {
        BranchSet {
            source: self.config.source.clone(),
            dest: self.config.dest.clone(),
            rebase: self.config.rebase.clone(),
        }
    }

    fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            policy: SelectionPolicy {
                tag_policy: self.config.tag_policy,
                exclude_commits: self.config.exclude_commits.clone(),
                prune_generated_commits: self.config.update_go_modules,
            },
            bot_emails: self.config.bot_emails.clone(),
        }
    }
}

/// Run one synchronization.
///
/// Handled outcomes (including the two manual ones) are `Ok`; operational
/// failures and policy violations are `Err` after being reported.
pub async fn run(ctx: &RunContext) -> Result<RunOutcome> {
    let cfg = &ctx.config;

    let labeled = match lookup_repositories(ctx).await {
        Ok(labeled) => labeled,
        Err(e) => return Err(ctx.fail(Stage::RepositoryLookup, e).await),
    };
    if let Some(pr) = labeled {
        let outcome = RunOutcome::ManualLabel {
            pr_url: pr.html_url,
            dest_url: cfg.dest.url.clone(),
        };
        return Ok(report(ctx, outcome).await);
    }

    let ws = match init_workspace(
        &cfg.working_dir,
        &ctx.branches(),
        &ctx.credentials,
        &GitIdentity {
            name: cfg.git_username.clone(),
            email: cfg.git_email.clone(),
        },
    ) {
        Ok(ws) => ws,
        Err(e) => return Err(ctx.fail(Stage::WorkspaceInit, e).await),
    };

    let source_ref = cfg.source.remote_ref(SOURCE_REMOTE);
    let dest_ref = cfg.dest.remote_ref(DEST_REMOTE);

    let rebase_needed = needs_rebase(&ws, &source_ref, &dest_ref);
    if rebase_needed {
        match rebase(ctx, &ws, &source_ref, &dest_ref).await {
            Ok(summary) => info!(
                picked = summary.picked.len(),
                dropped = summary.dropped.len(),
                squashed = summary.squashed.len(),
                "rebase complete"
            ),
            Err(e) if e.is_manual_intervention() => {
                let reason = format!(
                    "Manual intervention is needed to rebase {}:{} into {}: {e}",
                    cfg.source.url, cfg.source.branch, cfg.dest
                );
                return Ok(report(ctx, RunOutcome::ManualIntervention { reason }).await);
            }
            Err(e) => return Err(ctx.fail(Stage::Rebase, e).await),
        }
    }

    if cfg.dry_run {
        info!("dry run mode is enabled, not pushing or touching PRs");
        return Ok(RunOutcome::DryRun);
    }

    let (plan, description) = match inspect(ctx, &ws, &source_ref, &dest_ref, rebase_needed).await
    {
        Ok(found) => found,
        Err(e) => return Err(ctx.fail(Stage::Inspect, e).await),
    };
    info!(steps = plan.steps.len(), %description, "sync plan ready");

    let outcome = execute_sync_plan(ctx, &ws, &plan).await?;
    Ok(report(ctx, outcome).await)
}

/// Resolve all three repositories and look for a manual-label PR
async fn lookup_repositories(ctx: &RunContext) -> Result<Option<PullRequest>> {
    for (role, platform) in [
        ("dest", &ctx.dest),
        ("rebase", &ctx.rebase),
        ("source", &ctx.source),
    ] {
        let url = platform.repository_url().await?;
        let repo = platform.config();
        info!(role, owner = %repo.owner, repo = %repo.repo, %url, "resolved repository");
    }

    if ctx.config.ignore_manual_label {
        return Ok(None);
    }
    ctx.dest.find_labeled_pr(MANUAL_REBASE_LABEL).await
}

async fn rebase(
    ctx: &RunContext,
    ws: &GitWorkspace,
    source_ref: &str,
    dest_ref: &str,
) -> Result<ReplaySummary> {
    let cfg = &ctx.config;
    let message = bridge_commit_message(&cfg.source.branch, &cfg.dest.branch);
    prepare_rebase_branch(ws, source_ref, dest_ref, &message)?;

    let summary =
        replay_carried_commits(ws, source_ref, dest_ref, &ctx.replay_options(), ctx.source.as_ref())
            .await?;

    if cfg.update_go_modules {
        info!("updating go modules");
        if update_go_modules(ws, source_ref)? {
            info!("committed updated go modules");
        }
    }

    Ok(summary)
}

async fn inspect(
    ctx: &RunContext,
    ws: &GitWorkspace,
    source_ref: &str,
    dest_ref: &str,
    rebase_needed: bool,
) -> Result<(SyncPlan, String)> {
    let cfg = &ctx.config;
    let push_required = is_push_required(ws, source_ref, dest_ref, &cfg.rebase)?;
    let existing_pr = find_rebase_pr(ctx.dest.as_ref(), &cfg.rebase).await?;

    let short_sha = ws.rev_parse_short(source_ref, SHORT_SHA_LEN)?;
    let description = rebase_pr_description(&cfg.source, &short_sha, &cfg.dest.branch);

    let state = SyncState {
        needs_rebase: rebase_needed,
        push_required,
        existing_pr,
    };
    Ok((create_sync_plan(&state, &description), description))
}

/// Carry out `plan` (EFFECTFUL), stopping at the first failed step
async fn execute_sync_plan(
    ctx: &RunContext,
    ws: &GitWorkspace,
    plan: &SyncPlan,
) -> Result<RunOutcome> {
    let cfg = &ctx.config;
    let mut created = None;

    for step in &plan.steps {
        info!(%step, "executing");
        match step {
            SyncStep::PushRebaseBranch => {
                if let Err(e) = push_rebase_branch(ws, &cfg.rebase.branch) {
                    return Err(ctx.fail(Stage::Push, e).await);
                }
            }
            SyncStep::UpdatePrTitle { pr_number, title } => {
                if let Err(e) = ctx.dest.update_pr_title(*pr_number, title).await {
                    return Err(ctx.fail(Stage::UpdateTitle(*pr_number), e).await);
                }
            }
            SyncStep::CreatePr { title } => {
                match create_rebase_pr(ctx.dest.as_ref(), &cfg.rebase, &cfg.dest.branch, title)
                    .await
                {
                    Ok(pr) => created = Some(pr),
                    Err(e) => return Err(ctx.fail(Stage::CreatePr, e).await),
                }
            }
        }
    }

    Ok(outcome_for(plan, created, &cfg.dest.url))
}

fn outcome_for(plan: &SyncPlan, created: Option<PullRequest>, dest_url: &str) -> RunOutcome {
    if let Some(pr) = created {
        return RunOutcome::Created { url: pr.html_url };
    }
    match &plan.existing_pr {
        Some(pr) if plan.push_required => RunOutcome::Updated {
            url: pr.html_url.clone(),
        },
        Some(pr) => RunOutcome::AlreadyUpToDate {
            url: pr.html_url.clone(),
        },
        None => RunOutcome::DestinationUpToDate {
            dest_url: dest_url.to_string(),
        },
    }
}

/// Force-push the checked-out rebase branch, failing on any rejected ref
fn push_rebase_branch(ws: &GitWorkspace, branch: &str) -> Result<()> {
    let refspec = format!("HEAD:refs/heads/{branch}");
    info!(remote = REBASE_REMOTE, %refspec, "force pushing rebase branch");

    let statuses = ws.force_push(REBASE_REMOTE, &refspec)?;
    if let Some(rejected) = statuses.iter().find(|s| s.is_error()) {
        return Err(Error::Push {
            target: format!("{REBASE_REMOTE}/{branch}"),
            summary: rejected.summary.clone(),
        });
    }
    Ok(())
}

async fn report(ctx: &RunContext, outcome: RunOutcome) -> RunOutcome {
    let message = outcome.to_string();
    if outcome.needs_attention() {
        warn!("{message}");
    } else {
        info!("{message}");
    }
    ctx.notifier.send(&message).await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(url: &str) -> PullRequest {
        PullRequest {
            number: 7,
            html_url: url.to_string(),
            base_ref: "main".to_string(),
            head_ref: "rebase".to_string(),
            title: "Merge x".to_string(),
            labels: vec![],
        }
    }

    fn plan(push_required: bool, existing: Option<PullRequest>) -> SyncPlan {
        SyncPlan {
            steps: vec![],
            push_required,
            existing_pr: existing,
        }
    }

    #[test]
    fn test_outcome_prefers_created_pr() {
        let outcome = outcome_for(&plan(true, None), Some(pr("https://x/1")), "https://d");
        assert_eq!(
            outcome,
            RunOutcome::Created {
                url: "https://x/1".to_string()
            }
        );
    }

    #[test]
    fn test_outcome_for_existing_pr() {
        let updated = outcome_for(&plan(true, Some(pr("https://x/7"))), None, "https://d");
        assert!(matches!(updated, RunOutcome::Updated { .. }));

        let unchanged = outcome_for(&plan(false, Some(pr("https://x/7"))), None, "https://d");
        assert_eq!(
            unchanged.to_string(),
            "PR https://x/7 already contains the latest changes"
        );
    }

    #[test]
    fn test_outcome_without_any_pr() {
        let outcome = outcome_for(&plan(false, None), None, "https://github.com/o/d");
        assert_eq!(
            outcome.to_string(),
            "Destination repo https://github.com/o/d already contains the latest changes"
        );
    }
}
