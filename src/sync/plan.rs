//! Sync planning - pure functions deciding what to publish
//!
//! All repository and platform state is gathered beforehand, so the push /
//! title / PR decisions can be unit tested without git or GitHub.

use crate::sync::pr::refreshed_title;
use crate::types::PullRequest;

/// Gathered state the plan is computed from
#[derive(Debug, Clone)]
pub struct SyncState {
    /// Destination does not contain the source head yet
    pub needs_rebase: bool,
    /// Local rebase branch differs from the remote one
    pub push_required: bool,
    /// Open PR for the rebase branch
    pub existing_pr: Option<PullRequest>,
}

/// A single publishing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    /// Force-push the local rebase branch
    PushRebaseBranch,
    /// Rewrite the title of the existing PR
    UpdatePrTitle {
        /// PR number
        pr_number: u64,
        /// New title
        title: String,
    },
    /// Open a new rebase PR
    CreatePr {
        /// Title for the new PR
        title: String,
    },
}

impl std::fmt::Display for SyncStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PushRebaseBranch => write!(f, "push rebase branch"),
            Self::UpdatePrTitle { pr_number, title } => {
                write!(f, "retitle PR #{pr_number}: {title}")
            }
            Self::CreatePr { title } => write!(f, "create PR: {title}"),
        }
    }
}

/// Sync plan - the functional core output
///
/// Created by [`create_sync_plan`] and carried out by the executor in order.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Ordered steps to perform
    pub steps: Vec<SyncStep>,
    /// Whether the plan force-pushes
    pub push_required: bool,
    /// PR that already existed before the run
    pub existing_pr: Option<PullRequest>,
}

impl SyncPlan {
    /// Check if the plan does nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check if the plan opens a new PR
    #[must_use]
    pub fn creates_pr(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, SyncStep::CreatePr { .. }))
    }
}

/// Create a sync plan (PURE - no I/O)
///
/// Pushes when required. An existing PR is retitled only after a push and
/// only when its title carries exactly one anchor; without a PR one is
/// opened whenever a rebase is needed, pushed or not.
#[must_use]
pub fn create_sync_plan(state: &SyncState, description: &str) -> SyncPlan {
    let mut steps = Vec::new();

    if state.push_required {
        steps.push(SyncStep::PushRebaseBranch);
    }

    match &state.existing_pr {
        Some(pr) if state.push_required => {
            if let Some(title) = refreshed_title(&pr.title, description)
                && title != pr.title
            {
                steps.push(SyncStep::UpdatePrTitle {
                    pr_number: pr.number,
                    title,
                });
            }
        }
        Some(_) => {}
        None if state.needs_rebase => steps.push(SyncStep::CreatePr {
            title: description.to_string(),
        }),
        None => {}
    }

    SyncPlan {
        steps,
        push_required: state.push_required,
        existing_pr: state.existing_pr.clone(),
    }
}
