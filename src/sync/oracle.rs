//! Decides whether a rebase, a push or a new PR is actually needed

use crate::error::Result;
use crate::platform::PlatformService;
use crate::repo::{GitWorkspace, REBASE_REMOTE};
use crate::types::{BranchRef, PullRequest};
use tracing::{error, info};

/// Whether the destination still lacks the source head.
///
/// `false` once a fetched destination branch already contains
/// `source_ref`. Lookup failures count as "rebase needed".
pub fn needs_rebase(ws: &GitWorkspace, source_ref: &str, dest_ref: &str) -> bool {
    match ws.remote_branches_containing(source_ref) {
        Ok(branches) => {
            info!(?branches, "branches containing source head");
            if branches.iter().any(|b| b == dest_ref) {
                info!("dest branch already contains the latest changes");
                return false;
            }
        }
        Err(e) => {
            // git errors when the source head isn't known to dest at all
            error!(error = %e, "branch containment lookup failed");
        }
    }
    true
}

/// Whether the local rebase branch has to be force-pushed.
///
/// Not needed when no rebase is needed, or when the remote rebase branch
/// already has the same content as the local one.
pub fn is_push_required(
    ws: &GitWorkspace,
    source_ref: &str,
    dest_ref: &str,
    rebase: &BranchRef,
) -> Result<bool> {
    if !needs_rebase(ws, source_ref, dest_ref) {
        return Ok(false);
    }

    if ws.has_remote_tracking_ref(REBASE_REMOTE, &rebase.branch)?
        && ws.trees_equal(&rebase.remote_ref(REBASE_REMOTE), "HEAD")?
    {
        info!("existing rebase branch already contains source");
        return Ok(false);
    }

    Ok(true)
}

/// The open PR for the rebase branch, if any
pub async fn find_rebase_pr(
    dest: &dyn PlatformService,
    rebase: &BranchRef,
) -> Result<Option<PullRequest>> {
    info!("checking for existing pull request");
    let pr = dest.find_existing_pr(&rebase.head_spec()).await?;
    match pr {
        Some(ref pr) => info!(url = %pr.html_url, "found existing pull request"),
        None => info!("no existing pull request found"),
    }
    Ok(pr)
}
