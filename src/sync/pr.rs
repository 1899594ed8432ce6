//! Rebase PR title handling and creation

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{BranchRef, PullRequest};
use tracing::info;

/// Word that anchors the generated part of a rebase PR title
pub const TITLE_ANCHOR: &str = "Merge";

/// Generated PR title: `Merge {url}:{branch} ({sha}) into {dest}`
pub fn rebase_pr_description(source: &BranchRef, source_short_sha: &str, dest_branch: &str) -> String {
    format!(
        "{TITLE_ANCHOR} {}:{} ({source_short_sha}) into {dest_branch}",
        source.url, source.branch
    )
}

/// New title for an existing PR, keeping anything before the anchor.
///
/// Returns `None` unless the anchor occurs exactly once, so titles a human
/// rewrote are left alone.
pub fn refreshed_title(current: &str, description: &str) -> Option<String> {
    if current.matches(TITLE_ANCHOR).count() != 1 {
        return None;
    }
    let (prefix, _) = current.split_once(TITLE_ANCHOR)?;
    Some(format!("{prefix}{description}"))
}

/// Open the rebase PR against the destination branch
pub async fn create_rebase_pr(
    dest: &dyn PlatformService,
    rebase: &BranchRef,
    dest_branch: &str,
    title: &str,
) -> Result<PullRequest> {
    info!(title, "creating a pull request");
    dest.create_pr(&rebase.head_spec(), dest_branch, title).await
}
