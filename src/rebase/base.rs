//! Synthetic bridging commit the carried commits are replayed onto

use crate::error::Result;
use crate::repo::{GitWorkspace, REBASE_BRANCH};
use tracing::{debug, info};

/// Scratch branch holding the source head while the bridge is built
pub const MERGE_TMP_BRANCH: &str = "merge-tmp";

/// Message of the bridging commit.
///
/// Reserved: downstream commits must never use this exact text.
pub fn bridge_commit_message(source_branch: &str, dest_branch: &str) -> String {
    format!("merge upstream/{source_branch} into {dest_branch}")
}

/// Build the rebase base and check it out as the `rebase` branch.
///
/// The bridge commit has the source tree and parents
/// `[dest head, source head]`, so both histories are ancestors of whatever
/// gets replayed on top. Returns the bridge commit SHA.
pub fn prepare_rebase_branch(
    ws: &GitWorkspace,
    source_ref: &str,
    dest_ref: &str,
    message: &str,
) -> Result<String> {
    info!("preparing rebase branch");

    if ws.delete_branch_if_exists(MERGE_TMP_BRANCH)? {
        debug!("removed stale {MERGE_TMP_BRANCH} branch");
    }
    ws.checkout_new_branch(MERGE_TMP_BRANCH, source_ref)?;

    ws.checkout(dest_ref)?;
    let dest_head = ws.rev_parse("HEAD")?;
    let source_head = ws.rev_parse(MERGE_TMP_BRANCH)?;

    let bridge = ws.commit_tree(
        &format!("{MERGE_TMP_BRANCH}^{{tree}}"),
        &[&dest_head, &source_head],
        message,
    )?;
    debug!(%bridge, %dest_head, %source_head, "created bridge commit");

    ws.delete_branch_if_exists(REBASE_BRANCH)?;
    ws.checkout_new_branch(REBASE_BRANCH, &bridge)?;
    ws.delete_branch_if_exists(MERGE_TMP_BRANCH)?;

    Ok(bridge)
}
