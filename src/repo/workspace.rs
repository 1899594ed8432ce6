//! Working clone setup, rebuilt from scratch on every run

use crate::error::Result;
use crate::repo::git::GitWorkspace;
use crate::repo::{DEST_REMOTE, REBASE_BRANCH, REBASE_REMOTE, SOURCE_REMOTE};
use crate::types::BranchRef;
use std::path::Path;
use tracing::{debug, info};

/// The three branches a run works with
#[derive(Debug, Clone)]
pub struct BranchSet {
    /// Upstream branch (or tag) to rebase onto
    pub source: BranchRef,
    /// Maintained downstream branch
    pub dest: BranchRef,
    /// Branch the rebase result is pushed to
    pub rebase: BranchRef,
}

/// Tokens injected into git via per-URL credential helpers
#[derive(Debug, Clone, Default)]
pub struct WorkspaceCredentials {
    /// Token for fetching the destination repository
    pub dest_token: Option<String>,
    /// Token for fetching and pushing the rebase repository
    pub rebase_token: Option<String>,
}

/// Committer identity for picks and synthetic commits
#[derive(Debug, Clone, Default)]
pub struct GitIdentity {
    /// `user.name`
    pub name: Option<String>,
    /// `user.email`
    pub email: Option<String>,
}

/// Prepare the working clone at `workdir`.
///
/// Configures the `source`, `dest` and `rebase` remotes, fetches the
/// destination branch, the source branch and all source tags, fetches the
/// remote rebase branch when one exists, and finally resets the local
/// `rebase` branch to the current source head. Any previous local rebase
/// content is discarded.
pub fn init_workspace(
    workdir: &Path,
    branches: &BranchSet,
    credentials: &WorkspaceCredentials,
    identity: &GitIdentity,
) -> Result<GitWorkspace> {
    let ws = GitWorkspace::init(workdir)?;
    info!(path = %workdir.display(), "initialized working directory");

    for (remote, branch) in [
        (SOURCE_REMOTE, &branches.source),
        (DEST_REMOTE, &branches.dest),
        (REBASE_REMOTE, &branches.rebase),
    ] {
        ws.set_remote(remote, &branch.url)?;
    }

    configure(&ws, branches, credentials, identity)?;

    // A crashed run may have left a pick half-applied
    if ws.cherry_pick_abort()? {
        info!("aborted cherry-pick left over from a previous run");
    }

    info!(branch = %branches.dest.branch, "fetching from dest");
    ws.fetch(DEST_REMOTE, &branches.dest.branch)?;

    info!(branch = %branches.source.branch, "fetching from source");
    ws.fetch(SOURCE_REMOTE, &branches.source.branch)?;

    info!("fetching all tags from source");
    ws.fetch(SOURCE_REMOTE, "refs/tags/*:refs/tags/*")?;

    let source_ref = branches.source.remote_ref(SOURCE_REMOTE);
    if ws.is_tag(&branches.source.branch)? {
        // Tags can't move, but the ancestry math needs a branch ref
        info!(tag = %branches.source.branch, "source is a tag, creating branch {source_ref}");
        ws.force_branch(&source_ref, &branches.source.branch)?;
    }

    info!(
        branch = %branches.rebase.branch,
        url = %branches.rebase.url,
        "checking for existing rebase branch"
    );
    if ws.remote_has_branch(REBASE_REMOTE, &branches.rebase.branch)? {
        info!("fetching existing rebase branch");
        ws.fetch(REBASE_REMOTE, &branches.rebase.branch)?;
    } else if ws.delete_remote_tracking_ref(REBASE_REMOTE, &branches.rebase.branch)? {
        // Branch deleted remotely since the last run; the push check must not see it
        info!("rebase branch is gone from the remote, dropped stale tracking ref");
    }

    let head = ws.rev_parse(&source_ref)?;
    debug!(%head, "resetting local rebase branch to source head");
    ws.checkout_reset_branch(REBASE_BRANCH, &head)?;

    Ok(ws)
}

fn configure(
    ws: &GitWorkspace,
    branches: &BranchSet,
    credentials: &WorkspaceCredentials,
    identity: &GitIdentity,
) -> Result<()> {
    ws.set_config("credential.username", "x-access-token")?;
    ws.set_config("credential.useHttpPath", "true")?;

    for (url, token) in [
        (&branches.dest.url, &credentials.dest_token),
        (&branches.rebase.url, &credentials.rebase_token),
    ] {
        if let Some(token) = token {
            ws.set_secret_config(
                &format!("credential.{url}.helper"),
                &credential_helper(token),
            )?;
        }
    }

    if let Some(email) = identity.email.as_deref().filter(|e| !e.is_empty()) {
        ws.set_config("user.email", email)?;
    }
    if let Some(name) = identity.name.as_deref().filter(|n| !n.is_empty()) {
        ws.set_config("user.name", name)?;
    }
    ws.set_config("merge.renameLimit", "999999")?;
    Ok(())
}

/// Inline credential helper that answers with `token` as the password
fn credential_helper(token: &str) -> String {
    format!("!f() {{ echo \"password={token}\"; }}; f")
}
