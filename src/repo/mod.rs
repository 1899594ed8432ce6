//! Version-control collaborator
//!
//! The working clone always has three remotes: `source` (upstream),
//! `dest` (the maintained fork) and `rebase` (where results are pushed).

mod git;
mod workspace;

pub use git::{GitWorkspace, PushRefStatus};
pub use workspace::{BranchSet, GitIdentity, WorkspaceCredentials, init_workspace};

/// Remote name for the upstream repository
pub const SOURCE_REMOTE: &str = "source";

/// Remote name for the maintained downstream repository
pub const DEST_REMOTE: &str = "dest";

/// Remote name for the repository the rebase branch is pushed to
pub const REBASE_REMOTE: &str = "rebase";

/// Local branch the replay is built on
pub const REBASE_BRANCH: &str = "rebase";
