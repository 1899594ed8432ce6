//! Rebase decision-and-replay engine
//!
//! 1. Base - build the bridge commit the replay starts from
//! 2. Policy - decide per commit whether it is carried (pure, injected PR lookup)
//! 3. Replay - cherry-pick carries, squash bot commits, resolve simple conflicts

mod base;
mod conflict;
mod policy;
mod replay;
mod squash;

pub use base::{MERGE_TMP_BRANCH, bridge_commit_message, prepare_rebase_branch};
pub use conflict::{
    ConflictPlan, EntryAction, MAX_RESOLUTION_ROUNDS, PickOutcome, classify_entry, pick_commit,
    plan_resolution, resolve_pick_conflict,
};
pub use policy::{
    CommitTag, DropReason, MergedPrLookup, Selection, SelectionPolicy, UPSTREAM_PREFIX,
    parse_commit_tag,
};
pub use replay::{ReplayOptions, ReplaySummary, SquashedGroup, replay_carried_commits};
pub use squash::{SquashGroups, bot_identity};
