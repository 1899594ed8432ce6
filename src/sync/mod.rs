//! Publishing side of a run
//!
//! Three-phase pattern:
//! 1. Inspect - rebase/push necessity and the existing PR (oracle, effectful)
//! 2. Plan - create `SyncPlan` (pure, testable)
//! 3. Execute - push, retitle or open the PR, report (effectful)

mod execute;
mod oracle;
mod plan;
mod pr;

pub use execute::{MANUAL_REBASE_LABEL, RunContext, RunOutcome, run};
pub use oracle::{find_rebase_pr, is_push_required, needs_rebase};
pub use plan::{SyncPlan, SyncState, SyncStep, create_sync_plan};
pub use pr::{TITLE_ANCHOR, create_rebase_pr, rebase_pr_description, refreshed_title};
