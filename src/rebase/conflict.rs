//! Conflict resolution for failed cherry-picks
//!
//! Only delete/modify shaped conflicts are resolved, by deleting the file
//! from the pick. Everything else needs a human.

use crate::error::{Error, Result};
use crate::repo::GitWorkspace;
use crate::types::ConflictStatusEntry;
use tracing::{info, warn};

/// Classify-and-resolve rounds attempted for a single pick
pub const MAX_RESOLUTION_ROUNDS: usize = 16;

/// What to do with one status entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Clean single-side change, nothing to do
    Ignore,
    /// Deleted on one side, changed on the other: delete the file
    Remove,
    /// Needs manual resolution
    Unresolvable,
}

/// Classify a porcelain status code
pub fn classify_entry(entry: &ConflictStatusEntry) -> EntryAction {
    match entry.code.as_str() {
        "M " | "D " | "A " => EntryAction::Ignore,
        // modified/deleted, deleted/modified, renamed/deleted, deleted/renamed, both deleted
        "UD" | "DU" | "AU" | "UA" | "DD" => EntryAction::Remove,
        _ => EntryAction::Unresolvable,
    }
}

/// Resolution plan for a whole status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictPlan {
    /// Empty report: the change is already present, skip the pick
    SkipEmptyPick,
    /// Remove these paths and finalize the pick
    Resolve {
        /// Paths to delete
        remove: Vec<String>,
    },
    /// At least one entry can't be handled automatically
    Unresolvable(Vec<ConflictStatusEntry>),
}

/// Build a resolution plan from status entries (pure)
pub fn plan_resolution(entries: &[ConflictStatusEntry]) -> ConflictPlan {
    if entries.is_empty() {
        return ConflictPlan::SkipEmptyPick;
    }

    let mut remove = Vec::new();
    let mut unresolvable = Vec::new();
    for entry in entries {
        match classify_entry(entry) {
            EntryAction::Ignore => {}
            EntryAction::Remove => remove.push(entry.path.clone()),
            EntryAction::Unresolvable => unresolvable.push(entry.clone()),
        }
    }

    if unresolvable.is_empty() {
        ConflictPlan::Resolve { remove }
    } else {
        ConflictPlan::Unresolvable(unresolvable)
    }
}

/// How a pick ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// Applied cleanly
    Applied,
    /// Nothing left to apply, pick skipped
    Skipped,
    /// Conflict resolved by deleting these paths, then committed
    Resolved {
        /// Paths removed from the pick
        removed: Vec<String>,
    },
}

impl PickOutcome {
    /// Whether the pick produced a commit
    pub const fn created_commit(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

enum Round {
    Done(PickOutcome),
    Unresolvable(Vec<ConflictStatusEntry>),
}

fn resolve_round(ws: &GitWorkspace) -> Result<Round> {
    let entries = ws.status_entries()?;
    for entry in &entries {
        info!(status = %entry, "resolving conflict");
    }

    match plan_resolution(&entries) {
        ConflictPlan::SkipEmptyPick => {
            ws.cherry_pick_skip()?;
            Ok(Round::Done(PickOutcome::Skipped))
        }
        ConflictPlan::Resolve { remove } => {
            for path in &remove {
                ws.remove_path(path)?;
            }
            ws.commit_no_edit()?;
            Ok(Round::Done(PickOutcome::Resolved { removed: remove }))
        }
        ConflictPlan::Unresolvable(entries) => Ok(Round::Unresolvable(entries)),
    }
}

/// Resolve the in-progress failed cherry-pick of `sha`.
///
/// Git failures while resolving (another conflict surfacing on commit)
/// restart classification, up to [`MAX_RESOLUTION_ROUNDS`] times.
pub fn resolve_pick_conflict(ws: &GitWorkspace, sha: &str) -> Result<PickOutcome> {
    let mut last_error = None;

    for round in 1..=MAX_RESOLUTION_ROUNDS {
        match resolve_round(ws) {
            Ok(Round::Done(outcome)) => {
                info!(%sha, ?outcome, "conflict has been resolved, continuing");
                return Ok(outcome);
            }
            Ok(Round::Unresolvable(entries)) => {
                let detail = entries
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(Error::UnresolvableConflict {
                    sha: sha.to_string(),
                    detail: format!("unresolvable status: {detail}"),
                });
            }
            Err(err @ Error::Git { .. }) => {
                warn!(%sha, round, error = %err, "conflict resolution round failed, retrying");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(Error::UnresolvableConflict {
        sha: sha.to_string(),
        detail: format!(
            "gave up after {MAX_RESOLUTION_ROUNDS} rounds: {}",
            last_error.map_or_else(String::new, |e| e.to_string())
        ),
    })
}

/// Cherry-pick `sha` preferring its side, resolving conflicts when possible
pub fn pick_commit(ws: &GitWorkspace, sha: &str) -> Result<PickOutcome> {
    match ws.cherry_pick_theirs(sha) {
        Ok(()) => Ok(PickOutcome::Applied),
        Err(Error::Git { stderr, .. }) => {
            info!(%sha, %stderr, "cherry-pick failed, attempting resolution");
            resolve_pick_conflict(ws, sha)
        }
        Err(err) => Err(err),
    }
}
