//! Bot-authored commits buffered for consolidation

use crate::types::Commit;
use std::collections::HashMap;

/// Normalize a bot author email.
///
/// GitHub's anonymized addresses look like `12345+name@users.noreply.github.com`;
/// the numeric part differs between installations, so it is stripped.
pub fn bot_identity(email: &str) -> &str {
    match email.split_once('+') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => email,
    }
}

/// Buffered commits per bot identity, iterated in first-appearance order
#[derive(Debug, Clone, Default)]
pub struct SquashGroups {
    order: Vec<String>,
    groups: HashMap<String, Vec<Commit>>,
}

impl SquashGroups {
    /// Empty set of groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `commit` under `identity`
    pub fn push(&mut self, identity: &str, commit: Commit) {
        if let Some(group) = self.groups.get_mut(identity) {
            group.push(commit);
        } else {
            self.order.push(identity.to_string());
            self.groups.insert(identity.to_string(), vec![commit]);
        }
    }

    /// Whether nothing was buffered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Groups in the order each identity first appeared
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Commit])> {
        self.order.iter().map(|identity| {
            let commits = self
                .groups
                .get(identity)
                .map_or(&[][..], Vec::as_slice);
            (identity.as_str(), commits)
        })
    }
}
