//! Code-hosting platform services
//!
//! Provides the PR operations the sync engine needs behind one trait, so
//! the engine runs the same against GitHub or a test double.

mod factory;
mod github;

pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::rebase::MergedPrLookup;
use crate::types::{PlatformConfig, PullRequest, PullRequestDetails};
use async_trait::async_trait;

/// Platform service trait for repository and PR operations
///
/// One instance addresses one repository. A run holds three: destination,
/// rebase and source. Merged-PR lookups used by the selection policy come
/// from the [`MergedPrLookup`] supertrait.
#[async_trait]
pub trait PlatformService: MergedPrLookup + Send + Sync {
    /// Resolve the repository handle and return its clone URL
    async fn repository_url(&self) -> Result<String>;

    /// Find an open PR whose head matches `head` (`owner:branch`).
    ///
    /// At most one is expected; the first match wins.
    async fn find_existing_pr(&self, head: &str) -> Result<Option<PullRequest>>;

    /// Create a PR. Maintainer edits are always disabled.
    async fn create_pr(&self, head: &str, base: &str, title: &str) -> Result<PullRequest>;

    /// Replace the title of an existing PR
    async fn update_pr_title(&self, pr_number: u64, title: &str) -> Result<PullRequest>;

    /// Look up a single PR by number
    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails>;

    /// First open PR carrying `label`, if any
    async fn find_labeled_pr(&self, label: &str) -> Result<Option<PullRequest>>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
