//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::rebase::MergedPrLookup;
use crate::types::{PlatformConfig, PrState, PullRequest, PullRequestDetails};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config: PlatformConfig { owner, repo, host },
        })
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
    }
}

#[async_trait]
impl MergedPrLookup for GitHubService {
    async fn is_merged(&self, number: u64) -> Result<bool> {
        debug!(pr_number = number, repo = %self.config.repo, "checking whether PR is merged");
        Ok(self.get_pr_details(number).await?.state == PrState::Merged)
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn repository_url(&self) -> Result<String> {
        debug!(owner = %self.config.owner, repo = %self.config.repo, "fetching repository");
        let repo = self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .get()
            .await?;

        Ok(repo
            .clone_url
            .or(repo.html_url)
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn find_existing_pr(&self, head: &str) -> Result<Option<PullRequest>> {
        debug!(head, "finding existing PR");

        let prs = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(head.to_string())
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        let result = prs.items.first().map(pr_from_octocrab);
        if let Some(ref pr) = result {
            debug!(pr_number = pr.number, "found existing PR");
        } else {
            debug!("no existing PR found");
        }
        Ok(result)
    }

    async fn create_pr(&self, head: &str, base: &str, title: &str) -> Result<PullRequest> {
        debug!(head, base, "creating PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(title, head, base)
            .maintainer_can_modify(false)
            .send()
            .await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_pr_title(&self, pr_number: u64, title: &str) -> Result<PullRequest> {
        debug!(pr_number, title, "updating PR title");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .title(title)
            .send()
            .await
            .map_err(|e| {
                Error::GitHubApi(format!("Error updating title for pull request #{pr_number}: {e}"))
            })?;

        debug!(pr_number, "updated PR title");
        Ok(pr_from_octocrab(&pr))
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails> {
        debug!(pr_number, "getting PR details");

        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await?;

        // Determine PR state from GitHub's state field and merged_at
        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
            // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
            Some(_) | None => PrState::Closed,
        };

        let details = PullRequestDetails {
            number: pr.number,
            state,
        };

        debug!(pr_number, state = ?details.state, "got PR details");
        Ok(details)
    }

    async fn find_labeled_pr(&self, label: &str) -> Result<Option<PullRequest>> {
        debug!(label, "looking for labeled PRs");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;

        let prs = self.client.all_pages(first_page).await?;
        let found = prs
            .iter()
            .map(pr_from_octocrab)
            .find(|pr| pr.labels.iter().any(|l| l == label));

        debug!(label, found = found.is_some(), "labeled PR lookup complete");
        Ok(found)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
