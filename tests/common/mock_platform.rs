//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use rebasebot::error::{Error, Result};
use rebasebot::platform::PlatformService;
use rebasebot::rebase::MergedPrLookup;
use rebasebot::types::{PlatformConfig, PullRequest, PullRequestDetails};
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
}

/// Call record for `update_pr_title`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTitleCall {
    pub pr_number: u64,
    pub title: String,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// because mockall has issues with methods returning references.
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Configurable responses per head
/// - Merged PR set for the selection policy
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    next_pr_number: AtomicU64,
    find_pr_responses: Mutex<HashMap<String, Option<PullRequest>>>,
    labeled_prs: Mutex<HashMap<String, PullRequest>>,
    merged_prs: Mutex<HashSet<u64>>,
    pr_details_responses: Mutex<HashMap<u64, PullRequestDetails>>,
    // Call tracking
    find_pr_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    update_title_calls: Mutex<Vec<UpdateTitleCall>>,
    is_merged_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_repository: Mutex<Option<String>>,
    error_on_find_pr: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_update_title: Mutex<Option<String>>,
    error_on_is_merged: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(1),
            find_pr_responses: Mutex::new(HashMap::new()),
            labeled_prs: Mutex::new(HashMap::new()),
            merged_prs: Mutex::new(HashSet::new()),
            pr_details_responses: Mutex::new(HashMap::new()),
            find_pr_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            update_title_calls: Mutex::new(Vec::new()),
            is_merged_calls: Mutex::new(Vec::new()),
            error_on_repository: Mutex::new(None),
            error_on_find_pr: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_update_title: Mutex::new(None),
            error_on_is_merged: Mutex::new(None),
        }
    }

    /// Mock for `owner/repo` on github.com
    pub fn new(owner: &str, repo: &str) -> Self {
        Self::with_config(PlatformConfig {
            owner: owner.to_string(),
            repo: repo.to_string(),
            host: None,
        })
    }

    // === Error injection methods ===

    /// Make `repository_url` return an error
    pub fn fail_repository(&self, msg: &str) {
        *self.error_on_repository.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `find_existing_pr` return an error
    pub fn fail_find_pr(&self, msg: &str) {
        *self.error_on_find_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `update_pr_title` return an error
    pub fn fail_update_title(&self, msg: &str) {
        *self.error_on_update_title.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `is_merged` return an error
    pub fn fail_is_merged(&self, msg: &str) {
        *self.error_on_is_merged.lock().unwrap() = Some(msg.to_string());
    }

    // === Response setup ===

    /// Set the response for `find_existing_pr` for a specific head
    pub fn set_find_pr_response(&self, head: &str, pr: Option<PullRequest>) {
        self.find_pr_responses
            .lock()
            .unwrap()
            .insert(head.to_string(), pr);
    }

    /// Report PR `number` as merged
    pub fn mark_merged(&self, number: u64) {
        self.merged_prs.lock().unwrap().insert(number);
    }

    /// Make `find_labeled_pr(label)` return `pr`
    pub fn set_labeled_pr(&self, label: &str, pr: PullRequest) {
        self.labeled_prs
            .lock()
            .unwrap()
            .insert(label.to_string(), pr);
    }

    /// Set the response for `get_pr_details` for a specific PR
    pub fn set_pr_details_response(&self, pr_number: u64, details: PullRequestDetails) {
        self.pr_details_responses
            .lock()
            .unwrap()
            .insert(pr_number, details);
    }

    // === Call verification methods ===

    /// Get all heads that `find_existing_pr` was called with
    pub fn get_find_pr_calls(&self) -> Vec<String> {
        self.find_pr_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr` calls
    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr_title` calls
    pub fn get_update_title_calls(&self) -> Vec<UpdateTitleCall> {
        self.update_title_calls.lock().unwrap().clone()
    }

    /// Get all PR numbers `is_merged` was asked about
    pub fn get_is_merged_calls(&self) -> Vec<u64> {
        self.is_merged_calls.lock().unwrap().clone()
    }

    /// Assert that `create_pr` was called with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pr({head}, {base}) but got: {calls:?}"
        );
    }

    /// Assert that `update_pr_title` was called with specific args
    pub fn assert_update_title_called(&self, pr_number: u64, title: &str) {
        let calls = self.get_update_title_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.title == title),
            "Expected update_pr_title({pr_number}, {title}) but got: {calls:?}"
        );
    }

    fn pr_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/{}/pull/{number}",
            self.config.owner, self.config.repo
        )
    }
}

#[async_trait]
impl MergedPrLookup for MockPlatformService {
    async fn is_merged(&self, number: u64) -> Result<bool> {
        self.is_merged_calls.lock().unwrap().push(number);

        if let Some(msg) = self.error_on_is_merged.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        Ok(self.merged_prs.lock().unwrap().contains(&number))
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn repository_url(&self) -> Result<String> {
        if let Some(msg) = self.error_on_repository.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(format!(
            "https://github.com/{}/{}.git",
            self.config.owner, self.config.repo
        ))
    }

    async fn find_existing_pr(&self, head: &str) -> Result<Option<PullRequest>> {
        self.find_pr_calls.lock().unwrap().push(head.to_string());

        // Check for injected error
        if let Some(msg) = self.error_on_find_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let responses = self.find_pr_responses.lock().unwrap();
        Ok(responses.get(head).cloned().flatten())
    }

    async fn create_pr(&self, head: &str, base: &str, title: &str) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
        });

        // Check for injected error
        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: self.pr_url(number),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
            labels: vec![],
        })
    }

    async fn update_pr_title(&self, pr_number: u64, title: &str) -> Result<PullRequest> {
        self.update_title_calls.lock().unwrap().push(UpdateTitleCall {
            pr_number,
            title: title.to_string(),
        });

        // Check for injected error
        if let Some(msg) = self.error_on_update_title.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        Ok(PullRequest {
            number: pr_number,
            html_url: self.pr_url(pr_number),
            base_ref: "main".to_string(),
            head_ref: "rebase".to_string(),
            title: title.to_string(),
            labels: vec![],
        })
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails> {
        if let Some(details) = self.pr_details_responses.lock().unwrap().get(&pr_number) {
            return Ok(details.clone());
        }
        Err(Error::Platform(format!(
            "get_pr_details: no response configured for PR #{pr_number}"
        )))
    }

    async fn find_labeled_pr(&self, label: &str) -> Result<Option<PullRequest>> {
        Ok(self.labeled_prs.lock().unwrap().get(label).cloned())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Cloneable handle to one mock, so a test can keep inspecting a service
/// it handed to a `RunContext`
#[derive(Clone)]
pub struct SharedMock(Arc<MockPlatformService>);

impl SharedMock {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self(Arc::new(MockPlatformService::new(owner, repo)))
    }

    /// Boxed clone for a `RunContext`
    pub fn boxed(&self) -> Box<dyn PlatformService> {
        Box::new(self.clone())
    }
}

impl Deref for SharedMock {
    type Target = MockPlatformService;

    fn deref(&self) -> &MockPlatformService {
        &self.0
    }
}

#[async_trait]
impl MergedPrLookup for SharedMock {
    async fn is_merged(&self, number: u64) -> Result<bool> {
        self.0.is_merged(number).await
    }
}

#[async_trait]
impl PlatformService for SharedMock {
    async fn repository_url(&self) -> Result<String> {
        self.0.repository_url().await
    }

    async fn find_existing_pr(&self, head: &str) -> Result<Option<PullRequest>> {
        self.0.find_existing_pr(head).await
    }

    async fn create_pr(&self, head: &str, base: &str, title: &str) -> Result<PullRequest> {
        self.0.create_pr(head, base, title).await
    }

    async fn update_pr_title(&self, pr_number: u64, title: &str) -> Result<PullRequest> {
        self.0.update_pr_title(pr_number, title).await
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails> {
        self.0.get_pr_details(pr_number).await
    }

    async fn find_labeled_pr(&self, label: &str) -> Result<Option<PullRequest>> {
        self.0.find_labeled_pr(label).await
    }

    fn config(&self) -> &PlatformConfig {
        self.0.config()
    }
}
