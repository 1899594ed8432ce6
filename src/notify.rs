//! Slack webhook notifications

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget message delivery to an optional Slack webhook
#[derive(Debug, Clone)]
pub struct Notifier {
    webhook_url: Option<String>,
    http_client: Client,
}

impl Notifier {
    /// Create a notifier. `None` makes every send a no-op.
    pub fn new(webhook_url: Option<String>) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("rebasebot")
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            webhook_url: webhook_url.filter(|u| !u.is_empty()),
            http_client,
        })
    }

    /// Notifier that never sends anything
    pub fn disabled() -> Self {
        Self {
            webhook_url: None,
            http_client: Client::new(),
        }
    }

    /// Whether a webhook is configured
    pub const fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Deliver `message`. Failures are logged, never returned.
    pub async fn send(&self, message: &str) {
        let Some(ref url) = self.webhook_url else {
            return;
        };

        let result = self
            .http_client
            .post(url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("notification delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "notification webhook returned an error");
            }
            Err(e) => {
                warn!(error = %e, "failed to deliver notification");
            }
        }
    }
}
