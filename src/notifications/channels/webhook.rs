//! Generic webhook notification channel
//!
//! Sends run summaries as JSON payloads via HTTP POST.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{validate_url, Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::models::RunSummary;

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional authentication token (sent as Bearer token)
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ChannelError> {
        validate_url(&self.url)?;
        if self.timeout_secs == 0 {
            return Err(ChannelError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Webhook notification channel
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new webhook channel
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a simple webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Build the webhook payload from a run summary
    pub(crate) fn build_payload(summary: &RunSummary) -> serde_json::Value {
        serde_json::json!({
            "overall_success": summary.overall_success,
            "started_at": summary.started_at.to_rfc3339(),
            "finished_at": summary.finished_at.to_rfc3339(),
            "results": summary.results.iter().map(|r| serde_json::json!({
                "game": r.game.as_str(),
                "status": r.status.as_str(),
                "retcode": r.retcode,
                "message": r.message,
                "signed_in_days": r.signed_in_days,
                "reward": r.reward.as_ref().map(|reward| serde_json::json!({
                    "name": reward.name,
                    "count": reward.count,
                })),
                "attempts": r.attempt_count,
                "elapsed_secs": r.elapsed.as_secs_f64(),
            })).collect::<Vec<_>>(),
        })
    }

    /// Send the request with retry on server errors
    async fn send_with_retry(&self, payload: &serde_json::Value) -> ChannelResult<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                tracing::debug!(
                    attempt = attempt + 1,
                    max = self.config.max_retries + 1,
                    "retrying webhook request"
                );
            }

            let mut request = self.client.post(&self.config.url);
            if let Some(token) = &self.config.auth_token {
                request = request.bearer_auth(token);
            }

            match request.json(payload).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(());
                    }
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "unable to read response body".to_string());
                    last_error = Some(ChannelError::Other(format!("HTTP {status}: {body}")));

                    // Client errors will not resolve on retry.
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_error = Some(ChannelError::HttpError(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChannelError::Other("unknown error".to_string())))
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, summary: &RunSummary) -> ChannelResult<DeliveryStatus> {
        let payload = Self::build_payload(summary);

        match self.send_with_retry(&payload).await {
            Ok(()) => Ok(DeliveryStatus::success_with_message(
                "webhook",
                format!("delivered to {}", self.config.url),
            )),
            Err(e) => {
                tracing::error!(url = %self.config.url, error = %e, "failed to deliver webhook");
                Ok(DeliveryStatus::failure("webhook", e.to_string()))
            }
        }
    }

    async fn health_check(&self) -> ChannelResult<bool> {
        match self.client.head(&self.config.url).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(url = %self.config.url, error = %e, "webhook health check failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameId;
    use crate::models::{AttemptResult, CheckinStatus, Reward};
    use chrono::Utc;

    fn summary() -> RunSummary {
        let now = Utc::now();
        RunSummary::new(
            vec![
                AttemptResult::new(GameId::Hsr, CheckinStatus::Success, "checked in")
                    .with_retcode(0)
                    .with_signed_in_days(5)
                    .with_reward(Reward::new("Stellar Jade", 20)),
                AttemptResult::new(GameId::Gi, CheckinStatus::AuthInvalid, "invalid cookie")
                    .with_retcode(-100),
            ],
            now,
            now,
        )
    }

    #[test]
    fn test_webhook_config_validation() {
        assert!(WebhookConfig::new("https://example.com/hook").validate().is_ok());
        assert!(WebhookConfig::new("").validate().is_err());
        assert!(WebhookConfig::new("example.com/hook").validate().is_err());
        assert!(WebhookConfig::new("https://example.com")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_webhook_creation() {
        let channel = WebhookChannel::from_url("https://example.com/hook").unwrap();
        assert_eq!(channel.name(), "webhook");
        assert_eq!(channel.url(), "https://example.com/hook");

        assert!(WebhookChannel::from_url("not-a-url").is_err());
    }

    #[test]
    fn test_payload_building() {
        let payload = WebhookChannel::build_payload(&summary());

        assert_eq!(payload["overall_success"], false);
        assert_eq!(payload["results"][0]["game"], "hsr");
        assert_eq!(payload["results"][0]["status"], "success");
        assert_eq!(payload["results"][0]["reward"]["name"], "Stellar Jade");
        assert_eq!(payload["results"][0]["signed_in_days"], 5);
        assert_eq!(payload["results"][1]["retcode"], -100);
        assert!(payload["results"][1]["reward"].is_null());
    }

    #[test]
    fn test_config_serialization() {
        let config = WebhookConfig::new("https://example.com/hook").with_timeout(20);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: WebhookConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.url, parsed.url);
        assert_eq!(config.timeout_secs, parsed.timeout_secs);
    }
}
