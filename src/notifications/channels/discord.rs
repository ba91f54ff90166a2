//! Discord webhook channel
//!
//! Posts the human-readable run summary as a message content payload.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{validate_url, Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::models::RunSummary;
use crate::notifications::format_summary_text;

pub struct DiscordChannel {
    webhook_url: String,
    client: Client,
}

impl DiscordChannel {
    pub fn new(webhook_url: impl Into<String>) -> ChannelResult<Self> {
        let webhook_url = webhook_url.into();
        validate_url(&webhook_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChannelError::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            webhook_url,
            client,
        })
    }

    fn build_payload(summary: &RunSummary) -> serde_json::Value {
        serde_json::json!({ "content": format_summary_text(summary) })
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, summary: &RunSummary) -> ChannelResult<DeliveryStatus> {
        let payload = Self::build_payload(summary);

        match self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                Ok(DeliveryStatus::success("discord"))
            }
            Ok(response) => Ok(DeliveryStatus::failure(
                "discord",
                format!("HTTP {}", response.status()),
            )),
            Err(e) => {
                tracing::error!(error = %e, "failed to deliver discord notification");
                Ok(DeliveryStatus::failure("discord", e.to_string()))
            }
        }
    }
}
