//! Telegram bot channel
//!
//! Delivers the run summary through the Bot API's sendMessage method.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::models::RunSummary;
use crate::notifications::format_summary_text;

pub struct TelegramChannel {
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramChannel {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> ChannelResult<Self> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();

        if bot_token.is_empty() {
            return Err(ChannelError::InvalidConfig(
                "bot token cannot be empty".to_string(),
            ));
        }
        if chat_id.is_empty() {
            return Err(ChannelError::InvalidConfig(
                "chat id cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChannelError::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token)
    }

    fn build_payload(&self, summary: &RunSummary) -> serde_json::Value {
        serde_json::json!({
            "chat_id": self.chat_id,
            "text": format_summary_text(summary),
        })
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, summary: &RunSummary) -> ChannelResult<DeliveryStatus> {
        let payload = self.build_payload(summary);

        match self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                Ok(DeliveryStatus::success("telegram"))
            }
            Ok(response) => Ok(DeliveryStatus::failure(
                "telegram",
                format!("HTTP {}", response.status()),
            )),
            Err(e) => {
                tracing::error!(error = %e, "failed to deliver telegram notification");
                Ok(DeliveryStatus::failure("telegram", e.to_string()))
            }
        }
    }
}
