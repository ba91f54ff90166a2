//! Run reporting
//!
//! The reporter is the boundary between the check-in core and the outside
//! world: it receives a finished [`RunSummary`] and fans it out to every
//! configured channel. Sink failures are logged and never abort the run.

pub mod channels;

use tracing::{debug, error, info, warn};

use crate::config::NotificationsConfig;
use crate::models::RunSummary;

pub use channels::{Channel, ChannelError, DeliveryStatus};

use channels::discord::DiscordChannel;
use channels::telegram::TelegramChannel;
use channels::webhook::WebhookChannel;

/// Fan-out of run summaries to configured notification channels
#[derive(Default)]
pub struct Reporter {
    channels: Vec<Box<dyn Channel + Send + Sync>>,
    enabled: bool,
    success_only: bool,
}

impl Reporter {
    /// A reporter that delivers nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build channels from the notifications config section
    ///
    /// Sinks with empty URLs are skipped; a sink that fails to construct is
    /// logged and dropped rather than failing startup.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let mut reporter = Self {
            channels: Vec::new(),
            enabled: config.enabled,
            success_only: config.success_only,
        };

        if !config.enabled {
            return reporter;
        }

        if !config.webhook_url.is_empty() {
            match WebhookChannel::from_url(&config.webhook_url) {
                Ok(channel) => reporter.add_channel(Box::new(channel)),
                Err(e) => warn!(error = %e, "skipping misconfigured webhook channel"),
            }
        }

        if !config.discord_webhook.is_empty() {
            match DiscordChannel::new(&config.discord_webhook) {
                Ok(channel) => reporter.add_channel(Box::new(channel)),
                Err(e) => warn!(error = %e, "skipping misconfigured discord channel"),
            }
        }

        if !config.telegram_bot_token.is_empty() {
            match TelegramChannel::new(&config.telegram_bot_token, &config.telegram_chat_id) {
                Ok(channel) => reporter.add_channel(Box::new(channel)),
                Err(e) => warn!(error = %e, "skipping misconfigured telegram channel"),
            }
        }

        reporter
    }

    /// Add a notification channel
    pub fn add_channel(&mut self, channel: Box<dyn Channel + Send + Sync>) {
        self.enabled = true;
        self.channels.push(channel);
    }

    /// Number of configured channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a run summary to every channel
    pub async fn report(&self, summary: &RunSummary) {
        if !self.enabled || self.channels.is_empty() {
            return;
        }
        if self.success_only && !summary.overall_success {
            debug!("skipping notification for failed run (success_only)");
            return;
        }

        for channel in &self.channels {
            match channel.send(summary).await {
                Ok(status) if status.success => {
                    info!(channel = channel.name(), "notification delivered");
                }
                Ok(status) => {
                    error!(
                        channel = channel.name(),
                        message = ?status.message,
                        "notification delivery failed"
                    );
                }
                Err(e) => {
                    error!(channel = channel.name(), error = %e, "notification channel error");
                }
            }
        }
    }
}

/// Render a run summary as chat-friendly text
pub fn format_summary_text(summary: &RunSummary) -> String {
    let total = summary.results.len();
    let succeeded = summary.succeeded();

    let mut lines = vec![if summary.overall_success {
        format!("HoYoLAB check-in complete ({succeeded}/{total} succeeded)")
    } else {
        format!("HoYoLAB check-in finished with failures ({succeeded}/{total} succeeded)")
    }];

    for result in &summary.results {
        let mark = if result.is_success() { "✅" } else { "❌" };
        let mut line = format!("{mark} [{}] {}", result.game, result.message);
        if let Some(days) = result.signed_in_days {
            line.push_str(&format!(" (day {days})"));
        }
        if let Some(reward) = &result.reward {
            line.push_str(&format!(", {reward}"));
        }
        lines.push(line);
    }

    lines.join("\n")
}
