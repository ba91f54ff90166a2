//! Configuration management
//!
//! This module handles loading and validating configuration from a TOML
//! file. Every section falls back to its defaults when absent, so a partial
//! config file is always usable. Validation runs once at startup and aborts
//! before any network activity on configuration defects.

pub mod credentials;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::games::GameId;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// "all" or a single game id to narrow the run
    pub run_mode: String,

    /// Per-game enable switches
    pub games: BTreeMap<String, GameToggle>,

    /// Check-in behavior
    pub settings: Settings,

    /// Scheduling loop
    #[serde(rename = "loop")]
    pub schedule: LoopConfig,

    /// Notification sinks
    pub notifications: NotificationsConfig,

    /// HTTP tuning
    pub advanced: AdvancedConfig,
}

/// Enable switch for one game
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameToggle {
    pub enabled: bool,
}

/// Check-in behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run a pass immediately instead of waiting for the first fire
    pub run_on_start: bool,

    /// Courtesy delay between successive game calls, in seconds
    pub delay_between_games: f64,

    /// Maximum total attempts per account (first try included)
    pub max_retries: u32,

    /// Base delay for linear retry backoff, in seconds
    pub retry_delay_seconds: f64,

    /// Fetch reward details for already-signed accounts
    pub show_detailed_rewards: bool,

    /// Language tag sent to the API
    pub language: String,

    /// Directory holding `<game>_cookie.json` files
    pub cookie_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_on_start: true,
            delay_between_games: 3.0,
            max_retries: 3,
            retry_delay_seconds: 5.0,
            show_detailed_rewards: true,
            language: "en-us".to_string(),
            cookie_dir: PathBuf::from("cookies"),
        }
    }
}

/// Scheduling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    Once,
    Interval,
    Daily,
}

impl LoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Interval => "interval",
            Self::Daily => "daily",
        }
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub enabled: bool,
    pub mode: LoopMode,

    /// Interval between runs in `interval` mode, in hours
    pub interval_hours: f64,

    /// Fire time in `daily` mode, "HH:MM"
    pub daily_time: String,

    /// IANA timezone name for `daily_time`
    pub timezone: String,

    /// Stop after this many runs; 0 = unbounded
    pub max_runs: u32,

    /// After a run with failures, re-run only the failed games
    pub retry_failed: bool,

    /// Delay before the failed-game retry pass, in minutes
    pub retry_delay_minutes: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: LoopMode::Daily,
            interval_hours: 24.0,
            daily_time: "09:00".to_string(),
            timezone: "UTC".to_string(),
            max_runs: 0,
            retry_failed: true,
            retry_delay_minutes: 30.0,
        }
    }
}

/// Notification sink configuration; empty URLs disable a sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,

    /// Only report runs where every game succeeded
    pub success_only: bool,

    pub webhook_url: String,
    pub discord_webhook: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            success_only: true,
            webhook_url: String::new(),
            discord_webhook: String::new(),
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
        }
    }
}

/// HTTP tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// Per-request timeout, in seconds
    pub request_timeout: f64,

    /// Upper bound of the jittered courtesy delay, in seconds
    pub rate_limit_delay: f64,

    pub user_agent_rotation: bool,
    pub proxy_url: Option<String>,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            rate_limit_delay: 2.0,
            user_agent_rotation: true,
            proxy_url: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?;

        Ok(config)
    }

    /// Default configuration with the usual starter games enabled
    pub fn starter() -> Self {
        let mut config = Self {
            run_mode: "all".to_string(),
            ..Default::default()
        };
        for id in GameId::all() {
            config.games.insert(
                id.as_str().to_string(),
                GameToggle {
                    enabled: matches!(id, GameId::Hsr | GameId::Gi),
                },
            );
        }
        config
    }

    /// Validate configuration values
    ///
    /// Configuration defects abort startup before any network activity.
    pub fn validate(&self) -> Result<()> {
        if !self.run_mode.is_empty() && self.run_mode != "all" {
            GameId::parse(&self.run_mode)?;
        }

        for key in self.games.keys() {
            GameId::parse(key)?;
        }

        if self.enabled_games().is_empty() {
            return Err(Error::config("no games enabled"));
        }

        if self.settings.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }

        if self.advanced.request_timeout <= 0.0 {
            return Err(Error::config("request_timeout must be positive"));
        }

        match self.schedule.mode {
            LoopMode::Interval if self.schedule.interval_hours <= 0.0 => {
                return Err(Error::config("interval_hours must be positive"));
            }
            LoopMode::Daily => {
                self.daily_time()?;
                self.timezone()?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Enabled games in registry-declared order, narrowed by `run_mode`
    pub fn enabled_games(&self) -> Vec<GameId> {
        let only = match self.run_mode.as_str() {
            "" | "all" => None,
            mode => GameId::parse(mode).ok(),
        };

        GameId::all()
            .into_iter()
            .filter(|id| only.map_or(true, |o| o == *id))
            .filter(|id| {
                self.games
                    .get(id.as_str())
                    .map(|g| g.enabled)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Parse the daily fire time
    pub fn daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.schedule.daily_time, "%H:%M").map_err(|_| {
            Error::config(format!(
                "invalid daily_time '{}' (expected HH:MM)",
                self.schedule.daily_time
            ))
        })
    }

    /// Resolve the configured IANA timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.schedule
            .timezone
            .parse::<Tz>()
            .map_err(|_| Error::config(format!("invalid timezone '{}'", self.schedule.timezone)))
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        crate::utils::secs_f64(self.advanced.request_timeout)
    }
}
