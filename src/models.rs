// Core data structures for check-in runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::games::GameId;

/// Outcome classification of a single check-in attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinStatus {
    /// Check-in performed and reward claimed
    Success,
    /// Today's reward was already claimed; success for reporting purposes
    AlreadyCheckedIn,
    /// Cookies rejected or incomplete; cannot self-resolve
    AuthInvalid,
    /// Upstream throttling; retried with backoff
    RateLimited,
    /// Transport failure, timeout, or all endpoints down; retried
    NetworkError,
    /// Unrecognized API response; terminal, surfaced with the raw retcode
    UnknownError,
}

impl CheckinStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::AuthInvalid => "auth_invalid",
            Self::RateLimited => "rate_limited",
            Self::NetworkError => "network_error",
            Self::UnknownError => "unknown_error",
        }
    }

    /// True for outcomes that count as a successful check-in
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyCheckedIn)
    }

    /// True for failures that may self-resolve and are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkError)
    }
}

impl std::fmt::Display for CheckinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A daily reward as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub name: String,
    pub count: u32,
}

impl Reward {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.name, self.count)
    }
}

/// Result of one account/game check-in within a run
///
/// Produced once per (game, account) pair per run; immutable after the retry
/// controller stamps the final attempt count and elapsed time.
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub game: GameId,
    pub status: CheckinStatus,
    pub retcode: Option<i64>,
    pub message: String,
    pub signed_in_days: Option<u32>,
    pub reward: Option<Reward>,
    pub attempt_count: u32,
    pub elapsed: Duration,
}

impl AttemptResult {
    /// Create a result with the given classification
    pub fn new(game: GameId, status: CheckinStatus, message: impl Into<String>) -> Self {
        Self {
            game,
            status,
            retcode: None,
            message: message.into(),
            signed_in_days: None,
            reward: None,
            attempt_count: 1,
            elapsed: Duration::ZERO,
        }
    }

    /// Attach the raw API retcode
    pub fn with_retcode(mut self, retcode: i64) -> Self {
        self.retcode = Some(retcode);
        self
    }

    /// Attach the total sign-in day count
    pub fn with_signed_in_days(mut self, days: u32) -> Self {
        self.signed_in_days = Some(days);
        self
    }

    /// Attach today's reward
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Stamp the number of attempts the retry controller made
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempt_count = attempts;
        self
    }

    /// Stamp total wall time including backoff waits
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// True when the attempt counts as a successful check-in
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregated results of one orchestration pass
///
/// Consumed by the reporter and then discarded; the core retains no run
/// history.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<AttemptResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub overall_success: bool,
}

impl RunSummary {
    /// Build a summary, deriving `overall_success` from the results
    pub fn new(
        results: Vec<AttemptResult>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let overall_success = !results.is_empty() && results.iter().all(AttemptResult::is_success);
        Self {
            results,
            started_at,
            finished_at,
            overall_success,
        }
    }

    /// Games whose attempt did not end in success, in call order
    pub fn failed_games(&self) -> Vec<GameId> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.game)
            .collect()
    }

    /// Count of successful attempts
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Wall time of the whole pass
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
