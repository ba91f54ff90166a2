//! Check-in orchestration
//!
//! Drives one pass over the configured games: each enabled game gets exactly
//! one attempt sequence (retry policy wrapping the session client), with a
//! courtesy delay between successive calls. A single account's terminal
//! failure never halts the remaining games; every outcome is captured into
//! the run summary.
//!
//! The same code path serves full runs and the scheduler's failed-game
//! retry pass: callers hand in whichever game list applies.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::client::SessionClient;
use crate::config::credentials::CredentialStore;
use crate::games::{GameId, GameSpec};
use crate::models::{AttemptResult, CheckinStatus, RunSummary};
use crate::utils::retry::RetryPolicy;
use crate::utils::stop::StopSignal;

/// Orchestration tuning from the `settings` config section
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Pause between distinct game calls; not applied before the first
    pub delay_between_games: Duration,

    /// Retry policy applied around each account's attempt
    pub retry: RetryPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            delay_between_games: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

/// Seam between the scheduler and the orchestration pass
///
/// Lets scheduler state transitions be tested against a scripted driver
/// without real HTTP traffic.
#[async_trait]
pub trait CheckinDriver: Send + Sync {
    /// Run one pass over the given games
    async fn drive(&self, stop: &StopSignal, games: &[GameId]) -> RunSummary;
}

/// Sequential check-in runner over the configured games
pub struct Orchestrator {
    client: SessionClient,
    credentials: CredentialStore,
    settings: OrchestratorSettings,

    /// Per-game spec overrides, for testing against mock servers
    spec_overrides: HashMap<GameId, GameSpec>,
}

impl Orchestrator {
    pub fn new(
        client: SessionClient,
        credentials: CredentialStore,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            credentials,
            settings,
            spec_overrides: HashMap::new(),
        }
    }

    /// Override a game's spec, for testing against mock servers
    pub fn with_spec_override(mut self, spec: GameSpec) -> Self {
        self.spec_overrides.insert(spec.id, spec);
        self
    }

    fn spec_for(&self, game: GameId) -> GameSpec {
        self.spec_overrides
            .get(&game)
            .copied()
            .unwrap_or_else(|| *GameSpec::get(game))
    }

    /// Run one orchestration pass over `games`, in the given order
    ///
    /// A stop arriving during the inter-game delay ends the pass early; the
    /// summary then covers only the attempted games.
    pub async fn run(&self, stop: &StopSignal, games: &[GameId]) -> RunSummary {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(games.len());

        for (index, &game) in games.iter().enumerate() {
            if index > 0 && !self.settings.delay_between_games.is_zero() {
                if !stop.sleep(self.settings.delay_between_games).await {
                    warn!("orchestration pass interrupted by stop signal");
                    break;
                }
            }

            let result = self.attempt_game(stop, game).await;
            if result.is_success() {
                info!(
                    game = %game,
                    status = %result.status,
                    attempts = result.attempt_count,
                    "check-in complete"
                );
            } else {
                warn!(
                    game = %game,
                    status = %result.status,
                    retcode = ?result.retcode,
                    message = %result.message,
                    "check-in failed"
                );
            }
            results.push(result);
        }

        let summary = RunSummary::new(results, started_at, Utc::now());
        info!(
            games = summary.results.len(),
            succeeded = summary.succeeded(),
            overall_success = summary.overall_success,
            "run finished"
        );
        summary
    }

    /// One attempt sequence for a single game
    async fn attempt_game(&self, stop: &StopSignal, game: GameId) -> AttemptResult {
        let spec = self.spec_for(game);

        match self.credentials.get(game) {
            // A missing credential is a per-account configuration defect:
            // reported, never retried, and the other games still run.
            None => AttemptResult::new(
                game,
                CheckinStatus::AuthInvalid,
                "no cookie file configured for this game",
            ),
            Some(credential) => {
                self.settings
                    .retry
                    .execute(stop, || self.client.checkin(&spec, credential))
                    .await
            }
        }
    }
}

#[async_trait]
impl CheckinDriver for Orchestrator {
    async fn drive(&self, stop: &StopSignal, games: &[GameId]) -> RunSummary {
        self.run(stop, games).await
    }
}
