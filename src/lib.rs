//! hoyocheck - HoYoLAB daily check-in automation
//!
//! Automates the daily reward check-in for the supported HoYoverse titles
//! using stored session cookies, with retry/fallback resilience, a
//! scheduling loop and chat notifications.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration file and cookie loading
//! - [`games`] - Static per-game endpoint registry
//! - [`client`] - Authenticated check-in calls with endpoint fallback
//! - [`orchestrator`] - One pass over the configured games
//! - [`scheduler`] - Once/interval/daily scheduling with retry passes
//! - [`notifications`] - Run summary delivery to chat sinks
//! - [`models`] - Core data structures and types
//! - [`utils`] - Retry policy and cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use hoyocheck::client::{ClientSettings, SessionClient};
//! use hoyocheck::config::credentials::CredentialStore;
//! use hoyocheck::config::Config;
//! use hoyocheck::orchestrator::{Orchestrator, OrchestratorSettings};
//! use hoyocheck::utils::stop::StopSignal;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::starter();
//!     let games = config.enabled_games();
//!
//!     let client = SessionClient::new(ClientSettings::default())?;
//!     let credentials = CredentialStore::load_dir(
//!         &config.settings.cookie_dir,
//!         &games,
//!         &config.settings.language,
//!     );
//!     let orchestrator =
//!         Orchestrator::new(client, credentials, OrchestratorSettings::default());
//!
//!     let summary = orchestrator.run(&StopSignal::never(), &games).await;
//!     println!("overall success: {}", summary.overall_success);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod games;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{ClientSettings, SessionClient};
    pub use crate::config::{Config, LoopMode};
    pub use crate::error::{Error, Result};
    pub use crate::games::{GameId, GameSpec};
    pub use crate::models::{AttemptResult, CheckinStatus, Reward, RunSummary};
    pub use crate::notifications::Reporter;
    pub use crate::orchestrator::{Orchestrator, OrchestratorSettings};
    pub use crate::scheduler::{RunScheduler, SchedulerConfig, SchedulerPhase};
}

// Direct re-exports for convenience
pub use models::{AttemptResult, CheckinStatus, Reward, RunSummary};
