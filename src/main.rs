use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoyocheck::client::{ClientSettings, SessionClient};
use hoyocheck::config::credentials::CredentialStore;
use hoyocheck::config::Config;
use hoyocheck::games::{GameId, GameSpec};
use hoyocheck::notifications::Reporter;
use hoyocheck::orchestrator::{Orchestrator, OrchestratorSettings};
use hoyocheck::scheduler::clock::SystemClock;
use hoyocheck::scheduler::{RunScheduler, SchedulerConfig};
use hoyocheck::utils::retry::RetryPolicy;
use hoyocheck::utils::secs_f64;
use hoyocheck::utils::stop::{stop_channel, StopSignal};

#[derive(Parser)]
#[command(
    name = "hoyocheck",
    version,
    about = "HoYoLAB daily check-in automation with retry, scheduling and chat notifications",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "hoyocheck.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check-in pass and exit
    Run {
        /// Restrict the pass to a single game
        #[arg(short, long)]
        game: Option<String>,
    },

    /// Run on the configured schedule until interrupted
    Watch,

    /// List supported games
    Games,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Run { game } => {
            tracing::info!(game = ?game, "starting one-shot check-in");
            run(&cli.config, game).await?;
        }
        Commands::Watch => {
            tracing::info!("starting scheduled check-in loop");
            watch(&cli.config).await?;
        }
        Commands::Games => {
            games();
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("hoyocheck=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("hoyocheck=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Load and validate the config file, falling back to starter defaults
fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::from_file(path)?
    } else {
        tracing::warn!(path = %path.display(), "config file not found, using starter defaults");
        Config::starter()
    };
    config.validate()?;
    Ok(config)
}

/// Assemble the orchestrator from a validated config
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let client = SessionClient::new(ClientSettings {
        request_timeout: config.request_timeout(),
        rate_limit_delay: config.advanced.rate_limit_delay,
        user_agent_rotation: config.advanced.user_agent_rotation,
        proxy_url: config.advanced.proxy_url.clone(),
        fetch_rewards: config.settings.show_detailed_rewards,
    })?;

    let games = config.enabled_games();
    let credentials = CredentialStore::load_dir(
        &config.settings.cookie_dir,
        &games,
        &config.settings.language,
    );

    let settings = OrchestratorSettings {
        delay_between_games: secs_f64(config.settings.delay_between_games),
        retry: RetryPolicy::new(
            config.settings.max_retries,
            secs_f64(config.settings.retry_delay_seconds),
        ),
    };

    Ok(Orchestrator::new(client, credentials, settings))
}

/// Wire Ctrl-C into the cooperative stop signal
fn install_stop_handler() -> StopSignal {
    let (handle, signal) = stop_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping at next checkpoint");
            handle.stop();
        }
    });
    signal
}

async fn run(config_path: &Path, game: Option<String>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(game) = game {
        config.run_mode = game;
        config.validate()?;
    }

    let games = config.enabled_games();
    let orchestrator = build_orchestrator(&config)?;
    let reporter = Reporter::from_config(&config.notifications);
    let stop = install_stop_handler();

    let summary = orchestrator.run(&stop, &games).await;
    reporter.report(&summary).await;

    for result in &summary.results {
        let mark = if result.is_success() { "ok " } else { "err" };
        println!(
            "{mark} {:4} {} (attempts: {})",
            result.game.as_str(),
            result.message,
            result.attempt_count
        );
    }

    if !summary.overall_success {
        std::process::exit(1);
    }
    Ok(())
}

async fn watch(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    let games = config.enabled_games();
    let orchestrator = build_orchestrator(&config)?;
    let reporter = Reporter::from_config(&config.notifications);
    let scheduler_config = SchedulerConfig::from_config(&config)?;
    let stop = install_stop_handler();

    let mut scheduler = RunScheduler::new(scheduler_config, SystemClock);
    scheduler.run(&orchestrator, &reporter, &stop, &games).await;

    tracing::info!(
        runs = scheduler.state().runs_completed,
        "check-in loop finished"
    );
    Ok(())
}

fn games() {
    for id in GameId::all() {
        let spec = GameSpec::get(id);
        println!("{:4} {}", id.as_str(), spec.name);
    }
}
