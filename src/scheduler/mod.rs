//! Run scheduling
//!
//! Drives the orchestrator once, on an interval, or at a daily fixed time.
//! The scheduler owns the only mutable scheduling state in the process and
//! advances it through a small phase machine:
//!
//! ```text
//! once:     Idle → Running → Stopped
//! interval: Idle → Running → Waiting → Running → … → Stopped (max_runs)
//! daily:    Idle → Waiting → Running → Waiting → …
//! ```
//!
//! After a run where any game failed and `retry_failed` is set, the
//! scheduler enters RetryPending, waits, and re-invokes the orchestrator for
//! only the failed games before resuming the normal cadence. The stop signal
//! is checked before every wait and every run; all waits are interruptible.

pub mod clock;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, LoopMode};
use crate::error::Result;
use crate::games::GameId;
use crate::notifications::Reporter;
use crate::orchestrator::CheckinDriver;
use crate::utils::stop::StopSignal;
use crate::utils::{format_hms, secs_f64};

use self::clock::Clock;

// ============================================================================
// Phases and state
// ============================================================================

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Waiting,
    Running,
    RetryPending,
    Stopped,
}

impl SchedulerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::RetryPending => "retry_pending",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable scheduling state, advanced only by the scheduler loop
#[derive(Debug, Clone)]
pub struct ScheduleState {
    pub mode: LoopMode,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub runs_completed: u32,

    /// 0 = unbounded
    pub max_runs: u32,
}

// ============================================================================
// Configuration
// ============================================================================

/// Static scheduling parameters derived from the `loop` config section
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub mode: LoopMode,
    pub interval: Duration,
    pub daily_time: NaiveTime,
    pub timezone: Tz,
    pub max_runs: u32,
    pub retry_failed: bool,
    pub retry_delay: Duration,
    pub run_on_start: bool,
}

impl SchedulerConfig {
    /// Build from a validated [`Config`]
    ///
    /// A disabled loop degrades to `once` mode.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mode = if config.schedule.enabled {
            config.schedule.mode
        } else {
            LoopMode::Once
        };

        let daily_time = if mode == LoopMode::Daily {
            config.daily_time()?
        } else {
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        };
        let timezone = if mode == LoopMode::Daily {
            config.timezone()?
        } else {
            chrono_tz::UTC
        };

        Ok(Self {
            mode,
            interval: secs_f64(config.schedule.interval_hours * 3600.0),
            daily_time,
            timezone,
            max_runs: config.schedule.max_runs,
            retry_failed: config.schedule.retry_failed,
            retry_delay: secs_f64(config.schedule.retry_delay_minutes * 60.0),
            run_on_start: config.settings.run_on_start,
        })
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Scheduling loop around a check-in driver
pub struct RunScheduler<C: Clock> {
    config: SchedulerConfig,
    clock: C,
    state: ScheduleState,
    phase: SchedulerPhase,
}

impl<C: Clock> RunScheduler<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        let state = ScheduleState {
            mode: config.mode,
            next_fire_at: None,
            runs_completed: 0,
            max_runs: config.max_runs,
        };
        Self {
            config,
            clock,
            state,
            phase: SchedulerPhase::Idle,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Compute the next fire instant from `now`
    pub fn next_fire_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.config.mode {
            LoopMode::Once => now,
            LoopMode::Interval => {
                now + ChronoDuration::from_std(self.config.interval)
                    .unwrap_or_else(|_| ChronoDuration::hours(24))
            }
            LoopMode::Daily => {
                next_daily_occurrence(now, self.config.daily_time, self.config.timezone)
            }
        }
    }

    /// Run the scheduling loop until stopped or max runs are reached
    pub async fn run(
        &mut self,
        driver: &dyn CheckinDriver,
        reporter: &Reporter,
        stop: &StopSignal,
        games: &[GameId],
    ) {
        // `once` mode always fires immediately; the other modes honor
        // run_on_start.
        let mut fire_now = self.config.run_on_start || self.config.mode == LoopMode::Once;

        loop {
            if stop.is_stopped() {
                self.phase = SchedulerPhase::Stopped;
                break;
            }

            if !fire_now {
                let now = self.clock.now();
                let next = self.next_fire_from(now);
                self.state.next_fire_at = Some(next);
                self.phase = SchedulerPhase::Waiting;

                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                info!(
                    mode = %self.config.mode,
                    next_fire = %next,
                    wait = %format_hms(wait),
                    "waiting for next scheduled run"
                );
                if !stop.sleep(wait).await {
                    self.phase = SchedulerPhase::Stopped;
                    break;
                }
            }
            fire_now = false;

            if stop.is_stopped() {
                self.phase = SchedulerPhase::Stopped;
                break;
            }

            self.phase = SchedulerPhase::Running;
            let summary = driver.drive(stop, games).await;
            self.state.runs_completed += 1;
            reporter.report(&summary).await;

            if self.config.mode == LoopMode::Once {
                self.phase = SchedulerPhase::Stopped;
                break;
            }

            if self.config.retry_failed && !summary.overall_success {
                let failed = summary.failed_games();
                if !failed.is_empty() {
                    self.phase = SchedulerPhase::RetryPending;
                    warn!(
                        games = ?failed.iter().map(GameId::as_str).collect::<Vec<_>>(),
                        delay = %format_hms(self.config.retry_delay),
                        "scheduling retry pass for failed games"
                    );
                    if !stop.sleep(self.config.retry_delay).await {
                        self.phase = SchedulerPhase::Stopped;
                        break;
                    }

                    // Partial re-invocation scoped to the failed games; does
                    // not count toward max_runs.
                    self.phase = SchedulerPhase::Running;
                    let retry_summary = driver.drive(stop, &failed).await;
                    reporter.report(&retry_summary).await;
                }
            }

            if self.config.max_runs > 0 && self.state.runs_completed >= self.config.max_runs {
                info!(runs = self.state.runs_completed, "max runs reached");
                self.phase = SchedulerPhase::Stopped;
                break;
            }
        }

        info!(runs = self.state.runs_completed, "scheduler stopped");
    }
}

/// Next occurrence of `time` in `tz`, strictly after `now`
///
/// If today's occurrence already passed it falls to tomorrow; a time that
/// lands in a DST gap falls forward to the next day's valid occurrence.
fn next_daily_occurrence(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let local_now = now.with_timezone(&tz);

    for days in 0..=2 {
        let date = local_now.date_naive() + ChronoDuration::days(days);
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).earliest() {
            let candidate = candidate.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
    }

    now + ChronoDuration::hours(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn daily_scheduler(time: &str, tz: &str) -> RunScheduler<clock::SystemClock> {
        let config = SchedulerConfig {
            mode: LoopMode::Daily,
            interval: Duration::from_secs(0),
            daily_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            timezone: tz.parse().unwrap(),
            max_runs: 0,
            retry_failed: false,
            retry_delay: Duration::from_secs(0),
            run_on_start: false,
        };
        RunScheduler::new(config, clock::SystemClock)
    }

    #[test]
    fn test_daily_next_fire_later_today() {
        let scheduler = daily_scheduler("09:00", "UTC");
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap();

        let next = scheduler.next_fire_from(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_next_fire_rolls_to_tomorrow() {
        let scheduler = daily_scheduler("09:00", "UTC");
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap();

        let next = scheduler.next_fire_from(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_exact_fire_time_rolls_over() {
        let scheduler = daily_scheduler("09:00", "UTC");
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

        let next = scheduler.next_fire_from(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_respects_timezone() {
        // 09:00 in Seoul is 00:00 UTC.
        let scheduler = daily_scheduler("09:00", "Asia/Seoul");
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap();

        let next = scheduler.next_fire_from(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
        assert_eq!(next.with_timezone(&chrono_tz::Asia::Seoul).hour(), 9);
    }

    #[test]
    fn test_interval_next_fire() {
        let config = SchedulerConfig {
            mode: LoopMode::Interval,
            interval: Duration::from_secs(6 * 3600),
            daily_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
            max_runs: 0,
            retry_failed: false,
            retry_delay: Duration::from_secs(0),
            run_on_start: true,
        };
        let scheduler = RunScheduler::new(config, clock::SystemClock);

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next = scheduler.next_fire_from(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_initial_phase_is_idle() {
        let scheduler = daily_scheduler("09:00", "UTC");
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
        assert_eq!(scheduler.state().runs_completed, 0);
        assert!(scheduler.state().next_fire_at.is_none());
    }

    #[test]
    fn test_disabled_loop_degrades_to_once() {
        let mut config = crate::config::Config::starter();
        config.schedule.enabled = false;
        config.schedule.mode = LoopMode::Daily;

        let scheduler_config = SchedulerConfig::from_config(&config).unwrap();
        assert_eq!(scheduler_config.mode, LoopMode::Once);
    }

    #[test]
    fn test_from_config_conversions() {
        let mut config = crate::config::Config::starter();
        config.schedule.mode = LoopMode::Interval;
        config.schedule.interval_hours = 1.5;
        config.schedule.retry_delay_minutes = 30.0;

        let scheduler_config = SchedulerConfig::from_config(&config).unwrap();
        assert_eq!(scheduler_config.interval, Duration::from_secs(5400));
        assert_eq!(scheduler_config.retry_delay, Duration::from_secs(1800));
    }
}
