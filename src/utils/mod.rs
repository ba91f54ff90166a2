//! Common utilities and helper functions
//!
//! This module provides shared primitives used across the application:
//! cooperative cancellation and the retry policy wrapping single attempts.

pub mod retry;
pub mod stop;

use std::time::Duration;

/// Convert a fractional seconds value from config into a `Duration`
///
/// Negative or non-finite values clamp to zero.
pub fn secs_f64(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// Format a duration as `HH:MM:SS` for log lines
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
