//! Timing configuration for playback and navigation.
//!
//! Defaults match the CSS transition durations of the board. Each value can
//! be overridden through a `TRAILBOARD_*` environment variable; unparsable
//! values fall back to the default.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{FOCUS_DURATION_MS, FRAME_MS, NAV_SETTLE_MS, OVERVIEW_SETTLE_MS, PULSE_MS};

/// Fixed delays used by the interpreter and the step synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Wait before applying a smooth transform change.
    pub frame: Duration,
    /// Settle time after an overview transform.
    pub overview_settle: Duration,
    /// Focus transition when the action does not specify one.
    pub focus_default: Duration,
    /// Lifetime of a pulse signal.
    pub pulse: Duration,
    /// Lock window after explicit navigation.
    pub nav_settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(FRAME_MS),
            overview_settle: Duration::from_millis(OVERVIEW_SETTLE_MS),
            focus_default: Duration::from_millis(FOCUS_DURATION_MS),
            pulse: Duration::from_millis(PULSE_MS),
            nav_settle: Duration::from_millis(NAV_SETTLE_MS),
        }
    }
}

impl Pacing {
    /// Read overrides from the environment.
    ///
    /// - `TRAILBOARD_FRAME_MS`: default 16
    /// - `TRAILBOARD_OVERVIEW_SETTLE_MS`: default 500
    /// - `TRAILBOARD_FOCUS_MS`: default 450
    /// - `TRAILBOARD_PULSE_MS`: default 600
    /// - `TRAILBOARD_NAV_SETTLE_MS`: default 1000
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ms = |key: &str, default: u64| Duration::from_millis(parse_or(lookup(key).as_deref(), default));
        Self {
            frame: ms("TRAILBOARD_FRAME_MS", FRAME_MS),
            overview_settle: ms("TRAILBOARD_OVERVIEW_SETTLE_MS", OVERVIEW_SETTLE_MS),
            focus_default: ms("TRAILBOARD_FOCUS_MS", FOCUS_DURATION_MS),
            pulse: ms("TRAILBOARD_PULSE_MS", PULSE_MS),
            nav_settle: ms("TRAILBOARD_NAV_SETTLE_MS", NAV_SETTLE_MS),
        }
    }
}

pub(crate) fn parse_or<T>(raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr,
{
    match raw.map(str::trim).map(str::parse::<T>) {
        Some(Ok(value)) => value,
        _ => default,
    }
}
