//! Lightweight timing utilities for optional performance tracing.
//!
//! A [`TimingGuard`] records how long a scoped pipeline stage took and logs it
//! under the `cardscan::telemetry` target when dropped. Logging only happens
//! when telemetry has been switched on via [`configure`] and the log filter
//! admits the requested level, so guards cost one `Instant::now()` otherwise.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
    time::{Duration, Instant},
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target used for all timing output.
pub const TELEMETRY_TARGET: &str = "cardscan::telemetry";

static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(false);
static TELEMETRY_LEVEL: AtomicU8 = AtomicU8::new(0);

/// RAII helper that logs how long an operation took when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    fn new(label: Cow<'static, str>, level: Level, active: bool) -> Self {
        Self {
            label,
            level,
            start: Instant::now(),
            active,
        }
    }

    /// Returns `true` when the guard will emit a log entry on drop.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the elapsed duration since the guard was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the guard and return the elapsed duration without logging.
    pub fn finish(mut self) -> Duration {
        self.active = false;
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TELEMETRY_TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Create a timing guard that logs at `level` when telemetry allows it.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    timing_guard_if(label, level, true)
}

/// Create a timing guard that also respects an explicit boolean flag.
pub fn timing_guard_if(
    label: impl Into<Cow<'static, str>>,
    level: Level,
    enabled: bool,
) -> TimingGuard {
    let active =
        enabled && telemetry_allows(level) && log_enabled!(target: TELEMETRY_TARGET, level);
    TimingGuard::new(label.into(), level, active)
}

/// Configure the global telemetry state.
pub fn configure(enabled: bool, level: LevelFilter) {
    TELEMETRY_ENABLED.store(enabled, Ordering::Relaxed);
    TELEMETRY_LEVEL.store(filter_index(level), Ordering::Relaxed);
}

/// Returns whether telemetry logging is currently enabled.
pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::Relaxed)
}

/// Returns the maximum telemetry logging level.
pub fn telemetry_level() -> LevelFilter {
    filter_from_index(TELEMETRY_LEVEL.load(Ordering::Relaxed))
}

/// Returns `true` when telemetry is enabled and `level` is within the configured threshold.
pub fn telemetry_allows(level: Level) -> bool {
    telemetry_enabled() && level_index(level) <= TELEMETRY_LEVEL.load(Ordering::Relaxed)
}

fn level_index(level: Level) -> u8 {
    match level {
        Level::Error => 1,
        Level::Warn => 2,
        Level::Info => 3,
        Level::Debug => 4,
        Level::Trace => 5,
    }
}

fn filter_index(filter: LevelFilter) -> u8 {
    filter.to_level().map(level_index).unwrap_or(0)
}

fn filter_from_index(value: u8) -> LevelFilter {
    match value {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}
