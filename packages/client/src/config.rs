//! Engine timing and sizing configuration.

use std::time::Duration;

use crate::domain::latency::DEFAULT_WINDOW_CAPACITY;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);
/// Delay between the first successful sample and the follow-up report
pub const DEFAULT_FIRST_REPORT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// How long `stop` waits for the final report before aborting the probe task
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Engine configuration.
///
/// Zero durations are replaced by the defaults in the `with_*` builders,
/// since `tokio::time::interval` panics on a zero period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub probe_interval: Duration,
    pub report_interval: Duration,
    pub first_report_delay: Duration,
    pub heartbeat_interval: Duration,
    pub window_capacity: usize,
    /// `None` disables the fallback poll
    pub poll_interval: Option<Duration>,
    pub flush_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_interval: DEFAULT_PROBE_INTERVAL,
            report_interval: DEFAULT_REPORT_INTERVAL,
            first_report_delay: DEFAULT_FIRST_REPORT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

fn non_zero(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() { fallback } else { value }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = non_zero(interval, DEFAULT_PROBE_INTERVAL);
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = non_zero(interval, DEFAULT_REPORT_INTERVAL);
        self
    }

    pub fn with_first_report_delay(mut self, delay: Duration) -> Self {
        self.first_report_delay = delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = non_zero(interval, DEFAULT_HEARTBEAT_INTERVAL);
        self
    }

    /// Capacity is clamped to at least one sample.
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }
}
