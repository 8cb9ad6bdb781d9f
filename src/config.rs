//! Monitor configuration.
//!
//! - `poll_interval`: delay between event-log polls. Zero disables polling; the monitor then
//!   only waits for the completion signal.
//! - `wait_timeout`: total budget for completion checks (default 10 minutes).
//! - `wait_interval`: delay between completion checks. Defaults to `poll_interval`, and to
//!   `DEFAULT_WAIT_INTERVAL` when that is zero.
//! - `query_timeout`: longest a single event-log query may run before the tick is skipped
//!   (default 30 seconds).
//! - `subject_kind`: label prefix of the feed header (`"Stack: my-stack"`).
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use stackwatch::MonitorConfig;
//!
//! let config = MonitorConfig::builder()
//!     .poll_interval(Duration::from_secs(5))
//!     .wait_timeout(Duration::from_secs(30 * 60))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.retry_policy().next_delay(), Duration::from_secs(5));
//! ```

use crate::retry::{BuildError, RetryPolicy, DEFAULT_WAIT_TIMEOUT};
use std::time::Duration;

/// Default delay between event-log polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Default bound on a single event-log query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default header label prefix.
pub const DEFAULT_SUBJECT_KIND: &str = "Stack";

/// Validated configuration of a `Monitor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    poll_interval: Duration,
    wait_timeout: Duration,
    wait_interval: Option<Duration>,
    query_timeout: Duration,
    subject_kind: String,
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether the event log is polled at all.
    pub fn polling_enabled(&self) -> bool {
        !self.poll_interval.is_zero()
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn subject_kind(&self) -> &str {
        &self.subject_kind
    }

    /// Retry policy for the completion waiter.
    pub fn retry_policy(&self) -> RetryPolicy {
        let interval = self.wait_interval.unwrap_or(self.poll_interval);
        RetryPolicy::builder()
            .interval(interval)
            .timeout(self.wait_timeout)
            .build()
            .unwrap_or_default()
    }

    /// Header label for `subject`.
    pub fn header_label(&self, subject: &str) -> String {
        format!("{}: {}", self.subject_kind, subject)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            wait_interval: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            subject_kind: DEFAULT_SUBJECT_KIND.to_string(),
        }
    }
}

/// Builder for `MonitorConfig`.
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    pub fn new() -> Self {
        Self { config: MonitorConfig::default() }
    }

    /// Delay between event-log polls; zero disables polling.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Total budget for completion checks. Must be > 0.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    /// Delay between completion checks, independent of the poll interval.
    pub fn wait_interval(mut self, interval: Duration) -> Self {
        self.config.wait_interval = Some(interval);
        self
    }

    /// Bound on a single event-log query; an expired query counts as a transient error. Must be > 0.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    pub fn subject_kind(mut self, kind: impl Into<String>) -> Self {
        self.config.subject_kind = kind.into();
        self
    }

    pub fn build(self) -> Result<MonitorConfig, BuildError> {
        if self.config.wait_timeout.is_zero() {
            return Err(BuildError::ZeroTimeout);
        }
        if self.config.query_timeout.is_zero() {
            return Err(BuildError::ZeroQueryTimeout);
        }
        Ok(self.config)
    }
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat, deserializable form of `MonitorConfig` with millisecond fields.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub wait_interval_ms: Option<u64>,
    pub query_timeout_ms: u64,
    pub subject_kind: String,
}

#[cfg(feature = "serde")]
impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            timeout_ms: DEFAULT_WAIT_TIMEOUT.as_millis() as u64,
            wait_interval_ms: None,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT.as_millis() as u64,
            subject_kind: DEFAULT_SUBJECT_KIND.to_string(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<MonitorSettings> for MonitorConfig {
    type Error = BuildError;

    fn try_from(settings: MonitorSettings) -> Result<Self, Self::Error> {
        let mut builder = MonitorConfig::builder()
            .poll_interval(Duration::from_millis(settings.poll_interval_ms))
            .wait_timeout(Duration::from_millis(settings.timeout_ms))
            .query_timeout(Duration::from_millis(settings.query_timeout_ms))
            .subject_kind(settings.subject_kind);
        if let Some(ms) = settings.wait_interval_ms {
            builder = builder.wait_interval(Duration::from_millis(ms));
        }
        builder.build()
    }
}
