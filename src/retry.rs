//! Retry policy for completion checks.
//!
//! Semantics:
//! - The delay between attempts is fixed (`interval`).
//! - Attempts stop once the time elapsed since the first attempt reaches `timeout`. This is the
//!   only place a timeout is detected; nothing else checks a wall-clock deadline.
//! - The first attempt is always made, so a timed-out wait has made at least one attempt even when
//!   that attempt alone took longer than the timeout.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use stackwatch::RetryPolicy;
//!
//! let policy = RetryPolicy::builder()
//!     .interval(Duration::from_secs(5))
//!     .timeout(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//! assert!(policy.should_retry(1, Duration::from_secs(59)));
//! assert!(!policy.should_retry(1, Duration::from_secs(60)));
//! assert_eq!(policy.next_delay(), Duration::from_secs(5));
//! ```

use std::time::Duration;
use tokio::time::Instant;

/// Default total wait before giving up (10 minutes).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Delay used when a zero interval is configured, so the check never spins.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-delay retry policy capped by a total timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    interval: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Whether another attempt may be made after `attempts` attempts and `elapsed` time since the
    /// first one started. The first attempt is always allowed.
    pub fn should_retry(&self, attempts: usize, elapsed: Duration) -> bool {
        attempts == 0 || elapsed < self.timeout
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&self) -> Duration {
        self.interval
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_WAIT_INTERVAL, timeout: DEFAULT_WAIT_TIMEOUT }
    }
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The total timeout must be > 0.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    /// The per-query bound must be > 0.
    #[error("query timeout must be greater than zero")]
    ZeroQueryTimeout,
}

/// Builder for `RetryPolicy`.
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    interval: Duration,
    timeout: Duration,
}

impl RetryPolicyBuilder {
    /// Create a builder with a 1s interval and a 10 minute timeout.
    pub fn new() -> Self {
        Self { interval: DEFAULT_WAIT_INTERVAL, timeout: DEFAULT_WAIT_TIMEOUT }
    }

    /// Fixed delay between attempts. Zero falls back to `DEFAULT_WAIT_INTERVAL`.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Total time budget measured from the first attempt. Must be > 0.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RetryPolicy, BuildError> {
        if self.timeout.is_zero() {
            return Err(BuildError::ZeroTimeout);
        }
        let interval = if self.interval.is_zero() { DEFAULT_WAIT_INTERVAL } else { self.interval };
        Ok(RetryPolicy { interval, timeout: self.timeout })
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempt bookkeeping owned by a single waiter.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts: usize,
    first_attempt: Option<Instant>,
}

impl RetryState {
    pub fn new() -> Self {
        Self { attempts: 0, first_attempt: None }
    }

    /// Record that an attempt is starting. The first call pins the start instant.
    pub fn record_attempt(&mut self) -> usize {
        self.first_attempt.get_or_insert_with(Instant::now);
        self.attempts += 1;
        self.attempts
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Time since the first attempt started, zero before any attempt.
    pub fn elapsed(&self) -> Duration {
        self.first_attempt.map(|start| start.elapsed()).unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}
