//! Terminal errors surfaced by a watch.
//!
//! Only the completion waiter's outcome escalates to the caller. Query failures against the event
//! log are handled inside the polling loop and never appear here.
use std::time::Duration;

/// Terminal error of a watched operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MonitorError<E> {
    /// The completion check reported an error.
    #[error("operation failed: {0}")]
    Failed(#[source] E),
    /// The completion check never reported done within the configured timeout.
    #[error("operation did not complete after {attempts} checks in {elapsed:?} (limit: {timeout:?})")]
    TimedOut { attempts: usize, elapsed: Duration, timeout: Duration },
    /// The waiter task ended without resolving (panicked or its runtime shut down).
    #[error("completion waiter stopped without reporting an outcome")]
    WaiterLost,
}

impl<E> MonitorError<E> {
    /// Check if the operation timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Check if the completion check itself failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Check if the waiter disappeared.
    pub fn is_waiter_lost(&self) -> bool {
        matches!(self, Self::WaiterLost)
    }

    /// Get the check error if this is a `Failed` variant.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the check error if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Access timeout details as (attempts, elapsed, timeout).
    pub fn timeout_details(&self) -> Option<(usize, Duration, Duration)> {
        match self {
            Self::TimedOut { attempts, elapsed, timeout } => Some((*attempts, *elapsed, *timeout)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("{0}")]
    struct DummyError(&'static str);

    #[test]
    fn timeout_display_mentions_limit() {
        let err: MonitorError<DummyError> = MonitorError::TimedOut {
            attempts: 4,
            elapsed: Duration::from_millis(210),
            timeout: Duration::from_millis(200),
        };
        let msg = err.to_string();
        assert!(msg.contains("4 checks"));
        assert!(msg.contains("200ms"));
        assert!(err.is_timeout());
        assert!(!err.is_failure());
    }

    #[test]
    fn failure_keeps_source() {
        let err = MonitorError::Failed(DummyError("ROLLBACK_COMPLETE"));
        assert_eq!(err.to_string(), "operation failed: ROLLBACK_COMPLETE");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("ROLLBACK_COMPLETE"));
        assert_eq!(err.as_inner(), Some(&DummyError("ROLLBACK_COMPLETE")));
        assert_eq!(err.into_inner(), Some(DummyError("ROLLBACK_COMPLETE")));
    }

    #[test]
    fn accessors_return_none_for_other_variants() {
        let lost: MonitorError<DummyError> = MonitorError::WaiterLost;
        assert!(lost.is_waiter_lost());
        assert!(lost.timeout_details().is_none());
        assert!(lost.as_inner().is_none());

        let timeout: MonitorError<DummyError> = MonitorError::TimedOut {
            attempts: 1,
            elapsed: Duration::from_secs(2),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            timeout.timeout_details(),
            Some((1, Duration::from_secs(2), Duration::from_secs(1)))
        );
        assert!(timeout.source().is_none());
    }
}
