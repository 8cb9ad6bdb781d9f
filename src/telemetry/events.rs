//! Structured events describing what a watch did, for `TelemetrySink`s.

use crate::source::QueryErrorKind;
use std::fmt;

/// Events emitted by a monitor while it watches an operation.
///
/// Events are emitted from the polling task only, after the corresponding feed lines have been
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A poll tick queried the event log successfully.
    PollCompleted {
        /// Number of events that were new on this tick
        new_events: usize,
    },
    /// A poll tick's query failed with a transient error and was skipped.
    PollSuppressed {
        /// Kind of the ignored error
        kind: QueryErrorKind,
    },
    /// The polling loop stopped before the operation completed.
    PollingStopped {
        /// Why polling stopped
        reason: StopReason,
    },
    /// The completion waiter produced its outcome.
    WaitResolved {
        /// Terminal state of the operation
        outcome: OutcomeKind,
    },
}

/// Why a polling loop ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The controlling context was cancelled.
    Cancelled,
    /// The event log reported a non-transient error.
    SourceFailed,
}

/// Terminal state of a watched operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
    TimedOut,
    WaiterLost,
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::PollCompleted { new_events } => {
                write!(f, "Poll::Completed(new={})", new_events)
            }
            MonitorEvent::PollSuppressed { kind } => write!(f, "Poll::Suppressed({})", kind),
            MonitorEvent::PollingStopped { reason } => write!(f, "Poll::Stopped({})", reason),
            MonitorEvent::WaitResolved { outcome } => write!(f, "Wait::Resolved({})", outcome),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::SourceFailed => write!(f, "source_failed"),
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::Failure => write!(f, "failure"),
            OutcomeKind::TimedOut => write!(f, "timed_out"),
            OutcomeKind::WaiterLost => write!(f, "waiter_lost"),
        }
    }
}
