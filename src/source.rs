//! The event log a watch polls.
//!
//! Implementations wrap whatever client answers "describe events" for a stack. Errors carry an
//! explicit kind so the polling loop can tell what it may ignore:
//! - `Transient`: throttling, a 5xx, a dropped connection. The tick is skipped and polling
//!   continues.
//! - `Fatal`: the source can no longer answer (stack deleted, credentials revoked). Polling stops
//!   and the monitor goes straight to waiting for the outcome.

use crate::event::StackEvent;
use async_trait::async_trait;

/// Source of stack events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The most recent events for `subject`, newest first. The page size is fixed by the source.
    async fn describe_events(&self, subject: &str) -> Result<Vec<StackEvent>, QueryError>;
}

/// How the polling loop treats a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    Transient,
    Fatal,
}

impl std::fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryErrorKind::Transient => write!(f, "transient"),
            QueryErrorKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// A failed `describe_events` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} event query error: {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: QueryErrorKind::Transient, message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { kind: QueryErrorKind::Fatal, message: message.into() }
    }

    /// Whether the polling loop ignores this error and keeps going.
    pub fn is_transient(&self) -> bool {
        self.kind == QueryErrorKind::Transient
    }
}

#[async_trait]
impl<S> EventSource for std::sync::Arc<S>
where
    S: EventSource + ?Sized,
{
    async fn describe_events(&self, subject: &str) -> Result<Vec<StackEvent>, QueryError> {
        (**self).describe_events(subject).await
    }
}
