//! Built-in telemetry sinks.
//!
//! Any `tower::Service<MonitorEvent, Response = ()>` that is `Clone + Send` is a sink; the types
//! here cover discarding, logging and capturing events.

use super::events::{MonitorEvent, OutcomeKind};
use futures::future::{ready, Ready};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tower::Service;

/// A service that consumes monitor events.
pub trait TelemetrySink:
    Service<MonitorEvent, Response = (), Error = Self::SinkError> + Clone + Send + 'static
{
    type SinkError: std::error::Error + Send + 'static;
}

impl<S> TelemetrySink for S
where
    S: Service<MonitorEvent, Response = ()> + Clone + Send + 'static,
    S::Error: std::error::Error + Send + 'static,
{
    type SinkError = S::Error;
}

/// Deliver `event` if the sink becomes ready; errors are dropped.
pub async fn emit_best_effort<S>(sink: S, event: MonitorEvent)
where
    S: TelemetrySink,
    S::Future: Send + 'static,
{
    use tower::ServiceExt;

    match sink.ready_oneshot().await {
        Ok(mut ready_sink) => {
            if let Err(err) = ready_sink.call(event).await {
                tracing::trace!(error = %err, "telemetry sink rejected event");
            }
        }
        Err(err) => tracing::trace!(error = %err, "telemetry sink not ready"),
    }
}

/// Discards every event.
#[derive(Clone, Debug, Default)]
pub struct NullSink;

impl Service<MonitorEvent> for NullSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _event: MonitorEvent) -> Self::Future {
        ready(Ok(()))
    }
}

/// Logs each event with its fields under the `stackwatch::telemetry` target.
///
/// Events are emitted inside the watch span, so the subject is attached by the subscriber.
/// Timeouts and lost waiters log at `warn`, everything else at `info` (poll results at `debug`).
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl Service<MonitorEvent> for LogSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: MonitorEvent) -> Self::Future {
        match event {
            MonitorEvent::PollCompleted { new_events } => {
                tracing::debug!(target: "stackwatch::telemetry", new_events, "poll completed");
            }
            MonitorEvent::PollSuppressed { kind } => {
                tracing::debug!(target: "stackwatch::telemetry", kind = %kind, "poll suppressed");
            }
            MonitorEvent::PollingStopped { reason } => {
                tracing::info!(target: "stackwatch::telemetry", reason = %reason, "polling stopped");
            }
            MonitorEvent::WaitResolved {
                outcome: outcome @ (OutcomeKind::Success | OutcomeKind::Failure),
            } => {
                tracing::info!(target: "stackwatch::telemetry", outcome = %outcome, "wait resolved");
            }
            MonitorEvent::WaitResolved { outcome } => {
                tracing::warn!(target: "stackwatch::telemetry", outcome = %outcome, "wait resolved");
            }
        }
        ready(Ok(()))
    }
}

/// Keeps the most recent events in memory.
#[derive(Clone, Debug)]
pub struct MemorySink {
    events: Arc<Mutex<VecDeque<MonitorEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemorySink {
    /// Sink keeping up to 10 000 events.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Captured events, oldest first.
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.guard().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Events dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<MonitorEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<MonitorEvent> for MemorySink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: MonitorEvent) -> Self::Future {
        let mut events = self.guard();
        if events.len() == self.capacity {
            events.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        events.push_back(event);
        ready(Ok(()))
    }
}
