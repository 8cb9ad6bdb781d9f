//! Watch a long-running operation and render its event feed.
//!
//! A watch runs two threads of control:
//! - the completion waiter, spawned on the runtime, checking whether the operation is done;
//! - the polling loop, on the caller's task, querying the event log, rendering new events and
//!   sleeping between ticks.
//!
//! They share nothing but the completion signal. The loop looks at the signal once per tick; the
//! tick that starts after the signal resolved is the last one, so events written just before
//! completion still make it into the feed. A query is bounded by `query_timeout` and gives way to
//! cancellation, so a stuck event log never holds up the outcome. When the loop exits (completion, cancellation, a fatal
//! source error, or polling disabled) the watch drains: it waits for the outcome and returns it.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use stackwatch::{
//!     EventSource, MemoryFeed, Monitor, MonitorConfig, Progress, QueryError, StackEvent,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct NoEvents;
//!
//! #[async_trait]
//! impl EventSource for NoEvents {
//!     async fn describe_events(&self, _stack: &str) -> Result<Vec<StackEvent>, QueryError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let config = MonitorConfig::builder().poll_interval(Duration::from_millis(10)).build().unwrap();
//! let feed = MemoryFeed::new();
//! let monitor = Monitor::new(config, NoEvents, feed.clone());
//! let check = || async { Ok::<_, std::io::Error>(Progress::Done(())) };
//! let result = monitor.watch("my-stack", check, &CancellationToken::new()).await;
//! assert!(result.is_ok());
//! assert!(feed.lines().iter().any(|line| line.starts_with("| Stack: my-stack")));
//! # });
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::dedup::PollState;
use crate::error::MonitorError;
use crate::feed::FeedSink;
use crate::render::EventRenderer;
use crate::source::{EventSource, QueryErrorKind};
use crate::telemetry::{
    emit_best_effort, MonitorEvent, NullSink, OutcomeKind, StopReason, TelemetrySink,
};
use crate::waiter::{CompletionWaiter, Progress, WaitHandle};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Feed line written when the controlling context cancels a watch.
pub const INTERRUPTED_MESSAGE: &str = "Task interrupted. Stopping event printer.";

/// Result of a watch plus what the polling loop did.
#[derive(Debug)]
pub struct MonitorReport<T, E> {
    pub result: Result<T, MonitorError<E>>,
    /// Event-log queries issued, failed ones included.
    pub polls: usize,
    /// Event rows written to the feed.
    pub events_rendered: usize,
    /// Whether the polling loop stopped because of cancellation.
    pub cancelled: bool,
}

/// Watches operations against one event source.
pub struct Monitor<S, K = NullSink> {
    config: MonitorConfig,
    source: S,
    feed: Arc<dyn FeedSink>,
    telemetry: K,
    clock: Arc<dyn Clock>,
    renderer: EventRenderer,
}

impl<S, K> fmt::Debug for Monitor<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("source", &"<source>")
            .field("feed", &"<feed>")
            .field("clock", &self.clock)
            .finish()
    }
}

impl<S> Monitor<S, NullSink>
where
    S: EventSource,
{
    pub fn new<F>(config: MonitorConfig, source: S, feed: F) -> Self
    where
        F: FeedSink + 'static,
    {
        Self {
            config,
            source,
            feed: Arc::new(feed),
            telemetry: NullSink,
            clock: Arc::new(SystemClock),
            renderer: EventRenderer::new(),
        }
    }
}

impl<S, K> Monitor<S, K> {
    /// Emit `MonitorEvent`s to `sink`.
    pub fn with_telemetry<K2>(self, sink: K2) -> Monitor<S, K2>
    where
        K2: TelemetrySink,
    {
        Monitor {
            config: self.config,
            source: self.source,
            feed: self.feed,
            telemetry: sink,
            clock: self.clock,
            renderer: self.renderer,
        }
    }

    /// Use `clock` to stamp the start of each watch.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Counters and flags of one polling loop.
#[derive(Debug, Default)]
struct LoopStats {
    polls: usize,
    events_rendered: usize,
    cancelled: bool,
}

enum Tick {
    Continue,
    /// The operation resolved while the query was in flight.
    Resolved,
    SourceFailed,
    Cancelled,
}

impl<S, K> Monitor<S, K>
where
    S: EventSource,
    K: TelemetrySink,
    K::Future: Send + 'static,
{
    /// Watch `subject` until `check` reports done, fails, or times out.
    pub async fn watch<T, E, C, Fut>(
        &self,
        subject: &str,
        check: C,
        cancel: &CancellationToken,
    ) -> Result<T, MonitorError<E>>
    where
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        C: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Progress<T>, E>> + Send + 'static,
    {
        self.watch_with_report(subject, check, cancel).await.result
    }

    /// Like `watch`, also reporting what the polling loop did.
    pub async fn watch_with_report<T, E, C, Fut>(
        &self,
        subject: &str,
        check: C,
        cancel: &CancellationToken,
    ) -> MonitorReport<T, E>
    where
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        C: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Progress<T>, E>> + Send + 'static,
    {
        let span = tracing::info_span!("watch", subject = %subject);
        self.run(subject, check, cancel).instrument(span).await
    }

    async fn run<T, E, C, Fut>(
        &self,
        subject: &str,
        check: C,
        cancel: &CancellationToken,
    ) -> MonitorReport<T, E>
    where
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        C: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Progress<T>, E>> + Send + 'static,
    {
        let policy = self.config.retry_policy();
        self.feed.write_line(&format!(
            "Setting up a polling strategy to poll every {:?} for a maximum of {:?}",
            policy.interval(),
            policy.timeout()
        ));
        let mut handle = CompletionWaiter::new(policy).start(check);

        self.feed.write_line(&self.renderer.divider());
        self.feed.write_line(&self.renderer.header(&self.config.header_label(subject)));
        self.feed.write_line(&self.renderer.divider());

        let mut state = PollState::new(self.clock.now());
        let mut stats = LoopStats::default();

        if self.config.polling_enabled() {
            self.poll_until_resolved(subject, &mut handle, &mut state, &mut stats, cancel).await;
        } else {
            tracing::debug!("polling disabled; waiting for completion only");
        }

        let result = self.drain(handle).await;
        MonitorReport {
            result,
            polls: stats.polls,
            events_rendered: stats.events_rendered,
            cancelled: stats.cancelled,
        }
    }

    async fn poll_until_resolved<T, E>(
        &self,
        subject: &str,
        handle: &mut WaitHandle<T, E>,
        state: &mut PollState,
        stats: &mut LoopStats,
        cancel: &CancellationToken,
    ) {
        loop {
            if cancel.is_cancelled() {
                self.stop_cancelled(stats).await;
                return;
            }

            // A tick that starts after resolution is the final one.
            let finished = handle.is_resolved();
            match self.tick(subject, state, stats, handle, finished, cancel).await {
                Tick::Continue => {}
                Tick::Resolved => continue,
                Tick::SourceFailed => return,
                Tick::Cancelled => {
                    self.stop_cancelled(stats).await;
                    return;
                }
            }
            if finished {
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = cancel.cancelled() => {
                    self.stop_cancelled(stats).await;
                    return;
                }
            }
        }
    }

    /// One query of the event log. The query never outlives cancellation or the query timeout;
    /// outside the final tick it is also abandoned as soon as the operation resolves, so the
    /// final tick runs right away.
    async fn tick<T, E>(
        &self,
        subject: &str,
        state: &mut PollState,
        stats: &mut LoopStats,
        handle: &mut WaitHandle<T, E>,
        final_tick: bool,
        cancel: &CancellationToken,
    ) -> Tick {
        stats.polls += 1;
        let query =
            tokio::time::timeout(self.config.query_timeout(), self.source.describe_events(subject));

        let answer = tokio::select! {
            answer = query => answer,
            _ = cancel.cancelled() => {
                tracing::debug!(poll = stats.polls, "query abandoned on cancellation");
                return Tick::Cancelled;
            }
            _ = handle.resolved(), if !final_tick => {
                tracing::debug!(poll = stats.polls, "operation resolved mid-query; polling once more");
                return Tick::Resolved;
            }
        };

        match answer {
            Ok(Ok(batch)) => {
                let fresh = state.advance(batch);
                for event in &fresh {
                    self.feed.write_line(&self.renderer.row(event));
                    self.feed.write_line(&self.renderer.divider());
                }
                stats.events_rendered += fresh.len();
                tracing::debug!(
                    poll = stats.polls,
                    new_events = fresh.len(),
                    last_seen = state.last_seen_id().unwrap_or(""),
                    "polled event log"
                );
                self.emit(MonitorEvent::PollCompleted { new_events: fresh.len() }).await;
                Tick::Continue
            }
            Ok(Err(err)) if err.is_transient() => {
                tracing::trace!(poll = stats.polls, error = %err, "ignoring transient query error");
                self.emit(MonitorEvent::PollSuppressed { kind: err.kind }).await;
                Tick::Continue
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    poll = stats.polls,
                    error = %err,
                    "event log unavailable; stopping polling"
                );
                self.emit(MonitorEvent::PollingStopped { reason: StopReason::SourceFailed }).await;
                Tick::SourceFailed
            }
            Err(_) => {
                tracing::debug!(
                    poll = stats.polls,
                    timeout_ms = self.config.query_timeout().as_millis() as u64,
                    "event query timed out; skipping tick"
                );
                self.emit(MonitorEvent::PollSuppressed { kind: QueryErrorKind::Transient }).await;
                Tick::Continue
            }
        }
    }

    async fn stop_cancelled(&self, stats: &mut LoopStats) {
        stats.cancelled = true;
        self.feed.write_line(INTERRUPTED_MESSAGE);
        tracing::warn!(polls = stats.polls, "watch cancelled; waiting for completion outcome");
        self.emit(MonitorEvent::PollingStopped { reason: StopReason::Cancelled }).await;
    }

    async fn drain<T, E>(&self, handle: WaitHandle<T, E>) -> Result<T, MonitorError<E>>
    where
        E: fmt::Display,
    {
        let result = match handle.wait().await {
            Ok(outcome) => {
                self.emit(MonitorEvent::WaitResolved { outcome: outcome.kind() }).await;
                outcome.into_result(self.config.wait_timeout())
            }
            Err(lost) => {
                self.emit(MonitorEvent::WaitResolved { outcome: OutcomeKind::WaiterLost }).await;
                Err(lost.into())
            }
        };

        if let Err(err) = &result {
            self.feed.write_line(&format!("Failed to wait for operation to complete: {}", err));
        }
        result
    }

    async fn emit(&self, event: MonitorEvent) {
        emit_best_effort(self.telemetry.clone(), event).await;
    }
}
