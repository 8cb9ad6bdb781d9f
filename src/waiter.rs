//! Background wait-for-completion.
//!
//! Semantics:
//! - `CompletionWaiter::start` spawns a task that runs the completion check repeatedly under a
//!   `RetryPolicy` until it reports done, fails, or the policy forbids another attempt.
//! - The outcome travels over a single-assignment channel. The sending half is held by a
//!   `Resolver`; resolving consumes the sender, so any later resolution is a no-op.
//! - The task makes progress on its own: the caller only observes it through `WaitHandle`.
//!
//! Invariants:
//! - Exactly one `WaitOutcome` is produced per started wait.
//! - A `TimedOut` outcome always reports at least one attempt.
//! - No attempt starts after the outcome has been decided.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use stackwatch::{CompletionWaiter, Progress, RetryPolicy, WaitOutcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::builder()
//!     .interval(Duration::from_millis(10))
//!     .timeout(Duration::from_secs(1))
//!     .build()
//!     .unwrap();
//! let handle = CompletionWaiter::new(policy)
//!     .start(|| async { Ok::<_, std::io::Error>(Progress::Done("UPDATE_COMPLETE")) });
//! assert!(matches!(handle.wait().await, Ok(WaitOutcome::Success("UPDATE_COMPLETE"))));
//! # });
//! ```

use crate::error::MonitorError;
use crate::retry::{RetryPolicy, RetryState};
use crate::telemetry::OutcomeKind;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Result of a single completion check that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress<T> {
    /// The operation reached its terminal state.
    Done(T),
    /// The operation is still running.
    Pending,
}

/// Terminal outcome of a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T, E> {
    Success(T),
    Failure(E),
    TimedOut { attempts: usize, elapsed: Duration },
}

impl<T, E> WaitOutcome<T, E> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            WaitOutcome::Success(_) => OutcomeKind::Success,
            WaitOutcome::Failure(_) => OutcomeKind::Failure,
            WaitOutcome::TimedOut { .. } => OutcomeKind::TimedOut,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Success(_))
    }

    /// Convert into a caller-facing result. `timeout` is the configured limit reported on
    /// `TimedOut`.
    pub fn into_result(self, timeout: Duration) -> Result<T, MonitorError<E>> {
        match self {
            WaitOutcome::Success(value) => Ok(value),
            WaitOutcome::Failure(err) => Err(MonitorError::Failed(err)),
            WaitOutcome::TimedOut { attempts, elapsed } => {
                Err(MonitorError::TimedOut { attempts, elapsed, timeout })
            }
        }
    }
}

/// The waiter task ended without resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("completion waiter stopped without reporting an outcome")]
pub struct WaiterLost;

impl<E> From<WaiterLost> for MonitorError<E> {
    fn from(_: WaiterLost) -> Self {
        MonitorError::WaiterLost
    }
}

/// Write-once side of the completion signal.
#[derive(Debug)]
pub struct Resolver<T, E> {
    tx: Option<oneshot::Sender<WaitOutcome<T, E>>>,
}

impl<T, E> Resolver<T, E> {
    /// Deliver `outcome`. Returns `false` if an outcome was already delivered.
    pub fn resolve(&mut self, outcome: WaitOutcome<T, E>) -> bool {
        let Some(tx) = self.tx.take() else {
            tracing::debug!(outcome = %outcome.kind(), "completion already resolved; ignoring");
            return false;
        };
        tracing::info!(outcome = %outcome.kind(), "completion resolved");
        // A dropped handle means nobody is waiting; the outcome is simply discarded.
        let _ = tx.send(outcome);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }

    /// Whether the handle was dropped before resolution.
    pub fn is_abandoned(&self) -> bool {
        self.tx.as_ref().map(|tx| tx.is_closed()).unwrap_or(false)
    }
}

/// Create a connected resolver/handle pair.
pub fn signal<T, E>() -> (Resolver<T, E>, WaitHandle<T, E>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx: Some(tx) }, WaitHandle { slot: Slot::Pending(rx) })
}

#[derive(Debug)]
enum Slot<T, E> {
    Pending(oneshot::Receiver<WaitOutcome<T, E>>),
    Ready(WaitOutcome<T, E>),
    Lost,
}

/// Read side of the completion signal.
#[derive(Debug)]
pub struct WaitHandle<T, E> {
    slot: Slot<T, E>,
}

impl<T, E> WaitHandle<T, E> {
    /// Non-blocking check for an outcome. A waiter that went away counts as resolved.
    pub fn is_resolved(&mut self) -> bool {
        if let Slot::Pending(rx) = &mut self.slot {
            match rx.try_recv() {
                Ok(outcome) => self.slot = Slot::Ready(outcome),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Closed) => self.slot = Slot::Lost,
            }
        }
        true
    }

    /// Wait until an outcome is available, keeping it in the handle.
    ///
    /// Cancel-safe: dropping the returned future before it completes loses nothing.
    pub async fn resolved(&mut self) {
        if let Slot::Pending(rx) = &mut self.slot {
            let received = rx.await;
            self.slot = match received {
                Ok(outcome) => Slot::Ready(outcome),
                Err(_) => Slot::Lost,
            };
        }
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> Result<WaitOutcome<T, E>, WaiterLost> {
        match self.slot {
            Slot::Pending(rx) => rx.await.map_err(|_| WaiterLost),
            Slot::Ready(outcome) => Ok(outcome),
            Slot::Lost => Err(WaiterLost),
        }
    }
}

/// Runs completion checks in the background under a retry policy.
#[derive(Debug, Clone, Default)]
pub struct CompletionWaiter {
    policy: RetryPolicy,
}

impl CompletionWaiter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Spawn the check loop and return a handle to its outcome.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<T, E, C, Fut>(&self, check: C) -> WaitHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        C: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Progress<T>, E>> + Send + 'static,
    {
        tracing::info!(
            interval_ms = self.policy.interval().as_millis() as u64,
            timeout_ms = self.policy.timeout().as_millis() as u64,
            "starting completion waiter"
        );
        let (resolver, handle) = signal();
        tokio::spawn(run_checks(self.policy.clone(), check, resolver));
        handle
    }
}

async fn run_checks<T, E, C, Fut>(policy: RetryPolicy, mut check: C, mut resolver: Resolver<T, E>)
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<Progress<T>, E>>,
{
    let mut state = RetryState::new();

    while !resolver.is_resolved() {
        if resolver.is_abandoned() {
            tracing::debug!(attempts = state.attempts(), "wait handle dropped; stopping checks");
            return;
        }

        let attempt = state.record_attempt();
        let result = check().await;
        let elapsed = state.elapsed();

        let outcome = match result {
            Ok(Progress::Done(value)) => WaitOutcome::Success(value),
            Err(err) => WaitOutcome::Failure(err),
            Ok(Progress::Pending) if !policy.should_retry(attempt, elapsed) => {
                WaitOutcome::TimedOut { attempts: attempt, elapsed }
            }
            Ok(Progress::Pending) => {
                tracing::debug!(
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "operation still in progress"
                );
                tokio::time::sleep(policy.next_delay()).await;
                continue;
            }
        };
        resolver.resolve(outcome);
    }
}
