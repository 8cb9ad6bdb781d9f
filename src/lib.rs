#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # stackwatch
//!
//! Watch a long-running infrastructure operation (a stack create, update or delete) while it
//! runs: poll its event log, print each new event exactly once as a fixed-width table row, and
//! report how the operation ended.
//!
//! ## Features
//!
//! - **Completion waiter** running a user check on a fixed interval under a total timeout
//! - **Event feed** with cursor-based deduplication and chronological rendering
//! - **Cancellation** via `tokio_util::sync::CancellationToken`
//! - **Telemetry** through any `tower::Service<MonitorEvent>`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use stackwatch::{CompletionWaiter, Progress, RetryPolicy, WaitOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let policy = RetryPolicy::builder()
//!         .interval(Duration::from_millis(10))
//!         .timeout(Duration::from_secs(1))
//!         .build()
//!         .unwrap();
//!
//!     let handle = CompletionWaiter::new(policy)
//!         .start(|| async { Ok::<_, std::io::Error>(Progress::Done("CREATE_COMPLETE")) });
//!
//!     let outcome = handle.wait().await.unwrap();
//!     assert!(matches!(outcome, WaitOutcome::Success("CREATE_COMPLETE")));
//! }
//! ```

pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod event;
pub mod feed;
pub mod monitor;
pub mod render;
pub mod retry;
pub mod source;
pub mod telemetry;
pub mod waiter;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
#[cfg(feature = "serde")]
pub use config::MonitorSettings;
pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use dedup::{filter_new, PollState};
pub use error::MonitorError;
pub use event::StackEvent;
pub use feed::{FeedSink, MemoryFeed, TracingFeed, WriterFeed};
pub use monitor::{Monitor, MonitorReport, INTERRUPTED_MESSAGE};
pub use render::EventRenderer;
pub use retry::{BuildError, RetryPolicy, RetryPolicyBuilder, RetryState};
pub use source::{EventSource, QueryError, QueryErrorKind};
pub use telemetry::{LogSink, MemorySink, MonitorEvent, NullSink, TelemetrySink};
pub use waiter::{CompletionWaiter, Progress, WaitHandle, WaitOutcome, WaiterLost};
