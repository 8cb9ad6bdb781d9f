#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::{ready, Ready};
use stackwatch::{
    EventSource, FixedClock, MemoryFeed, Monitor, MonitorConfig, Progress, QueryError, StackEvent,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SUBJECT: &str = "my-stack";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stack reached {0}")]
pub struct CheckError(pub String);

/// Wall-clock start of every test watch.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// `secs` seconds after `start()` (negative for history before the watch).
pub fn at(secs: i64) -> DateTime<Utc> {
    start() + chrono::Duration::seconds(secs)
}

pub fn event(id: &str, secs: i64, resource: &str) -> StackEvent {
    StackEvent::new(id, at(secs), resource, "UPDATE_IN_PROGRESS")
}

pub fn config(poll_ms: u64, timeout_ms: u64) -> MonitorConfig {
    MonitorConfig::builder()
        .poll_interval(Duration::from_millis(poll_ms))
        .wait_timeout(Duration::from_millis(timeout_ms))
        .build()
        .expect("valid config")
}

pub fn monitor<S: EventSource>(config: MonitorConfig, source: S) -> (Monitor<S>, MemoryFeed) {
    let feed = MemoryFeed::new();
    let monitor = Monitor::new(config, source, feed.clone()).with_clock(FixedClock::new(start()));
    (monitor, feed)
}

pub type Check = Ready<Result<Progress<&'static str>, CheckError>>;

/// Completion check that reports done on its `checks`-th call.
pub fn done_after(checks: usize) -> impl FnMut() -> Check + Send + 'static {
    let mut seen = 0;
    move || {
        seen += 1;
        if seen >= checks {
            ready(Ok(Progress::Done("UPDATE_COMPLETE")))
        } else {
            ready(Ok(Progress::Pending))
        }
    }
}

/// Completion check that never reports done.
pub fn never_done() -> impl FnMut() -> Check + Send + 'static {
    || ready(Ok(Progress::Pending))
}

/// Completion check that fails with `status` on its `checks`-th call.
pub fn fails_after(checks: usize, status: &'static str) -> impl FnMut() -> Check + Send + 'static {
    let mut seen = 0;
    move || {
        seen += 1;
        if seen >= checks {
            ready(Err(CheckError(status.to_string())))
        } else {
            ready(Ok(Progress::Pending))
        }
    }
}

/// Event source replaying a fixed script of responses; once exhausted it repeats the last
/// successful page.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<StackEvent>, QueryError>>>,
    last: Mutex<Vec<StackEvent>>,
    queries: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<StackEvent>, QueryError>>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), ..Self::default() })
    }

    pub fn pages(pages: Vec<Vec<StackEvent>>) -> Arc<Self> {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn describe_events(&self, _subject: &str) -> Result<Vec<StackEvent>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(page)) => {
                *self.last.lock().unwrap() = page.clone();
                Ok(page)
            }
            Some(Err(err)) => Err(err),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// Event log that tests append to while a watch runs.
#[derive(Debug, Clone, Default)]
pub struct LiveLog {
    events: Arc<Mutex<Vec<StackEvent>>>,
}

impl LiveLog {
    pub fn push(&self, event: StackEvent) {
        self.events.lock().unwrap().insert(0, event);
    }
}

#[async_trait]
impl EventSource for LiveLog {
    async fn describe_events(&self, _subject: &str) -> Result<Vec<StackEvent>, QueryError> {
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Feed lines that are event rows, i.e. everything after the header block that is not a rule.
pub fn rows(lines: &[String]) -> Vec<String> {
    lines.iter().skip(4).filter(|line| line.starts_with("| ")).cloned().collect()
}

/// Event source whose queries never answer.
#[derive(Debug, Default)]
pub struct HangingSource {
    queries: AtomicUsize,
}

impl HangingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for HangingSource {
    async fn describe_events(&self, _subject: &str) -> Result<Vec<StackEvent>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        futures::future::pending().await
    }
}
