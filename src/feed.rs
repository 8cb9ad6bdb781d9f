//! Line-oriented output for the rendered progress feed.
//!
//! Writes are best-effort: a sink that cannot write drops the line. Only the polling task writes
//! to a feed.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination for rendered lines and operator diagnostics.
pub trait FeedSink: Send + Sync {
    /// Append one line (without trailing newline).
    fn write_line(&self, line: &str);
}

impl<F> FeedSink for Arc<F>
where
    F: FeedSink + ?Sized,
{
    fn write_line(&self, line: &str) {
        (**self).write_line(line)
    }
}

/// Feed backed by any `io::Write` (stdout, a file, a build log).
#[derive(Debug)]
pub struct WriterFeed<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterFeed<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterFeed<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> FeedSink for WriterFeed<W> {
    fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if writeln!(writer, "{}", line).and_then(|_| writer.flush()).is_err() {
            tracing::trace!("feed write failed; line dropped");
        }
    }
}

/// Feed that keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedSink for MemoryFeed {
    fn write_line(&self, line: &str) {
        self.guard().push(line.to_owned());
    }
}

/// Feed that forwards each line to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeed;

impl FeedSink for TracingFeed {
    fn write_line(&self, line: &str) {
        tracing::info!(target: "stackwatch::feed", "{}", line);
    }
}
