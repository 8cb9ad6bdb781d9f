//! Telemetry for watched operations.
//!
//! The monitor emits structured `MonitorEvent`s alongside the human-readable feed. Events flow
//! through `TelemetrySink` implementations, which are `tower::Service<MonitorEvent>`s so they can
//! be wrapped and composed like any other service.
//!
//! Emission is best-effort: a sink that is not ready or fails never affects the watch.

pub mod events;
pub mod sinks;

pub use events::{MonitorEvent, OutcomeKind, StopReason};
pub use sinks::{emit_best_effort, LogSink, MemorySink, NullSink, TelemetrySink};
