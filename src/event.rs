//! Stack events as returned by the remote event log.
//!
//! Events are immutable. Identity is `event_id`; ordering is by `timestamp`, with `event_id`
//! breaking ties so that sorting is stable across polls.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A single status record emitted by a resource while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub logical_resource_id: String,
    pub resource_status: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource_status_reason: Option<String>,
}

impl StackEvent {
    /// Create an event without a status reason.
    pub fn new(
        event_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        logical_resource_id: impl Into<String>,
        resource_status: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            logical_resource_id: logical_resource_id.into(),
            resource_status: resource_status.into(),
            resource_status_reason: None,
        }
    }

    /// Attach a status reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.resource_status_reason = Some(reason.into());
        self
    }

    /// Status reason, or the empty string when the source sent none.
    pub fn reason(&self) -> &str {
        self.resource_status_reason.as_deref().unwrap_or("")
    }
}

impl PartialOrd for StackEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StackEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp).then_with(|| self.event_id.cmp(&other.event_id))
    }
}
