//! Filtering of already-seen and pre-start events.
//!
//! The event log returns a fixed-size page, newest first. A batch is scanned from the front and
//! the scan stops at the first event that is the dedup cursor (`last_seen_id`) or that is older
//! than the watch start (`not_before`, inclusive lower bound). Everything scanned before the stop
//! is new.
//!
//! When neither stop condition is hit inside the page, every returned event is treated as new.
//! Events that scrolled past the page between two polls are not recovered.

use crate::event::StackEvent;
use chrono::{DateTime, Utc};

/// Select the events of `batch` (newest first) that have not been rendered yet.
///
/// Returns the new events oldest first and the id of the newest one, or `last_seen_id` unchanged
/// when nothing is new.
pub fn filter_new(
    batch: Vec<StackEvent>,
    last_seen_id: Option<&str>,
    not_before: DateTime<Utc>,
) -> (Vec<StackEvent>, Option<String>) {
    let mut fresh: Vec<StackEvent> = batch
        .into_iter()
        .take_while(|event| {
            Some(event.event_id.as_str()) != last_seen_id && event.timestamp >= not_before
        })
        .collect();

    let newest = match fresh.first() {
        Some(event) => Some(event.event_id.clone()),
        None => return (fresh, last_seen_id.map(str::to_owned)),
    };

    fresh.reverse();
    // Chronological by (timestamp, id) even when the page is not strictly newest first.
    fresh.sort();
    (fresh, newest)
}

/// Dedup cursor owned by one polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    start_time: DateTime<Utc>,
    last_seen_id: Option<String>,
}

impl PollState {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self { start_time, last_seen_id: None }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn last_seen_id(&self) -> Option<&str> {
        self.last_seen_id.as_deref()
    }

    /// Filter `batch` against the cursor and move the cursor to the newest new event.
    pub fn advance(&mut self, batch: Vec<StackEvent>) -> Vec<StackEvent> {
        let (fresh, newest) = filter_new(batch, self.last_seen_id(), self.start_time);
        self.last_seen_id = newest;
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_714_557_600_000 + ms).single().expect("valid timestamp")
    }

    fn ev(id: &str, ms: i64) -> StackEvent {
        StackEvent::new(id, at(ms), "Resource", "UPDATE_IN_PROGRESS")
    }

    fn ids(events: &[StackEvent]) -> Vec<&str> {
        events.iter().map(|e| e.event_id.as_str()).collect()
    }

    #[test]
    fn first_tick_returns_everything_since_start_oldest_first() {
        let batch = vec![ev("e3", 3), ev("e2", 2), ev("e1", 1)];
        let (fresh, newest) = filter_new(batch, None, at(1));
        assert_eq!(ids(&fresh), vec!["e1", "e2", "e3"]);
        assert_eq!(newest.as_deref(), Some("e3"));
    }

    #[test]
    fn second_tick_stops_at_cursor() {
        let batch = vec![ev("e4", 4), ev("e3", 3), ev("e2", 2)];
        let (fresh, newest) = filter_new(batch, Some("e3"), at(1));
        assert_eq!(ids(&fresh), vec!["e4"]);
        assert_eq!(newest.as_deref(), Some("e4"));
    }

    #[test]
    fn start_time_is_an_inclusive_lower_bound() {
        let batch = vec![ev("at", 10), ev("before", 9)];
        let (fresh, _) = filter_new(batch, None, at(10));
        assert_eq!(ids(&fresh), vec!["at"]);
    }

    #[test]
    fn nothing_new_keeps_cursor() {
        let batch = vec![ev("e3", 3), ev("e2", 2)];
        let (fresh, newest) = filter_new(batch, Some("e3"), at(0));
        assert!(fresh.is_empty());
        assert_eq!(newest.as_deref(), Some("e3"));

        let (fresh, newest) = filter_new(Vec::new(), None, at(0));
        assert!(fresh.is_empty());
        assert!(newest.is_none());
    }

    #[test]
    fn stale_page_without_cursor_is_all_new() {
        // The cursor scrolled out of the page: everything returned counts as new.
        let batch = vec![ev("e9", 9), ev("e8", 8)];
        let (fresh, newest) = filter_new(batch, Some("e3"), at(0));
        assert_eq!(ids(&fresh), vec!["e8", "e9"]);
        assert_eq!(newest.as_deref(), Some("e9"));
    }

    #[test]
    fn filtering_is_idempotent() {
        let batch = vec![ev("e5", 5), ev("e4", 4), ev("e3", 3)];
        let first = filter_new(batch.clone(), Some("e3"), at(0));
        let second = filter_new(batch, Some("e3"), at(0));
        assert_eq!(first, second);
    }

    #[test]
    fn equal_timestamps_order_by_id() {
        let batch = vec![ev("b", 5), ev("a", 5), ev("c", 4)];
        let (fresh, newest) = filter_new(batch, None, at(0));
        assert_eq!(ids(&fresh), vec!["c", "a", "b"]);
        assert_eq!(newest.as_deref(), Some("b"));
    }

    #[test]
    fn poll_state_never_rerenders() {
        let mut state = PollState::new(at(1));
        assert!(state.last_seen_id().is_none());

        let first = state.advance(vec![ev("e3", 3), ev("e2", 2), ev("e1", 1), ev("e0", 0)]);
        assert_eq!(ids(&first), vec!["e1", "e2", "e3"]);
        assert_eq!(state.last_seen_id(), Some("e3"));

        let second = state.advance(vec![ev("e4", 4), ev("e3", 3), ev("e2", 2)]);
        assert_eq!(ids(&second), vec!["e4"]);
        assert_eq!(state.last_seen_id(), Some("e4"));

        let third = state.advance(vec![ev("e4", 4), ev("e3", 3)]);
        assert!(third.is_empty());
        assert_eq!(state.last_seen_id(), Some("e4"));
        assert_eq!(state.start_time(), at(1));
    }

    #[test]
    fn output_is_chronological_for_any_prefix() {
        let batch: Vec<StackEvent> =
            (0..20).rev().map(|i| ev(&format!("e{:02}", i), i64::from(i) * 7)).collect();
        for cursor in 0..20 {
            let id = format!("e{:02}", cursor);
            let (fresh, _) = filter_new(batch.clone(), Some(&id), at(0));
            assert_eq!(fresh.len(), 19 - cursor as usize);
            assert!(fresh.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            assert!(fresh.iter().all(|e| e.event_id != id));
        }
    }
}
