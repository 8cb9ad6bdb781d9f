//! Fixed-width table rendering of the progress feed.
//!
//! ```text
//! -----------------------------------------------------------------------------------------------
//! | Stack: my-stack                                                                             |
//! -----------------------------------------------------------------------------------------------
//! | 2024-05-01 10:00:01.250   | Bucket               | CREATE_IN_PROGRESS                   | ...
//! -----------------------------------------------------------------------------------------------
//! ```
//!
//! Column widths and the divider width are fixed so output lines up with feeds produced by earlier
//! versions. Values are left-justified, space padded and truncated to their column.

use crate::event::StackEvent;

pub const TIMESTAMP_WIDTH: usize = 25;
pub const SUBJECT_WIDTH: usize = 20;
pub const STATUS_WIDTH: usize = 36;
pub const REASON_WIDTH: usize = 140;

/// Width of the horizontal rule. Kept as a literal, not derived from the columns.
pub const DIVIDER_WIDTH: usize = 231;

/// Width of the header label between the `"| "` and `" |"` borders.
pub const HEADER_WIDTH: usize = DIVIDER_WIDTH - 4;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats header, divider and event rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRenderer;

impl EventRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Boxed label row, e.g. `| Stack: my-stack    ... |`.
    pub fn header(&self, label: &str) -> String {
        format!("| {} |", pad_right(label, HEADER_WIDTH))
    }

    /// Horizontal rule.
    pub fn divider(&self) -> String {
        "-".repeat(DIVIDER_WIDTH)
    }

    /// One table row for `event`.
    pub fn row(&self, event: &StackEvent) -> String {
        let time = event.timestamp.format(TIMESTAMP_FORMAT).to_string();
        format!(
            "| {} | {} | {} | {} |",
            pad_right(&time, TIMESTAMP_WIDTH),
            pad_right(&event.logical_resource_id, SUBJECT_WIDTH),
            pad_right(&event.resource_status, STATUS_WIDTH),
            pad_right(event.reason(), REASON_WIDTH),
        )
    }
}

/// Left-justify `value` in exactly `width` characters.
pub(crate) fn pad_right(value: &str, width: usize) -> String {
    let mut out: String = value.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}
