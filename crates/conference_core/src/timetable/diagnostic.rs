//! Accumulated scheduling diagnostics.
//!
//! Overlaps are never raised as errors. Callers inspect
//! `TimeTable::errors()` once a placement sequence is done.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Category of a recorded overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Target key already held an anchor; the new item was dropped.
    OverlapEvent,
    /// Two fixed items overlap on an extension slot; the older one was trimmed.
    OverlapReference,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OverlapEvent => "overlap-event",
            Self::OverlapReference => "overlap-reference",
        }
    }
}

/// One entry of the table's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic<P> {
    pub kind: DiagnosticKind,
    /// Slot where the overlap was detected.
    pub time: NaiveTime,
    /// Payload of the item being placed.
    pub item: P,
    /// Payload of the item already occupying the slot.
    pub previous: P,
    pub message: String,
}
