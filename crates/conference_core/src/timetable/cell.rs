//! Grid cell model.
//!
//! # Responsibility
//! - Define the two cell variants stored per `(slot, track)` key.
//! - Provide borrowed views that resolve a secondary cell to its anchor.
//!
//! # Invariants
//! - Exactly one `Anchor` exists per placed item, keyed on its first track.
//! - A `Secondary` never owns its anchor; it holds an `AnchorId` into the
//!   table's anchor arena.
//! - An anchor cell is never removed once written; only its `columns` shrink.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Index of an anchor inside the table's anchor arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub(crate) usize);

impl AnchorId {
    /// Position in the arena, in placement order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Start of a placed item together with its span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor<K, P> {
    /// Slot where the item starts.
    pub time: NaiveTime,
    /// First listed track; the anchor cell lives here.
    pub track: K,
    /// Caller payload (talk, break, keynote...).
    pub payload: P,
    /// Span in slots. Reduced in place when a later placement trims the item.
    pub columns: u32,
    /// Number of tracks occupied.
    pub rows: usize,
    /// Duration was derived from grid state instead of given.
    pub flex: bool,
}

/// Slot occupied by an item other than at its anchor key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secondary<K> {
    pub time: NaiveTime,
    pub track: K,
    pub anchor: AnchorId,
    /// Copied from the anchor when the cell is created.
    pub flex: bool,
}

/// Occupant of one `(slot, track)` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell<K> {
    Anchor(AnchorId),
    Secondary(Secondary<K>),
}

impl<K> Cell<K> {
    /// Anchor owning this cell (itself for the anchor variant).
    pub fn anchor_id(&self) -> AnchorId {
        match self {
            Self::Anchor(id) => *id,
            Self::Secondary(cell) => cell.anchor,
        }
    }
}

/// Read-only view of an occupied cell with its anchor resolved.
#[derive(Debug)]
pub enum CellView<'a, K, P> {
    Anchor(&'a Anchor<K, P>),
    Secondary {
        cell: &'a Secondary<K>,
        anchor: &'a Anchor<K, P>,
    },
}

impl<K, P> Clone for CellView<'_, K, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, P> Copy for CellView<'_, K, P> {}

impl<'a, K, P> CellView<'a, K, P> {
    /// Slot this cell occupies.
    pub fn time(&self) -> NaiveTime {
        match self {
            Self::Anchor(anchor) => anchor.time,
            Self::Secondary { cell, .. } => cell.time,
        }
    }

    /// Track this cell occupies.
    pub fn track(&self) -> &'a K {
        match self {
            Self::Anchor(anchor) => &anchor.track,
            Self::Secondary { cell, .. } => &cell.track,
        }
    }

    pub fn anchor(&self) -> &'a Anchor<K, P> {
        match self {
            Self::Anchor(anchor) => anchor,
            Self::Secondary { anchor, .. } => anchor,
        }
    }

    pub fn payload(&self) -> &'a P {
        &self.anchor().payload
    }

    pub fn is_anchor(&self) -> bool {
        matches!(self, Self::Anchor(_))
    }
}
