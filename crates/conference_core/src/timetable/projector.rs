//! Read-only projections over a timetable.
//!
//! # Responsibility
//! - Per-track iteration and next-event lookup.
//! - Point-in-time queries (active cells, boundary changes).
//! - Dense dumps by track and by time for rendering.
//!
//! # Invariants
//! - Every projection steps from the grid start by whole slots, so dense
//!   dumps and row iteration visit the same keys.

use crate::timetable::cell::{Anchor, Cell, CellView};
use crate::timetable::{clock, minute_of_day, TimeTable};
use chrono::{NaiveTime, Timelike};
use std::fmt::Debug;
use std::hash::Hash;

/// Lazy walk over the occupied cells of one track.
///
/// Empty slots are skipped. Clone the iterator to restart from the same
/// position.
#[derive(Debug, Clone)]
pub struct RowIter<'a, K, P> {
    table: &'a TimeTable<K, P>,
    track: &'a K,
    cursor: u32,
    end: u32,
}

impl<'a, K, P> Iterator for RowIter<'a, K, P>
where
    K: Clone + Eq + Hash + Debug,
    P: Clone + Debug,
{
    type Item = CellView<'a, K, P>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        while self.cursor < self.end {
            let minute = self.cursor;
            self.cursor += table.slot;
            if let Some(cell) = table.store.get(minute, self.track) {
                return Some(table.view(cell));
            }
        }
        None
    }
}

/// One `(time, track)` position of a dense dump.
#[derive(Debug)]
pub struct GridPosition<'a, K, P> {
    pub time: NaiveTime,
    pub track: &'a K,
    /// `None` for an empty slot.
    pub cell: Option<CellView<'a, K, P>>,
}

/// All slots of one track.
#[derive(Debug)]
pub struct RowProjection<'a, K, P> {
    pub track: &'a K,
    pub cells: Vec<GridPosition<'a, K, P>>,
}

/// All tracks at one slot.
#[derive(Debug)]
pub struct TimeProjection<'a, K, P> {
    pub time: NaiveTime,
    pub cells: Vec<GridPosition<'a, K, P>>,
}

impl<K, P> TimeTable<K, P>
where
    K: Clone + Eq + Hash + Debug,
    P: Clone + Debug,
{
    /// Occupant of one key, if any.
    pub fn get(&self, time: NaiveTime, track: &K) -> Option<CellView<'_, K, P>> {
        self.store
            .get(minute_of_day(time), track)
            .map(|cell| self.view(cell))
    }

    /// Occupied cells of `track` between `start` and `end`.
    ///
    /// Bounds default to the grid's own range. A `start` off the slot grid
    /// (or before the grid start) begins at the next slot boundary.
    pub fn iter_on_row<'a>(
        &'a self,
        track: &'a K,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> RowIter<'a, K, P> {
        self.row_from(
            track,
            start.map_or(self.start, |time| self.next_slot_minute(time)),
            end.map_or(self.end, ceil_minute),
        )
    }

    /// First item on `track` that starts at or after `start`.
    ///
    /// Extensions of items that started before `start` are skipped. A
    /// `start` between slot boundaries behaves like the next boundary.
    pub fn find_first_event(&self, start: NaiveTime, track: &K) -> Option<&Anchor<K, P>> {
        self.first_anchor_from(self.next_slot_minute(start), track)
    }

    /// Cells present at `time`, in track order.
    ///
    /// Secondary cells are left out unless `include_secondary` is set.
    pub fn events_at_time(
        &self,
        time: NaiveTime,
        include_secondary: bool,
    ) -> Vec<CellView<'_, K, P>> {
        let minute = minute_of_day(time);
        self.tracks
            .iter()
            .filter_map(|track| self.store.get(minute, track))
            .filter(|cell| include_secondary || matches!(cell, Cell::Anchor(_)))
            .map(|cell| self.view(cell))
            .collect()
    }

    /// Anchor keys whose span starts or ends exactly at `time`.
    ///
    /// Ordered by time, then by track order.
    pub fn changes_at_time(&self, time: NaiveTime) -> Vec<(NaiveTime, K)> {
        let minute = minute_of_day(time);
        let mut keys: Vec<(u32, usize, K)> = self
            .store
            .iter()
            .filter_map(|((key_minute, track), cell)| match cell {
                Cell::Anchor(id) => {
                    let span_end = key_minute + self.anchors[id.0].columns * self.slot;
                    (*key_minute == minute || span_end == minute).then(|| {
                        (*key_minute, self.track_index(track), track.clone())
                    })
                }
                Cell::Secondary(_) => None,
            })
            .collect();
        keys.sort_by_key(|(key_minute, index, _)| (*key_minute, *index));
        keys.into_iter()
            .map(|(key_minute, _, track)| (clock(key_minute), track))
            .collect()
    }

    /// Slot start times of the grid.
    pub fn columns(&self) -> impl Iterator<Item = NaiveTime> {
        self.slot_minutes_iter().map(clock)
    }

    /// Dense dump grouped by track, then time.
    pub fn by_rows(&self) -> Vec<RowProjection<'_, K, P>> {
        self.tracks
            .iter()
            .map(|track| RowProjection {
                track,
                cells: self
                    .slot_minutes_iter()
                    .map(|minute| self.position(minute, track))
                    .collect(),
            })
            .collect()
    }

    /// Dense dump grouped by time, then track.
    pub fn by_times(&self) -> Vec<TimeProjection<'_, K, P>> {
        self.slot_minutes_iter()
            .map(|minute| TimeProjection {
                time: clock(minute),
                cells: self
                    .tracks
                    .iter()
                    .map(|track| self.position(minute, track))
                    .collect(),
            })
            .collect()
    }

    pub(crate) fn row_from<'a>(&'a self, track: &'a K, start: u32, end: u32) -> RowIter<'a, K, P> {
        RowIter {
            table: self,
            track,
            cursor: start,
            end,
        }
    }

    pub(crate) fn first_anchor_from(&self, minute: u32, track: &K) -> Option<&Anchor<K, P>> {
        let mut cursor = minute;
        while cursor < self.end {
            if let Some(cell) = self.store.get(cursor, track) {
                let anchor = &self.anchors[cell.anchor_id().0];
                if minute_of_day(anchor.time) >= minute {
                    return Some(anchor);
                }
            }
            cursor += self.slot;
        }
        None
    }

    pub(crate) fn view<'a>(&'a self, cell: &'a Cell<K>) -> CellView<'a, K, P> {
        match cell {
            Cell::Anchor(id) => CellView::Anchor(&self.anchors[id.0]),
            Cell::Secondary(secondary) => CellView::Secondary {
                cell: secondary,
                anchor: &self.anchors[secondary.anchor.0],
            },
        }
    }

    /// First slot boundary at or after `time`, never before the grid start.
    fn next_slot_minute(&self, time: NaiveTime) -> u32 {
        let minute = ceil_minute(time);
        if minute <= self.start {
            return self.start;
        }
        self.start + (minute - self.start).div_ceil(self.slot) * self.slot
    }

    fn slot_minutes_iter(&self) -> impl Iterator<Item = u32> {
        (self.start..self.end).step_by(self.slot as usize)
    }

    fn position<'a>(&'a self, minute: u32, track: &'a K) -> GridPosition<'a, K, P> {
        GridPosition {
            time: clock(minute),
            track,
            cell: self.store.get(minute, track).map(|cell| self.view(cell)),
        }
    }
}

/// Minute-of-day rounded up when `time` carries seconds.
fn ceil_minute(time: NaiveTime) -> u32 {
    let minute = minute_of_day(time);
    if time.second() != 0 || time.nanosecond() != 0 {
        minute + 1
    } else {
        minute
    }
}
