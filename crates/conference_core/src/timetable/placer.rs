//! Item placement and conflict resolution.
//!
//! # Responsibility
//! - Resolve an item's span (fixed or flexible) and write its cells.
//! - Decide per cell what happens when the target key is occupied.
//!
//! # Invariants
//! - Placement is validate-then-commit: an item colliding with any existing
//!   anchor is dropped whole with one `overlap-event` and writes nothing.
//! - Overwriting a secondary cell trims the owning item so that its span ends
//!   where the new cell starts, except for a flexible item's trailing cell
//!   landing on a fixed item's extension: the flexible item yields and ends
//!   before that column.
//! - A yielding column is detected before any of its cells are written, so
//!   yielding never trims other items.
//! - Trimming removes only secondary cells; anchors stay in place.

use crate::timetable::cell::{Anchor, AnchorId, Cell, Secondary};
use crate::timetable::diagnostic::{Diagnostic, DiagnosticKind};
use crate::timetable::{clock, minute_of_day, TimeTable, TimeTableResult};
use chrono::NaiveTime;
use log::{debug, warn};
use std::fmt::Debug;
use std::hash::Hash;

impl<K, P> TimeTable<K, P>
where
    K: Clone + Eq + Hash + Debug,
    P: Clone + Debug,
{
    /// Places one item starting at `time` on `tracks`.
    ///
    /// `duration` is given in minutes; `None` or `Some(0)` makes the item
    /// flexible: it stretches from `time` to the next event on `tracks[0]`,
    /// or to the grid end. Spans are truncated to whole slots and clipped at
    /// the grid end.
    ///
    /// Returns `Ok(Some(id))` when the item was placed and `Ok(None)` when it
    /// collided with an existing anchor (see `errors()`).
    ///
    /// # Errors
    /// - `EmptyEventTracks`, `UnknownTrack`, `DuplicateTrack` for bad tracks.
    /// - `OutOfRange`, `Misaligned` for a bad start time.
    pub fn set_event(
        &mut self,
        time: NaiveTime,
        payload: P,
        duration: Option<u32>,
        tracks: &[K],
    ) -> TimeTableResult<Option<AnchorId>> {
        self.check_event_tracks(tracks)?;
        let at = self.aligned_minute(time)?;
        let Some(first) = tracks.first() else {
            return Ok(None);
        };

        let flex = matches!(duration, None | Some(0));
        let minutes = match duration {
            Some(minutes) if minutes > 0 => minutes,
            _ => match self.first_anchor_from(at + self.slot, first) {
                Some(next) => minute_of_day(next.time) - at,
                None => self.end - at,
            },
        };

        let mut columns = minutes / self.slot;
        let available = (self.end - at).div_ceil(self.slot);
        if columns > available {
            debug!(
                "event=timetable_clip module=timetable status=ok time={} requested_columns={} columns={}",
                time, columns, available
            );
            columns = available;
        }

        if let Some((minute, previous)) = self.first_anchor_conflict(at, columns, tracks) {
            let previous = self.anchors[previous.0].payload.clone();
            self.record(DiagnosticKind::OverlapEvent, minute, payload, previous);
            return Ok(None);
        }

        let id = AnchorId(self.anchors.len());
        self.anchors.push(Anchor {
            time,
            track: first.clone(),
            payload,
            columns,
            rows: tracks.len(),
            flex,
        });

        for column in 0..columns.max(1) {
            let minute = at + column * self.slot;
            if flex && column > 0 && self.meets_fixed_extension(minute, tracks) {
                self.trim(id, minute);
                break;
            }
            for (row, track) in tracks.iter().enumerate() {
                let cell = if column == 0 && row == 0 {
                    Cell::Anchor(id)
                } else {
                    Cell::Secondary(Secondary {
                        time: clock(minute),
                        track: track.clone(),
                        anchor: id,
                        flex,
                    })
                };
                self.place(minute, track, cell, id);
            }
        }

        debug!(
            "event=timetable_place module=timetable status=ok time={} columns={} rows={} flex={}",
            time,
            self.anchors[id.0].columns,
            tracks.len(),
            flex
        );
        Ok(Some(id))
    }

    /// Writes one cell of item `incoming`, resolving the current occupant.
    ///
    /// Callers have already ruled out the yielding case, so an occupied
    /// secondary is always trimmed here.
    fn place(&mut self, minute: u32, track: &K, cell: Cell<K>, incoming: AnchorId) {
        let flex = self.anchors[incoming.0].flex;
        match self.store.get(minute, track).cloned() {
            None => {}
            Some(Cell::Anchor(previous)) => {
                self.record_between(DiagnosticKind::OverlapEvent, minute, incoming, previous);
                return;
            }
            Some(Cell::Secondary(occupant)) => {
                if !occupant.flex && !flex {
                    self.record_between(
                        DiagnosticKind::OverlapReference,
                        minute,
                        incoming,
                        occupant.anchor,
                    );
                }
                self.trim(occupant.anchor, minute);
            }
        }
        self.store.set(minute, track.clone(), cell);
    }

    /// Whether any of `tracks` holds a fixed item's extension at `minute`.
    fn meets_fixed_extension(&self, minute: u32, tracks: &[K]) -> bool {
        tracks.iter().any(|track| {
            matches!(
                self.store.get(minute, track),
                Some(Cell::Secondary(occupant)) if !occupant.flex
            )
        })
    }

    /// Shortens item `id` so that it ends right before `minute`.
    ///
    /// Walks forward from `minute` on every track, dropping consecutive
    /// secondary cells of `id` and stopping at the first foreign cell.
    fn trim(&mut self, id: AnchorId, minute: u32) {
        let anchor_start = minute_of_day(self.anchors[id.0].time);
        let columns = minute.saturating_sub(anchor_start) / self.slot;

        for track in &self.tracks {
            let mut cursor = minute;
            while cursor < self.end {
                let owned = self
                    .store
                    .get(cursor, track)
                    .map(|cell| matches!(cell, Cell::Secondary(secondary) if secondary.anchor == id));
                match owned {
                    None => {}
                    Some(true) => {
                        self.store.delete(cursor, track);
                    }
                    Some(false) => break,
                }
                cursor += self.slot;
            }
        }

        let anchor = &mut self.anchors[id.0];
        debug!(
            "event=timetable_trim module=timetable status=ok anchor_time={} columns_before={} columns_after={}",
            anchor.time, anchor.columns, columns
        );
        anchor.columns = columns;
    }

    /// First key of the item's footprint already holding an anchor.
    fn first_anchor_conflict(
        &self,
        at: u32,
        columns: u32,
        tracks: &[K],
    ) -> Option<(u32, AnchorId)> {
        for column in 0..columns.max(1) {
            let minute = at + column * self.slot;
            for track in tracks {
                if let Some(Cell::Anchor(id)) = self.store.get(minute, track) {
                    return Some((minute, *id));
                }
            }
        }
        None
    }

    fn record_between(
        &mut self,
        kind: DiagnosticKind,
        minute: u32,
        incoming: AnchorId,
        previous: AnchorId,
    ) {
        let item = self.anchors[incoming.0].payload.clone();
        let previous = self.anchors[previous.0].payload.clone();
        self.record(kind, minute, item, previous);
    }

    fn record(&mut self, kind: DiagnosticKind, minute: u32, item: P, previous: P) {
        let time = clock(minute);
        warn!(
            "event=timetable_conflict module=timetable status=warn kind={} time={}",
            kind.as_str(),
            time
        );
        self.errors.push(Diagnostic {
            kind,
            time,
            message: format!("Event {item:?} overlap {previous:?} on time {time}"),
            item,
            previous,
        });
    }
}
