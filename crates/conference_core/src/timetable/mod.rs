//! Timetable grid engine.
//!
//! # Responsibility
//! - Lay items of discrete duration onto a `(time slot x track)` grid.
//! - Resolve placement conflicts, including flexible items whose duration
//!   stretches to the next event.
//! - Expose read-only projections (per track, per time, dense dumps, slices).
//!
//! # Invariants
//! - At most one cell occupies a `(slot, track)` key.
//! - Every secondary cell refers to an anchor that lives in the arena.
//! - An anchor's `columns` equals the number of slots its item occupies on
//!   each of its tracks.
//! - No cell is written at or after the grid end.
//! - Precondition failures return `TimeTableError` and never reach the
//!   diagnostic log; overlaps are recorded in the log and never raised.

mod cell;
mod diagnostic;
mod placer;
mod projector;
mod store;

pub use cell::{Anchor, AnchorId, Cell, CellView, Secondary};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use projector::{GridPosition, RowIter, RowProjection, TimeProjection};

use chrono::{NaiveTime, Timelike};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use store::GridStore;

/// Slot length used when none is configured.
pub const DEFAULT_SLOT_MINUTES: u32 = 15;

pub type TimeTableResult<T> = Result<T, TimeTableError>;

/// Precondition violations for table construction and placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeTableError {
    /// `start` is not strictly before `end`.
    InvalidRange { start: NaiveTime, end: NaiveTime },
    /// Configured track set is empty.
    NoTracks,
    /// Slot length of zero minutes.
    ZeroSlotLength,
    /// Track not part of the configured set.
    UnknownTrack(String),
    /// Track listed twice.
    DuplicateTrack(String),
    /// `set_event` called without tracks.
    EmptyEventTracks,
    /// Time outside `[start, end)`.
    OutOfRange(NaiveTime),
    /// Time not on a slot boundary.
    Misaligned(NaiveTime),
}

impl Display for TimeTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "time range start {start} must be before end {end}")
            }
            Self::NoTracks => write!(f, "timetable needs at least one track"),
            Self::ZeroSlotLength => write!(f, "slot length must be at least one minute"),
            Self::UnknownTrack(track) => write!(f, "unknown track: {track}"),
            Self::DuplicateTrack(track) => write!(f, "track listed twice: {track}"),
            Self::EmptyEventTracks => write!(f, "event must occupy at least one track"),
            Self::OutOfRange(time) => write!(f, "time {time} is outside the timetable range"),
            Self::Misaligned(time) => write!(f, "time {time} is not aligned to a slot"),
        }
    }
}

impl Error for TimeTableError {}

/// In-memory scheduling grid built fresh for one report.
///
/// `K` identifies a track (room, channel...), `P` is the caller payload
/// attached to every placed item.
#[derive(Debug, Clone)]
pub struct TimeTable<K, P> {
    start: u32,
    end: u32,
    slot: u32,
    tracks: Vec<K>,
    anchors: Vec<Anchor<K, P>>,
    store: GridStore<K>,
    errors: Vec<Diagnostic<P>>,
}

impl<K, P> TimeTable<K, P>
where
    K: Clone + Eq + Hash + Debug,
    P: Clone + Debug,
{
    /// Creates an empty grid over `[start, end)` with 15 minute slots.
    pub fn new(range: (NaiveTime, NaiveTime), tracks: Vec<K>) -> TimeTableResult<Self> {
        Self::with_slot_length(range, tracks, DEFAULT_SLOT_MINUTES)
    }

    /// Creates an empty grid over `[start, end)` with custom slot length.
    ///
    /// # Errors
    /// - `InvalidRange` when `start >= end`.
    /// - `NoTracks` / `DuplicateTrack` when `tracks` is not a non-empty set.
    /// - `ZeroSlotLength` when `slot_minutes == 0`.
    /// - `Misaligned` when a bound carries sub-minute precision.
    pub fn with_slot_length(
        range: (NaiveTime, NaiveTime),
        tracks: Vec<K>,
        slot_minutes: u32,
    ) -> TimeTableResult<Self> {
        let (start, end) = range;
        if start >= end {
            return Err(TimeTableError::InvalidRange { start, end });
        }
        if tracks.is_empty() {
            return Err(TimeTableError::NoTracks);
        }
        if slot_minutes == 0 {
            return Err(TimeTableError::ZeroSlotLength);
        }
        let mut seen = HashSet::new();
        for track in &tracks {
            if !seen.insert(track) {
                return Err(TimeTableError::DuplicateTrack(format!("{track:?}")));
            }
        }

        Ok(Self {
            start: whole_minute(start)?,
            end: whole_minute(end)?,
            slot: slot_minutes,
            tracks,
            anchors: Vec::new(),
            store: GridStore::new(),
            errors: Vec::new(),
        })
    }

    pub fn start(&self) -> NaiveTime {
        clock(self.start)
    }

    pub fn end(&self) -> NaiveTime {
        clock(self.end)
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot
    }

    /// Configured tracks in grid order.
    pub fn tracks(&self) -> &[K] {
        &self.tracks
    }

    /// Accumulated overlap diagnostics, in detection order.
    pub fn errors(&self) -> &[Diagnostic<P>] {
        &self.errors
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor<K, P>> {
        self.anchors.get(id.0)
    }

    /// Number of occupied `(slot, track)` keys.
    pub fn occupied_cells(&self) -> usize {
        self.store.len()
    }

    /// Copies the grid restricted to `[start, end)`.
    ///
    /// Missing bounds default to this grid's bounds and inverted bounds are
    /// swapped. The copy keeps tracks, slot length and the error log, and is
    /// independent from `self` afterwards.
    ///
    /// # Errors
    /// - `InvalidRange` when both bounds are equal.
    /// - `Misaligned` when a bound is off this grid's slot boundaries.
    pub fn slice(&self, start: Option<NaiveTime>, end: Option<NaiveTime>) -> TimeTableResult<Self> {
        let mut start = start.unwrap_or_else(|| self.start());
        let mut end = end.unwrap_or_else(|| self.end());
        if end < start {
            std::mem::swap(&mut start, &mut end);
        }
        let mut sliced = Self::with_slot_length((start, end), self.tracks.clone(), self.slot)?;
        for bound in [start, end] {
            let minute = whole_minute(bound)?;
            if minute.abs_diff(self.start) % self.slot != 0 {
                return Err(TimeTableError::Misaligned(bound));
            }
        }

        sliced.anchors = self.anchors.clone();
        sliced.errors = self.errors.clone();
        sliced.store = self.store.clone();
        let outside: Vec<(u32, K)> = sliced
            .store
            .keys()
            .filter(|(minute, _)| *minute < sliced.start || *minute >= sliced.end)
            .cloned()
            .collect();
        for (minute, track) in &outside {
            sliced.store.delete(*minute, track);
        }
        Ok(sliced)
    }

    /// Converts a placement time into a validated slot minute.
    fn aligned_minute(&self, time: NaiveTime) -> TimeTableResult<u32> {
        let minute = whole_minute(time)?;
        if minute < self.start || minute >= self.end {
            return Err(TimeTableError::OutOfRange(time));
        }
        if (minute - self.start) % self.slot != 0 {
            return Err(TimeTableError::Misaligned(time));
        }
        Ok(minute)
    }

    fn check_event_tracks(&self, tracks: &[K]) -> TimeTableResult<()> {
        if tracks.is_empty() {
            return Err(TimeTableError::EmptyEventTracks);
        }
        for (index, track) in tracks.iter().enumerate() {
            if !self.tracks.contains(track) {
                return Err(TimeTableError::UnknownTrack(format!("{track:?}")));
            }
            if tracks[..index].contains(track) {
                return Err(TimeTableError::DuplicateTrack(format!("{track:?}")));
            }
        }
        Ok(())
    }

    fn track_index(&self, track: &K) -> usize {
        self.tracks
            .iter()
            .position(|candidate| candidate == track)
            .unwrap_or(self.tracks.len())
    }
}

pub(crate) fn minute_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn whole_minute(time: NaiveTime) -> TimeTableResult<u32> {
    if time.second() != 0 || time.nanosecond() != 0 {
        return Err(TimeTableError::Misaligned(time));
    }
    Ok(minute_of_day(time))
}

/// Minute-of-day back to a clock time. Grid minutes are always below 24h.
pub(crate) fn clock(minute: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0).unwrap_or(NaiveTime::MIN)
}
