//! Sparse cell storage keyed by `(minute-of-day, track)`.
//!
//! # Invariants
//! - At most one cell per key.
//! - Every call touches only the key it names.
//! - No ordering guarantee; callers impose order through the time axis.

use crate::timetable::cell::Cell;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub(crate) struct GridStore<K> {
    cells: HashMap<(u32, K), Cell<K>>,
}

impl<K: Clone + Eq + Hash> GridStore<K> {
    pub(crate) fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, minute: u32, track: &K) -> Option<&Cell<K>> {
        self.cells.get(&(minute, track.clone()))
    }

    /// Writes `cell`, returning the previous occupant.
    pub(crate) fn set(&mut self, minute: u32, track: K, cell: Cell<K>) -> Option<Cell<K>> {
        self.cells.insert((minute, track), cell)
    }

    pub(crate) fn delete(&mut self, minute: u32, track: &K) -> Option<Cell<K>> {
        self.cells.remove(&(minute, track.clone()))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &(u32, K)> {
        self.cells.keys()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&(u32, K), &Cell<K>)> {
        self.cells.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }
}
