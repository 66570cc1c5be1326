//! Tab stops
//!
//! An ordered set of column indices. New screens get a stop every 8 columns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default spacing between tab stops
pub const DEFAULT_TAB_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabStops {
    stops: BTreeSet<usize>,
    cols: usize,
}

impl TabStops {
    /// Tab stops at every 8th column below `cols`
    pub fn new(cols: usize) -> Self {
        Self {
            stops: (DEFAULT_TAB_WIDTH..cols).step_by(DEFAULT_TAB_WIDTH).collect(),
            cols,
        }
    }

    pub fn set(&mut self, col: usize) {
        if col < self.cols {
            self.stops.insert(col);
        }
    }

    pub fn clear(&mut self, col: usize) {
        self.stops.remove(&col);
    }

    pub fn clear_all(&mut self) {
        self.stops.clear();
    }

    pub fn contains(&self, col: usize) -> bool {
        self.stops.contains(&col)
    }

    /// First stop strictly right of `col`
    pub fn next_after(&self, col: usize) -> Option<usize> {
        self.stops
            .range(col.saturating_add(1)..)
            .next()
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.stops.iter().copied()
    }
}
