//! Scrollback buffer implementation
//!
//! The scrollback buffer stores rows that have scrolled off the top of the
//! visible screen. Reverse scrolling pops them back in newest-first order.
//!
//! Capacity is optional: `None` keeps every row, `Some(n)` drops the oldest
//! row once more than `n` are held, and `Some(0)` disables history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::grid::Row;

/// Ring buffer for scrollback rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scrollback {
    /// Oldest row at the front, newest at the back
    rows: VecDeque<Row>,
    /// Maximum number of rows to store
    capacity: Option<usize>,
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Scrollback {
    /// Create a new scrollback buffer with the given capacity
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            rows: VecDeque::new(),
            capacity,
        }
    }

    /// Get the number of rows in the scrollback
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the scrollback is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the maximum capacity
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Push a row into the scrollback buffer, evicting the oldest if full
    pub fn push(&mut self, row: Row) {
        match self.capacity {
            Some(0) => return,
            Some(cap) if self.rows.len() >= cap => {
                self.rows.pop_front();
            }
            _ => {}
        }
        self.rows.push_back(row);
    }

    /// Remove and return the most recently pushed row
    pub fn pop_newest(&mut self) -> Option<Row> {
        self.rows.pop_back()
    }

    /// Get a row by index (0 = oldest row in scrollback)
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Get a row by index from the end (0 = most recent row)
    pub fn get_from_end(&self, index: usize) -> Option<&Row> {
        let len = self.rows.len();
        if index >= len {
            return None;
        }
        self.rows.get(len - 1 - index)
    }

    /// Clear all rows from the scrollback
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Iterate over all rows from oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Row> + DoubleEndedIterator {
        self.rows.iter()
    }
}
