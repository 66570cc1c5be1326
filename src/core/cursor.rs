//! Cursor state management
//!
//! The cursor tracks the write position. A single saved slot backs
//! DECSC/DECRC (`ESC 7` / `ESC 8`).

use serde::{Deserialize, Serialize};

/// Cursor position (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Row position
    pub row: usize,
    /// Column position
    pub col: usize,
}

/// Position stored by `ESC 7`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    /// Create a new cursor at the home position
    pub fn new() -> Self {
        Self::default()
    }

    /// Move cursor to absolute position, clamping to bounds
    pub fn move_to(&mut self, row: usize, col: usize, rows: usize, cols: usize) {
        self.row = row.min(rows.saturating_sub(1));
        self.col = col.min(cols.saturating_sub(1));
    }

    /// Move cursor to (0, 0)
    pub fn home(&mut self) {
        self.row = 0;
        self.col = 0;
    }

    /// Move cursor up by n rows, stopping at `min_row`
    pub fn move_up(&mut self, n: usize, min_row: usize) {
        self.row = self.row.saturating_sub(n).max(min_row);
    }

    /// Move cursor down by n rows, stopping at `max_row`
    pub fn move_down(&mut self, n: usize, max_row: usize) {
        self.row = self.row.saturating_add(n).min(max_row);
    }

    /// Move cursor left by n columns, stopping at column 0
    pub fn move_left(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
    }

    /// Move cursor right by n columns, stopping at the last column
    pub fn move_right(&mut self, n: usize, cols: usize) {
        self.col = self.col.saturating_add(n).min(cols.saturating_sub(1));
    }

    /// Carriage return - move to column 0
    pub fn carriage_return(&mut self) {
        self.col = 0;
    }

    /// Save cursor position
    pub fn save(&self) -> SavedCursor {
        SavedCursor {
            row: self.row,
            col: self.col,
        }
    }

    /// Restore cursor position, clamping to bounds
    pub fn restore(&mut self, saved: &SavedCursor, rows: usize, cols: usize) {
        self.move_to(saved.row, saved.col, rows, cols);
    }
}
