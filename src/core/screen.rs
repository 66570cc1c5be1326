//! Screen model implementation
//!
//! The screen is the virtual terminal state for one buffer: the visible
//! grid, the cursor and its saved slot, tab stops, the scroll region, the
//! scrollback history and the active attribute set. Dimensions are fixed
//! for the lifetime of a screen.

use serde::{Deserialize, Serialize};

use super::cell::{Attrs, Cell};
use super::cursor::{Cursor, SavedCursor};
use super::grid::{Grid, Row};
use super::scrollback::Scrollback;
use super::tabs::TabStops;

/// Which part of the screen or row an erase covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EraseMode {
    /// Cursor to end (inclusive)
    ToEnd,
    /// Start to cursor (inclusive)
    ToCursor,
    /// Everything
    All,
}

impl EraseMode {
    /// Map a `J`/`K` parameter onto an erase mode
    pub fn from_param(param: u32) -> Option<Self> {
        match param {
            0 => Some(EraseMode::ToEnd),
            1 => Some(EraseMode::ToCursor),
            2 => Some(EraseMode::All),
            _ => None,
        }
    }
}

/// The main screen structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screen {
    grid: Grid,
    cursor: Cursor,
    /// Slot written by `ESC 7`, empty until the first save
    saved_cursor: Option<SavedCursor>,
    tabs: TabStops,
    /// Scroll region top (0-indexed, inclusive)
    scroll_top: usize,
    /// Scroll region bottom (0-indexed, inclusive)
    scroll_bottom: usize,
    scrollback: Scrollback,
    /// Attributes applied to newly written cells
    attrs: Attrs,
}

impl Screen {
    /// Create a blank screen. Zero dimensions are raised to one.
    pub fn new(rows: usize, cols: usize, scrollback_capacity: Option<usize>) -> Self {
        let grid = Grid::new(rows, cols);
        let rows = grid.rows();
        let cols = grid.cols();

        Self {
            grid,
            cursor: Cursor::new(),
            saved_cursor: None,
            tabs: TabStops::new(cols),
            scroll_top: 0,
            scroll_bottom: rows - 1,
            scrollback: Scrollback::new(scrollback_capacity),
            attrs: Attrs::empty(),
        }
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// `(rows, cols)`
    pub fn size(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// `(row, col)` of the cursor
    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor.row, self.cursor.col)
    }

    pub fn saved_cursor(&self) -> Option<SavedCursor> {
        self.saved_cursor
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn tabs(&self) -> &TabStops {
        &self.tabs
    }

    /// Active scroll region as `(top, bottom)`, inclusive
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    /// Attributes that the next printed character will carry
    pub fn attrs(&self) -> Attrs {
        self.attrs
    }

    /// Cell at a position, clamped into the grid
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.grid.cell(row, col)
    }

    /// Full text of a row, blank cells as spaces
    pub fn row_text(&self, row: usize) -> String {
        self.grid.row(row).text()
    }

    /// Up to `len` characters of a row starting at `col`
    pub fn row_substring(&self, row: usize, col: usize, len: usize) -> String {
        self.grid
            .row(row)
            .cells
            .iter()
            .skip(col)
            .take(len)
            .map(Cell::display_char)
            .collect()
    }

    /// Write a character at the cursor and advance. The last column absorbs
    /// further characters without wrapping.
    pub fn print(&mut self, c: char) {
        let Cursor { row, col } = self.cursor;
        self.grid.cell_mut(row, col).write(c, self.attrs);
        self.cursor.move_right(1, self.cols());
    }

    /// Line feed (LF, VT, FF); never returns the carriage
    pub fn linefeed(&mut self) {
        let row = self.cursor.row;
        if row == self.scroll_bottom {
            self.scroll_up();
        } else {
            self.cursor.move_down(1, self.rows() - 1);
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor.carriage_return();
    }

    pub fn backspace(&mut self) {
        self.cursor.move_left(1);
    }

    /// Move to the next tab stop, or the last column when none is left
    pub fn tab(&mut self) {
        let last = self.cols() - 1;
        self.cursor.col = self
            .tabs
            .next_after(self.cursor.col)
            .unwrap_or(last)
            .min(last);
    }

    /// Index (IND)
    pub fn index(&mut self) {
        self.linefeed();
    }

    /// Reverse index (RI) - move cursor up, scroll the region down at the top margin
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_top {
            self.scroll_down();
        } else {
            self.cursor.move_up(1, 0);
        }
    }

    /// Next line (NEL)
    pub fn next_line(&mut self) {
        self.carriage_return();
        self.linefeed();
    }

    /// Scroll the region up by one row. Rows leaving the top of the grid are
    /// kept in scrollback.
    fn scroll_up(&mut self) {
        let evicted = self.grid.scroll_up(self.scroll_top, self.scroll_bottom);
        if self.scroll_top == 0 {
            self.scrollback.push(evicted);
        }
    }

    /// Scroll the region down by one row. A full-height top brings back the
    /// newest scrollback row.
    fn scroll_down(&mut self) {
        let incoming = if self.scroll_top == 0 {
            self.scrollback.pop_newest()
        } else {
            None
        };
        let incoming = incoming.unwrap_or_else(|| Row::new(self.cols()));
        self.grid
            .scroll_down(self.scroll_top, self.scroll_bottom, incoming);
    }

    /// Topmost row a vertical move may reach from the current row
    fn upper_margin(&self) -> usize {
        if self.cursor.row >= self.scroll_top {
            self.scroll_top
        } else {
            0
        }
    }

    /// Bottommost row a vertical move may reach from the current row
    fn lower_margin(&self) -> usize {
        if self.cursor.row <= self.scroll_bottom {
            self.scroll_bottom
        } else {
            self.rows() - 1
        }
    }

    /// Cursor up (CUU)
    pub fn move_cursor_up(&mut self, n: usize) {
        let margin = self.upper_margin();
        self.cursor.move_up(n, margin);
    }

    /// Cursor down (CUD)
    pub fn move_cursor_down(&mut self, n: usize) {
        let margin = self.lower_margin();
        self.cursor.move_down(n, margin);
    }

    /// Cursor forward (CUF)
    pub fn move_cursor_forward(&mut self, n: usize) {
        self.cursor.move_right(n, self.cols());
    }

    /// Cursor backward (CUB)
    pub fn move_cursor_backward(&mut self, n: usize) {
        self.cursor.move_left(n);
    }

    /// Absolute move, 0-indexed, clamped into the grid
    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        let (rows, cols) = self.size();
        self.cursor.move_to(row, col, rows, cols);
    }

    /// Erase in display (ED). The cursor does not move.
    pub fn erase_in_display(&mut self, mode: EraseMode) {
        let Cursor { row, col } = self.cursor;
        let last_col = self.cols() - 1;
        match mode {
            EraseMode::ToEnd => {
                self.grid.row_mut(row).erase_range(col, last_col);
                for r in (row + 1)..self.rows() {
                    self.grid.row_mut(r).clear();
                }
            }
            EraseMode::ToCursor => {
                for r in 0..row {
                    self.grid.row_mut(r).clear();
                }
                self.grid.row_mut(row).erase_range(0, col);
            }
            EraseMode::All => self.grid.clear(),
        }
    }

    /// Erase in line (EL). The cursor does not move.
    pub fn erase_in_line(&mut self, mode: EraseMode) {
        let Cursor { row, col } = self.cursor;
        let last_col = self.cols() - 1;
        let line = self.grid.row_mut(row);
        match mode {
            EraseMode::ToEnd => line.erase_range(col, last_col),
            EraseMode::ToCursor => line.erase_range(0, col),
            EraseMode::All => line.clear(),
        }
    }

    /// Set the scroll region from 0-indexed inclusive bounds. An empty or
    /// inverted region falls back to the whole screen. The cursor homes.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let last = self.rows() - 1;
        let bottom = bottom.min(last);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = last;
        }
        self.cursor.home();
    }

    /// Set a tab stop at the cursor column (HTS)
    pub fn set_tab_stop(&mut self) {
        self.tabs.set(self.cursor.col);
    }

    /// Clear the tab stop at the cursor column (TBC 0)
    pub fn clear_tab_stop(&mut self) {
        self.tabs.clear(self.cursor.col);
    }

    /// Clear every tab stop (TBC 3)
    pub fn clear_all_tab_stops(&mut self) {
        self.tabs.clear_all();
    }

    /// Save the cursor position (DECSC)
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor.save());
    }

    /// Restore the cursor position (DECRC). Nothing happens before the first save.
    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor {
            let (rows, cols) = self.size();
            self.cursor.restore(&saved, rows, cols);
        }
    }

    /// Add attributes to the active set
    pub fn add_attrs(&mut self, attrs: Attrs) {
        self.attrs.insert(attrs);
    }

    /// Clear the active attribute set
    pub fn reset_attrs(&mut self) {
        self.attrs = Attrs::empty();
    }

    /// Soft reset (`ESC c`): home the cursor and drop the active attributes.
    /// Content, tab stops, scroll region and scrollback stay.
    pub fn soft_reset(&mut self) {
        self.cursor.home();
        self.reset_attrs();
    }
}
