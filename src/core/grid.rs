//! Terminal Grid
//!
//! A fixed-size 2D grid of cells representing the visible terminal area.
//! Every coordinate access is clamped into the grid, so callers never see
//! an out-of-bounds panic.

use serde::{Deserialize, Serialize};

use super::cell::Cell;

/// A row of cells in the terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// The cells in this row
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cols: usize) -> Self {
        Self {
            cells: vec![Cell::default(); cols],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.erase();
        }
    }

    /// Erase cells from start to end (inclusive)
    pub fn erase_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.cells.len().saturating_sub(1));
        for cell in self.cells.iter_mut().take(end + 1).skip(start) {
            cell.erase();
        }
    }

    /// Full row contents, blank cells rendered as spaces
    pub fn text(&self) -> String {
        self.cells.iter().map(Cell::display_char).collect()
    }

    /// Row contents with trailing blanks removed
    pub fn trimmed_text(&self) -> String {
        self.text().trim_end().to_string()
    }

    /// Get the length of content (excluding trailing blank cells)
    pub fn content_len(&self) -> usize {
        self.cells
            .iter()
            .rposition(|c| !c.is_blank())
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

/// The terminal grid - a 2D array of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// The rows in the grid
    rows: Vec<Row>,
    /// Number of columns
    cols: usize,
}

impl Grid {
    /// Create a blank grid. Both dimensions are forced to at least one.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
            cols,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Clamp a coordinate into the grid
    pub fn clamp(&self, row: usize, col: usize) -> (usize, usize) {
        (row.min(self.rows() - 1), col.min(self.cols - 1))
    }

    /// Get a reference to a cell, clamping the coordinate
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        let (row, col) = self.clamp(row, col);
        &self.rows[row].cells[col]
    }

    /// Get a mutable reference to a cell, clamping the coordinate
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let (row, col) = self.clamp(row, col);
        &mut self.rows[row].cells[col]
    }

    /// Get a reference to a row, clamping the index
    pub fn row(&self, row: usize) -> &Row {
        let (row, _) = self.clamp(row, 0);
        &self.rows[row]
    }

    /// Get a mutable reference to a row, clamping the index
    pub fn row_mut(&mut self, row: usize) -> &mut Row {
        let (row, _) = self.clamp(row, 0);
        &mut self.rows[row]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Blank every cell
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    /// Scroll rows `top..=bottom` up by one. The row that leaves the top is
    /// returned and a blank row enters at the bottom.
    pub fn scroll_up(&mut self, top: usize, bottom: usize) -> Row {
        let (bottom, _) = self.clamp(bottom, 0);
        let top = top.min(bottom);
        let evicted = self.rows.remove(top);
        self.rows.insert(bottom, Row::new(self.cols));
        evicted
    }

    /// Scroll rows `top..=bottom` down by one, inserting `incoming` at the
    /// top. The row pushed off the bottom is discarded.
    pub fn scroll_down(&mut self, top: usize, bottom: usize, incoming: Row) {
        let (bottom, _) = self.clamp(bottom, 0);
        let top = top.min(bottom);
        self.rows.remove(bottom);
        let incoming = self.fit(incoming);
        self.rows.insert(top, incoming);
    }

    /// Make a row match this grid's width
    fn fit(&self, mut row: Row) -> Row {
        row.cells.resize(self.cols, Cell::default());
        row
    }
}
