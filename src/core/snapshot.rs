//! Deterministic snapshot generation
//!
//! Snapshots capture the observable state of a screen in a serializable
//! form. Given the same byte stream, a screen always produces an identical
//! snapshot, which makes them convenient for golden comparisons and for the
//! headless runner's JSON output.

use serde::{Deserialize, Serialize};

use super::cell::{Attrs, Cell};
use super::screen::Screen;

/// A complete snapshot of the screen state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    /// Visible grid content (row-major)
    pub grid: Vec<Vec<CellSnapshot>>,
    pub cursor: CursorSnapshot,
    /// Attributes that will apply to the next printed character
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    /// Scroll region, inclusive
    pub scroll_top: usize,
    pub scroll_bottom: usize,
    pub scrollback_lines: usize,
}

/// Snapshot of a single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub c: char,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub row: usize,
    pub col: usize,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        CellSnapshot {
            c: cell.display_char(),
            attrs: cell.attrs,
        }
    }
}

impl Snapshot {
    /// Create a snapshot from the current screen state
    pub fn from_screen(screen: &Screen) -> Self {
        let grid = screen
            .grid()
            .iter()
            .map(|row| row.cells.iter().map(CellSnapshot::from).collect())
            .collect();
        let (row, col) = screen.cursor_position();
        let (scroll_top, scroll_bottom) = screen.scroll_region();

        Snapshot {
            rows: screen.rows(),
            cols: screen.cols(),
            grid,
            cursor: CursorSnapshot { row, col },
            attrs: screen.attrs(),
            scroll_top,
            scroll_bottom,
            scrollback_lines: screen.scrollback().len(),
        }
    }

    /// Convert snapshot to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain text of the grid, trailing blanks and blank rows trimmed
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = self
            .grid
            .iter()
            .map(|row| {
                let line: String = row.iter().map(|cell| cell.c).collect();
                line.trim_end().to_string()
            })
            .collect();

        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Compare grid contents only, ignoring cursor and history
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.grid == other.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_screen() {
        let mut screen = Screen::new(3, 10, None);
        screen.print('H');
        screen.print('i');

        let snapshot = Snapshot::from_screen(&screen);

        assert_eq!(snapshot.rows, 3);
        assert_eq!(snapshot.cols, 10);
        assert_eq!(snapshot.grid[0][0].c, 'H');
        assert_eq!(snapshot.grid[0][1].c, 'i');
        assert_eq!(snapshot.grid[0][2].c, ' ');
        assert_eq!(snapshot.cursor, CursorSnapshot { row: 0, col: 2 });
    }

    #[test]
    fn test_snapshot_to_text() {
        let mut screen = Screen::new(3, 10, None);
        screen.print('A');
        screen.print('B');
        screen.linefeed();
        screen.carriage_return();
        screen.print('C');

        let snapshot = Snapshot::from_screen(&screen);
        assert_eq!(snapshot.to_text(), "AB\nC\n");
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut screen = Screen::new(2, 5, None);
        screen.print('X');
        screen.add_attrs(Attrs::BOLD | Attrs::REVERSE);
        screen.print('Y');

        let snapshot = Snapshot::from_screen(&screen);
        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();

        assert_eq!(snapshot, restored);
        assert_eq!(restored.grid[0][1].attrs, Attrs::BOLD | Attrs::REVERSE);
    }

    #[test]
    fn test_content_equals_ignores_cursor() {
        let mut a = Screen::new(2, 4, None);
        let mut b = Screen::new(2, 4, None);
        a.print('z');
        b.print('z');
        b.move_cursor_to(1, 3);

        let (sa, sb) = (Snapshot::from_screen(&a), Snapshot::from_screen(&b));
        assert!(sa.content_equals(&sb));
        assert_ne!(sa, sb);
    }
}
