//! Terminal Core Module
//!
//! Platform-independent screen state. This module contains:
//! - Cell representation with attributes
//! - The fixed-size grid and its rows
//! - Cursor state and the saved-cursor slot
//! - Tab stops and the scrollback history
//! - The screen that owns all of the above
//! - Deterministic snapshot generation
//!
//! The core is completely deterministic: given the same sequence of
//! mutations, it always produces the same state.

mod cell;
mod cursor;
mod grid;
mod screen;
mod scrollback;
mod snapshot;
mod tabs;

pub use cell::{Attrs, Cell};
pub use cursor::{Cursor, SavedCursor};
pub use grid::{Grid, Row};
pub use screen::{EraseMode, Screen};
pub use scrollback::Scrollback;
pub use snapshot::{CellSnapshot, CursorSnapshot, Snapshot};
pub use tabs::{TabStops, DEFAULT_TAB_WIDTH};
