//! Terminal Cell
//!
//! Represents a single cell in the terminal grid: one character and the
//! attribute set that was active when it was written.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Rendition attributes selected with SGR.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Attrs: u8 {
        const BOLD       = 0b0000_0001;
        const UNDERSCORE = 0b0000_0010;
        const BLINK      = 0b0000_0100;
        const REVERSE    = 0b0000_1000;
    }
}

impl Attrs {
    /// Map an SGR parameter onto the attribute it turns on
    pub fn from_sgr(code: u32) -> Option<Self> {
        match code {
            1 => Some(Attrs::BOLD),
            4 => Some(Attrs::UNDERSCORE),
            5 => Some(Attrs::BLINK),
            7 => Some(Attrs::REVERSE),
            _ => None,
        }
    }

    /// SGR parameters that reproduce this attribute set, in ascending order
    pub fn sgr_codes(self) -> Vec<u8> {
        let mut codes = Vec::with_capacity(4);
        if self.contains(Attrs::BOLD) {
            codes.push(1);
        }
        if self.contains(Attrs::UNDERSCORE) {
            codes.push(4);
        }
        if self.contains(Attrs::BLINK) {
            codes.push(5);
        }
        if self.contains(Attrs::REVERSE) {
            codes.push(7);
        }
        codes
    }
}

/// A single cell in the terminal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The character in this cell, `' '` when blank
    pub c: char,
    /// Whether anything has been written here since the last erase
    pub set: bool,
    /// Rendition attributes
    pub attrs: Attrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            set: false,
            attrs: Attrs::empty(),
        }
    }
}

impl Cell {
    /// Create a new cell holding `c` with no attributes
    pub fn new(c: char) -> Self {
        Self::with_attrs(c, Attrs::empty())
    }

    /// Create a new cell holding `c` with the given attributes
    pub fn with_attrs(c: char, attrs: Attrs) -> Self {
        Self { c, set: true, attrs }
    }

    /// Check if this cell is blank (never written or erased)
    pub fn is_blank(&self) -> bool {
        !self.set
    }

    /// Overwrite the cell contents
    pub fn write(&mut self, c: char, attrs: Attrs) {
        self.c = c;
        self.set = true;
        self.attrs = attrs;
    }

    /// Reset the cell to a blank with no attributes
    pub fn erase(&mut self) {
        *self = Self::default();
    }

    /// Character to show when drawing this cell
    pub fn display_char(&self) -> char {
        if self.set {
            self.c
        } else {
            ' '
        }
    }
}
