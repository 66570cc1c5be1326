//! Screen renderer
//!
//! Draws a [`Screen`] onto a real terminal through any [`Write`]. Each row
//! is encoded to the bytes that reproduce it (text plus SGR runs) and only
//! rows whose encoding changed since the last frame are rewritten.
//! [`Renderer::invalidate`] forces a full redraw, which is what a buffer
//! switch needs.

use std::io::{self, Write};

use crate::core::{Attrs, Row, Screen};

#[derive(Debug, Default)]
pub struct Renderer {
    /// Encoded rows as last drawn
    frame: Vec<Vec<u8>>,
    /// Whether `frame` matches the real terminal
    valid: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last frame so the next render redraws every row
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Draw `screen`, writing only rows that changed, then place the cursor
    pub fn render<W: Write>(&mut self, screen: &Screen, out: &mut W) -> io::Result<()> {
        let rows = screen.rows();
        if !self.valid || self.frame.len() != rows {
            self.frame = vec![Vec::new(); rows];
            // Hide the cursor while repainting
            out.write_all(b"\x1b[?25l\x1b[0m\x1b[H\x1b[2J")?;
            for (index, row) in screen.grid().iter().enumerate() {
                let encoded = encode_row(row);
                write!(out, "\x1b[{};1H", index + 1)?;
                out.write_all(&encoded)?;
                self.frame[index] = encoded;
            }
            self.valid = true;
        } else {
            for (index, row) in screen.grid().iter().enumerate() {
                let encoded = encode_row(row);
                if self.frame[index] != encoded {
                    write!(out, "\x1b[{};1H\x1b[2K", index + 1)?;
                    out.write_all(&encoded)?;
                    self.frame[index] = encoded;
                }
            }
        }

        let (row, col) = screen.cursor_position();
        write!(out, "\x1b[{};{}H\x1b[?25h", row + 1, col + 1)?;
        out.flush()
    }
}

/// Bytes that draw `row` from column 0, trailing plain blanks omitted
fn encode_row(row: &Row) -> Vec<u8> {
    let end = row
        .cells
        .iter()
        .rposition(|cell| !cell.is_blank() || !cell.attrs.is_empty())
        .map_or(0, |i| i + 1);

    let mut out = Vec::with_capacity(end + 8);
    let mut current = Attrs::empty();
    let mut utf8 = [0u8; 4];

    for cell in &row.cells[..end] {
        if cell.attrs != current {
            push_sgr(&mut out, cell.attrs);
            current = cell.attrs;
        }
        out.extend_from_slice(cell.display_char().encode_utf8(&mut utf8).as_bytes());
    }

    if !current.is_empty() {
        out.extend_from_slice(b"\x1b[0m");
    }
    out
}

/// SGR sequence that switches from any state to exactly `attrs`
fn push_sgr(out: &mut Vec<u8>, attrs: Attrs) {
    out.extend_from_slice(b"\x1b[0");
    for code in attrs.sgr_codes() {
        out.push(b';');
        out.extend_from_slice(code.to_string().as_bytes());
    }
    out.push(b'm');
}
