//! Terminal Executor
//!
//! Ties together the parser and the screen model, applying parsed actions
//! to update the screen. Each buffer owns one `Terminal`; its parser keeps
//! any partially received sequence between calls to [`Terminal::process`].
//!
//! Malformed or unsupported input never fails. It is consumed without
//! effect and reported at `trace` level.

use tracing::trace;

use crate::core::{Attrs, EraseMode, Screen};
use crate::parser::{Action, CsiAction, EscAction, Parser};

/// Terminal executor that processes parsed actions and updates the screen
#[derive(Debug)]
pub struct Terminal {
    /// The terminal screen
    screen: Screen,
    /// The escape sequence parser
    parser: Parser,
}

impl Terminal {
    /// Create a new terminal with the given dimensions
    pub fn new(rows: usize, cols: usize, scrollback_capacity: Option<usize>) -> Self {
        Self {
            screen: Screen::new(rows, cols, scrollback_capacity),
            parser: Parser::new(),
        }
    }

    /// Get a reference to the screen
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Process output bytes from the session
    pub fn process(&mut self, data: &[u8]) {
        let actions = self.parser.parse(data);
        for action in actions {
            self.apply_action(action);
        }
    }

    /// Apply a single parsed action to the screen
    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Print(c) => self.screen.print(c),
            Action::Execute(byte) => self.execute_c0(byte),
            Action::Csi(csi) => self.execute_csi(&csi),
            Action::Esc(esc) => self.execute_esc(esc),
            Action::Osc(payload) => {
                trace!(len = payload.len(), "OSC string ignored");
            }
        }
    }

    /// Execute a C0 control character
    fn execute_c0(&mut self, byte: u8) {
        match byte {
            // BS - Backspace
            0x08 => self.screen.backspace(),
            // HT - Horizontal Tab
            0x09 => self.screen.tab(),
            // LF, VT, FF - Line Feed
            0x0A..=0x0C => self.screen.linefeed(),
            // CR - Carriage Return
            0x0D => self.screen.carriage_return(),
            _ => trace!(byte, "C0 control ignored"),
        }
    }

    /// Execute a CSI sequence
    fn execute_csi(&mut self, csi: &CsiAction) {
        if !csi.is_plain() {
            trace!(?csi, "unsupported CSI sequence");
            return;
        }

        let count = || csi.param_or_default(0, 1) as usize;

        match csi.final_byte {
            // CUU - Cursor Up
            b'A' => self.screen.move_cursor_up(count()),
            // CUD - Cursor Down
            b'B' => self.screen.move_cursor_down(count()),
            // CUF - Cursor Forward
            b'C' => self.screen.move_cursor_forward(count()),
            // CUB - Cursor Backward
            b'D' => self.screen.move_cursor_backward(count()),
            // CUP, HVP - Cursor Position (1-based)
            b'H' | b'f' => {
                let row = csi.param_or_default(0, 1) as usize - 1;
                let col = csi.param_or_default(1, 1) as usize - 1;
                self.screen.move_cursor_to(row, col);
            }
            // ED - Erase in Display
            b'J' => match EraseMode::from_param(csi.param(0, 0)) {
                Some(mode) => self.screen.erase_in_display(mode),
                None => trace!(?csi, "unsupported erase mode"),
            },
            // EL - Erase in Line
            b'K' => match EraseMode::from_param(csi.param(0, 0)) {
                Some(mode) => self.screen.erase_in_line(mode),
                None => trace!(?csi, "unsupported erase mode"),
            },
            // TBC - Tab Clear
            b'g' => match csi.param(0, 0) {
                0 => self.screen.clear_tab_stop(),
                3 => self.screen.clear_all_tab_stops(),
                other => trace!(param = other, "unsupported tab clear"),
            },
            // SGR - Select Graphic Rendition
            b'm' => self.execute_sgr(csi),
            // DECSTBM - Set Top and Bottom Margins
            b'r' => {
                let rows = self.screen.rows();
                let top = csi.param_or_default(0, 1) as usize - 1;
                let bottom = (csi.param_or_default(1, rows as u32) as usize).min(rows) - 1;
                self.screen.set_scroll_region(top, bottom);
            }
            _ => trace!(?csi, "unsupported CSI sequence"),
        }
    }

    /// Execute SGR (Select Graphic Rendition)
    fn execute_sgr(&mut self, csi: &CsiAction) {
        if csi.params.is_empty() {
            self.screen.reset_attrs();
            return;
        }

        let mut codes = csi.params.iter().copied();
        while let Some(code) = codes.next() {
            match code {
                0 => self.screen.reset_attrs(),
                // Extended colors carry their own arguments, none of which
                // may be read as attributes
                38 | 48 | 58 => {
                    let skip = match codes.next() {
                        Some(5) => 1,
                        Some(2) => 3,
                        _ => 0,
                    };
                    codes.by_ref().take(skip).for_each(drop);
                    trace!(code, "extended color ignored");
                }
                _ => match Attrs::from_sgr(code) {
                    Some(attrs) => self.screen.add_attrs(attrs),
                    None => trace!(code, "unsupported SGR code"),
                },
            }
        }
    }

    /// Execute an ESC sequence
    fn execute_esc(&mut self, esc: EscAction) {
        match esc {
            EscAction::SaveCursor => self.screen.save_cursor(),
            EscAction::RestoreCursor => self.screen.restore_cursor(),
            EscAction::Index => self.screen.index(),
            EscAction::ReverseIndex => self.screen.reverse_index(),
            EscAction::NextLine => self.screen.next_line(),
            EscAction::TabSet => self.screen.set_tab_stop(),
            EscAction::Reset => self.screen.soft_reset(),
            EscAction::Unknown {
                intermediates,
                final_byte,
            } => trace!(?intermediates, final_byte, "unsupported ESC sequence"),
        }
    }
}
