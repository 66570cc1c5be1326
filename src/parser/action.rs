//! Terminal Actions
//!
//! Semantic operations produced by the parser that should be applied to the screen.

use serde::{Deserialize, Serialize};

/// A terminal action produced by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Print a character at the cursor
    Print(char),

    /// Execute a C0 control byte (never ESC, CAN or SUB)
    Execute(u8),

    /// A complete CSI sequence
    Csi(CsiAction),

    /// A complete ESC sequence (non-CSI)
    Esc(EscAction),

    /// OSC payload, terminated by BEL or ST
    Osc(Vec<u8>),
}

/// CSI (Control Sequence Introducer) sequence: `ESC [ params final`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsiAction {
    /// Parameters; omitted entries are 0
    pub params: Vec<u32>,
    /// Intermediate bytes (0x20-0x2F)
    pub intermediates: Vec<u8>,
    /// Private marker (`?`, `>`, `<` or `=`)
    pub private: Option<u8>,
    /// Final byte (0x40-0x7E)
    pub final_byte: u8,
}

impl CsiAction {
    pub fn new(final_byte: u8) -> Self {
        Self {
            params: Vec::new(),
            intermediates: Vec::new(),
            private: None,
            final_byte,
        }
    }

    /// Get parameter at index, or default value if not present
    pub fn param(&self, index: usize, default: u32) -> u32 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Get parameter at index, treating 0 as default
    pub fn param_or_default(&self, index: usize, default: u32) -> u32 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }

    /// Plain sequences carry neither a private marker nor intermediates
    pub fn is_plain(&self) -> bool {
        self.private.is_none() && self.intermediates.is_empty()
    }
}

/// ESC sequence actions (non-CSI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscAction {
    /// ESC 7 - Save cursor (DECSC)
    SaveCursor,

    /// ESC 8 - Restore cursor (DECRC)
    RestoreCursor,

    /// ESC D - Index (IND)
    Index,

    /// ESC M - Reverse Index (RI)
    ReverseIndex,

    /// ESC E - Next Line (NEL)
    NextLine,

    /// ESC H - Horizontal Tab Set (HTS)
    TabSet,

    /// ESC c - Reset
    Reset,

    /// Anything else, including charset designations such as `ESC ( B`
    Unknown { intermediates: Vec<u8>, final_byte: u8 },
}

impl EscAction {
    pub fn from_bytes(intermediates: &[u8], final_byte: u8) -> Self {
        if !intermediates.is_empty() {
            return EscAction::Unknown {
                intermediates: intermediates.to_vec(),
                final_byte,
            };
        }
        match final_byte {
            b'7' => EscAction::SaveCursor,
            b'8' => EscAction::RestoreCursor,
            b'D' => EscAction::Index,
            b'M' => EscAction::ReverseIndex,
            b'E' => EscAction::NextLine,
            b'H' => EscAction::TabSet,
            b'c' => EscAction::Reset,
            _ => EscAction::Unknown {
                intermediates: Vec::new(),
                final_byte,
            },
        }
    }
}
