//! Parser State Machine
//!
//! Implements a VT500-series style parser state machine.
//! The parser handles arbitrary chunk boundaries: an escape sequence or a
//! UTF-8 character cut in half by a read is completed by the next chunk.
//!
//! # State Machine
//!
//! The parser follows the state machine model described in:
//! - "A parser for DEC's ANSI-compatible video terminals" by Paul Williams
//! - https://vt100.net/emu/dec_ansi_parser
//!
//! States:
//! - Ground: Normal text processing
//! - Escape: After ESC, waiting for next byte
//! - EscapeIntermediate: ESC followed by intermediate bytes
//! - CsiEntry: After CSI (ESC [), before any parameter
//! - CsiParam: Collecting CSI parameters
//! - CsiIntermediate: CSI with intermediate bytes
//! - CsiIgnore: Malformed CSI, discarded up to its final byte
//! - OscString: Collecting OSC payload
//! - StringIgnore: DCS/SOS/PM/APC payload, discarded up to ST
//!
//! Eight-bit C1 controls are not recognised; stray bytes in 0x80-0xBF are
//! decoded as U+FFFD like any other malformed UTF-8.

use super::action::{Action, CsiAction, EscAction};

/// Upper bound on collected CSI parameters; extra ones are dropped
const MAX_PARAMS: usize = 32;

/// Upper bound on a retained OSC payload; extra bytes are dropped
const MAX_OSC_LEN: usize = 4096;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    OscString,
    StringIgnore,
}

/// Partially decoded UTF-8 character
#[derive(Debug, Clone, Copy, Default)]
struct Utf8 {
    code: u32,
    remaining: u8,
}

/// The terminal parser
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Intermediate bytes collected during parsing
    intermediates: Vec<u8>,
    /// Parameters for CSI sequences
    params: Vec<u32>,
    /// Current parameter being built
    current_param: u32,
    /// Whether the current parameter has been started
    param_started: bool,
    /// Private marker of the current CSI sequence
    private_marker: Option<u8>,
    /// OSC string payload
    osc_string: Vec<u8>,
    /// UTF-8 decoder state
    utf8: Utf8,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            intermediates: Vec::with_capacity(4),
            params: Vec::with_capacity(16),
            current_param: 0,
            param_started: false,
            private_marker: None,
            osc_string: Vec::with_capacity(256),
            utf8: Utf8::default(),
        }
    }

    /// Reset the parser to initial state
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.clear_params();
        self.osc_string.clear();
        self.utf8 = Utf8::default();
    }

    /// Whether the parser is between sequences
    pub fn is_ground(&self) -> bool {
        self.state == State::Ground && self.utf8.remaining == 0
    }

    /// Clear parameter state
    fn clear_params(&mut self) {
        self.intermediates.clear();
        self.params.clear();
        self.current_param = 0;
        self.param_started = false;
        self.private_marker = None;
    }

    /// Process a chunk of bytes, returning actions
    pub fn parse(&mut self, data: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        for &byte in data {
            self.advance(byte, &mut actions);
        }
        actions
    }

    /// Process a single byte
    pub fn advance(&mut self, byte: u8, actions: &mut Vec<Action>) {
        // A pending UTF-8 character is completed or abandoned first
        if self.utf8.remaining > 0 {
            if (0x80..=0xBF).contains(&byte) {
                self.continue_utf8(byte, actions);
                return;
            }
            self.utf8 = Utf8::default();
            actions.push(Action::Print(char::REPLACEMENT_CHARACTER));
        }

        match byte {
            // CAN, SUB - cancel current sequence
            0x18 | 0x1A => {
                self.state = State::Ground;
                self.osc_string.clear();
            }
            0x1B => self.enter_escape(actions),
            0x00..=0x1F => self.process_c0(byte, actions),
            // DEL is ignored in every state
            0x7F => {}
            _ => match self.state {
                State::Ground => self.process_ground(byte, actions),
                State::Escape => self.process_escape(byte, actions),
                State::EscapeIntermediate => self.process_escape_intermediate(byte, actions),
                State::CsiEntry => self.process_csi_entry(byte, actions),
                State::CsiParam => self.process_csi_param(byte, actions),
                State::CsiIntermediate => self.process_csi_intermediate(byte, actions),
                State::CsiIgnore => self.process_csi_ignore(byte),
                State::OscString => self.process_osc_string(byte),
                State::StringIgnore => {}
            },
        }
    }

    /// ESC starts a new sequence from any state; it also acts as the first
    /// half of ST for string states
    fn enter_escape(&mut self, actions: &mut Vec<Action>) {
        if self.state == State::OscString {
            self.terminate_osc(actions);
        }
        self.state = State::Escape;
        self.clear_params();
    }

    /// Process C0 control characters other than ESC, CAN and SUB
    fn process_c0(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match self.state {
            State::OscString => {
                // BEL terminates OSC (xterm extension), other controls are ignored
                if byte == 0x07 {
                    self.terminate_osc(actions);
                }
            }
            State::StringIgnore => {}
            _ => actions.push(Action::Execute(byte)),
        }
    }

    /// Process bytes in ground state (normal text)
    fn process_ground(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            0x20..=0x7E => actions.push(Action::Print(byte as char)),
            0xC2..=0xDF => self.start_utf8(u32::from(byte & 0x1F), 1),
            0xE0..=0xEF => self.start_utf8(u32::from(byte & 0x0F), 2),
            0xF0..=0xF4 => self.start_utf8(u32::from(byte & 0x07), 3),
            _ => actions.push(Action::Print(char::REPLACEMENT_CHARACTER)),
        }
    }

    fn start_utf8(&mut self, code: u32, remaining: u8) {
        self.utf8 = Utf8 { code, remaining };
    }

    /// Process UTF-8 continuation byte
    fn continue_utf8(&mut self, byte: u8, actions: &mut Vec<Action>) {
        self.utf8.code = (self.utf8.code << 6) | u32::from(byte & 0x3F);
        self.utf8.remaining -= 1;

        if self.utf8.remaining == 0 {
            // Overlong forms and surrogates fail here
            let c = char::from_u32(self.utf8.code).unwrap_or(char::REPLACEMENT_CHARACTER);
            self.utf8 = Utf8::default();
            actions.push(Action::Print(c));
        }
    }

    /// Process bytes in escape state
    fn process_escape(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            // Intermediate bytes
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = State::EscapeIntermediate;
            }
            // CSI (ESC [)
            b'[' => {
                self.clear_params();
                self.state = State::CsiEntry;
            }
            // OSC (ESC ])
            b']' => {
                self.osc_string.clear();
                self.state = State::OscString;
            }
            // DCS (ESC P), SOS (ESC X), PM (ESC ^), APC (ESC _)
            b'P' | b'X' | b'^' | b'_' => self.state = State::StringIgnore,
            // Final bytes - dispatch ESC sequence
            0x30..=0x7E => {
                self.state = State::Ground;
                self.dispatch_esc(byte, actions);
            }
            _ => self.state = State::Ground,
        }
    }

    /// Process bytes in escape intermediate state
    fn process_escape_intermediate(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            0x20..=0x2F => self.intermediates.push(byte),
            0x30..=0x7E => {
                self.state = State::Ground;
                self.dispatch_esc(byte, actions);
            }
            _ => self.state = State::Ground,
        }
    }

    /// Dispatch ESC sequence
    fn dispatch_esc(&mut self, final_byte: u8, actions: &mut Vec<Action>) {
        let action = EscAction::from_bytes(&self.intermediates, final_byte);
        actions.push(Action::Esc(action));
    }

    /// Process bytes in CSI entry state
    fn process_csi_entry(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            // Private marker
            b'<' | b'=' | b'>' | b'?' => {
                self.private_marker = Some(byte);
                self.state = State::CsiParam;
            }
            _ => {
                self.state = State::CsiParam;
                self.process_csi_param(byte, actions);
            }
        }
    }

    /// Process bytes in CSI param state
    fn process_csi_param(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            // Digit
            b'0'..=b'9' => {
                self.current_param = self
                    .current_param
                    .saturating_mul(10)
                    .saturating_add(u32::from(byte - b'0'));
                self.param_started = true;
            }
            // Parameter separator; colon subparameters are flattened
            b';' | b':' => {
                self.push_param();
                self.param_started = true;
            }
            // Intermediate bytes
            0x20..=0x2F => {
                self.finish_params();
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            // Final bytes - dispatch
            0x40..=0x7E => {
                self.finish_params();
                self.state = State::Ground;
                self.dispatch_csi(byte, actions);
            }
            // Private markers in the wrong position, or high bytes
            _ => self.state = State::CsiIgnore,
        }
    }

    /// Process bytes in CSI intermediate state
    fn process_csi_intermediate(&mut self, byte: u8, actions: &mut Vec<Action>) {
        match byte {
            0x20..=0x2F => self.intermediates.push(byte),
            0x40..=0x7E => {
                self.state = State::Ground;
                self.dispatch_csi(byte, actions);
            }
            _ => self.state = State::CsiIgnore,
        }
    }

    /// Process bytes in CSI ignore state
    fn process_csi_ignore(&mut self, byte: u8) {
        if (0x40..=0x7E).contains(&byte) {
            self.state = State::Ground;
        }
    }

    fn push_param(&mut self) {
        if self.params.len() < MAX_PARAMS {
            self.params.push(self.current_param);
        }
        self.current_param = 0;
    }

    /// Close the parameter being built, if any was started
    fn finish_params(&mut self) {
        if self.param_started {
            self.push_param();
            self.param_started = false;
        }
    }

    /// Dispatch CSI sequence
    fn dispatch_csi(&mut self, final_byte: u8, actions: &mut Vec<Action>) {
        let action = CsiAction {
            params: std::mem::take(&mut self.params),
            intermediates: std::mem::take(&mut self.intermediates),
            private: self.private_marker.take(),
            final_byte,
        };
        self.clear_params();
        actions.push(Action::Csi(action));
    }

    /// Process bytes in OSC string state
    fn process_osc_string(&mut self, byte: u8) {
        if self.osc_string.len() < MAX_OSC_LEN {
            self.osc_string.push(byte);
        }
    }

    /// Terminate OSC sequence and dispatch
    fn terminate_osc(&mut self, actions: &mut Vec<Action>) {
        self.state = State::Ground;
        actions.push(Action::Osc(std::mem::take(&mut self.osc_string)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn csi(actions: &[Action]) -> &CsiAction {
        match actions {
            [Action::Csi(csi)] => csi,
            other => panic!("expected a single CSI action, got {:?}", other),
        }
    }

    #[test]
    fn test_print_ascii() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"Hi");
        assert_eq!(actions, vec![Action::Print('H'), Action::Print('i')]);
    }

    #[test]
    fn test_print_utf8() {
        let mut parser = Parser::new();
        let actions = parser.parse("é─😀".as_bytes());
        assert_eq!(
            actions,
            vec![
                Action::Print('é'),
                Action::Print('─'),
                Action::Print('😀')
            ]
        );
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut parser = Parser::new();
        let bytes = "─".as_bytes();
        assert!(parser.parse(&bytes[..1]).is_empty());
        assert!(parser.parse(&bytes[1..2]).is_empty());
        assert_eq!(parser.parse(&bytes[2..]), vec![Action::Print('─')]);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut parser = Parser::new();
        // Truncated sequence followed by ASCII: replacement, then the ASCII
        let actions = parser.parse(&[0xE2, 0x94, b'a']);
        assert_eq!(
            actions,
            vec![Action::Print('\u{FFFD}'), Action::Print('a')]
        );

        let actions = parser.parse(&[0x80, 0xFF]);
        assert_eq!(
            actions,
            vec![Action::Print('\u{FFFD}'), Action::Print('\u{FFFD}')]
        );
    }

    #[test]
    fn test_c0_controls() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\r\n\x08\x09\x07");
        assert_eq!(
            actions,
            vec![
                Action::Execute(b'\r'),
                Action::Execute(b'\n'),
                Action::Execute(0x08),
                Action::Execute(0x09),
                Action::Execute(0x07),
            ]
        );
    }

    #[test]
    fn test_csi_params() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[10;20H");
        let csi = csi(&actions);
        assert_eq!(csi.params, vec![10, 20]);
        assert_eq!(csi.final_byte, b'H');
        assert!(csi.is_plain());
    }

    #[test]
    fn test_csi_empty_params() {
        let mut parser = Parser::new();

        let actions = parser.parse(b"\x1b[H");
        assert!(csi(&actions).params.is_empty());

        let actions = parser.parse(b"\x1b[;5H");
        assert_eq!(csi(&actions).params, vec![0, 5]);

        let actions = parser.parse(b"\x1b[3;m");
        assert_eq!(csi(&actions).params, vec![3, 0]);
    }

    #[test]
    fn test_csi_param_saturates() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[99999999999999999999A");
        assert_eq!(csi(&actions).params, vec![u32::MAX]);
    }

    #[test]
    fn test_csi_private_marker() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[?25h");
        let csi = csi(&actions);
        assert_eq!(csi.private, Some(b'?'));
        assert_eq!(csi.params, vec![25]);
        assert!(!csi.is_plain());
    }

    #[test]
    fn test_csi_intermediate() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[2 q");
        let csi = csi(&actions);
        assert_eq!(csi.intermediates, vec![b' ']);
        assert_eq!(csi.final_byte, b'q');
    }

    #[test]
    fn test_csi_misplaced_marker_ignored() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[1?2Hx");
        assert_eq!(actions, vec![Action::Print('x')]);
    }

    #[test]
    fn test_c0_inside_csi_executes() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[1\r2H");
        assert_eq!(actions[0], Action::Execute(b'\r'));
        match &actions[1] {
            Action::Csi(csi) => assert_eq!(csi.params, vec![12]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancel_aborts_sequence() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b[12\x18A");
        assert_eq!(actions, vec![Action::Print('A')]);

        let actions = parser.parse(b"\x1b[5\x1aB");
        assert_eq!(actions, vec![Action::Print('B')]);
    }

    #[test]
    fn test_esc_sequences() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b7\x1b8\x1bM\x1b(B");
        assert_eq!(
            actions,
            vec![
                Action::Esc(EscAction::SaveCursor),
                Action::Esc(EscAction::RestoreCursor),
                Action::Esc(EscAction::ReverseIndex),
                Action::Esc(EscAction::Unknown {
                    intermediates: vec![b'('],
                    final_byte: b'B'
                }),
            ]
        );
    }

    #[test]
    fn test_osc_bel_terminated() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b]0;title\x07after");
        assert_eq!(actions[0], Action::Osc(b"0;title".to_vec()));
        assert_eq!(actions[1], Action::Print('a'));
    }

    #[test]
    fn test_osc_st_terminated() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1b]2;hello\x1b\\x");
        assert_eq!(actions[0], Action::Osc(b"2;hello".to_vec()));
        assert!(matches!(actions[1], Action::Esc(EscAction::Unknown { .. })));
        assert_eq!(actions[2], Action::Print('x'));
    }

    #[test]
    fn test_dcs_swallowed() {
        let mut parser = Parser::new();
        let actions = parser.parse(b"\x1bPq#0;1\x07junk\x1b\\ok");
        let printed: String = actions
            .iter()
            .filter_map(|a| match a {
                Action::Print(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(printed, "ok");
    }

    #[test]
    fn test_split_csi() {
        let mut parser = Parser::new();
        assert!(parser.parse(b"\x1b").is_empty());
        assert!(parser.parse(b"[3").is_empty());
        assert!(!parser.is_ground());
        let actions = parser.parse(b"1m");
        assert_eq!(csi(&actions).params, vec![31]);
        assert!(parser.is_ground());
    }

    #[test]
    fn test_reset() {
        let mut parser = Parser::new();
        parser.parse(b"\x1b[12");
        parser.reset();
        assert_eq!(parser.parse(b"A"), vec![Action::Print('A')]);
    }

    proptest! {
        #[test]
        fn prop_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut parser = Parser::new();
            let _ = parser.parse(&data);
        }

        #[test]
        fn prop_chunking_is_invisible(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            split in any::<prop::sample::Index>(),
        ) {
            let mut whole = Parser::new();
            let expected = whole.parse(&data);

            let at = if data.is_empty() { 0 } else { split.index(data.len() + 1) };
            let mut chunked = Parser::new();
            let mut actions = chunked.parse(&data[..at]);
            actions.extend(chunked.parse(&data[at..]));

            prop_assert_eq!(expected, actions);
        }
    }
}
