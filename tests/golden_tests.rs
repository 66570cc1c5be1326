//! Golden tests for the interpreter and screen model
//!
//! Each test feeds a byte sequence to a terminal and compares the resulting
//! screen against the expected state.

use proptest::prelude::*;
use vtmux::core::{Attrs, Snapshot};
use vtmux::Terminal;

/// Helper to run a golden test
fn run_golden_test(input: &[u8], rows: usize, cols: usize) -> (Terminal, Snapshot) {
    let mut term = Terminal::new(rows, cols, None);
    term.process(input);
    let snapshot = Snapshot::from_screen(term.screen());
    (term, snapshot)
}

/// Helper to run a golden test with chunked input (tests streaming)
fn run_golden_test_chunked(input: &[u8], rows: usize, cols: usize, chunk_size: usize) -> Snapshot {
    let mut term = Terminal::new(rows, cols, None);
    for chunk in input.chunks(chunk_size) {
        term.process(chunk);
    }
    Snapshot::from_screen(term.screen())
}

/// Trimmed text of one row
fn line(term: &Terminal, row: usize) -> String {
    term.screen().row_text(row).trim_end().to_string()
}

/// Input touching most of the supported sequences
const SESSION: &[u8] = b"\x1b[H\x1b[2J$ ls\r\n\x1b[1mbin\x1b[0m  \x1b[4;7msrc\x1b[m\tdocs\r\n\
\x1b]0;vtmux\x07\x1b[3;5Hmid\x1b7\x1b[10;1Hbottom\x1b8!\x1b[K\r\n\
caf\xc3\xa9 \xe2\x94\x80\xe2\x94\x80\x1b[2A\x1b[3C@\x1bM\x1bD\x1bE\x1b[?25l\x1b[1;3r\x1b[r";

// ============================================================================
// Basic printing
// ============================================================================

#[test]
fn test_simple_text() {
    let (term, snapshot) = run_golden_test(b"Hello, World!", 24, 80);
    assert_eq!(snapshot.cursor.row, 0);
    assert_eq!(snapshot.cursor.col, 13);
    assert_eq!(line(&term, 0), "Hello, World!");
}

#[test]
fn test_multiline_text() {
    // LF alone keeps the column; CR LF starts a fresh line
    let (term, _) = run_golden_test(b"Line 1\r\nLine 2\nX", 24, 80);
    assert_eq!(line(&term, 0), "Line 1");
    assert_eq!(line(&term, 1), "Line 2");
    assert_eq!(term.screen().row_substring(2, 6, 1), "X");
}

#[test]
fn test_last_column_absorbs() {
    let (term, snapshot) = run_golden_test(b"abcdefgh", 2, 5);
    assert_eq!(term.screen().row_text(0), "abcdh");
    assert_eq!(line(&term, 1), "");
    assert_eq!((snapshot.cursor.row, snapshot.cursor.col), (0, 4));
}

#[test]
fn test_utf8_text() {
    let (term, snapshot) = run_golden_test("Grüße ─ κόσμε".as_bytes(), 3, 20);
    assert_eq!(line(&term, 0), "Grüße ─ κόσμε");
    assert_eq!(snapshot.cursor.col, 13);
}

// ============================================================================
// Cursor movement and erasing
// ============================================================================

#[test]
fn test_cursor_movement() {
    let (term, snapshot) =
        run_golden_test(b"Hello\x1b[3CWorld\x1b[2DXX\x1b[H\x1b[2J\x1b[5;10HPositioned", 24, 80);
    assert_eq!(term.screen().row_substring(4, 9, 10), "Positioned");
    assert_eq!((snapshot.cursor.row, snapshot.cursor.col), (4, 19));
    assert_eq!(line(&term, 0), "");
}

#[test]
fn test_cursor_up_clamps_at_top() {
    for start in 1..=10 {
        let input = format!("\x1b[{};4H\x1b[300A", start);
        let (term, _) = run_golden_test(input.as_bytes(), 10, 20);
        assert_eq!(term.screen().cursor_position(), (0, 3));
    }
}

#[test]
fn test_erase_display_keeps_cursor() {
    let (term, _) = run_golden_test(b"first line\r\nsecond", 5, 20);
    let before = term.screen().cursor_position();

    let mut term = term;
    term.process(b"\x1b[2J");

    assert_eq!(term.screen().cursor_position(), before);
    assert_eq!(before, (1, 6));
    for row in 0..5 {
        assert_eq!(line(&term, row), "");
    }
}

#[test]
fn test_erase_in_line_modes() {
    let input = b"abcdefgh\r\x1b[4C\x1b[K\r\n\
abcdefgh\r\x1b[4C\x1b[1K\r\n\
abcdefgh\x1b[2K";
    let (term, _) = run_golden_test(input, 3, 10);
    assert_eq!(line(&term, 0), "abcd");
    assert_eq!(term.screen().row_text(1), "     fgh  ");
    assert_eq!(line(&term, 2), "");
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_sgr_accumulates_and_resets() {
    let (term, snapshot) = run_golden_test(b"\x1b[1m\x1b[4mA\x1b[0mB", 2, 10);
    assert_eq!(term.screen().cell(0, 0).attrs, Attrs::BOLD | Attrs::UNDERSCORE);
    assert_eq!(term.screen().cell(0, 1).attrs, Attrs::empty());
    assert!(snapshot.attrs.is_empty());
}

#[test]
fn test_sgr_unknown_codes_ignored() {
    let (term, _) = run_golden_test(b"\x1b[31;1;38;5;196;22mX", 1, 5);
    assert_eq!(term.screen().cell(0, 0).attrs, Attrs::BOLD);
}

// ============================================================================
// Scrolling and scrollback
// ============================================================================

#[test]
fn test_scrollback_round_trip() {
    let rows = 4;
    let extra = 5;
    let lines: Vec<String> = (0..rows + extra).map(|i| format!("line {}", i)).collect();

    let mut term = Terminal::new(rows, 12, None);
    term.process(lines.join("\r\n").as_bytes());
    assert_eq!(term.screen().scrollback().len(), extra);
    assert_eq!(line(&term, 0), lines[extra]);

    term.process(b"\x1b[H");
    for restored in (0..extra).rev() {
        term.process(b"\x1bM");
        assert_eq!(line(&term, 0), lines[restored]);
    }

    assert!(term.screen().scrollback().is_empty());
    for row in 0..rows {
        assert_eq!(line(&term, row), lines[row]);
    }
}

#[test]
fn test_scroll_region_keeps_outside_rows() {
    let (term, _) = run_golden_test(b"top\r\na\r\nb\r\nbottom\x1b[2;3r\x1b[3;1H\n\nc", 4, 10);
    assert_eq!(line(&term, 0), "top");
    assert_eq!(line(&term, 1), "");
    assert_eq!(line(&term, 2), "c");
    assert_eq!(line(&term, 3), "bottom");
    // Rows scrolled inside a region never reach scrollback
    assert!(term.screen().scrollback().is_empty());
}

#[test]
fn test_bounded_scrollback() {
    let mut term = Terminal::new(2, 10, Some(3));
    for i in 0..10 {
        term.process(format!("{}\r\n", i).as_bytes());
    }
    let history: Vec<String> = term
        .screen()
        .scrollback()
        .iter()
        .map(|row| row.trimmed_text())
        .collect();
    assert_eq!(history, vec!["6", "7", "8"]);
}

// ============================================================================
// Tabs
// ============================================================================

#[test]
fn test_tab_stops() {
    let (term, _) = run_golden_test(b"a\tb\x1b[3g\r\x1b[4C\x1bH\rx\ty\tz", 2, 20);
    assert_eq!(term.screen().row_substring(0, 0, 10), "x   y   b ");
    assert_eq!(term.screen().cursor_position(), (0, 19));
    assert_eq!(term.screen().row_substring(0, 19, 1), "z");
}

// ============================================================================
// Streaming
// ============================================================================

#[test]
fn test_chunked_matches_whole() {
    let (_, whole) = run_golden_test(SESSION, 10, 30);
    for chunk_size in 1..=SESSION.len() {
        assert_eq!(
            run_golden_test_chunked(SESSION, 10, 30, chunk_size),
            whole,
            "chunk size {}",
            chunk_size
        );
    }
}

proptest! {
    #[test]
    fn prop_split_anywhere_matches_whole(split in 0..SESSION.len()) {
        let (_, whole) = run_golden_test(SESSION, 10, 30);

        let mut term = Terminal::new(10, 30, None);
        term.process(&SESSION[..split]);
        term.process(&SESSION[split..]);

        prop_assert_eq!(Snapshot::from_screen(term.screen()), whole);
    }

    #[test]
    fn prop_cursor_stays_in_bounds(
        input in proptest::collection::vec(any::<u8>(), 0..512),
        rows in 1usize..12,
        cols in 1usize..30,
    ) {
        let mut term = Terminal::new(rows, cols, Some(16));
        term.process(&input);

        let (row, col) = term.screen().cursor_position();
        prop_assert!(row < rows);
        prop_assert!(col < cols);
        prop_assert_eq!(term.screen().size(), (rows, cols));
        let (top, bottom) = term.screen().scroll_region();
        prop_assert!(top <= bottom && bottom < rows);
    }

    #[test]
    fn prop_escape_heavy_input_never_panics(
        parts in proptest::collection::vec(
            prop_oneof![
                Just(b"\x1b[".to_vec()),
                Just(b"\x1b]".to_vec()),
                Just(b"\x1b".to_vec()),
                Just(b"\x07".to_vec()),
                Just(b";".to_vec()),
                Just(b"999999999999".to_vec()),
                Just(b"\r\n".to_vec()),
                proptest::collection::vec(0x20u8..0x7f, 1..4),
            ],
            0..64,
        )
    ) {
        let input: Vec<u8> = parts.concat();
        let mut term = Terminal::new(5, 8, None);
        term.process(&input);
        let (row, col) = term.screen().cursor_position();
        prop_assert!(row < 5 && col < 8);
    }
}
