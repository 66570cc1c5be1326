//! Integration tests with real shells
//!
//! These tests drive the buffer manager through actual PTYs and check the
//! screens that result from a shell's output.

use std::time::{Duration, Instant};

use vtmux::pty::{PtySpawner, ShellCommand, WindowSize};
use vtmux::{BufferId, BufferManager, BufferSettings, Closed};

fn script(body: &str) -> ShellCommand {
    ShellCommand {
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), body.to_string()],
    }
}

fn manager(command: ShellCommand) -> BufferManager<PtySpawner> {
    let spawner = PtySpawner::new(command, WindowSize::new(8, 40), "vt100");
    let settings = BufferSettings {
        rows: 8,
        cols: 40,
        ..BufferSettings::default()
    };
    BufferManager::new(spawner, settings)
}

/// Feed buffer `id` until its screen shows `needle` or the timeout expires
fn pump_until(mux: &mut BufferManager<PtySpawner>, id: BufferId, needle: &str) -> bool {
    let mut buf = [0u8; 4096];
    let deadline = Instant::now() + Duration::from_secs(5);

    while Instant::now() < deadline {
        let screen = mux.get(id).unwrap().screen();
        if (0..screen.rows()).any(|row| screen.row_text(row).contains(needle)) {
            return true;
        }

        let session = mux.get(id).unwrap().session();
        if !session.pty().poll_read(50).unwrap_or(false) {
            continue;
        }
        match session.read(&mut buf) {
            Ok(Some(n)) if n > 0 => {
                mux.feed_output(id, &buf[..n]);
            }
            Ok(None) => {}
            _ => break,
        }
    }
    false
}

#[test]
fn test_each_buffer_sees_its_number() {
    let mut mux = manager(script(
        "echo \"buffer=$VTMUX_BUFNUM session=$VTMUX_SESSION term=$TERM\"; exec cat",
    ));
    let first = mux.create().unwrap();
    let second = mux.create().unwrap();

    assert!(pump_until(&mut mux, first, "buffer=0 session=vtmux term=vt100"));
    assert!(pump_until(&mut mux, second, "buffer=1 session=vtmux term=vt100"));

    mux.close(first);
    mux.close(second);
}

#[test]
fn test_input_reaches_active_shell() {
    let mut mux = manager(script("exec cat"));
    let id = mux.create().unwrap();

    mux.write_active(b"hello from vtmux\r").unwrap();
    assert!(pump_until(&mut mux, id, "hello from vtmux"));
    assert_eq!(mux.close(id), Closed::LastBuffer);
}

#[test]
fn test_shell_escape_sequences_reach_screen() {
    let mut mux = manager(script("printf 'plain \\033[1mbold\\033[0m\\033[4;10Hplaced'; exec cat"));
    let id = mux.create().unwrap();

    assert!(pump_until(&mut mux, id, "placed"));
    let screen = mux.get(id).unwrap().screen();
    assert_eq!(screen.row_substring(0, 0, 10), "plain bold");
    assert!(!screen.cell(0, 6).attrs.is_empty());
    assert!(screen.cell(0, 0).attrs.is_empty());
    assert_eq!(screen.row_substring(3, 9, 6), "placed");
    assert_eq!(screen.cursor_position(), (3, 15));

    mux.close(id);
}
