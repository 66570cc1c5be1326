//! Raw mode for the controlling terminal

use std::io;

use nix::sys::termios::{self, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices};

/// RAII guard for raw terminal mode
///
/// Keystrokes reach the multiplexer byte by byte, unechoed and without
/// signal generation, so Ctrl-C and friends go to the buffer's shell. The
/// original settings come back on drop.
pub struct RawModeGuard {
    original: termios::Termios,
}

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        let original = termios::tcgetattr(io::stdin()).map_err(io::Error::from)?;

        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG | LocalFlags::IEXTEN);
        raw.input_flags.remove(
            InputFlags::ICRNL | InputFlags::IXON | InputFlags::INLCR | InputFlags::IGNCR,
        );
        raw.output_flags.remove(OutputFlags::OPOST);

        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw).map_err(io::Error::from)?;

        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.original);
    }
}
