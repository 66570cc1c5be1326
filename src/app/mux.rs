//! Main application
//!
//! One thread, one `poll`: stdin and every buffer's PTY master are watched
//! together, so buffer switches are never interleaved with half-applied
//! output.

use std::io::{self, Write};
use std::os::fd::BorrowedFd;
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::libc::STDIN_FILENO;
use nix::poll::{poll, PollFd, PollFlags};
use nix::unistd::read;
use tracing::{debug, info, warn};

use super::config::{Config, ConfigError};
use super::raw_mode::RawModeGuard;
use crate::buffer::BufferId;
use crate::manager::{BufferManager, Closed, MuxError};
use crate::pty::{get_window_size, reap_children, PtyError, PtySpawner, ShellCommand, WindowSize};
use crate::render::Renderer;
use crate::router::InputRouter;

/// Bytes read from a PTY master per call
const READ_CHUNK: usize = 64 * 1024;

/// Reads taken from one PTY master before going back to `poll`, so a shell
/// that never stops writing cannot starve stdin or the other buffers
const MAX_READS_PER_ROUND: usize = 4;

/// Error type for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error(transparent)]
    Mux(#[from] MuxError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What draining a buffer's PTY found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Drained {
    /// Some output was applied to the buffer
    pub output: bool,
    /// The session is gone
    pub closed: bool,
}

/// Read what `id`'s PTY has ready, up to [`MAX_READS_PER_ROUND`] reads, and
/// apply it to the buffer
pub(crate) fn drain(
    manager: &mut BufferManager<PtySpawner>,
    id: BufferId,
    buf: &mut [u8],
) -> Drained {
    let mut drained = Drained::default();

    for _ in 0..MAX_READS_PER_ROUND {
        let result = match manager.get(id) {
            Some(buffer) => buffer.session().read(buf),
            None => {
                drained.closed = true;
                return drained;
            }
        };

        match result {
            Ok(Some(0)) => {
                drained.closed = true;
                return drained;
            }
            Ok(Some(n)) => {
                manager.feed_output(id, &buf[..n]);
                drained.output = true;
            }
            Ok(None) => return drained,
            // Linux reports EIO on the master once the slave side is gone
            Err(PtyError::Read(Errno::EIO)) => {
                drained.closed = true;
                return drained;
            }
            Err(e) => {
                warn!(id, error = %e, "read failed, closing buffer");
                drained.closed = true;
                return drained;
            }
        }
    }
    drained
}

/// The multiplexer
pub struct App {
    manager: BufferManager<PtySpawner>,
    router: InputRouter,
    renderer: Renderer,
}

impl App {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let host = match get_window_size(STDIN_FILENO) {
            Ok(size) if size.rows > 0 && size.cols > 0 => size,
            Ok(_) => WindowSize::default(),
            Err(e) => {
                debug!(error = %e, "no terminal size, using default");
                WindowSize::default()
            }
        };
        let size = WindowSize::new(
            config.rows.unwrap_or(host.rows),
            config.cols.unwrap_or(host.cols),
        );
        info!(rows = size.rows, cols = size.cols, "screen size");

        let command = ShellCommand::resolve(config.shell.as_deref())?;
        let spawner = PtySpawner::new(command, size, config.term.clone());
        let settings = config.buffer_settings(size.rows, size.cols);

        Ok(Self {
            manager: BufferManager::new(spawner, settings),
            router: InputRouter::new(config.keymap()),
            renderer: Renderer::new(),
        })
    }

    /// Run until the last buffer closes or stdin ends
    pub fn run(mut self) -> Result<(), AppError> {
        let _raw = RawModeGuard::new()?;
        let mut stdout = io::stdout().lock();

        self.manager.create()?;
        let result = self.event_loop(&mut stdout);

        // Leave a clean screen behind for the parent shell
        let _ = stdout.write_all(b"\x1b[0m\x1b[H\x1b[2J");
        let _ = stdout.flush();
        result
    }

    fn event_loop<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        let mut input = [0u8; 4096];
        let mut output = vec![0u8; READ_CHUNK];
        let mut dirty = true;

        loop {
            if dirty {
                if let Some(screen) = self.manager.active_screen() {
                    self.renderer.render(screen, out)?;
                }
                dirty = false;
            }

            let buffers: Vec<(BufferId, RawFd)> = self
                .manager
                .iter()
                .map(|buffer| (buffer.id(), buffer.session().master_fd()))
                .collect();
            let fds: Vec<RawFd> = std::iter::once(STDIN_FILENO)
                .chain(buffers.iter().map(|&(_, fd)| fd))
                .collect();

            let ready = match wait_readable(&fds) {
                Ok(ready) => ready,
                Err(PtyError::Poll(Errno::EINTR)) => continue,
                Err(e) => return Err(e.into()),
            };

            if ready[0] {
                match read(STDIN_FILENO, &mut input) {
                    Ok(0) => {
                        info!("stdin closed");
                        return Ok(());
                    }
                    Ok(n) => match self.router.dispatch(&input[..n], &mut self.manager) {
                        Ok(true) => {
                            self.renderer.invalidate();
                            dirty = true;
                        }
                        Ok(false) => {}
                        // The session's hangup shows up on its master shortly.
                        // Commands after the failed write still ran.
                        Err(e) => {
                            warn!(error = %e, "input dropped");
                            self.renderer.invalidate();
                            dirty = true;
                        }
                    },
                    Err(Errno::EINTR) | Err(Errno::EAGAIN) => {}
                    Err(e) => return Err(io::Error::from(e).into()),
                }
            }

            let active = self.manager.active_id();
            for (&(id, _), &readable) in buffers.iter().zip(&ready[1..]) {
                if !readable {
                    continue;
                }
                let drained = drain(&mut self.manager, id, &mut output);
                if drained.output && Some(id) == active {
                    dirty = true;
                }
                if drained.closed {
                    info!(id, "session ended");
                    match self.manager.close(id) {
                        Closed::LastBuffer => return Ok(()),
                        Closed::Remaining => {
                            if Some(id) == active {
                                self.renderer.invalidate();
                                dirty = true;
                            }
                        }
                    }
                }
            }

            reap_children();
        }
    }
}

/// Block until at least one of `fds` is readable or hung up
fn wait_readable(fds: &[RawFd]) -> Result<Vec<bool>, PtyError> {
    // SAFETY: every fd stays open until this function returns
    let borrowed: Vec<BorrowedFd<'_>> =
        fds.iter().map(|&fd| unsafe { BorrowedFd::borrow_raw(fd) }).collect();
    let mut poll_fds: Vec<PollFd<'_>> = borrowed
        .iter()
        .map(|fd| PollFd::new(fd, PollFlags::POLLIN))
        .collect();

    poll(&mut poll_fds, -1).map_err(PtyError::Poll)?;

    let wake = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
    Ok(poll_fds
        .iter()
        .map(|fd| fd.revents().is_some_and(|r| r.intersects(wake)))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::manager::BufferSettings;

    fn manager_running(script: &str) -> BufferManager<PtySpawner> {
        let command = ShellCommand {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        };
        let spawner = PtySpawner::new(command, WindowSize::new(5, 20), "vt100");
        let settings = BufferSettings {
            rows: 5,
            cols: 20,
            ..BufferSettings::default()
        };
        BufferManager::new(spawner, settings)
    }

    #[test]
    fn test_drain_until_exit() {
        let mut manager = manager_running("printf 'buffer %s' \"$VTMUX_BUFNUM\"");
        let id = manager.create().unwrap();
        let mut buf = vec![0u8; 1024];

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut output = false;
        loop {
            let fd = manager.get(id).unwrap().session().master_fd();
            wait_readable(&[fd]).unwrap();
            let drained = drain(&mut manager, id, &mut buf);
            output |= drained.output;
            if drained.closed || Instant::now() > deadline {
                break;
            }
        }

        assert!(output);
        assert_eq!(manager.active_screen().unwrap().row_text(0).trim_end(), "buffer 0");
        assert_eq!(manager.close(id), Closed::LastBuffer);
    }

    #[test]
    fn test_drain_returns_while_shell_keeps_writing() {
        let mut manager = manager_running("exec yes");
        let id = manager.create().unwrap();
        let mut buf = vec![0u8; READ_CHUNK];

        let fd = manager.get(id).unwrap().session().master_fd();
        wait_readable(&[fd]).unwrap();

        for _ in 0..3 {
            let started = Instant::now();
            let drained = drain(&mut manager, id, &mut buf);
            assert!(!drained.closed);
            assert!(started.elapsed() < Duration::from_secs(1));
        }
        assert_eq!(manager.active_screen().unwrap().row_text(0).trim_end(), "y");
        assert_eq!(manager.close(id), Closed::LastBuffer);
    }

    #[test]
    fn test_drain_unknown_buffer_is_closed() {
        let mut manager = manager_running("true");
        let mut buf = [0u8; 16];
        assert!(drain(&mut manager, 7, &mut buf).closed);
    }
}
