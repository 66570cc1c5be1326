//! Unix PTY implementation
//!
//! Implements PTY creation and child process management using POSIX APIs.

use std::collections::BTreeMap;
use std::ffi::CString;
use std::os::fd::BorrowedFd;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, FdFlag, OFlag};
use nix::libc::{self, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};
use nix::sys::signal::{kill, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, read, setsid, write, ForkResult, Pid};
use tracing::{debug, info, warn};

use super::{PtyError, PtyResult, ShellCommand, WindowSize};
use crate::buffer::BufferId;
use crate::session::{Session, SessionError, SessionSpawner};

/// How long a write waits for the master to drain before giving up
const WRITE_TIMEOUT_MS: i32 = 1000;

/// A pseudoterminal with a spawned child process
#[derive(Debug)]
pub struct Pty {
    /// The PTY master file descriptor
    master: PtyMaster,
    /// The child process ID
    child_pid: Pid,
    /// Whether the child may still be running
    child_alive: bool,
}

impl Pty {
    /// Spawn `command` on a fresh PTY of the given size.
    ///
    /// The child gets `TERM=term` plus every pair in `env`. The master is
    /// close-on-exec and non-blocking in the parent.
    pub fn spawn(
        command: &ShellCommand,
        size: WindowSize,
        term: &str,
        env: &[(String, String)],
    ) -> PtyResult<Self> {
        // Everything the child needs is allocated before forking
        let to_cstring =
            |s: &str| CString::new(s).map_err(|_| PtyError::InvalidCommand(s.to_string()));
        let program = to_cstring(command.program.as_str())?;
        let mut argv = Vec::with_capacity(command.args.len() + 1);
        argv.push(program.clone());
        for arg in &command.args {
            argv.push(to_cstring(arg.as_str())?);
        }

        let mut child_env = Vec::with_capacity(env.len() + 1);
        child_env.push(("TERM".to_string(), term.to_string()));
        child_env.extend(env.iter().cloned());

        // Open PTY master
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(PtyError::OpenMaster)?;

        // Grant access to slave
        grantpt(&master).map_err(PtyError::GrantPty)?;

        // Unlock slave
        unlockpt(&master).map_err(PtyError::UnlockPty)?;

        // SAFETY: ptsname is not thread-safe; the multiplexer spawns from a
        // single thread and uses the result immediately
        let slave_name = unsafe { ptsname(&master) }.map_err(PtyError::PtsName)?;
        let slave_name = to_cstring(slave_name.as_str())?;

        // Later children must not inherit this master
        fcntl(master.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(PtyError::SetFlags)?;

        set_window_size(master.as_raw_fd(), size)?;

        // SAFETY: the child only calls async-signal-safe functions plus
        // setenv before exec, and never returns into the caller
        match unsafe { fork() }.map_err(PtyError::Fork)? {
            ForkResult::Child => {
                drop(master);
                exec_child(&slave_name, &program, &argv, &child_env)
            }
            ForkResult::Parent { child } => {
                let flags = fcntl(master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(PtyError::SetFlags)?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(
                    master.as_raw_fd(),
                    FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
                )
                .map_err(PtyError::SetFlags)?;

                debug!(pid = child.as_raw(), program = %command.program, "spawned child");
                Ok(Pty {
                    master,
                    child_pid: child,
                    child_alive: true,
                })
            }
        }
    }

    /// Get the raw file descriptor of the PTY master
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Get the child process ID
    pub fn child_pid(&self) -> Pid {
        self.child_pid
    }

    /// Check if the child process is still running
    pub fn is_alive(&mut self) -> bool {
        if !self.child_alive {
            return false;
        }

        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            _ => {
                self.child_alive = false;
                false
            }
        }
    }

    /// Read from the PTY master (non-blocking)
    ///
    /// `Ok(None)` means no data is available yet and `Ok(Some(0))` means end
    /// of file. Once the child has exited Linux reports `EIO`, which is
    /// returned as an error.
    pub fn read(&self, buf: &mut [u8]) -> PtyResult<Option<usize>> {
        match read(self.master.as_raw_fd(), buf) {
            Ok(n) => Ok(Some(n)),
            // EAGAIN and EWOULDBLOCK are the same value on Linux
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(None),
            Err(e) => Err(PtyError::Read(e)),
        }
    }

    /// Write all data to the PTY master, waiting while it is full
    pub fn write_all(&self, mut data: &[u8]) -> PtyResult<()> {
        while !data.is_empty() {
            match write(self.master.as_raw_fd(), data) {
                Ok(n) => data = &data[n..],
                Err(Errno::EINTR) => {}
                Err(Errno::EAGAIN) => {
                    if !self.poll(PollFlags::POLLOUT, WRITE_TIMEOUT_MS)? {
                        return Err(PtyError::Write(Errno::EAGAIN));
                    }
                }
                Err(e) => return Err(PtyError::Write(e)),
            }
        }
        Ok(())
    }

    /// Poll for data available to read
    ///
    /// Returns true if data is available or the child hung up, false if the
    /// timeout expired.
    pub fn poll_read(&self, timeout_ms: i32) -> PtyResult<bool> {
        self.poll(PollFlags::POLLIN, timeout_ms)
    }

    fn poll(&self, flags: PollFlags, timeout_ms: i32) -> PtyResult<bool> {
        // SAFETY: The master fd is valid for the lifetime of this Pty
        let borrowed_fd = unsafe { BorrowedFd::borrow_raw(self.master.as_raw_fd()) };
        let mut fds = [PollFd::new(&borrowed_fd, flags)];
        let n = poll(&mut fds, timeout_ms).map_err(PtyError::Poll)?;
        Ok(n > 0
            && fds[0]
                .revents()
                .is_some_and(|r| r.intersects(flags | PollFlags::POLLHUP)))
    }

    /// Send a signal to the child process
    pub fn signal(&self, signal: Signal) -> PtyResult<()> {
        kill(self.child_pid, signal).map_err(PtyError::Signal)
    }

    /// Hang up on the child and reap it if it has already gone
    pub fn terminate(&mut self) {
        if !self.child_alive {
            return;
        }
        match self.signal(Signal::SIGHUP) {
            Ok(()) | Err(PtyError::Signal(Errno::ESRCH)) => {}
            Err(e) => warn!(pid = self.child_pid.as_raw(), error = %e, "failed to signal child"),
        }
        let _ = self.is_alive();
        self.child_alive = false;
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Child half of [`Pty::spawn`]. Never returns.
fn exec_child(slave_name: &CString, program: &CString, argv: &[CString], env: &[(String, String)]) -> ! {
    // Create new session, then open the slave so it becomes the
    // controlling terminal
    if setsid().is_ok() {
        if let Ok(slave_fd) = open(slave_name.as_c_str(), OFlag::O_RDWR, Mode::empty()) {
            // SAFETY: TIOCSCTTY is a valid ioctl for setting controlling terminal
            unsafe {
                libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0);
            }

            let redirected = [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO]
                .into_iter()
                .all(|fd| dup2(slave_fd, fd).is_ok());

            if slave_fd > STDERR_FILENO {
                let _ = close(slave_fd);
            }

            if redirected {
                for (name, value) in env {
                    std::env::set_var(name, value);
                }
                let _ = execvp(program, argv);
            }
        }
    }

    // SAFETY: _exit skips atexit handlers and stdio flushing that belong to
    // the parent's copy of the process
    unsafe { libc::_exit(127) }
}

/// Reap every child that has already exited
pub fn reap_children() {
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(_) => break,
            Ok(status) => debug!(?status, "reaped child"),
        }
    }
}

/// Set the window size on a PTY file descriptor
fn set_window_size(fd: RawFd, size: WindowSize) -> PtyResult<()> {
    let winsize = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCSWINSZ is a valid ioctl for setting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(())
    }
}

/// Get the window size of a terminal file descriptor
pub fn get_window_size(fd: RawFd) -> PtyResult<WindowSize> {
    let mut winsize = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ is a valid ioctl for getting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) };

    if result < 0 {
        Err(PtyError::GetWinsize(Errno::last()))
    } else {
        Ok(WindowSize::new(winsize.ws_row, winsize.ws_col))
    }
}

/// A buffer's shell running on a PTY
#[derive(Debug)]
pub struct PtySession {
    pty: Pty,
    /// Variables announced to this session since it started
    vars: BTreeMap<String, String>,
    terminated: bool,
}

impl PtySession {
    pub fn new(pty: Pty, env: &[(String, String)]) -> Self {
        Self {
            pty,
            vars: env.iter().cloned().collect(),
            terminated: false,
        }
    }

    pub fn pty(&self) -> &Pty {
        &self.pty
    }

    pub fn master_fd(&self) -> RawFd {
        self.pty.master_fd()
    }

    /// See [`Pty::read`]
    pub fn read(&self, buf: &mut [u8]) -> PtyResult<Option<usize>> {
        self.pty.read(buf)
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl Session for PtySession {
    fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if self.terminated {
            return Err(SessionError::Closed);
        }
        Ok(self.pty.write_all(data)?)
    }

    fn set_var(&mut self, name: &str, value: &str) {
        debug!(pid = self.pty.child_pid().as_raw(), name, value, "session variable");
        self.vars.insert(name.to_string(), value.to_string());
    }

    fn terminate(&mut self) {
        self.pty.terminate();
        self.terminated = true;
    }
}

/// Spawns one shell per buffer
#[derive(Debug, Clone)]
pub struct PtySpawner {
    command: ShellCommand,
    size: WindowSize,
    term: String,
}

impl PtySpawner {
    pub fn new(command: ShellCommand, size: WindowSize, term: impl Into<String>) -> Self {
        Self {
            command,
            size,
            term: term.into(),
        }
    }
}

impl SessionSpawner for PtySpawner {
    type Session = PtySession;

    fn spawn(&mut self, id: BufferId, env: &[(String, String)]) -> Result<PtySession, SessionError> {
        let pty = Pty::spawn(&self.command, self.size, &self.term, env)?;
        info!(id, pid = pty.child_pid().as_raw(), "buffer session started");
        Ok(PtySession::new(pty, env))
    }
}
