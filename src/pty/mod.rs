//! PTY (Pseudoterminal) handling
//!
//! This module provides functionality for creating and managing pseudoterminals,
//! spawning shells, and handling I/O. [`PtySpawner`] plugs real PTYs into the
//! buffer manager as its session backend.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{get_window_size, reap_children, Pty, PtySession, PtySpawner};

/// Shell used when nothing else is configured or discoverable
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Error type for PTY operations
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("Failed to open PTY master: {0}")]
    OpenMaster(#[source] nix::Error),

    #[error("Failed to grant PTY access: {0}")]
    GrantPty(#[source] nix::Error),

    #[error("Failed to unlock PTY: {0}")]
    UnlockPty(#[source] nix::Error),

    #[error("Failed to get PTY slave name: {0}")]
    PtsName(#[source] nix::Error),

    #[error("Failed to fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("Failed to set window size: {0}")]
    SetWinsize(#[source] nix::Error),

    #[error("Failed to get window size: {0}")]
    GetWinsize(#[source] nix::Error),

    #[error("Failed to read from PTY: {0}")]
    Read(#[source] nix::Error),

    #[error("Failed to write to PTY: {0}")]
    Write(#[source] nix::Error),

    #[error("Failed to set file descriptor flags: {0}")]
    SetFlags(#[source] nix::Error),

    #[error("Failed to poll: {0}")]
    Poll(#[source] nix::Error),

    #[error("Failed to signal child: {0}")]
    Signal(#[source] nix::Error),

    #[error("Invalid shell command: {0:?}")]
    InvalidCommand(String),
}

/// Result type for PTY operations
pub type PtyResult<T> = Result<T, PtyError>;

/// Window size for PTY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
}

impl WindowSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

/// A shell command split into program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    /// Split a command line on whitespace
    pub fn parse(line: &str) -> PtyResult<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| PtyError::InvalidCommand(line.to_string()))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Pick the shell to run: the configured command, then `$SHELL`, then
    /// the login shell from the password database, then [`FALLBACK_SHELL`]
    pub fn resolve(configured: Option<&str>) -> PtyResult<Self> {
        if let Some(line) = configured {
            return Self::parse(line);
        }

        let from_env = std::env::var("SHELL")
            .ok()
            .filter(|shell| !shell.trim().is_empty());
        let shell = from_env
            .or_else(login_shell)
            .unwrap_or_else(|| FALLBACK_SHELL.to_string());
        Self::parse(&shell)
    }
}

/// Login shell of the current user
fn login_shell() -> Option<String> {
    let user = nix::unistd::User::from_uid(nix::unistd::getuid()).ok()??;
    let shell = user.shell.to_str()?.trim().to_string();
    (!shell.is_empty()).then_some(shell)
}
