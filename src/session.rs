//! Shell sessions
//!
//! A session is the process side of a buffer: something that accepts the
//! user's input and can be told about environment variables. The buffer
//! manager only talks to sessions through these traits, so it can be driven
//! by real PTYs in the application and by in-memory fakes in tests.

use crate::buffer::BufferId;
use crate::pty::PtyError;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("PTY error: {0}")]
    Pty(#[from] PtyError),

    #[error("Session has already exited")]
    Closed,

    #[error("Failed to spawn session: {0}")]
    Spawn(String),
}

/// A running session attached to one buffer
pub trait Session {
    /// Send bytes to the session's input
    fn write(&mut self, data: &[u8]) -> Result<(), SessionError>;

    /// Record an environment variable for the session
    fn set_var(&mut self, name: &str, value: &str);

    /// Stop the session. Calling it more than once is harmless.
    fn terminate(&mut self);
}

/// Creates sessions for new buffers
pub trait SessionSpawner {
    type Session: Session;

    /// Start a session for buffer `id` with `env` added to its environment
    fn spawn(
        &mut self,
        id: BufferId,
        env: &[(String, String)],
    ) -> Result<Self::Session, SessionError>;
}
