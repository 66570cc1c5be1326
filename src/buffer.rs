//! Buffers
//!
//! A buffer is one multiplexed session: the process side and the
//! [`Terminal`] that interprets its output.

use crate::core::Screen;
use crate::terminal::Terminal;

/// Buffer number. Ids are reused after a buffer closes.
pub type BufferId = usize;

/// One session plus its screen state
#[derive(Debug)]
pub struct Buffer<S> {
    id: BufferId,
    terminal: Terminal,
    session: S,
}

impl<S> Buffer<S> {
    pub fn new(id: BufferId, terminal: Terminal, session: S) -> Self {
        Self {
            id,
            terminal,
            session,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn screen(&self) -> &Screen {
        self.terminal.screen()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Apply session output to this buffer's screen
    pub fn process(&mut self, data: &[u8]) {
        self.terminal.process(data);
    }

    /// Give up the session, for example to terminate it
    pub fn into_session(self) -> S {
        self.session
    }
}
