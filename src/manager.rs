//! Buffer manager
//!
//! Owns every live buffer, keyed and ordered by id, and tracks which one is
//! displayed. Ids are allocated lowest-free-first, so closing buffer 0 and
//! creating a new one hands out 0 again. Navigation wraps around the ordered
//! set of live ids.
//!
//! The manager is generic over [`SessionSpawner`]; the application plugs in
//! PTYs and tests plug in an in-memory fake.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::buffer::{Buffer, BufferId};
use crate::core::Screen;
use crate::session::{Session, SessionError, SessionSpawner};
use crate::terminal::Terminal;

/// Default name of the variable carrying the buffer number
pub const DEFAULT_BUFNUM_VAR: &str = "VTMUX_BUFNUM";

/// Variable carrying the multiplexer session name
pub const SESSION_VAR: &str = "VTMUX_SESSION";

/// Default multiplexer session name
pub const DEFAULT_SESSION_NAME: &str = "vtmux";

/// Error type for buffer manager operations
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("Failed to start buffer {id}: {source}")]
    Spawn {
        id: BufferId,
        #[source]
        source: SessionError,
    },

    #[error("No active buffer")]
    NoActiveBuffer,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type for buffer manager operations
pub type MuxResult<T> = Result<T, MuxError>;

/// Outcome of closing a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {
    /// Other buffers are still live
    Remaining,
    /// No buffers are left; the multiplexer should exit
    LastBuffer,
}

/// Settings shared by every buffer the manager creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSettings {
    pub rows: usize,
    pub cols: usize,
    /// Scrollback capacity, `None` for unbounded
    pub scrollback: Option<usize>,
    /// Variable that tells a session its buffer number
    pub bufnum_var: String,
    /// Value of [`SESSION_VAR`]
    pub session_name: String,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            scrollback: None,
            bufnum_var: DEFAULT_BUFNUM_VAR.to_string(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

/// Manages the set of live buffers and the active pointer
pub struct BufferManager<P: SessionSpawner> {
    spawner: P,
    settings: BufferSettings,
    buffers: BTreeMap<BufferId, Buffer<P::Session>>,
    active: Option<BufferId>,
}

impl<P: SessionSpawner> BufferManager<P> {
    /// Create an empty manager
    pub fn new(spawner: P, settings: BufferSettings) -> Self {
        Self {
            spawner,
            settings,
            buffers: BTreeMap::new(),
            active: None,
        }
    }

    pub fn settings(&self) -> &BufferSettings {
        &self.settings
    }

    pub fn spawner(&self) -> &P {
        &self.spawner
    }

    /// Lowest id not held by a live buffer
    fn free_id(&self) -> BufferId {
        let mut id = 0;
        for &taken in self.buffers.keys() {
            if taken != id {
                break;
            }
            id += 1;
        }
        id
    }

    /// Start a new buffer and make it active.
    ///
    /// When the session cannot be started the manager is left unchanged.
    pub fn create(&mut self) -> MuxResult<BufferId> {
        let id = self.free_id();
        let env = vec![
            (self.settings.bufnum_var.clone(), id.to_string()),
            (SESSION_VAR.to_string(), self.settings.session_name.clone()),
        ];

        let session = self
            .spawner
            .spawn(id, &env)
            .map_err(|source| MuxError::Spawn { id, source })?;
        let terminal = Terminal::new(
            self.settings.rows,
            self.settings.cols,
            self.settings.scrollback,
        );

        self.buffers.insert(id, Buffer::new(id, terminal, session));
        info!(id, live = self.buffers.len(), "buffer created");
        self.activate(id);
        Ok(id)
    }

    /// Make `id` the displayed buffer and re-announce its number to the session
    fn activate(&mut self, id: BufferId) {
        self.active = Some(id);
        if let Some(buffer) = self.buffers.get_mut(&id) {
            buffer
                .session_mut()
                .set_var(&self.settings.bufnum_var, &id.to_string());
        }
        debug!(id, "buffer activated");
    }

    /// First live id after `id`, wrapping to the lowest
    fn successor(&self, id: BufferId) -> Option<BufferId> {
        self.buffers
            .range(id.saturating_add(1)..)
            .next()
            .or_else(|| self.buffers.iter().next())
            .map(|(&next, _)| next)
    }

    /// Last live id before `id`, wrapping to the highest
    fn predecessor(&self, id: BufferId) -> Option<BufferId> {
        self.buffers
            .range(..id)
            .next_back()
            .or_else(|| self.buffers.iter().next_back())
            .map(|(&prev, _)| prev)
    }

    /// Switch to the next buffer in id order. Returns whether the active
    /// buffer changed.
    pub fn next(&mut self) -> bool {
        let target = self.active.and_then(|id| self.successor(id));
        self.switch_to(target)
    }

    /// Switch to the previous buffer in id order. Returns whether the active
    /// buffer changed.
    pub fn prev(&mut self) -> bool {
        let target = self.active.and_then(|id| self.predecessor(id));
        self.switch_to(target)
    }

    /// Switch to buffer `id` if it is live. Returns whether the active
    /// buffer changed.
    pub fn goto(&mut self, id: BufferId) -> bool {
        if !self.buffers.contains_key(&id) {
            debug!(id, "goto ignored, no such buffer");
            return false;
        }
        self.switch_to(Some(id))
    }

    fn switch_to(&mut self, target: Option<BufferId>) -> bool {
        match target {
            Some(id) if Some(id) != self.active => {
                self.activate(id);
                true
            }
            _ => false,
        }
    }

    /// Close buffer `id`, terminating its session.
    ///
    /// If it was active, its successor in id order becomes active. Closing
    /// an unknown id changes nothing.
    pub fn close(&mut self, id: BufferId) -> Closed {
        let successor = self.successor(id).filter(|&next| next != id);

        if let Some(buffer) = self.buffers.remove(&id) {
            buffer.into_session().terminate();
            info!(id, live = self.buffers.len(), "buffer closed");

            if self.active == Some(id) {
                self.active = None;
                if let Some(next) = successor {
                    self.activate(next);
                }
            }
        }

        if self.buffers.is_empty() {
            Closed::LastBuffer
        } else {
            Closed::Remaining
        }
    }

    /// Apply session output to buffer `id`, active or not. Returns false if
    /// the buffer does not exist.
    pub fn feed_output(&mut self, id: BufferId, data: &[u8]) -> bool {
        match self.buffers.get_mut(&id) {
            Some(buffer) => {
                buffer.process(data);
                true
            }
            None => false,
        }
    }

    /// Forward input to the active buffer's session
    pub fn write_active(&mut self, data: &[u8]) -> MuxResult<()> {
        let id = self.active.ok_or(MuxError::NoActiveBuffer)?;
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or(MuxError::NoActiveBuffer)?;
        buffer.session_mut().write(data)?;
        Ok(())
    }

    pub fn active_id(&self) -> Option<BufferId> {
        self.active
    }

    /// Live ids in ascending order
    pub fn ids(&self) -> Vec<BufferId> {
        self.buffers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn get(&self, id: BufferId) -> Option<&Buffer<P::Session>> {
        self.buffers.get(&id)
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut Buffer<P::Session>> {
        self.buffers.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buffer<P::Session>> {
        self.buffers.values()
    }

    pub fn active(&self) -> Option<&Buffer<P::Session>> {
        self.active.and_then(|id| self.buffers.get(&id))
    }

    /// Screen of the displayed buffer
    pub fn active_screen(&self) -> Option<&Screen> {
        self.active().map(Buffer::screen)
    }
}
