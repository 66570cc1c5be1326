//! Input routing
//!
//! Keystrokes from the real terminal either go to the active buffer's
//! session or, when they follow the meta prefix, drive the buffer manager.
//!
//! | Keys          | Effect                          |
//! |---------------|---------------------------------|
//! | prefix `c`    | create a buffer                 |
//! | prefix `n`    | next buffer                     |
//! | prefix `p`    | previous buffer                 |
//! | prefix `0-9`  | go to that buffer               |
//! | prefix prefix | send one literal prefix byte    |
//!
//! A prefix that ends one read is completed by the next one.

use tracing::{debug, warn};

use crate::buffer::BufferId;
use crate::manager::{BufferManager, MuxResult};
use crate::session::SessionSpawner;

/// Default meta prefix, Ctrl-A
pub const DEFAULT_META: u8 = 0x01;

/// Bytes that trigger each meta command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    pub meta: u8,
    pub create: u8,
    pub next: u8,
    pub prev: u8,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            meta: DEFAULT_META,
            create: b'c',
            next: b'n',
            prev: b'p',
        }
    }
}

impl Keymap {
    pub fn with_meta(meta: u8) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    /// Parse a key description into a byte.
    ///
    /// Accepts `C-a` / `Ctrl-a` / `^A` for control keys and a single ASCII
    /// character for itself.
    pub fn parse_key(s: &str) -> Option<u8> {
        let s = s.trim();
        let ctrl = s
            .strip_prefix("C-")
            .or_else(|| s.strip_prefix("Ctrl-"))
            .or_else(|| s.strip_prefix("ctrl-"))
            .or_else(|| s.strip_prefix('^'));

        match ctrl {
            Some(rest) => match rest.as_bytes() {
                [b] if b.is_ascii_alphabetic() || (b'@'..=b'_').contains(b) => {
                    Some(b.to_ascii_uppercase() & 0x1F)
                }
                _ => None,
            },
            None => match s.as_bytes() {
                [b] if b.is_ascii() => Some(*b),
                _ => None,
            },
        }
    }

    /// Command bound to the byte that followed the prefix
    fn command(&self, byte: u8) -> Option<MetaCommand> {
        match byte {
            b if b == self.create => Some(MetaCommand::Create),
            b if b == self.next => Some(MetaCommand::Next),
            b if b == self.prev => Some(MetaCommand::Prev),
            b'0'..=b'9' => Some(MetaCommand::Goto(BufferId::from(byte - b'0'))),
            _ => None,
        }
    }
}

/// Buffer manager operation requested from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Create,
    Next,
    Prev,
    Goto(BufferId),
}

/// One piece of routed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Bytes for the active session
    Forward(Vec<u8>),
    /// A meta command
    Command(MetaCommand),
}

/// Splits keyboard input into forwarded bytes and meta commands
#[derive(Debug, Clone)]
pub struct InputRouter {
    keymap: Keymap,
    /// The previous read ended with the prefix
    pending: bool,
}

impl InputRouter {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            pending: false,
        }
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Whether a prefix is waiting for its command byte
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Route one read's worth of input
    pub fn route(&mut self, data: &[u8]) -> Vec<Routed> {
        let mut routed = Vec::new();
        let mut forward = Vec::new();

        for &byte in data {
            if self.pending {
                self.pending = false;
                if byte == self.keymap.meta {
                    forward.push(byte);
                } else if let Some(command) = self.keymap.command(byte) {
                    if !forward.is_empty() {
                        routed.push(Routed::Forward(std::mem::take(&mut forward)));
                    }
                    routed.push(Routed::Command(command));
                } else {
                    debug!(byte, "unbound meta key dropped");
                }
            } else if byte == self.keymap.meta {
                self.pending = true;
            } else {
                forward.push(byte);
            }
        }

        if !forward.is_empty() {
            routed.push(Routed::Forward(forward));
        }
        routed
    }

    /// Route input and apply it to `manager`. Returns whether the displayed
    /// buffer changed.
    ///
    /// A buffer that cannot be created is logged and skipped. A failed write
    /// to the active session does not stop the commands after it; the first
    /// such error is returned once everything has been applied, and the
    /// caller must then assume the displayed buffer may have changed.
    pub fn dispatch<P: SessionSpawner>(
        &mut self,
        data: &[u8],
        manager: &mut BufferManager<P>,
    ) -> MuxResult<bool> {
        let mut changed = false;
        let mut failed = None;

        for routed in self.route(data) {
            match routed {
                Routed::Forward(bytes) => {
                    if let Err(e) = manager.write_active(&bytes) {
                        debug!(error = %e, len = bytes.len(), "forward failed");
                        failed.get_or_insert(e);
                    }
                }
                Routed::Command(command) => {
                    debug!(?command, "meta command");
                    changed |= match command {
                        MetaCommand::Create => match manager.create() {
                            Ok(_) => true,
                            Err(e) => {
                                warn!(error = %e, "could not create buffer");
                                false
                            }
                        },
                        MetaCommand::Next => manager.next(),
                        MetaCommand::Prev => manager.prev(),
                        MetaCommand::Goto(id) => manager.goto(id),
                    };
                }
            }
        }

        match failed {
            Some(e) => Err(e),
            None => Ok(changed),
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(Keymap::default())
    }
}
