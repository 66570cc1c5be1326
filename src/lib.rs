//! vtmux
//!
//! A small terminal multiplexer. Each buffer runs a shell on its own PTY and
//! feeds that shell's output through a VT100 interpreter into a private
//! screen; one buffer at a time is drawn on the real terminal.
//!
//! - `parser`: escape sequence tokenizer
//! - `core`: screen model, cells, cursor, tab stops, scrollback
//! - `terminal`: applies parsed actions to a screen
//! - `manager`, `buffer`, `session`: the set of live buffers
//! - `router`: meta-prefix key handling
//! - `render`: draws the active screen
//! - `pty`: Unix PTY management
//! - `app`: configuration and the event loop

pub mod app;
pub mod buffer;
pub mod core;
pub mod manager;
pub mod parser;
pub mod pty;
pub mod render;
pub mod router;
pub mod session;
pub mod terminal;

pub use buffer::{Buffer, BufferId};
pub use manager::{BufferManager, BufferSettings, Closed, MuxError, MuxResult};
pub use router::{InputRouter, Keymap, MetaCommand, Routed};
pub use session::{Session, SessionError, SessionSpawner};
pub use terminal::Terminal;
