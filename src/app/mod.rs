//! Application glue module
//!
//! Configuration, raw terminal mode and the multiplexer's event loop.

mod config;
mod mux;
mod raw_mode;

pub use config::{CliArgs, Config, ConfigError};
pub use mux::{App, AppError};
pub use raw_mode::RawModeGuard;
