//! Configuration for vtmux
//!
//! Settings come from four layers, later layers winning:
//! - built-in defaults
//! - the TOML file at `$XDG_CONFIG_HOME/vtmux/config.toml` (or `--config`)
//! - `VTMUX_*` environment variables
//! - command line flags

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::manager::{BufferSettings, DEFAULT_BUFNUM_VAR, DEFAULT_SESSION_NAME};
use crate::router::{Keymap, DEFAULT_META};

/// CLI arguments for vtmux
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vtmux")]
#[command(version)]
#[command(about = "A small VT100 terminal multiplexer", long_about = None)]
pub struct CliArgs {
    /// Path to custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Shell command to run in each buffer
    #[arg(short, long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Meta prefix key, e.g. "C-a" or "^B"
    #[arg(short, long, value_name = "KEY")]
    pub meta: Option<String>,

    /// Screen rows (defaults to the terminal's size)
    #[arg(long, value_name = "ROWS")]
    pub rows: Option<u16>,

    /// Screen columns (defaults to the terminal's size)
    #[arg(long, value_name = "COLS")]
    pub cols: Option<u16>,

    /// Scrollback lines kept per buffer
    #[arg(long, value_name = "LINES")]
    pub scrollback: Option<usize>,

    /// Write logs to this file (logging is off without it)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Multiplexer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell command (None = `$SHELL`, then the login shell)
    pub shell: Option<String>,

    /// Meta prefix key
    pub meta: String,

    /// Screen rows (None = terminal size)
    pub rows: Option<u16>,

    /// Screen columns (None = terminal size)
    pub cols: Option<u16>,

    /// Scrollback lines per buffer (None = unbounded)
    pub scrollback: Option<usize>,

    /// Variable carrying the buffer number into each session
    pub bufnum_var: String,

    /// Multiplexer session name exported to every buffer
    pub session_name: String,

    /// `TERM` for spawned shells
    pub term: String,
}

fn default_meta() -> String {
    "C-a".to_string()
}
fn default_term() -> String {
    "vt100".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            meta: default_meta(),
            rows: None,
            cols: None,
            scrollback: None,
            bufnum_var: DEFAULT_BUFNUM_VAR.to_string(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            term: default_term(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config error in '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl Config {
    /// Load configuration with full precedence:
    /// CLI args > environment variables > config file > defaults
    pub fn load_with_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            // A file named on the command line must load
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_file(&path).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "ignoring config file");
                    Config::default()
                }),
                _ => Config::default(),
            },
        };

        config.apply_env_vars(|name| env::var(name).ok());
        config.apply_cli_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `VTMUX_*` variables looked up through `lookup`
    fn apply_env_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("VTMUX_SHELL") {
            self.shell = Some(val);
        }
        if let Some(val) = lookup("VTMUX_META") {
            self.meta = val;
        }
        if let Some(val) = lookup("VTMUX_SCROLLBACK") {
            match val.parse() {
                Ok(lines) => self.scrollback = Some(lines),
                Err(_) => tracing::warn!(value = %val, "ignoring invalid VTMUX_SCROLLBACK"),
            }
        }
    }

    fn apply_cli_args(&mut self, args: &CliArgs) {
        if let Some(shell) = &args.shell {
            self.shell = Some(shell.clone());
        }
        if let Some(meta) = &args.meta {
            self.meta = meta.clone();
        }
        if let Some(rows) = args.rows {
            self.rows = Some(rows);
        }
        if let Some(cols) = args.cols {
            self.cols = Some(cols);
        }
        if let Some(scrollback) = args.scrollback {
            self.scrollback = Some(scrollback);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Keymap::parse_key(&self.meta).is_none() {
            return Err(ConfigError::invalid(
                "meta",
                format!("Unrecognised key '{}'. Expected e.g. \"C-a\" or \"^B\"", self.meta),
            ));
        }

        if self.rows == Some(0) {
            return Err(ConfigError::invalid("rows", "Rows must be at least 1"));
        }
        if self.cols == Some(0) {
            return Err(ConfigError::invalid("cols", "Columns must be at least 1"));
        }

        if let Some(shell) = &self.shell {
            if shell.trim().is_empty() {
                return Err(ConfigError::invalid("shell", "Shell command is empty"));
            }
        }

        let valid_name = |name: &str| {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !valid_name(&self.bufnum_var) {
            return Err(ConfigError::invalid(
                "bufnum_var",
                format!("'{}' is not a valid variable name", self.bufnum_var),
            ));
        }
        if self.session_name.contains('\0') {
            return Err(ConfigError::invalid("session_name", "Contains a NUL byte"));
        }
        if self.term.is_empty() || self.term.contains('\0') {
            return Err(ConfigError::invalid("term", "TERM must be a non-empty name"));
        }

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vtmux").join("config.toml"))
    }

    /// Key bindings with the configured meta prefix
    pub fn keymap(&self) -> Keymap {
        Keymap::with_meta(Keymap::parse_key(&self.meta).unwrap_or(DEFAULT_META))
    }

    /// Buffer settings for a screen of `rows` x `cols`, after size overrides
    pub fn buffer_settings(&self, rows: u16, cols: u16) -> BufferSettings {
        BufferSettings {
            rows: usize::from(self.rows.unwrap_or(rows)),
            cols: usize::from(self.cols.unwrap_or(cols)),
            scrollback: self.scrollback,
            bufnum_var: self.bufnum_var.clone(),
            session_name: self.session_name.clone(),
        }
    }
}
