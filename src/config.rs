//! Runtime configuration.
//!
//! Settings come from an optional JSON file and are then overridden by
//! environment variables, so a plain `BOARD_VIEW_ROLE=host` is enough to try
//! the game locally.

use crate::constants::{DEFAULT_SERVER_ADDR, DEFAULT_WINDOW_SIZE};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "BOARD_VIEW_CONFIG";
/// Config file used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "board_view.json";

/// How this process takes part in a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// GUI connected to a remote server
    Client,
    /// GUI plus an in-process server other clients can join
    Host,
    /// Server only, no window
    Server,
}

impl Role {
    /// Parses a role name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "host" => Ok(Role::Host),
            "server" => Ok(Role::Server),
            _ => Err(ConfigError::UnknownRole(name.to_string())),
        }
    }

    /// Lower-case display name.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Host => "host",
            Role::Server => "server",
        }
    }
}

/// All runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Whether to connect, host, or serve headless
    pub role: Role,
    /// Server address a client connects to
    pub server_addr: String,
    /// Address a host or server listens on
    pub bind_addr: String,
    /// SVG layout of the board
    pub layout_path: PathBuf,
    /// Directory of SVG piece sprites
    pub pieces_dir: PathBuf,
    /// Starting snapshot for a host or server
    pub initial_state_path: PathBuf,
    /// Initial window size in logical points
    pub window_size: (f32, f32),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            role: Role::Client,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            bind_addr: DEFAULT_SERVER_ADDR.to_string(),
            layout_path: PathBuf::from("assets/layout.svg"),
            pieces_dir: PathBuf::from("assets/pieces"),
            initial_state_path: PathBuf::from("assets/initial_state.json"),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl AppConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the config file named by the environment (or the default
    /// path), then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `BOARD_VIEW_*` overrides read through `var`.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(role) = var("BOARD_VIEW_ROLE") {
            self.role = Role::parse(&role)?;
        }
        if let Some(addr) = var("BOARD_VIEW_SERVER") {
            self.server_addr = addr;
        }
        if let Some(addr) = var("BOARD_VIEW_BIND") {
            self.bind_addr = addr;
        }
        if let Some(path) = var("BOARD_VIEW_LAYOUT") {
            self.layout_path = path.into();
        }
        if let Some(path) = var("BOARD_VIEW_PIECES") {
            self.pieces_dir = path.into();
        }
        if let Some(path) = var("BOARD_VIEW_STATE") {
            self.initial_state_path = path.into();
        }
        Ok(())
    }
}
