//! # Board View
//!
//! A networked board-game client. The board is an SVG layout whose named
//! rectangles are the locations pieces can stand on; an authoritative server
//! holds the game state and broadcasts full snapshots after every change.
//!
//! ## Features
//! - SVG layout loading with letterboxed, aspect-preserving scaling
//! - Pieces stacked on one location fan out so each stays visible
//! - Drag a piece onto a location to send a `move_piece` command
//! - Dropping anywhere else puts the piece back
//! - Client, host (client plus in-process server) and headless server roles
//!
//! The core ([`session`], [`occupancy`], [`screen`], [`layout`]) has no
//! knowledge of windows or sockets; [`ui`] and [`net`] drive it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod images;
pub mod layout;
pub mod net;
pub mod occupancy;
pub mod protocol;
pub mod screen;
pub mod session;
pub mod text;
pub mod ui;

pub use channel::{SyncChannel, TransportEnd};
pub use config::{AppConfig, Role};
pub use error::{Error, Result};
pub use layout::{LayoutDocument, LayoutIndex};
pub use protocol::{GameState, ProtocolMessage};
pub use session::GameSession;
pub use ui::BoardApp;

use images::ImageCatalog;
use log::{info, warn};
use std::path::Path;

/// Loads the starting snapshot for a host or server. A missing file starts
/// an empty board.
pub fn load_initial_state(path: &Path) -> Result<GameState> {
    match std::fs::read_to_string(path) {
        Ok(json) => GameState::from_json(&json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("No initial state at {}; starting empty", path.display());
            Ok(GameState::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?)
}

/// Runs the server without a window until the listener fails.
///
/// # Returns
///
/// An error if the state file is invalid or the address can't be bound.
pub fn run_server_headless(config: &AppConfig) -> Result<()> {
    let state = load_initial_state(&config.initial_state_path)?;
    let runtime = build_runtime()?;
    runtime.block_on(net::serve(&config.bind_addr, state))?;
    Ok(())
}

/// Runs the board window for a client or host.
///
/// A host binds its listener before the window opens and connects its own
/// client to it, so the first snapshot comes through the same path as for
/// remote players.
///
/// # Example
///
/// ```no_run
/// use board_view::{run_app, AppConfig};
///
/// fn main() -> board_view::Result<()> {
///     run_app(&AppConfig::default())
/// }
/// ```
pub fn run_app(config: &AppConfig) -> Result<()> {
    let layout = LayoutIndex::new(LayoutDocument::load(&config.layout_path)?);
    info!(
        "Loaded layout {} with {} locations",
        config.layout_path.display(),
        layout.location_count()
    );
    let images = ImageCatalog::from_dir(&config.pieces_dir)?;
    if images.is_empty() {
        warn!("No sprites found in {}", config.pieces_dir.display());
    } else {
        info!("Loaded {} sprites from {}", images.len(), config.pieces_dir.display());
    }

    let runtime = build_runtime()?;
    let (channel, transport) = SyncChannel::new();

    let server_addr = match config.role {
        Role::Host => {
            let state = load_initial_state(&config.initial_state_path)?;
            let listener = runtime.block_on(tokio::net::TcpListener::bind(&config.bind_addr))?;
            let local = listener.local_addr()?;
            info!("Hosting game on {}", local);
            runtime.spawn(async move {
                if let Err(e) = net::run_server(listener, net::GameServer::new(state)).await {
                    log::error!("Server stopped: {}", e);
                }
            });
            local.to_string()
        }
        Role::Client | Role::Server => config.server_addr.clone(),
    };
    runtime.spawn(net::run_client(server_addr, transport));

    let session = GameSession::new(
        layout,
        Box::new(images),
        channel,
        GameState::default(),
        config.window_size,
    )?;
    let app = BoardApp::new(session, Some(runtime), config.role.label());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([config.window_size.0, config.window_size.1])
            .with_title("Board View"),
        ..Default::default()
    };
    eframe::run_native(
        "Board View",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_initial_state_is_empty_board() {
        let state = load_initial_state(Path::new("/no/such/initial_state.json")).unwrap();
        assert!(state.pieces().is_empty());
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn test_initial_state_file_is_validated() {
        let path = std::env::temp_dir().join(format!("board_view_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"game_board": {"pieces": [{"name": "p1"}]}}"#).unwrap();
        let result = load_initial_state(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }
}
