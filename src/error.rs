//! Error types for the board view.
//!
//! Lookup misses (unknown location, missing sprite image) are deliberately
//! absent here: they are reported through `Option` and logged where they
//! happen, never propagated.

use thiserror::Error;

/// Failure computing the layout to window transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The layout document reported a zero or negative extent.
    #[error("layout extents must be positive, got {width}x{height}")]
    InvalidLayoutExtents {
        /// Layout width
        width: f32,
        /// Layout height
        height: f32,
    },
    /// The window reported a zero or negative extent.
    #[error("window extents must be positive, got {width}x{height}")]
    InvalidWindowExtents {
        /// Window width
        width: f32,
        /// Window height
        height: f32,
    },
}

/// Failure loading a layout document.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The layout file could not be read
    #[error("failed to read layout: {0}")]
    Io(#[from] std::io::Error),

    /// The layout is not well-formed XML
    #[error("layout XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// No `<svg>` element was found
    #[error("layout has no <svg> root element")]
    MissingRoot,

    /// Neither `viewBox` nor numeric `width`/`height` were present
    #[error("layout has no usable extents (need viewBox or numeric width/height)")]
    MissingExtents,
}

/// An inbound snapshot that cannot replace the current state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// The top level value is not an object
    #[error("snapshot is not a JSON object")]
    NotAnObject,

    /// `game_board.pieces` is absent
    #[error("snapshot is missing `game_board.pieces`")]
    MissingPieces,

    /// `game_board.pieces` is present but not an array
    #[error("`game_board.pieces` is not a list")]
    PiecesNotAList,

    /// A piece entry lacks a string field
    #[error("piece entry {index} is missing a string `{field}`")]
    BadEntry {
        /// Position of the entry in `game_board.pieces`
        index: usize,
        /// Name of the missing field
        field: &'static str,
    },
}

/// Failure building the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`crate::config::AppConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An unrecognised role name
    #[error("unknown role `{0}` (expected client, host or server)")]
    UnknownRole(String),
}

/// Crate-wide error.
#[derive(Error, Debug)]
pub enum Error {
    /// Layout or window extents unusable
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Board layout could not be loaded
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Malformed state snapshot
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Bad configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The window could not be created or crashed
    #[error("GUI error: {0}")]
    Gui(#[from] eframe::Error),
}

/// Result alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
