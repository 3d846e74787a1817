//! Application state for the board window.
//!
//! The window owns the [`GameSession`] and whatever is needed to keep its
//! network side alive; everything game-related lives in the session.

use super::textures::SpriteTextures;
use crate::session::{DropOutcome, GameSession};
use eframe::egui;

/// The eframe application showing one game.
pub struct BoardApp {
    /// The game being shown
    pub session: GameSession,
    /// Rasterised sprite images
    pub textures: SpriteTextures,
    /// Role shown in the status bar
    pub role_label: String,
    /// Outcome of the most recent drop, for the status bar
    pub last_outcome: Option<DropOutcome>,
    /// Canvas size the session was last resized to
    pub canvas_size: Option<egui::Vec2>,
    /// Screen position of the canvas' top-left corner
    pub canvas_origin: egui::Pos2,
    /// Number of snapshots applied since start
    pub snapshots_applied: u64,
    /// Runtime driving the transport tasks; dropping it stops them
    runtime: Option<tokio::runtime::Runtime>,
}

impl BoardApp {
    /// Creates the app around a ready session.
    ///
    /// # Arguments
    ///
    /// * `session` - Session to display and drive
    /// * `runtime` - Runtime the session's transport runs on, kept alive with the app
    /// * `role_label` - Text identifying this process' role
    pub fn new(
        session: GameSession,
        runtime: Option<tokio::runtime::Runtime>,
        role_label: impl Into<String>,
    ) -> Self {
        Self {
            session,
            textures: SpriteTextures::default(),
            role_label: role_label.into(),
            last_outcome: None,
            canvas_size: None,
            canvas_origin: egui::Pos2::ZERO,
            snapshots_applied: 0,
            runtime,
        }
    }

    /// Whether a transport runtime is attached.
    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Converts a screen position to the canvas-local space the session uses.
    pub fn to_canvas(&self, pos: egui::Pos2) -> (f32, f32) {
        let local = pos - self.canvas_origin;
        (local.x, local.y)
    }

    /// Converts a canvas-local position to screen space.
    pub fn to_screen(&self, (x, y): (f32, f32)) -> egui::Pos2 {
        self.canvas_origin + egui::vec2(x, y)
    }
}
