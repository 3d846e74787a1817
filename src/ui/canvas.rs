//! Canvas sizing and pointer handling.
//!
//! The session works in canvas-local coordinates with the origin at the
//! canvas' top-left corner, y pointing down. This module converts egui's
//! screen positions into that space and forwards pointer events.

use super::state::BoardApp;
use eframe::egui;
use log::{debug, error};

impl BoardApp {
    /// Lays out the board canvas, keeps the session sized to it, handles
    /// pointer input and draws the board.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI the canvas fills
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas_origin = response.rect.min;
        self.sync_canvas_size(response.rect.size());

        self.handle_pointer(ui, &response);
        self.render_board(ui.ctx(), &painter);
    }

    /// Resizes the session when the canvas size changes.
    ///
    /// A failed resize (a collapsed window) keeps the previous layout on
    /// screen and is retried on the next size change.
    pub fn sync_canvas_size(&mut self, size: egui::Vec2) {
        if self.canvas_size == Some(size) {
            return;
        }
        self.canvas_size = Some(size);

        match self.session.resize(size.x, size.y) {
            Ok(()) => {
                debug!("Canvas resized to {}x{}", size.x, size.y);
                self.textures.clear();
            }
            Err(e) => error!("Ignoring canvas size {}x{}: {}", size.x, size.y, e),
        }
    }

    /// Forwards press, motion and release of the primary button to the session.
    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let (pressed, released, delta, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta(),
                i.pointer.interact_pos(),
            )
        });

        let mut grabbed = false;
        if pressed {
            if let Some(pos) = pos.filter(|p| response.rect.contains(*p)) {
                let (x, y) = self.to_canvas(pos);
                grabbed = self.session.pointer_down(x, y);
            }
        }

        // Movement that led up to the press must not carry the new grab
        if !grabbed && delta != egui::Vec2::ZERO {
            self.session.pointer_motion(delta.x, delta.y);
        }

        if released {
            let (x, y) = match pos {
                Some(pos) => self.to_canvas(pos),
                None => (f32::NAN, f32::NAN),
            };
            let outcome = self.session.pointer_up(x, y);
            if outcome != crate::session::DropOutcome::NotDragging {
                self.last_outcome = Some(outcome);
            }
        }
    }
}
