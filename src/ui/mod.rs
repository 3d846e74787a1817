//! User interface for the board window.
//!
//! The window is a single canvas showing the board layout and the pieces on
//! it, with a status bar underneath. Pieces are moved by dragging them onto a
//! named location; the move is sent to the server and the next snapshot
//! settles where everything ends up.
//!
//! # Module Organization
//!
//! - [`state`] - The [`BoardApp`] struct
//! - [`canvas`] - Canvas sizing and pointer handling
//! - [`rendering`] - Drawing the layout and sprites
//! - [`textures`] - SVG rasterisation and texture caching

pub mod canvas;
pub mod rendering;
pub mod state;
pub mod textures;


pub use state::BoardApp;

use crate::constants::TICK_INTERVAL;
use crate::session::{DropOutcome, Selection};
use eframe::egui;

impl eframe::App for BoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
        // Keep ticking so inbound snapshots are picked up without input
        ctx.request_repaint_after(TICK_INTERVAL);
    }
}

impl BoardApp {
    /// Runs one frame: ticks the session, then draws the status bar and canvas.
    pub fn show(&mut self, ctx: &egui::Context) {
        if self.session.tick() {
            self.snapshots_applied += 1;
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                self.draw_status(ui);
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(rendering::BACKGROUND))
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        ui.label(format!("Role: {}", self.role_label));
        ui.separator();

        if !self.has_runtime() {
            ui.label("Offline");
        } else if self.session.channel().is_disconnected() {
            ui.colored_label(egui::Color32::RED, "Transport stopped");
        } else if self.snapshots_applied == 0 {
            ui.label("Waiting for server...");
        } else {
            ui.label(format!("Snapshots: {}", self.snapshots_applied));
        }
        ui.separator();

        let queued = self.session.channel().pending_outbound();
        if queued > 0 {
            ui.label(format!("Queued: {}", queued));
            ui.separator();
        }

        ui.label(format!(
            "Locations: {}  Pieces: {}",
            self.session.layout().location_count(),
            self.session.sprites().len()
        ));

        let status = match (self.session.selection(), &self.last_outcome) {
            (Selection::Dragging { piece_name, .. }, _) => format!("Dragging {}", piece_name),
            (
                Selection::Idle,
                Some(DropOutcome::Moved {
                    piece_name,
                    destination,
                }),
            ) => format!("Moved {} to {}", piece_name, destination),
            (Selection::Idle, Some(DropOutcome::RolledBack { piece_name })) => {
                format!("{} returned", piece_name)
            }
            (Selection::Idle, _) => String::new(),
        };
        if !status.is_empty() {
            ui.separator();
            ui.label(status);
        }
    }
}
