//! Drawing the board layout and pieces.
//!
//! Layout shapes are drawn in document order, then sprites in placement
//! order so later pieces cover earlier ones.

use super::state::BoardApp;
use crate::constants::{DEFAULT_LABEL_FONT_SIZE, LABEL_FONT_SCALE};
use crate::layout::{Rgba, Shape};
use crate::occupancy::RenderedSprite;
use crate::screen;
use crate::text::substitute;
use eframe::egui;

/// Background behind the board.
pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(255, 239, 213);

fn color(rgba: Rgba) -> egui::Color32 {
    let [r, g, b, a] = rgba;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

impl BoardApp {
    /// Renders the layout and all sprites.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context, used to upload sprite textures
    /// * `painter` - Painter clipped to the canvas
    pub fn render_board(&mut self, ctx: &egui::Context, painter: &egui::Painter) {
        self.draw_layout(painter);

        let sprites: Vec<RenderedSprite> = self.session.sprites().to_vec();
        for sprite in &sprites {
            self.draw_sprite(ctx, painter, sprite);
        }
    }

    /// Draws rectangles (fill then outline) and substituted text labels.
    fn draw_layout(&self, painter: &egui::Painter) {
        let transform = *self.session.transform();
        let document = self.session.state().document();

        for shape in &self.session.layout().document().shapes {
            match shape {
                Shape::Rect(rect) => {
                    let mapped = screen::map_rect(&rect.bounds, &transform);
                    let screen_rect = egui::Rect::from_center_size(
                        self.to_screen((mapped.center_x, mapped.center_y)),
                        egui::vec2(mapped.width, mapped.height),
                    );
                    if let Some(fill) = rect.style.fill_rgba() {
                        painter.rect_filled(screen_rect, 0.0, color(fill));
                    }
                    if let Some(stroke) = rect.style.stroke_rgba() {
                        let width = rect.style.stroke_width.unwrap_or(1.0) * transform.ratio;
                        painter.rect_stroke(
                            screen_rect,
                            0.0,
                            egui::Stroke::new(width, color(stroke)),
                            egui::StrokeKind::Middle,
                        );
                    }
                }
                Shape::Text(label) => {
                    let pos = self.to_screen(screen::map_point(label.x, label.y, &transform));
                    let size = label.style.font_size_px().unwrap_or(DEFAULT_LABEL_FONT_SIZE)
                        * LABEL_FONT_SCALE
                        * transform.ratio;
                    let text_color = label
                        .style
                        .fill_rgba()
                        .map(color)
                        .unwrap_or(egui::Color32::BLACK);
                    painter.text(
                        pos,
                        egui::Align2::LEFT_BOTTOM,
                        substitute(&label.text, document),
                        egui::FontId::proportional(size.max(1.0)),
                        text_color,
                    );
                }
            }
        }
    }

    /// Draws one sprite, or a labelled placeholder if its image can't be rendered.
    fn draw_sprite(&mut self, ctx: &egui::Context, painter: &egui::Painter, sprite: &RenderedSprite) {
        let rect = egui::Rect::from_center_size(
            self.to_screen(sprite.position()),
            egui::vec2(sprite.width, sprite.height),
        );
        match self
            .textures
            .get(ctx, &sprite.image.path, sprite.width, sprite.height)
        {
            Some(texture) => {
                painter.image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                painter.rect_filled(rect, 4.0, egui::Color32::from_gray(90));
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    &sprite.piece_name,
                    egui::FontId::proportional((sprite.height / 4.0).clamp(6.0, 14.0)),
                    egui::Color32::WHITE,
                );
            }
        }
    }
}
