//! Sprite rasterisation and texture caching.
//!
//! Sprites are SVG files rendered with `resvg` at the exact pixel size they
//! are drawn at, then uploaded as egui textures. Textures are cached per
//! (file, pixel size); the cache is cleared whenever the window is resized.

use eframe::egui;
use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache key: sprite path and pixel size.
type TextureKey = (PathBuf, u32, u32);

/// Texture cache for sprite images.
#[derive(Default)]
pub struct SpriteTextures {
    /// Loaded textures; `None` marks a sprite that failed to rasterise
    cache: HashMap<TextureKey, Option<egui::TextureHandle>>,
    /// System fonts, loaded on first use
    fontdb: Option<Arc<fontdb::Database>>,
}

impl SpriteTextures {
    /// Returns the texture for `path` at `width`x`height` pixels, rendering
    /// it on first request. Failures are logged once and cached.
    pub fn get(
        &mut self,
        ctx: &egui::Context,
        path: &Path,
        width: f32,
        height: f32,
    ) -> Option<&egui::TextureHandle> {
        let w = width.round().max(1.0) as u32;
        let h = height.round().max(1.0) as u32;
        let key = (path.to_path_buf(), w, h);

        if !self.cache.contains_key(&key) {
            let fontdb = self
                .fontdb
                .get_or_insert_with(|| {
                    let mut db = fontdb::Database::new();
                    db.load_system_fonts();
                    Arc::new(db)
                })
                .clone();
            let texture = match rasterize_svg(path, w, h, fontdb) {
                Ok(image) => Some(ctx.load_texture(
                    path.display().to_string(),
                    image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    warn!("Failed to render sprite {}: {}", path.display(), e);
                    None
                }
            };
            self.cache.insert(key.clone(), texture);
        }

        self.cache.get(&key).and_then(Option::as_ref)
    }

    /// Drops every cached texture.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Renders an SVG file into an image of exactly `width`x`height` pixels.
pub fn rasterize_svg(
    path: &Path,
    width: u32,
    height: u32,
    fontdb: Arc<fontdb::Database>,
) -> Result<egui::ColorImage, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;

    let mut opt = usvg::Options::default();
    opt.fontdb = fontdb;
    opt.resources_dir = path.parent().map(Path::to_path_buf);
    let tree = usvg::Tree::from_data(&data, &opt).map_err(|e| e.to_string())?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| format!("Failed to create pixmap {}x{}", width, height))?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    let mut pmut = pixmap.as_mut();
    resvg::render(&tree, transform, &mut pmut);

    Ok(egui::ColorImage::from_rgba_premultiplied(
        [width as usize, height as usize],
        pixmap.data(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_fills_requested_size() {
        let path = std::env::temp_dir().join(format!("board_view_{}.svg", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##,
        )
        .unwrap();

        let image = rasterize_svg(&path, 20, 20, Arc::new(fontdb::Database::new())).unwrap();
        assert_eq!(image.size, [20, 20]);
        let center = image.pixels[10 * 20 + 10];
        assert_eq!(center, egui::Color32::from_rgb(255, 0, 0));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = rasterize_svg(
            Path::new("/no/such/sprite.svg"),
            8,
            8,
            Arc::new(fontdb::Database::new()),
        );
        assert!(result.is_err());
    }
}
