//! Sprite image lookup.
//!
//! Pieces are drawn from SVG sprites. The lookup maps a piece name to an
//! image file and its native size; rasterising happens in the UI.

use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An image a piece can be drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Path of the SVG sprite
    pub path: PathBuf,
    /// Native width in pixels
    pub width: f32,
    /// Native height in pixels
    pub height: f32,
}

/// Resolves the image for a piece. Pure: no side effects, and a miss is a
/// plain `None`.
pub trait ImageLookup {
    /// Returns the image to draw `piece_name` with, if any.
    fn lookup_image(&self, piece_name: &str) -> Option<ImageRef>;
}

impl ImageLookup for HashMap<String, ImageRef> {
    fn lookup_image(&self, piece_name: &str) -> Option<ImageRef> {
        self.get(piece_name).cloned()
    }
}

/// Sprite catalog built from a directory of `.svg` files.
///
/// A piece named `red_pawn_3` resolves to `red_pawn_3.svg` if present,
/// otherwise to `red_pawn.svg`, so numbered copies of a piece share art.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    /// File stem → image
    images: HashMap<String, ImageRef>,
}

impl ImageCatalog {
    /// Scans `dir` for SVG sprites, reading each one's native size.
    ///
    /// Files that fail to parse are logged and skipped; only an unreadable
    /// directory is an error.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let options = usvg::Options::default();
        let mut catalog = Self::default();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("svg") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };
            let data = match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Failed to read sprite {}: {}", path.display(), e);
                    continue;
                }
            };
            match usvg::Tree::from_data(&data, &options) {
                Ok(tree) => {
                    let size = tree.size();
                    debug!("Sprite {} is {}x{}", stem, size.width(), size.height());
                    catalog.insert(
                        stem,
                        ImageRef {
                            path,
                            width: size.width(),
                            height: size.height(),
                        },
                    );
                }
                Err(e) => warn!("Failed to parse sprite {}: {}", path.display(), e),
            }
        }
        Ok(catalog)
    }

    /// Adds or replaces an image under a file stem.
    pub fn insert(&mut self, stem: impl Into<String>, image: ImageRef) {
        self.images.insert(stem.into(), image);
    }

    /// Number of known sprites.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageLookup for ImageCatalog {
    fn lookup_image(&self, piece_name: &str) -> Option<ImageRef> {
        if let Some(image) = self.images.get(piece_name) {
            return Some(image.clone());
        }
        self.images.get(base_name(piece_name)?).cloned()
    }
}

/// Strips a trailing `_<digits>` copy number: `red_pawn_3` → `red_pawn`.
fn base_name(piece_name: &str) -> Option<&str> {
    let (base, suffix) = piece_name.rsplit_once('_')?;
    (!base.is_empty() && !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .then_some(base)
}
