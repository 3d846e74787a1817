//! Turning placements into on-screen sprites.
//!
//! Placements are processed in snapshot order. When a piece lands on a
//! location that already holds pieces, every earlier occupant is pushed right
//! by [`OCCUPANT_OFFSET`](crate::constants::OCCUPANT_OFFSET) and the newcomer
//! takes the unshifted center. With pieces `[P1, P2, P3]` on one location the
//! final offsets are `+30, +15, 0`.

use crate::constants::OCCUPANT_OFFSET;
use crate::images::{ImageLookup, ImageRef};
use crate::layout::LayoutIndex;
use crate::protocol::PlacementEntry;
use crate::screen::{self, ScreenTransform};
use log::{debug, warn};
use std::collections::HashMap;

/// A piece drawn on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSprite {
    /// Name of the piece this sprite shows
    pub piece_name: String,
    /// Image the sprite is drawn with
    pub image: ImageRef,
    /// Center x in window pixels
    pub center_x: f32,
    /// Center y in window pixels
    pub center_y: f32,
    /// Drawn width in window pixels
    pub width: f32,
    /// Drawn height in window pixels
    pub height: f32,
}

impl RenderedSprite {
    /// Whether the window-space point is over this sprite (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (x - self.center_x).abs() <= self.width / 2.0
            && (y - self.center_y).abs() <= self.height / 2.0
    }

    /// Current center.
    pub fn position(&self) -> (f32, f32) {
        (self.center_x, self.center_y)
    }

    /// Moves the center.
    pub fn set_position(&mut self, (x, y): (f32, f32)) {
        self.center_x = x;
        self.center_y = y;
    }
}

/// Builds a fresh sprite list for the given placements.
///
/// Entries whose location is not in the layout, or whose piece has no image,
/// are skipped with a warning; the rest are still placed. The output is in
/// placement order, which is also draw order.
///
/// # Arguments
///
/// * `entries` - Placements in snapshot order
/// * `layout` - Named locations
/// * `images` - Image lookup for piece names
/// * `transform` - Current layout to window transform
pub fn resolve_placements(
    entries: &[PlacementEntry],
    layout: &LayoutIndex,
    images: &dyn ImageLookup,
    transform: &ScreenTransform,
) -> Vec<RenderedSprite> {
    let mut sprites: Vec<RenderedSprite> = Vec::with_capacity(entries.len());
    // Location name → indices into `sprites` placed there so far
    let mut occupants: HashMap<&str, Vec<usize>> = HashMap::new();

    for entry in entries {
        debug!("Placing {} at {}", entry.name, entry.location);

        let Some(rect) = layout.find_by_name(&entry.location) else {
            warn!(
                "Can't find location named {} to place {}.",
                entry.location, entry.name
            );
            continue;
        };
        let Some(image) = images.lookup_image(&entry.name) else {
            warn!(
                "Can't find image for {} at {}, so can't create sprite.",
                entry.name, entry.location
            );
            continue;
        };

        let base = screen::map_rect(&rect.bounds, transform);
        let sprite = RenderedSprite {
            piece_name: entry.name.clone(),
            width: image.width * transform.ratio,
            height: image.height * transform.ratio,
            image,
            center_x: base.center_x,
            center_y: base.center_y,
        };

        let here = occupants.entry(entry.location.as_str()).or_default();
        for &idx in here.iter() {
            sprites[idx].center_x += OCCUPANT_OFFSET;
        }
        here.push(sprites.len());
        debug!(
            "Placed {} located at {} at ({}, {})",
            sprite.piece_name, entry.location, sprite.center_x, sprite.center_y
        );
        sprites.push(sprite);
    }

    sprites
}
