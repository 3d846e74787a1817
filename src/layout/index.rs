//! Name lookup and hit-testing over a layout.

use super::{LayoutDocument, RectShape};
use crate::error::TransformError;
use crate::screen::{self, ScreenTransform};
use log::warn;
use std::collections::HashMap;

/// Owns a [`LayoutDocument`] and answers "where is location X" and "which
/// location is under this pixel".
#[derive(Debug, Clone)]
pub struct LayoutIndex {
    document: LayoutDocument,
    /// Location name → index into `document.shapes`
    by_name: HashMap<String, usize>,
}

impl LayoutIndex {
    /// Indexes every named rectangle of the document.
    ///
    /// When two rectangles share an id, the first in document order is the
    /// one addressed by name.
    pub fn new(document: LayoutDocument) -> Self {
        let mut by_name = HashMap::new();
        for (idx, shape) in document.shapes.iter().enumerate() {
            if let super::Shape::Rect(RectShape { id: Some(id), .. }) = shape {
                if by_name.contains_key(id) {
                    warn!("Duplicate location id {:?} in layout; keeping the first", id);
                    continue;
                }
                by_name.insert(id.clone(), idx);
            }
        }
        Self { document, by_name }
    }

    /// The indexed document.
    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    /// Transform fitting this layout into a window of the given size.
    pub fn transform_for(
        &self,
        window_width: f32,
        window_height: f32,
    ) -> Result<ScreenTransform, TransformError> {
        screen::compute_transform(
            self.document.width,
            self.document.height,
            window_width,
            window_height,
        )
    }

    /// Looks up a location by name. A miss is not an error; callers decide
    /// whether to log and skip.
    pub fn find_by_name(&self, name: &str) -> Option<&RectShape> {
        let idx = *self.by_name.get(name)?;
        match &self.document.shapes[idx] {
            super::Shape::Rect(rect) => Some(rect),
            super::Shape::Text(_) => None,
        }
    }

    /// Returns the named location under a window-space point.
    ///
    /// The point is mapped back into layout space and the first named
    /// rectangle in document order containing it wins. Unnamed rectangles
    /// (backgrounds, decoration) never match.
    pub fn hit_test(
        &self,
        screen_x: f32,
        screen_y: f32,
        transform: &ScreenTransform,
    ) -> Option<&RectShape> {
        let (x, y) = screen::unmap_point(screen_x, screen_y, transform);
        self.document
            .rects()
            .filter(|rect| rect.id.is_some())
            .find(|rect| rect.bounds.contains(x, y))
    }

    /// Number of addressable locations.
    pub fn location_count(&self) -> usize {
        self.by_name.len()
    }
}
