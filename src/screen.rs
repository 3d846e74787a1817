//! Mapping between layout space and window space.
//!
//! The layout is scaled uniformly (aspect ratio preserved) to fit the window
//! and centered inside it. Both spaces are y-down, so the mapping is a plain
//! scale followed by a translation.

use crate::error::TransformError;
use crate::layout::Bounds;

/// Uniform-scale plus translate transform from layout space to window space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    /// Window x of the layout's top-left corner
    pub origin_x: f32,
    /// Window y of the layout's top-left corner
    pub origin_y: f32,
    /// Window pixels per layout unit (always > 0)
    pub ratio: f32,
}

/// A layout rectangle expressed in window space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Center x in window pixels
    pub center_x: f32,
    /// Center y in window pixels
    pub center_y: f32,
    /// Scaled width in window pixels
    pub width: f32,
    /// Scaled height in window pixels
    pub height: f32,
}

/// Computes the transform that fits a layout of the given extents into a
/// window, preserving aspect ratio and centering the result.
///
/// # Arguments
///
/// * `layout_width`, `layout_height` - Extents of the layout document
/// * `window_width`, `window_height` - Extents of the drawing surface in pixels
///
/// # Returns
///
/// The transform, or a [`TransformError`] if any extent is not positive.
pub fn compute_transform(
    layout_width: f32,
    layout_height: f32,
    window_width: f32,
    window_height: f32,
) -> Result<ScreenTransform, TransformError> {
    // `!(x > 0.0)` also rejects NaN
    if !(layout_width > 0.0) || !(layout_height > 0.0) {
        return Err(TransformError::InvalidLayoutExtents {
            width: layout_width,
            height: layout_height,
        });
    }
    if !(window_width > 0.0) || !(window_height > 0.0) {
        return Err(TransformError::InvalidWindowExtents {
            width: window_width,
            height: window_height,
        });
    }

    let ratio = (window_width / layout_width).min(window_height / layout_height);
    let origin_x = (window_width - layout_width * ratio) / 2.0;
    let origin_y = (window_height - layout_height * ratio) / 2.0;

    Ok(ScreenTransform {
        origin_x,
        origin_y,
        ratio,
    })
}

/// Converts a layout-space rectangle to its window-space center and size.
pub fn map_rect(bounds: &Bounds, transform: &ScreenTransform) -> ScreenRect {
    let (center_x, center_y) = map_point(
        bounds.x + bounds.width / 2.0,
        bounds.y + bounds.height / 2.0,
        transform,
    );
    ScreenRect {
        center_x,
        center_y,
        width: bounds.width * transform.ratio,
        height: bounds.height * transform.ratio,
    }
}

/// Maps a layout-space point into window space.
pub fn map_point(x: f32, y: f32, transform: &ScreenTransform) -> (f32, f32) {
    (
        transform.origin_x + x * transform.ratio,
        transform.origin_y + y * transform.ratio,
    )
}

/// Maps a window-space point back into layout space. Exact inverse of
/// [`map_point`].
pub fn unmap_point(screen_x: f32, screen_y: f32, transform: &ScreenTransform) -> (f32, f32) {
    (
        (screen_x - transform.origin_x) / transform.ratio,
        (screen_y - transform.origin_y) / transform.ratio,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_matching_aspect_has_no_letterbox() {
        let t = compute_transform(800.0, 600.0, 400.0, 300.0).unwrap();
        assert_eq!(t.ratio, 0.5);
        assert_eq!(t.origin_x, 0.0);
        assert_eq!(t.origin_y, 0.0);
    }

    #[test]
    fn test_wide_window_centers_horizontally() {
        let t = compute_transform(100.0, 100.0, 300.0, 100.0).unwrap();
        assert_eq!(t.ratio, 1.0);
        assert_eq!(t.origin_x, 100.0);
        assert_eq!(t.origin_y, 0.0);
    }

    #[test]
    fn test_tall_window_centers_vertically() {
        let t = compute_transform(200.0, 100.0, 100.0, 400.0).unwrap();
        assert_eq!(t.ratio, 0.5);
        assert_eq!(t.origin_x, 0.0);
        assert_eq!(t.origin_y, 175.0);
    }

    #[test]
    fn test_non_positive_extents_are_rejected() {
        assert!(matches!(
            compute_transform(0.0, 100.0, 100.0, 100.0),
            Err(TransformError::InvalidLayoutExtents { .. })
        ));
        assert!(matches!(
            compute_transform(100.0, 100.0, 100.0, -1.0),
            Err(TransformError::InvalidWindowExtents { .. })
        ));
        assert!(compute_transform(f32::NAN, 100.0, 100.0, 100.0).is_err());
    }

    #[test]
    fn test_point_round_trip() {
        let transforms = [
            compute_transform(800.0, 600.0, 400.0, 300.0).unwrap(),
            compute_transform(210.0, 297.0, 1024.0, 768.0).unwrap(),
            compute_transform(50.0, 20.0, 333.0, 999.0).unwrap(),
        ];
        let points = [(0.0, 0.0), (12.5, 7.25), (49.0, 19.0), (199.9, 296.1)];
        for t in &transforms {
            for &(x, y) in &points {
                let (sx, sy) = map_point(x, y, t);
                let (ux, uy) = unmap_point(sx, sy, t);
                assert!(approx(ux, x) && approx(uy, y), "{x},{y} -> {ux},{uy}");
            }
        }
    }

    #[test]
    fn test_map_rect_scales_and_centers() {
        let t = compute_transform(100.0, 100.0, 300.0, 100.0).unwrap();
        let r = map_rect(
            &Bounds {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0,
            },
            &t,
        );
        assert_eq!(r.center_x, 125.0);
        assert_eq!(r.center_y, 40.0);
        assert_eq!(r.width, 30.0);
        assert_eq!(r.height, 40.0);
    }
}
