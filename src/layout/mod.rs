//! Layout document model.
//!
//! A layout is read once at session start from an SVG file and is read-only
//! afterwards. Rectangles with an `id` are the named locations pieces can
//! occupy; text elements are labels drawn over the board.
//!
//! # Module Organization
//!
//! - `parse` - Reading SVG source into a [`LayoutDocument`]
//! - `index` - Name lookup and hit-testing over a document

mod index;
mod parse;

pub use index::LayoutIndex;

use crate::error::LayoutError;
use std::path::Path;

/// RGBA colour with 8 bits per channel.
pub type Rgba = [u8; 4];

/// Axis-aligned rectangle in layout space (top-left origin, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Bounds {
    /// Returns `true` if the layout-space point lies inside (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Presentation properties of a shape.
///
/// Colours are kept as written in the source (`#RRGGBB`, `none`, ...) and only
/// turned into RGBA on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// `fill` paint
    pub fill: Option<String>,
    /// `stroke` paint
    pub stroke: Option<String>,
    /// `fill-opacity` in [0, 1]
    pub fill_opacity: Option<f32>,
    /// `stroke-opacity` in [0, 1]
    pub stroke_opacity: Option<f32>,
    /// `stroke-width` in layout units
    pub stroke_width: Option<f32>,
    /// `font-size` as written, e.g. `"4.2333px"`
    pub font_size: Option<String>,
}

impl Style {
    /// Sets a single property by its SVG name. Unknown properties and
    /// unparsable numbers are ignored.
    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key.trim() {
            "fill" => self.fill = Some(value.to_string()),
            "stroke" => self.stroke = Some(value.to_string()),
            "fill-opacity" => self.fill_opacity = parse_number(value),
            "stroke-opacity" => self.stroke_opacity = parse_number(value),
            "stroke-width" => self.stroke_width = parse_number(value),
            "font-size" => self.font_size = Some(value.to_string()),
            _ => {}
        }
    }

    /// Applies a CSS-like declaration list such as `fill:#ff0000;stroke:none`.
    pub fn apply_declarations(&mut self, declarations: &str) {
        for declaration in declarations.split(';') {
            if let Some((key, value)) = declaration.split_once(':') {
                self.set(key, value);
            }
        }
    }

    /// Fills in every property this style lacks from `other`.
    pub fn inherit_missing(&mut self, other: &Style) {
        if self.fill.is_none() {
            self.fill = other.fill.clone();
        }
        if self.stroke.is_none() {
            self.stroke = other.stroke.clone();
        }
        if self.fill_opacity.is_none() {
            self.fill_opacity = other.fill_opacity;
        }
        if self.stroke_opacity.is_none() {
            self.stroke_opacity = other.stroke_opacity;
        }
        if self.stroke_width.is_none() {
            self.stroke_width = other.stroke_width;
        }
        if self.font_size.is_none() {
            self.font_size = other.font_size.clone();
        }
    }

    /// Fill colour combined with `fill-opacity`, if the fill is a hex colour.
    pub fn fill_rgba(&self) -> Option<Rgba> {
        resolve_color(self.fill.as_deref()?, self.fill_opacity)
    }

    /// Stroke colour combined with `stroke-opacity`, if the stroke is a hex colour.
    pub fn stroke_rgba(&self) -> Option<Rgba> {
        resolve_color(self.stroke.as_deref()?, self.stroke_opacity)
    }

    /// Numeric part of `font-size` (the unit suffix is dropped).
    pub fn font_size_px(&self) -> Option<f32> {
        parse_number(self.font_size.as_deref()?)
    }
}

/// Combines a `#RRGGBB` colour with an optional opacity in [0, 1].
///
/// Alpha is `opacity * 255` truncated; without an opacity the colour is opaque.
/// Returns `None` for anything that is not a six digit hex colour.
pub fn resolve_color(hex: &str, opacity: Option<f32>) -> Option<Rgba> {
    let digits = hex.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let alpha = match opacity {
        Some(opacity) => (opacity.clamp(0.0, 1.0) * 255.0) as u8,
        None => 255,
    };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

/// Parses the leading number of a length such as `"12px"` or `"0.26"`.
pub(crate) fn parse_number(value: &str) -> Option<f32> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0))
        })
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// A rectangle in the layout. Named rectangles are board locations.
#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    /// Location name; unique across the document when present
    pub id: Option<String>,
    /// Geometry in layout space
    pub bounds: Bounds,
    /// Presentation properties
    pub style: Style,
}

/// A text label anchored at its baseline start point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    /// Element id, if any
    pub id: Option<String>,
    /// Baseline start x in layout space
    pub x: f32,
    /// Baseline y in layout space
    pub y: f32,
    /// Literal text, possibly containing `{path}` substitution tokens
    pub text: String,
    /// Presentation properties
    pub style: Style,
}

/// Drawable element of a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A rectangle
    Rect(RectShape),
    /// A text label
    Text(TextShape),
}

/// Parsed layout: extents plus shapes in document order.
///
/// Document order matters: it is the draw order and the hit-test priority.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDocument {
    /// Layout-space width
    pub width: f32,
    /// Layout-space height
    pub height: f32,
    /// Shapes in source order
    pub shapes: Vec<Shape>,
}

impl LayoutDocument {
    /// Parses a layout from SVG source text.
    pub fn from_svg_str(source: &str) -> Result<Self, LayoutError> {
        parse::parse_svg(source)
    }

    /// Reads and parses a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_svg_str(&source)
    }

    /// Iterates the rectangles in document order.
    pub fn rects(&self) -> impl Iterator<Item = &RectShape> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Rect(rect) => Some(rect),
            Shape::Text(_) => None,
        })
    }
}
