//! SVG reading.
//!
//! Only the subset a board layout needs is understood: the root extents,
//! `<rect>`, `<text>`/`<tspan>` and `<g>` with `translate(...)` transforms.
//! Everything else is skipped.

use super::{parse_number, Bounds, LayoutDocument, RectShape, Shape, Style, TextShape};
use crate::error::LayoutError;
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Attribute name → unescaped value, keyed by local name (namespace prefix dropped).
type Attributes = HashMap<String, String>;

/// A `<text>` element being collected until its end tag.
struct PendingText {
    id: Option<String>,
    x: Option<f32>,
    y: Option<f32>,
    text: String,
    style: Style,
    /// Element depth of the `<text>` start tag
    depth: usize,
}

/// Parses SVG source into a layout document.
pub(crate) fn parse_svg(source: &str) -> Result<LayoutDocument, LayoutError> {
    // Untrimmed, so spaces between tspans survive
    let mut reader = Reader::from_str(source);

    let mut extents: Option<(f32, f32, f32, f32)> = None;
    let mut shapes = Vec::new();
    // Accumulated translation for each open element
    let mut offsets: Vec<(f32, f32)> = Vec::new();
    let mut pending_text: Option<PendingText> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let attrs = read_attributes(&element)?;
                let parent = offsets.last().copied().unwrap_or((0.0, 0.0));
                let offset = compose_translate(parent, attrs.get("transform"));
                handle_element(
                    &element,
                    &attrs,
                    offset,
                    offsets.len(),
                    &mut extents,
                    &mut shapes,
                    &mut pending_text,
                );
                offsets.push(offset);
            }
            Event::Empty(element) => {
                let attrs = read_attributes(&element)?;
                let parent = offsets.last().copied().unwrap_or((0.0, 0.0));
                let offset = compose_translate(parent, attrs.get("transform"));
                handle_element(
                    &element,
                    &attrs,
                    offset,
                    offsets.len(),
                    &mut extents,
                    &mut shapes,
                    &mut pending_text,
                );
                // An empty <text/> has no end tag to close it
                if pending_text.as_ref().is_some_and(|t| t.depth == offsets.len()) {
                    if let Some(text) = pending_text.take() {
                        finish_text(text, &mut shapes);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(pending) = pending_text.as_mut() {
                    push_collapsed(&mut pending.text, &text.unescape()?);
                }
            }
            Event::End(_) => {
                offsets.pop();
                if pending_text.as_ref().is_some_and(|t| t.depth == offsets.len()) {
                    if let Some(text) = pending_text.take() {
                        finish_text(text, &mut shapes);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (min_x, min_y, width, height) = match extents {
        Some(extents) => extents,
        None => return Err(LayoutError::MissingRoot),
    };
    if width <= 0.0 || height <= 0.0 {
        return Err(LayoutError::MissingExtents);
    }

    // Normalise so the viewBox minimum is the layout origin
    if min_x != 0.0 || min_y != 0.0 {
        for shape in &mut shapes {
            match shape {
                Shape::Rect(rect) => {
                    rect.bounds.x -= min_x;
                    rect.bounds.y -= min_y;
                }
                Shape::Text(text) => {
                    text.x -= min_x;
                    text.y -= min_y;
                }
            }
        }
    }

    debug!(
        "Parsed layout {}x{} with {} shapes",
        width,
        height,
        shapes.len()
    );
    Ok(LayoutDocument {
        width,
        height,
        shapes,
    })
}

/// Dispatches one start or empty element.
fn handle_element(
    element: &BytesStart,
    attrs: &Attributes,
    offset: (f32, f32),
    depth: usize,
    extents: &mut Option<(f32, f32, f32, f32)>,
    shapes: &mut Vec<Shape>,
    pending_text: &mut Option<PendingText>,
) {
    match element.local_name().as_ref() {
        b"svg" if extents.is_none() => {
            *extents = Some(read_extents(attrs));
        }
        b"rect" => {
            let number = |key: &str| attrs.get(key).and_then(|v| parse_number(v));
            let (Some(width), Some(height)) = (number("width"), number("height")) else {
                warn!("Skipping <rect> without width/height (id {:?})", attrs.get("id"));
                return;
            };
            shapes.push(Shape::Rect(RectShape {
                id: attrs.get("id").cloned(),
                bounds: Bounds {
                    x: number("x").unwrap_or(0.0) + offset.0,
                    y: number("y").unwrap_or(0.0) + offset.1,
                    width,
                    height,
                },
                style: read_style(attrs),
            }));
        }
        b"text" => {
            let number = |key: &str| attrs.get(key).and_then(|v| parse_number(v));
            *pending_text = Some(PendingText {
                id: attrs.get("id").cloned(),
                x: number("x").map(|x| x + offset.0),
                y: number("y").map(|y| y + offset.1),
                text: String::new(),
                style: read_style(attrs),
                depth,
            });
        }
        b"tspan" => {
            if let Some(pending) = pending_text.as_mut() {
                let number = |key: &str| attrs.get(key).and_then(|v| parse_number(v));
                let tspan_y = number("y");
                // A tspan with its own y starts a new line
                if tspan_y.is_some() && !pending.text.trim().is_empty() {
                    pending.text.push('\n');
                }
                if pending.x.is_none() {
                    pending.x = number("x").map(|x| x + offset.0);
                }
                if pending.y.is_none() {
                    pending.y = tspan_y.map(|y| y + offset.1);
                }
                pending.style.inherit_missing(&read_style(attrs));
            }
        }
        _ => {}
    }
}

/// Appends SVG character data with every whitespace run collapsed to one space.
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

/// Pushes a completed text element, if it has an anchor point.
fn finish_text(pending: PendingText, shapes: &mut Vec<Shape>) {
    let text = pending
        .text
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    match (pending.x, pending.y) {
        (Some(x), Some(y)) => shapes.push(Shape::Text(TextShape {
            id: pending.id,
            x,
            y,
            text: text.trim().to_string(),
            style: pending.style,
        })),
        _ => warn!("Skipping <text> without a position: {:?}", pending.text),
    }
}

fn read_attributes(element: &BytesStart) -> Result<Attributes, LayoutError> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Presentation attributes first, then the `style` attribute on top.
fn read_style(attrs: &Attributes) -> Style {
    let mut style = Style::default();
    for key in [
        "fill",
        "stroke",
        "fill-opacity",
        "stroke-opacity",
        "stroke-width",
        "font-size",
    ] {
        if let Some(value) = attrs.get(key) {
            style.set(key, value);
        }
    }
    if let Some(declarations) = attrs.get("style") {
        style.apply_declarations(declarations);
    }
    style
}

/// Returns `(min_x, min_y, width, height)` from `viewBox`, falling back to
/// `width`/`height`. Missing values come back as zero extents.
fn read_extents(attrs: &Attributes) -> (f32, f32, f32, f32) {
    if let Some(view_box) = attrs.get("viewBox") {
        let values: Vec<f32> = view_box
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();
        if let [min_x, min_y, width, height] = values[..] {
            return (min_x, min_y, width, height);
        }
        warn!("Ignoring malformed viewBox {:?}", view_box);
    }
    let number = |key: &str| attrs.get(key).and_then(|v| parse_number(v));
    (
        0.0,
        0.0,
        number("width").unwrap_or(0.0),
        number("height").unwrap_or(0.0),
    )
}

/// Adds an element's own `translate(...)` to its parent's offset.
fn compose_translate(parent: (f32, f32), transform: Option<&String>) -> (f32, f32) {
    let Some(transform) = transform.map(|t| t.trim()) else {
        return parent;
    };
    let args = transform
        .strip_prefix("translate(")
        .and_then(|rest| rest.strip_suffix(')'));
    match args {
        Some(args) => {
            let mut values = args
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|part| !part.is_empty())
                .filter_map(|part| part.parse::<f32>().ok());
            let dx = values.next().unwrap_or(0.0);
            let dy = values.next().unwrap_or(0.0);
            (parent.0 + dx, parent.1 + dy)
        }
        None => {
            warn!("Unsupported transform {:?} ignored", transform);
            parent
        }
    }
}
