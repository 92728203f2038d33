//! Capabilities a document must offer to be filled

use crate::error::Result;
use crate::layout::{DecodedImage, FieldBox, ImagePlacement, LinePlacement, Point, Rect};

/// Where a named field lives in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPosition {
    /// Page number (1-indexed)
    pub page: u32,
    pub field_box: FieldBox,
}

/// Paint of a rectangle primitive. Gray levels run from 0 (black) to 1 (white).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RectStyle {
    Fill { gray: f32 },
    Stroke { gray: f32, width: f32 },
}

/// Drawing primitives on a page, in PDF user space
pub trait DrawingSink {
    /// Draw one line of text. Sinks honour `line.sink_align` by shifting the
    /// glyphs so that `line.x` is the left edge, center or right edge.
    fn draw_text(&mut self, page: u32, line: &LinePlacement, font_size: f32) -> Result<()>;

    fn draw_image(
        &mut self,
        page: u32,
        placement: &ImagePlacement,
        image: &DecodedImage,
    ) -> Result<()>;

    fn draw_rect(&mut self, page: u32, rect: &Rect, style: RectStyle) -> Result<()>;

    /// Stroke an open polyline in black
    fn draw_path(&mut self, page: u32, points: &[Point], stroke_width: f32) -> Result<()>;
}

/// A fillable document: drawing plus access to its interactive fields
pub trait FormSurface: DrawingSink {
    /// Number of pages in the document
    fn page_count(&self) -> u32;

    /// Locate a field by name
    fn field_position(&self, name: &str) -> Option<FieldPosition>;

    /// Write a value through the interactive-field API
    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()>;

    /// Remove every widget of a field, on every page, so drawn content is not
    /// covered by it. Returns whether a widget was found.
    fn remove_field(&mut self, name: &str) -> Result<bool>;
}
