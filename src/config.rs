//! Fill configuration and layout calibration values

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Font size used when a record does not carry one
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Line pitch as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Baseline drop (in font sizes) below the box midpoint for center alignment
pub const CENTER_BASELINE_OFFSET: f32 = 0.3;

/// Extra lift (in font sizes) applied to bottom-aligned multi-line text
pub const MULTILINE_BOTTOM_LIFT: f32 = 0.3;

/// Checkmark half-extent as a fraction of the shorter box side
pub const CHECK_MARK_SCALE: f32 = 0.3;

/// Stroke width of checkbox borders and marks, in points
pub const BORDER_WIDTH: f32 = 1.0;

/// Default pixel budget for embedded images
pub const DEFAULT_MAX_IMAGE_PIXELS: u64 = 100_000_000;

/// How single-line text is vertically centered.
///
/// Two formulas exist in practice: a baseline dropped by a fraction of the
/// font size below the box midpoint, and the plain midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalCentering {
    /// `y = bottom + height/2 - center_baseline_offset * font_size`
    BaselineOffset,
    /// `y = bottom + height/2`
    Midpoint,
}

/// Who is responsible for shifting centered/right-aligned glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalPlacement {
    /// The layout engine measures the text and returns the glyph start
    PreMeasured,
    /// The layout engine returns the anchor edge; the sink aligns the glyphs
    SinkAligned,
}

/// Numeric calibration of the layout engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub line_height_factor: f32,
    pub vertical_centering: VerticalCentering,
    pub center_baseline_offset: f32,
    pub multiline_bottom_lift: f32,
    pub check_mark_scale: f32,
    pub border_width: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            line_height_factor: LINE_HEIGHT_FACTOR,
            vertical_centering: VerticalCentering::BaselineOffset,
            center_baseline_offset: CENTER_BASELINE_OFFSET,
            multiline_bottom_lift: MULTILINE_BOTTOM_LIFT,
            check_mark_scale: CHECK_MARK_SCALE,
            border_width: BORDER_WIDTH,
        }
    }
}

/// Configuration for a fill pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Font size for records without `font_size`
    pub default_font_size: f32,
    /// Horizontal text placement mode
    pub horizontal_placement: HorizontalPlacement,
    /// Flatten remaining form fields into page content after filling
    pub flatten: bool,
    /// Maximum pixel area of an embedded image (width * height)
    pub max_image_pixels: u64,
    /// Layout calibration values
    pub calibration: Calibration,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
            horizontal_placement: HorizontalPlacement::PreMeasured,
            flatten: true,
            max_image_pixels: DEFAULT_MAX_IMAGE_PIXELS,
            calibration: Calibration::default(),
        }
    }
}

impl FillConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
