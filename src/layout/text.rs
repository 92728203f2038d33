//! Single-line and multi-line text placement
//!
//! Coordinates are baseline origins in PDF user space. Vertical rules:
//! - Top: first baseline one font size below the top edge
//! - Center: calibrated baseline below the midpoint (or the plain midpoint)
//! - Bottom: baseline on the bottom edge (multi-line text is lifted slightly)

use crate::config::{Calibration, HorizontalPlacement, VerticalCentering};
use crate::layout::alignment::{Alignment, HorizontalAnchor, VerticalAnchor};
use crate::layout::geometry::FieldBox;
use crate::layout::metrics::TextMetrics;

/// One line of text ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlacement {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Alignment the sink must apply around `x`. `Left` when `x` is already
    /// the glyph start.
    pub sink_align: HorizontalAnchor,
}

/// All lines of a text field
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub lines: Vec<LinePlacement>,
    pub font_size: f32,
    pub line_height: f32,
    /// `lines.len() * line_height`
    pub total_height: f32,
}

/// Text layout parameters shared by every line of a field
pub struct TextLayout<'a, M: TextMetrics + ?Sized> {
    pub field_box: FieldBox,
    pub alignment: Alignment,
    pub font_size: f32,
    pub placement: HorizontalPlacement,
    pub calibration: &'a Calibration,
    pub metrics: &'a M,
}

impl<'a, M: TextMetrics + ?Sized> TextLayout<'a, M> {
    /// Horizontal origin and sink tag for one line
    fn line_x(&self, text: &str) -> (f32, HorizontalAnchor) {
        let b = &self.field_box;
        let anchor = self.alignment.horizontal();

        match self.placement {
            HorizontalPlacement::SinkAligned => {
                let x = match anchor {
                    HorizontalAnchor::Left => b.left,
                    HorizontalAnchor::Center => b.left + b.width / 2.0,
                    HorizontalAnchor::Right => b.right(),
                };
                (x, anchor)
            }
            HorizontalPlacement::PreMeasured => {
                let x = match anchor {
                    HorizontalAnchor::Left => b.left,
                    HorizontalAnchor::Center => {
                        let text_width = self.metrics.measure_width(text, self.font_size);
                        b.left + (b.width - text_width) / 2.0
                    }
                    HorizontalAnchor::Right => {
                        let text_width = self.metrics.measure_width(text, self.font_size);
                        b.right() - text_width
                    }
                };
                (x, HorizontalAnchor::Left)
            }
        }
    }

    fn single_line_y(&self) -> f32 {
        let b = &self.field_box;
        match self.alignment.vertical() {
            VerticalAnchor::Top => b.top - self.font_size,
            VerticalAnchor::Center => match self.calibration.vertical_centering {
                VerticalCentering::BaselineOffset => {
                    b.bottom() + b.height / 2.0
                        - self.calibration.center_baseline_offset * self.font_size
                }
                VerticalCentering::Midpoint => b.bottom() + b.height / 2.0,
            },
            VerticalAnchor::Bottom => b.bottom(),
        }
    }

    fn line_height(&self) -> f32 {
        self.font_size * self.calibration.line_height_factor
    }

    /// Place a single line of text
    pub fn place_line(&self, text: &str) -> LinePlacement {
        let (x, sink_align) = self.line_x(text);
        LinePlacement {
            text: text.to_string(),
            x,
            y: self.single_line_y(),
            sink_align,
        }
    }

    /// Baseline of the first line of a block of `line_count` lines
    pub fn block_start_y(&self, line_count: usize) -> f32 {
        let b = &self.field_box;
        let line_height = self.line_height();
        let total_height = line_count as f32 * line_height;

        match self.alignment.vertical() {
            VerticalAnchor::Top => b.top - self.font_size,
            VerticalAnchor::Center => b.bottom() + (b.height + total_height) / 2.0 - line_height,
            VerticalAnchor::Bottom => {
                b.bottom() + total_height - line_height
                    + self.calibration.multiline_bottom_lift * self.font_size
            }
        }
    }

    /// Place text split on `\n`, one baseline per line
    pub fn place_lines(&self, text: &str) -> TextPlacement {
        let lines: Vec<&str> = text.split('\n').collect();
        let line_height = self.line_height();
        let start_y = self.block_start_y(lines.len());

        let placed = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let (x, sink_align) = self.line_x(line);
                LinePlacement {
                    text: (*line).to_string(),
                    x,
                    y: start_y - i as f32 * line_height,
                    sink_align,
                }
            })
            .collect::<Vec<_>>();

        TextPlacement {
            total_height: placed.len() as f32 * line_height,
            lines: placed,
            font_size: self.font_size,
            line_height,
        }
    }

    /// [`Self::place_line`] wrapped as a one-line block
    pub fn place_single(&self, text: &str) -> TextPlacement {
        let line_height = self.line_height();
        TextPlacement {
            lines: vec![self.place_line(text)],
            font_size: self.font_size,
            line_height,
            total_height: line_height,
        }
    }

    /// Place `text`, choosing the multi-line rules when it contains a newline
    pub fn place(&self, text: &str) -> TextPlacement {
        if text.contains('\n') {
            self.place_lines(text)
        } else {
            self.place_single(text)
        }
    }
}
