//! Field layout engine
//!
//! Pure placement math: given a field box, an alignment, font metrics and a
//! value, compute where text baselines, images and checkmarks go. Nothing in
//! here touches a PDF.

pub mod alignment;
pub mod checkbox;
pub mod geometry;
pub mod image;
pub mod metrics;
pub mod strategy;
pub mod text;

pub use alignment::{Alignment, HorizontalAnchor, VerticalAnchor};
pub use checkbox::{checkbox_mark, is_truthy, CheckboxMark};
pub use geometry::{FieldBox, FieldGeometry, Point, Rect, ResolvedGeometry};
pub use self::image::{place_image, DecodedImage, ImageDecoder, ImagePlacement};
pub use metrics::{StandardFontMetrics, TextMetrics};
pub use strategy::{parse_data_uri, FieldContent, RenderInstruction, RenderStrategy};
pub use text::{LinePlacement, TextLayout, TextPlacement};
