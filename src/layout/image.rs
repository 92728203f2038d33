//! Scale-to-fit image placement

use crate::error::{Error, Result};
use crate::layout::geometry::FieldBox;

/// Raster content with its intrinsic size
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: image::DynamicImage,
}

impl DecodedImage {
    pub fn new(pixels: image::DynamicImage) -> Self {
        Self {
            width: pixels.width(),
            height: pixels.height(),
            pixels,
        }
    }
}

/// Turns encoded image bytes into pixels
pub trait ImageDecoder {
    fn decode(&self, media_type: &str, bytes: &[u8]) -> Result<DecodedImage>;
}

/// Where and how large an image is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit an image of `intrinsic` size into `target` (defaults to the box size),
/// preserving aspect ratio, and center it in the box.
///
/// The image is scaled up as well as down. The lower-left corner sits at
/// `left + (tw - sw)/2`, `bottom + (th - sh)/2`.
pub fn place_image(
    field_box: &FieldBox,
    target: Option<(f32, f32)>,
    intrinsic: (u32, u32),
) -> Result<ImagePlacement> {
    let (target_width, target_height) = target.unwrap_or((field_box.width, field_box.height));

    if field_box.is_empty() || target_width <= 0.0 || target_height <= 0.0 {
        return Err(Error::InvalidGeometry {
            reason: format!(
                "image target {}x{} in box {}x{} has no area",
                target_width, target_height, field_box.width, field_box.height
            ),
        });
    }

    let (image_width, image_height) = intrinsic;
    if image_width == 0 || image_height == 0 {
        return Err(Error::MalformedImagePayload {
            reason: format!("decoded image is {}x{}", image_width, image_height),
        });
    }

    let scale = (target_width / image_width as f32).min(target_height / image_height as f32);
    let width = image_width as f32 * scale;
    let height = image_height as f32 * scale;

    Ok(ImagePlacement {
        x: field_box.left + (target_width - width) / 2.0,
        y: field_box.bottom() + (target_height - height) / 2.0,
        width,
        height,
    })
}
