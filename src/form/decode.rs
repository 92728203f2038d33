//! Decoding of embedded data-URI images

use crate::error::{Error, Result};
use crate::layout::{DecodedImage, ImageDecoder};
use base64::Engine;

/// Decode the base64 payload of a data URI
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let engine = base64::engine::general_purpose::STANDARD;
    let bytes = engine
        .decode(payload.trim())
        .map_err(|e| Error::MalformedImagePayload {
            reason: format!("invalid base64: {}", e),
        })?;

    if bytes.is_empty() {
        return Err(Error::MalformedImagePayload {
            reason: "empty image payload".to_string(),
        });
    }

    Ok(bytes)
}

/// Decoder backed by the `image` crate, with a pixel budget
#[derive(Debug, Clone, Copy)]
pub struct RasterDecoder {
    max_pixels: u64,
}

impl RasterDecoder {
    pub fn new(max_pixels: u64) -> Self {
        Self { max_pixels }
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, media_type: &str, bytes: &[u8]) -> Result<DecodedImage> {
        // the bytes decide; the data-URI label is only a fallback
        let format = image::guess_format(bytes)
            .ok()
            .or_else(|| {
                image::ImageFormat::from_mime_type(format!("image/{}", media_type.to_lowercase()))
            })
            .ok_or_else(|| Error::MalformedImagePayload {
                reason: format!("unsupported image type: {}", media_type),
            })?;

        let pixels = image::load_from_memory_with_format(bytes, format).map_err(|e| {
            Error::MalformedImagePayload {
                reason: format!("failed to decode {} image: {}", media_type, e),
            }
        })?;

        let area = pixels.width() as u64 * pixels.height() as u64;
        if area > self.max_pixels {
            return Err(Error::ImageDimensionExceeded {
                detail: format!(
                    "{}x{} = {} pixels exceeds maximum of {}",
                    pixels.width(),
                    pixels.height(),
                    area,
                    self.max_pixels
                ),
            });
        }

        Ok(DecodedImage::new(pixels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let decoder = RasterDecoder::new(1_000_000);
        let decoded = decoder.decode("png", &png_bytes(20, 10)).unwrap();
        assert_eq!((decoded.width, decoded.height), (20, 10));
    }

    #[test]
    fn test_mislabelled_type_falls_back_to_sniffing() {
        let decoder = RasterDecoder::new(1_000_000);
        let decoded = decoder.decode("x-unknown", &png_bytes(4, 4)).unwrap();
        assert_eq!(decoded.width, 4);
    }

    #[test]
    fn test_jpeg_labelled_png_decodes() {
        let img = image::DynamicImage::new_rgb8(6, 3);
        let mut jpeg = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let decoder = RasterDecoder::new(1_000_000);
        let decoded = decoder.decode("png", &jpeg).unwrap();
        assert_eq!((decoded.width, decoded.height), (6, 3));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let decoder = RasterDecoder::new(1_000_000);
        let result = decoder.decode("png", b"definitely not a png");
        assert!(matches!(result, Err(Error::MalformedImagePayload { .. })));
    }

    #[test]
    fn test_pixel_budget() {
        let decoder = RasterDecoder::new(99);
        let result = decoder.decode("png", &png_bytes(10, 10));
        assert!(matches!(result, Err(Error::ImageDimensionExceeded { .. })));
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload("SGVsbG8=").unwrap(), b"Hello");
        assert!(matches!(
            decode_payload("***"),
            Err(Error::MalformedImagePayload { .. })
        ));
        assert!(matches!(
            decode_payload(""),
            Err(Error::MalformedImagePayload { .. })
        ));
    }
}
