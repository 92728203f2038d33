//! Classification of field values and render-strategy selection

use crate::layout::checkbox::CheckboxMark;
use crate::layout::image::{DecodedImage, ImagePlacement};
use crate::layout::text::TextPlacement;

const DATA_URI_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = "base64,";

/// Split `data:image/<type>;base64,<payload>` into `(type, payload)`.
///
/// The media type must be non-empty and free of `;`. The payload is returned
/// as is, possibly empty.
pub fn parse_data_uri(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix(DATA_URI_PREFIX)?;
    let (media_type, rest) = rest.split_once(';')?;
    if media_type.is_empty() {
        return None;
    }
    let payload = rest.strip_prefix(BASE64_MARKER)?;
    Some((media_type, payload))
}

/// What a field value holds, decided once per field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContent<'v> {
    /// Embedded data-URI image
    Image {
        media_type: &'v str,
        payload: &'v str,
    },
    /// Boolean value of a checkbox field
    Checkbox { checked: bool },
    /// Plain text, multi-line when it contains `\n`
    Text { text: &'v str, multiline: bool },
}

impl<'v> FieldContent<'v> {
    /// Classify a value. Image payloads win over the declared kind; then
    /// checkbox kinds; everything else is text.
    pub fn classify(value: &'v str, is_checkbox: bool) -> Self {
        if let Some((media_type, payload)) = parse_data_uri(value) {
            FieldContent::Image {
                media_type,
                payload,
            }
        } else if is_checkbox {
            FieldContent::Checkbox {
                checked: crate::layout::checkbox::is_truthy(value),
            }
        } else {
            FieldContent::Text {
                text: value,
                multiline: value.contains('\n'),
            }
        }
    }
}

/// How a field gets filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Scale-to-fit image inside the field box
    Image,
    /// Drawn checkmark
    Checkbox,
    /// One baseline
    SingleLineText,
    /// Stacked baselines
    MultiLineText,
    /// No geometry: write the interactive field's value instead of drawing
    SetFieldValue,
}

impl RenderStrategy {
    /// Pick the strategy for a classified value
    pub fn select(content: &FieldContent<'_>, geometry_available: bool) -> Self {
        if !geometry_available {
            return RenderStrategy::SetFieldValue;
        }
        match content {
            FieldContent::Image { .. } => RenderStrategy::Image,
            FieldContent::Checkbox { .. } => RenderStrategy::Checkbox,
            FieldContent::Text {
                multiline: false, ..
            } => RenderStrategy::SingleLineText,
            FieldContent::Text {
                multiline: true, ..
            } => RenderStrategy::MultiLineText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStrategy::Image => "image",
            RenderStrategy::Checkbox => "checkbox",
            RenderStrategy::SingleLineText => "single_line_text",
            RenderStrategy::MultiLineText => "multi_line_text",
            RenderStrategy::SetFieldValue => "set_field_value",
        }
    }
}

/// Drawing work for one field
#[derive(Debug, Clone)]
pub enum RenderInstruction {
    Text(TextPlacement),
    Image {
        placement: ImagePlacement,
        image: DecodedImage,
    },
    Checkbox(CheckboxMark),
}
