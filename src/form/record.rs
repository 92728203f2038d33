//! Input records for filling, as they arrive in JSON

use crate::layout::{Alignment, FieldGeometry};
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an interactive form field.
///
/// Accepts the snake_case names used by extraction, a few common spellings,
/// and the legacy integer codes 0..=7. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Unknown,
    PushButton,
    Checkbox,
    RadioButton,
    Text,
    ListBox,
    ComboBox,
    Signature,
    Other(String),
}

impl FieldKind {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "" | "none" | "unknown" => FieldKind::Unknown,
            "push_button" | "pushbutton" | "button" => FieldKind::PushButton,
            "checkbox" | "check_box" => FieldKind::Checkbox,
            "radio_button" | "radiobutton" | "radio" => FieldKind::RadioButton,
            "text" => FieldKind::Text,
            "list_box" | "listbox" | "list" => FieldKind::ListBox,
            "combo_box" | "combobox" | "combo" => FieldKind::ComboBox,
            "signature" => FieldKind::Signature,
            _ => FieldKind::Other(token.to_string()),
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => FieldKind::Unknown,
            1 => FieldKind::PushButton,
            2 => FieldKind::Checkbox,
            3 => FieldKind::RadioButton,
            4 => FieldKind::Text,
            5 => FieldKind::ListBox,
            6 => FieldKind::ComboBox,
            7 => FieldKind::Signature,
            other => FieldKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Unknown => "unknown",
            FieldKind::PushButton => "push_button",
            FieldKind::Checkbox => "checkbox",
            FieldKind::RadioButton => "radio_button",
            FieldKind::Text => "text",
            FieldKind::ListBox => "list_box",
            FieldKind::ComboBox => "combo_box",
            FieldKind::Signature => "signature",
            FieldKind::Other(token) => token,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::String(s) => Ok(FieldKind::from_token(s)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(FieldKind::from_code)
                .ok_or_else(|| serde::de::Error::custom("\"field_type\" code must be an integer")),
            _ => Err(serde::de::Error::custom(
                "\"field_type\" must be a string or an integer code",
            )),
        }
    }
}

/// Page numbers arrive as integers or as integral floats (`1.0`)
fn deserialize_page_number<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(Some(n as u32)),
        Some(n) => Err(serde::de::Error::custom(format!(
            "\"page_number\" must be a positive integer, got {}",
            n
        ))),
    }
}

/// One field to fill
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormFieldRecord {
    /// Field name as it appears in the PDF
    pub name: String,
    /// Value to fill: text, a `data:image/<type>;base64,...` URI, or a checkbox token
    #[serde(default)]
    pub value: Option<String>,
    /// Field kind (text, checkbox, ...). Checkbox values are drawn as checkmarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub field_type: Option<FieldKind>,
    /// Alignment code 0..=8 (0 top-left, 4 center, 8 bottom-right). Defaults to bottom-left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<i64>,
    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f32>,
    /// Page number (1-indexed). Without it the field is located in the PDF by name.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_page_number"
    )]
    pub page_number: Option<u32>,
    /// Tab order as reported by extraction (not used for filling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_order: Option<u32>,
}

impl FormFieldRecord {
    pub fn geometry(&self) -> FieldGeometry {
        FieldGeometry {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            width: self.width,
            height: self.height,
        }
    }

    /// Explicit target size for images, when both dimensions are given
    pub fn target_size(&self) -> Option<(f32, f32)> {
        self.width.zip(self.height)
    }

    pub fn is_checkbox(&self) -> bool {
        matches!(self.field_type, Some(FieldKind::Checkbox))
    }

    /// Decoded alignment, plus the raw code when it was not recognized
    pub fn alignment(&self) -> (Alignment, Option<i64>) {
        match self.text_align {
            None => (Alignment::default(), None),
            Some(code) => match Alignment::from_code(code) {
                Some(alignment) => (alignment, None),
                None => (Alignment::default(), Some(code)),
            },
        }
    }
}

/// A name/value pair written straight into an interactive field
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldValue {
    /// Field name as it appears in the template
    pub name: String,
    /// Value to set
    #[serde(default)]
    pub value: Option<String>,
}

/// Values for one output page stamped from a template
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageFields {
    /// Output page number; must be unique across the list
    pub page_number: u32,
    /// Fields to set on this page
    pub fields: Vec<FieldValue>,
}

/// Parse a JSON array of field records
pub fn parse_records(json: &str) -> crate::Result<Vec<FormFieldRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a JSON array of template pages
pub fn parse_pages(json: &str) -> crate::Result<Vec<PageFields>> {
    Ok(serde_json::from_str(json)?)
}
