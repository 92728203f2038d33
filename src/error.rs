//! Error types for PDF Form Filler

use thiserror::Error;

/// Result type alias for PDF Form Filler
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PDF Form Filler
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Invalid page range
    #[error("Invalid page range: {range}")]
    InvalidPageRange { range: String },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// The input contained no fields (or no pages) to fill
    #[error("No form fields provided")]
    EmptyFieldList,

    /// Input was structurally valid JSON but semantically unusable
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A data URI image could not be decoded
    #[error("Malformed image payload: {reason}")]
    MalformedImagePayload { reason: String },

    /// Field geometry cannot hold the requested content
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Named field does not exist in the document
    #[error("Field not found in PDF: {name}")]
    FieldNotFound { name: String },

    /// Field exists but its kind cannot take a value
    #[error("Unsupported field type for writing: {name} ({field_type})")]
    UnsupportedFieldType { name: String, field_type: String },

    /// Cache key not found
    #[error("Cache key not found: {key}")]
    CacheKeyNotFound { key: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// qpdf error
    #[error("qpdf error: {reason}")]
    QpdfError { reason: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Decoded image exceeds the configured pixel budget
    #[error("Image dimension exceeded: {detail}")]
    ImageDimensionExceeded { detail: String },
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::InvalidPageRange { range } => format!("Invalid page range: {}", range),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::EmptyFieldList => "No form fields provided".to_string(),
            Error::InvalidInput { reason } => format!("Invalid input: {}", reason),
            Error::MalformedImagePayload { .. } => "Malformed image payload".to_string(),
            Error::InvalidGeometry { reason } => format!("Invalid geometry: {}", reason),
            Error::FieldNotFound { name } => format!("Field not found in PDF: {}", name),
            Error::UnsupportedFieldType { name, .. } => {
                format!("Unsupported field type for writing: {}", name)
            }
            Error::CacheKeyNotFound { .. } => "Cache key not found".to_string(),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::QpdfError { .. } => "PDF processing error".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::ImageDimensionExceeded { detail } => {
                format!("Image dimension exceeded: {}", detail)
            }
        }
    }

    /// Whether this error only affects a single field and processing may continue.
    pub fn is_field_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedImagePayload { .. }
                | Error::InvalidGeometry { .. }
                | Error::FieldNotFound { .. }
                | Error::UnsupportedFieldType { .. }
                | Error::ImageDimensionExceeded { .. }
                | Error::PageOutOfBounds { .. }
                | Error::Base64Decode(_)
                | Error::Pdfium { .. }
        )
    }
}
