//! PDF processing layer
//!
//! This module provides the PDFium form backend and qpdf page assembly.

mod document;
mod qpdf;

pub use document::{
    extract_form_fields, fill_form, fill_template_pages, parse_page_range, ExtractedField,
    FieldOption, PdfiumForm,
};
pub use qpdf::QpdfWrapper;
