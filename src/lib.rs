//! PDF Form Filler Library
//!
//! Fills PDF form fields by drawing their values onto the page:
//! - `layout`: geometry, alignment and placement of text, images and checkmarks
//! - `form`: input records and the fill pass over a [`form::FormSurface`]
//! - `pdf`: PDFium-backed surface, field extraction and template stamping
//! - `server`: MCP tools `fill_form`, `extract_form_fields`, `fill_template_pages`

pub mod config;
pub mod error;
pub mod form;
pub mod layout;
pub mod pdf;
pub mod server;
pub mod source;

pub use config::FillConfig;
pub use error::{Error, Result};
pub use server::{
    run_server, run_server_with_config, ExtractFormFieldsParams, FillFormParams, FillFormResult,
    FillTemplatePagesParams, PdfFormServer, PdfSource, ServerConfig,
};
