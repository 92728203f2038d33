//! qpdf FFI wrapper for page assembly
//!
//! Stamped template copies are concatenated here using the qpdf crate
//! (vendored FFI).

use crate::error::{Error, Result};
use qpdf::QPdf;

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    match e.error_code() {
        qpdf::QPdfErrorCode::InvalidPassword => Error::PasswordRequired,
        _ => Error::QpdfError {
            reason: e.to_string(),
        },
    }
}

impl QpdfWrapper {
    /// Build one PDF from the first page of each input, in input order
    ///
    /// # Arguments
    /// * `inputs` - Raw bytes of each stamped document
    ///
    /// # Returns
    /// The assembled PDF as bytes
    pub fn merge_first_pages<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Vec<u8>> {
        if inputs.is_empty() {
            return Err(Error::QpdfError {
                reason: "No input PDFs provided".to_string(),
            });
        }

        let dest = QPdf::empty();

        for (i, input) in inputs.iter().enumerate() {
            let source = QPdf::read_from_memory(input.as_ref()).map_err(|e| Error::QpdfError {
                reason: format!("Failed to read stamped page {}: {}", i + 1, e),
            })?;

            let first = source.get_page(0).ok_or_else(|| Error::QpdfError {
                reason: format!("Stamped page {} has no pages", i + 1),
            })?;
            let copied = dest.copy_from_foreign(&first);
            dest.add_page(&copied, false).map_err(map_qpdf_error)?;
        }

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }
}
