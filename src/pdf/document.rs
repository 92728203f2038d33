//! PDFium-backed form documents

use crate::config::FillConfig;
use crate::error::{Error, Result};
use crate::form::{
    DrawingSink, FieldKind, FieldPosition, FillReport, FormFieldRecord, FormFiller, FormSurface,
    PageFields, RasterDecoder, RectStyle, SkippedField,
};
use crate::layout::{
    is_truthy, DecodedImage, FieldBox, HorizontalAnchor, ImagePlacement, LinePlacement, Point,
    Rect, StandardFontMetrics, TextMetrics,
};
use crate::pdf::qpdf::QpdfWrapper;
use pdfium_render::prelude::*;
use rmcp::schemars::JsonSchema;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
pub(crate) fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

fn check_pdf_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    data: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>> {
    check_pdf_header(data)?;
    pdfium
        .load_pdf_from_byte_slice(data, password)
        .map_err(map_pdfium_error)
}

/// Gray level (0 black, 1 white) as an opaque color
fn gray_color(gray: f32) -> PdfColor {
    let level = (gray.clamp(0.0, 1.0) * 255.0).round() as u8;
    PdfColor::new(level, level, level, 255)
}

fn field_kind(field: &PdfFormField) -> FieldKind {
    if field.as_text_field().is_some() {
        FieldKind::Text
    } else if field.as_checkbox_field().is_some() {
        FieldKind::Checkbox
    } else if field.as_radio_button_field().is_some() {
        FieldKind::RadioButton
    } else if field.as_combo_box_field().is_some() {
        FieldKind::ComboBox
    } else if field.as_list_box_field().is_some() {
        FieldKind::ListBox
    } else if field.as_push_button_field().is_some() {
        FieldKind::PushButton
    } else if field.as_signature_field().is_some() {
        FieldKind::Signature
    } else {
        FieldKind::Unknown
    }
}

/// Choice offered by a list or combo box
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FieldOption {
    pub label: Option<String>,
    pub is_selected: bool,
}

/// One widget found in a document. Serializes with the same keys the fill
/// input uses, so extraction output can be edited and fed back.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExtractedField {
    pub name: String,
    #[schemars(with = "String")]
    pub field_type: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    /// Page number (1-indexed)
    pub page_number: u32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
    /// 1-based position of the widget among its page's annotations
    pub tab_order: u32,
}

impl ExtractedField {
    fn position(&self) -> FieldPosition {
        FieldPosition {
            page: self.page_number,
            field_box: FieldBox::from_edges(self.left, self.bottom, self.right, self.top),
        }
    }
}

macro_rules! field_options {
    ($options:expr) => {{
        let options = $options;
        let mut collected = Vec::new();
        for i in 0..options.len() {
            if let Ok(opt) = options.get(i) {
                collected.push(FieldOption {
                    label: opt.label().cloned(),
                    is_selected: opt.is_set(),
                });
            }
        }
        (!collected.is_empty()).then_some(collected)
    }};
}

/// Walk the widgets of the given pages (all pages when `None`)
fn collect_fields(
    document: &PdfDocument,
    page_numbers: Option<&[u32]>,
) -> Result<Vec<ExtractedField>> {
    let pages = document.pages();
    let page_count = pages.len() as u32;

    let selected: Vec<u32> = match page_numbers {
        Some(nums) => nums
            .iter()
            .filter(|&&n| n >= 1 && n <= page_count)
            .copied()
            .collect(),
        None => (1..=page_count).collect(),
    };

    let mut fields = Vec::new();

    for page_number in selected {
        let page = pages
            .get((page_number - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page_number, e),
            })?;

        for (index, annotation) in page.annotations().iter().enumerate() {
            let Some(field) = annotation.as_form_field() else {
                continue;
            };
            let Some(name) = field.name() else {
                continue;
            };
            let bounds = match annotation.bounds() {
                Ok(bounds) => bounds,
                Err(e) => {
                    tracing::warn!(field = %name, page = page_number, error = %e, "widget has no bounds");
                    continue;
                }
            };

            let field_type = field_kind(field);
            let (value, is_checked, options) = if let Some(text) = field.as_text_field() {
                (text.value(), None, None)
            } else if let Some(checkbox) = field.as_checkbox_field() {
                (None, checkbox.is_checked().ok(), None)
            } else if let Some(radio) = field.as_radio_button_field() {
                (None, radio.is_checked().ok(), None)
            } else if let Some(combo) = field.as_combo_box_field() {
                (None, None, field_options!(combo.options()))
            } else if let Some(list) = field.as_list_box_field() {
                (None, None, field_options!(list.options()))
            } else {
                (None, None, None)
            };

            let (left, bottom) = (bounds.left().value, bounds.bottom().value);
            let (right, top) = (bounds.right().value, bounds.top().value);

            fields.push(ExtractedField {
                name,
                field_type,
                value,
                is_checked,
                options,
                page_number,
                left,
                right,
                top,
                bottom,
                width: (right - left).max(0.0),
                height: (top - bottom).max(0.0),
                tab_order: index as u32 + 1,
            });
        }
    }

    Ok(fields)
}

fn write_field_value(field: &mut PdfFormField, name: &str, value: &str) -> Result<()> {
    let failed = |e: PdfiumError| Error::Pdfium {
        reason: format!("Failed to set value of {}: {}", name, e),
    };

    if let Some(text) = field.as_text_field_mut() {
        text.set_value(value).map_err(failed)
    } else if let Some(checkbox) = field.as_checkbox_field_mut() {
        checkbox.set_checked(is_truthy(value)).map_err(failed)
    } else if let Some(radio) = field.as_radio_button_field_mut() {
        if is_truthy(value) {
            radio.set_checked().map_err(failed)
        } else {
            Ok(())
        }
    } else {
        Err(Error::UnsupportedFieldType {
            name: name.to_string(),
            field_type: field_kind(field).to_string(),
        })
    }
}

/// A loaded document exposed as a [`FormSurface`].
///
/// Text is drawn in Times-Roman; widths for sink-side alignment come from the
/// built-in metrics so they agree with what the planner measured.
pub struct PdfiumForm<'a> {
    document: PdfDocument<'a>,
    font: PdfFontToken,
    metrics: StandardFontMetrics,
    fields: HashMap<String, FieldPosition>,
}

impl<'a> PdfiumForm<'a> {
    pub fn new(mut document: PdfDocument<'a>) -> Result<Self> {
        let font = document.fonts_mut().times_roman();

        let mut fields = HashMap::new();
        for field in collect_fields(&document, None)? {
            // first widget wins for fields with several widgets
            fields.entry(field.name.clone()).or_insert_with(|| field.position());
        }

        Ok(Self {
            document,
            font,
            metrics: StandardFontMetrics::times_roman(),
            fields,
        })
    }

    fn page(&self, page: u32) -> Result<PdfPage<'a>> {
        let total = self.page_count();
        if page < 1 || page > total {
            return Err(Error::PageOutOfBounds { page, total });
        }
        self.document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page, e),
            })
    }

    /// Bake remaining widgets into page content
    pub fn flatten(&mut self) -> Result<()> {
        for page_number in 1..=self.page_count() {
            let mut page = self.page(page_number)?;
            page.flatten().map_err(|e| Error::Pdfium {
                reason: format!("Failed to flatten page {}: {}", page_number, e),
            })?;
        }
        Ok(())
    }

    pub fn save(self) -> Result<Vec<u8>> {
        self.document.save_to_bytes().map_err(|e| Error::Pdfium {
            reason: format!("Failed to save PDF: {}", e),
        })
    }
}

impl DrawingSink for PdfiumForm<'_> {
    fn draw_text(&mut self, page: u32, line: &LinePlacement, font_size: f32) -> Result<()> {
        let shift = match line.sink_align {
            HorizontalAnchor::Left => 0.0,
            HorizontalAnchor::Center => self.metrics.measure_width(&line.text, font_size) / 2.0,
            HorizontalAnchor::Right => self.metrics.measure_width(&line.text, font_size),
        };

        let mut pdf_page = self.page(page)?;
        pdf_page
            .objects_mut()
            .create_text_object(
                PdfPoints::new(line.x - shift),
                PdfPoints::new(line.y),
                &line.text,
                self.font,
                PdfPoints::new(font_size),
            )
            .map_err(map_pdfium_error)?;
        Ok(())
    }

    fn draw_image(
        &mut self,
        page: u32,
        placement: &ImagePlacement,
        image: &DecodedImage,
    ) -> Result<()> {
        let mut pdf_page = self.page(page)?;
        pdf_page
            .objects_mut()
            .create_image_object(
                PdfPoints::new(placement.x),
                PdfPoints::new(placement.y),
                &image.pixels,
                Some(PdfPoints::new(placement.width)),
                Some(PdfPoints::new(placement.height)),
            )
            .map_err(map_pdfium_error)?;
        Ok(())
    }

    fn draw_rect(&mut self, page: u32, rect: &Rect, style: RectStyle) -> Result<()> {
        let bounds = PdfRect::new_from_values(
            rect.y,
            rect.x,
            rect.y + rect.height,
            rect.x + rect.width,
        );
        let (stroke, width, fill) = match style {
            RectStyle::Fill { gray } => (None, None, Some(gray_color(gray))),
            RectStyle::Stroke { gray, width } => {
                (Some(gray_color(gray)), Some(PdfPoints::new(width)), None)
            }
        };

        let mut pdf_page = self.page(page)?;
        pdf_page
            .objects_mut()
            .create_path_object_rect(bounds, stroke, width, fill)
            .map_err(map_pdfium_error)?;
        Ok(())
    }

    fn draw_path(&mut self, page: u32, points: &[Point], stroke_width: f32) -> Result<()> {
        let mut pdf_page = self.page(page)?;
        for segment in points.windows(2) {
            pdf_page
                .objects_mut()
                .create_path_object_line(
                    PdfPoints::new(segment[0].x),
                    PdfPoints::new(segment[0].y),
                    PdfPoints::new(segment[1].x),
                    PdfPoints::new(segment[1].y),
                    PdfColor::BLACK,
                    PdfPoints::new(stroke_width),
                )
                .map_err(map_pdfium_error)?;
        }
        Ok(())
    }
}

impl FormSurface for PdfiumForm<'_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn field_position(&self, name: &str) -> Option<FieldPosition> {
        self.fields.get(name).copied()
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()> {
        // scan the annotations directly: widgets without usable bounds are
        // absent from `self.fields` but still writable
        for page_number in 1..=self.page_count() {
            let page = self.page(page_number)?;
            for mut annotation in page.annotations().iter() {
                let Some(field) = annotation.as_form_field_mut() else {
                    continue;
                };
                if field.name().as_deref() == Some(name) {
                    return write_field_value(field, name, value);
                }
            }
        }

        Err(Error::FieldNotFound {
            name: name.to_string(),
        })
    }

    fn remove_field(&mut self, name: &str) -> Result<bool> {
        let mut removed = false;

        for page_number in 1..=self.page_count() {
            let mut page = self.page(page_number)?;
            while let Some(index) = page.annotations().iter().position(|annotation| {
                annotation.as_form_field().and_then(|f| f.name()).as_deref() == Some(name)
            }) {
                let annotation = page.annotations().get(index).map_err(map_pdfium_error)?;
                page.annotations_mut()
                    .delete_annotation(annotation)
                    .map_err(map_pdfium_error)?;
                removed = true;
            }
        }

        self.fields.remove(name);
        Ok(removed)
    }
}

/// Fill `records` into the PDF in `data` and return the new PDF bytes
pub fn fill_form(
    data: &[u8],
    password: Option<&str>,
    records: &[FormFieldRecord],
    config: &FillConfig,
) -> Result<(Vec<u8>, FillReport)> {
    if records.is_empty() {
        return Err(Error::EmptyFieldList);
    }
    check_pdf_header(data)?;

    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;
    let mut form = PdfiumForm::new(document)?;

    let filler = FormFiller::new(
        config,
        StandardFontMetrics::times_roman(),
        RasterDecoder::new(config.max_image_pixels),
    );
    let report = filler.fill(records, &mut form)?;

    if config.flatten {
        form.flatten()?;
    }
    let output = form.save()?;

    tracing::info!(
        filled = report.fields_filled,
        skipped = report.fields_skipped.len(),
        warnings = report.warnings.len(),
        "form filled"
    );

    Ok((output, report))
}

/// List the form fields of a PDF, sorted by tab order. `pages` is a range
/// such as `"1-3,5"`; all pages when `None`.
pub fn extract_form_fields(
    data: &[u8],
    password: Option<&str>,
    pages: Option<&str>,
) -> Result<Vec<ExtractedField>> {
    check_pdf_header(data)?;

    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;

    let page_numbers = pages
        .map(|range| parse_page_range(range, document.pages().len() as u32))
        .transpose()?;

    let mut fields = collect_fields(&document, page_numbers.as_deref())?;
    fields.sort_by_key(|f| f.tab_order);

    Ok(fields)
}

/// Stamp one copy of the template per entry, set its fields, flatten it and
/// concatenate the first page of every copy.
pub fn fill_template_pages(
    template: &[u8],
    password: Option<&str>,
    pages: &[PageFields],
) -> Result<(Vec<u8>, FillReport)> {
    check_pdf_header(template)?;
    if pages.is_empty() {
        return Err(Error::EmptyFieldList);
    }

    let mut seen = HashSet::new();
    for entry in pages {
        if !seen.insert(entry.page_number) {
            return Err(Error::InvalidInput {
                reason: format!("page {} appears more than once", entry.page_number),
            });
        }
    }

    let pdfium = create_pdfium()?;
    let mut report = FillReport::default();
    let mut stamped = Vec::with_capacity(pages.len());

    for entry in pages {
        let document = load_document(&pdfium, template, password)?;
        let mut form = PdfiumForm::new(document)?;

        for field in &entry.fields {
            let Some(value) = field.value.as_deref() else {
                report.fields_skipped.push(SkippedField {
                    name: field.name.clone(),
                    reason: format!("page {}: No value provided", entry.page_number),
                });
                continue;
            };

            match form.set_field_value(&field.name, value) {
                Ok(()) => report.fields_filled += 1,
                Err(e) if e.is_field_local() => {
                    tracing::warn!(field = %field.name, page = entry.page_number, error = %e, "skipping field");
                    report.fields_skipped.push(SkippedField {
                        name: field.name.clone(),
                        reason: format!("page {}: {}", entry.page_number, e),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        form.flatten()?;
        stamped.push(form.save()?);
    }

    let output = QpdfWrapper::merge_first_pages(&stamped)?;

    tracing::info!(
        pages = stamped.len(),
        filled = report.fields_filled,
        skipped = report.fields_skipped.len(),
        "template pages filled"
    );

    Ok((output, report))
}

/// Parse page range string (e.g., "1-5,10,15-20") into sorted, unique page numbers
pub fn parse_page_range(range: &str, max_pages: u32) -> Result<Vec<u32>> {
    let invalid = || Error::InvalidPageRange {
        range: range.to_string(),
    };
    let page_number = |s: &str| -> Result<u32> {
        let n: u32 = s.trim().parse().map_err(|_| invalid())?;
        if n < 1 || n > max_pages {
            return Err(invalid());
        }
        Ok(n)
    };

    let mut pages = Vec::new();

    for part in range.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (page_number(start)?, page_number(end)?);
                if start > end {
                    return Err(invalid());
                }
                pages.extend(start..=end);
            }
            None => pages.push(page_number(part)?),
        }
    }

    pages.sort_unstable();
    pages.dedup();

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldValue;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn load_fixture(name: &str) -> Vec<u8> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(name);
        std::fs::read(path).unwrap()
    }

    // PDFium is not thread-safe
    static PDFIUM_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    /// PDFium is bound at runtime; these tests need the shared library
    macro_rules! pdfium_or_skip {
        () => {
            match create_pdfium() {
                Ok(pdfium) => pdfium,
                Err(e) => {
                    eprintln!("skipping: {}", e);
                    return;
                }
            }
        };
    }

    fn field_names(data: &[u8]) -> Vec<String> {
        extract_form_fields(data, None, None)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect()
    }

    fn page(page_number: u32) -> PageFields {
        PageFields {
            page_number,
            fields: vec![FieldValue {
                name: "1".to_string(),
                value: Some("ACME".to_string()),
            }],
        }
    }

    #[test]
    fn test_invalid_pdf_detection() {
        let records = vec![FormFieldRecord {
            name: "a".to_string(),
            value: Some("b".to_string()),
            ..FormFieldRecord::default()
        }];
        let result = fill_form(b"not a pdf", None, &records, &FillConfig::default());
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));

        let result = extract_form_fields(b"%PD", None, None);
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[test]
    fn test_empty_records_rejected_before_loading() {
        let result = fill_form(b"not a pdf", None, &[], &FillConfig::default());
        assert!(matches!(result, Err(Error::EmptyFieldList)));
    }

    #[test]
    fn test_template_pages_validation() {
        let result = fill_template_pages(b"%PDF-1.7\n", None, &[]);
        assert!(matches!(result, Err(Error::EmptyFieldList)));

        let result = fill_template_pages(b"%PDF-1.7\n", None, &[page(1), page(2), page(1)]);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = fill_template_pages(b"plain text", None, &[page(1)]);
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    fn channels(color: PdfColor) -> (u8, u8, u8, u8) {
        (color.red(), color.green(), color.blue(), color.alpha())
    }

    #[test]
    fn test_gray_color() {
        assert_eq!(channels(gray_color(1.0)), (255, 255, 255, 255));
        assert_eq!(channels(gray_color(0.0)), (0, 0, 0, 255));
        assert_eq!(channels(gray_color(0.5)), (128, 128, 128, 255));
        assert_eq!(channels(gray_color(2.0)), (255, 255, 255, 255));
    }

    #[test]
    fn test_parse_page_range() {
        assert_eq!(parse_page_range("1-3", 10).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_page_range("1,3,5", 10).unwrap(), vec![1, 3, 5]);
        assert_eq!(
            parse_page_range("7-9, 5,1-3", 10).unwrap(),
            vec![1, 2, 3, 5, 7, 8, 9]
        );
        assert_eq!(parse_page_range("2,1,2", 10).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_parse_page_range_invalid() {
        assert!(parse_page_range("0-3", 10).is_err());
        assert!(parse_page_range("1-15", 10).is_err());
        assert!(parse_page_range("5-3", 10).is_err());
        assert!(parse_page_range("abc", 10).is_err());
    }

    #[test]
    fn test_remove_field_deletes_widgets_on_every_page() {
        let _guard = PDFIUM_LOCK.lock();
        let output = {
            let pdfium = pdfium_or_skip!();
            let data = load_fixture("repeated.pdf");
            let document = load_document(&pdfium, &data, None).unwrap();
            let mut form = PdfiumForm::new(document).unwrap();
            assert_eq!(form.field_position("hdr").map(|p| p.page), Some(1));

            assert!(form.remove_field("hdr").unwrap());
            assert_eq!(form.field_position("hdr"), None);
            assert!(!form.remove_field("hdr").unwrap());
            form.save().unwrap()
        };

        assert_eq!(field_names(&output), vec!["date".to_string()]);
    }

    #[test]
    fn test_set_field_value_writes_text_and_checkbox() {
        let _guard = PDFIUM_LOCK.lock();
        let output = {
            let pdfium = pdfium_or_skip!();
            let data = load_fixture("template.pdf");
            let document = load_document(&pdfium, &data, None).unwrap();
            let mut form = PdfiumForm::new(document).unwrap();

            form.set_field_value("company", "ACME").unwrap();
            form.set_field_value("paid", " Yes ").unwrap();
            assert!(matches!(
                form.set_field_value("missing", "x"),
                Err(Error::FieldNotFound { .. })
            ));
            form.save().unwrap()
        };

        let fields = extract_form_fields(&output, None, None).unwrap();
        let company = fields.iter().find(|f| f.name == "company").unwrap();
        assert_eq!(company.value.as_deref(), Some("ACME"));
        let paid = fields.iter().find(|f| f.name == "paid").unwrap();
        assert_eq!(paid.field_type, FieldKind::Checkbox);
        assert_eq!(paid.is_checked, Some(true));
    }
}
