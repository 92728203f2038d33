//! Per-field planning and the fill pass

use crate::config::FillConfig;
use crate::error::{Error, Result};
use crate::form::decode::decode_payload;
use crate::form::record::FormFieldRecord;
use crate::form::surface::{FieldPosition, FormSurface, RectStyle};
use crate::layout::{
    checkbox_mark, place_image, FieldContent, ImageDecoder, RenderInstruction, RenderStrategy,
    TextLayout, TextMetrics,
};
use rmcp::schemars::JsonSchema;
use serde::Serialize;

/// What to do with one field
#[derive(Debug, Clone)]
pub enum FieldPlan {
    /// Remove the widget and draw the instruction on `page`
    Draw {
        page: u32,
        instruction: RenderInstruction,
    },
    /// Remove the widget and draw nothing (unchecked checkbox)
    Clear { page: u32 },
    /// No geometry: set the interactive field's value
    SetValue { value: String },
}

/// Degraded-but-continued conditions
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// Dimensions absent from the record were taken as 0
    MissingGeometry { dimensions: Vec<String> },
    /// `text_align` code outside 0..=8, bottom-left used instead
    UnsupportedAlignment { code: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FieldWarning {
    pub name: String,
    #[serde(flatten)]
    pub kind: WarningKind,
}

/// A field that could not be filled
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SkippedField {
    pub name: String,
    pub reason: String,
}

/// Outcome of a fill pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    pub fields_filled: u32,
    pub fields_skipped: Vec<SkippedField>,
    pub warnings: Vec<FieldWarning>,
}

impl FillReport {
    fn skip(&mut self, name: &str, reason: impl Into<String>) {
        self.fields_skipped.push(SkippedField {
            name: name.to_string(),
            reason: reason.into(),
        });
    }
}

/// A planned field with the strategy that produced it
#[derive(Debug, Clone)]
pub struct PlannedField {
    pub strategy: RenderStrategy,
    pub plan: FieldPlan,
    pub warnings: Vec<FieldWarning>,
}

/// Plans and applies fields against a [`FormSurface`]
pub struct FormFiller<'a, M: TextMetrics, D: ImageDecoder> {
    config: &'a FillConfig,
    metrics: M,
    decoder: D,
}

impl<'a, M: TextMetrics, D: ImageDecoder> FormFiller<'a, M, D> {
    pub fn new(config: &'a FillConfig, metrics: M, decoder: D) -> Self {
        Self {
            config,
            metrics,
            decoder,
        }
    }

    /// Plan one record. `located` is the field's position in the document,
    /// used when the record carries no page number. Returns `None` for
    /// records without a value.
    pub fn plan_field(
        &self,
        record: &FormFieldRecord,
        located: Option<FieldPosition>,
    ) -> Result<Option<PlannedField>> {
        let Some(value) = record.value.as_deref() else {
            return Ok(None);
        };

        let mut warnings = Vec::new();

        let (alignment, unsupported) = record.alignment();
        if let Some(code) = unsupported {
            warnings.push(FieldWarning {
                name: record.name.clone(),
                kind: WarningKind::UnsupportedAlignment { code },
            });
        }

        let position = match record.page_number {
            Some(page) => {
                let resolved = record.geometry().resolve();
                if !resolved.is_complete() {
                    warnings.push(FieldWarning {
                        name: record.name.clone(),
                        kind: WarningKind::MissingGeometry {
                            dimensions: resolved.missing.iter().map(|d| d.to_string()).collect(),
                        },
                    });
                }
                Some(FieldPosition {
                    page,
                    field_box: resolved.field_box,
                })
            }
            None => located,
        };

        let content = FieldContent::classify(value, record.is_checkbox());
        let strategy = RenderStrategy::select(&content, position.is_some());

        let Some(FieldPosition { page, field_box }) = position else {
            return Ok(Some(PlannedField {
                strategy,
                plan: FieldPlan::SetValue {
                    value: value.to_string(),
                },
                warnings,
            }));
        };

        let plan = match content {
            FieldContent::Image {
                media_type,
                payload,
            } => {
                let bytes = decode_payload(payload)?;
                let image = self.decoder.decode(media_type, &bytes)?;
                let placement =
                    place_image(&field_box, record.target_size(), (image.width, image.height))?;
                FieldPlan::Draw {
                    page,
                    instruction: RenderInstruction::Image { placement, image },
                }
            }
            FieldContent::Checkbox { checked: false } => FieldPlan::Clear { page },
            FieldContent::Checkbox { checked: true } => FieldPlan::Draw {
                page,
                instruction: RenderInstruction::Checkbox(checkbox_mark(
                    &field_box,
                    &self.config.calibration,
                )),
            },
            FieldContent::Text { text, multiline } => {
                let layout = TextLayout {
                    field_box,
                    alignment,
                    font_size: record.font_size.unwrap_or(self.config.default_font_size),
                    placement: self.config.horizontal_placement,
                    calibration: &self.config.calibration,
                    metrics: &self.metrics,
                };
                let placement = if multiline {
                    layout.place_lines(text)
                } else {
                    layout.place_single(text)
                };
                FieldPlan::Draw {
                    page,
                    instruction: RenderInstruction::Text(placement),
                }
            }
        };

        Ok(Some(PlannedField {
            strategy,
            plan,
            warnings,
        }))
    }

    /// Fill every record in input order. One field's failure never stops the
    /// others; only an empty list or a document-level error fails the pass.
    pub fn fill<S: FormSurface>(
        &self,
        records: &[FormFieldRecord],
        surface: &mut S,
    ) -> Result<FillReport> {
        if records.is_empty() {
            return Err(Error::EmptyFieldList);
        }

        let mut report = FillReport::default();

        for record in records {
            let located = match record.page_number {
                Some(_) => None,
                None => surface.field_position(&record.name),
            };

            let planned = match self.plan_field(record, located) {
                Ok(Some(planned)) => planned,
                Ok(None) => {
                    report.skip(&record.name, "No value provided");
                    continue;
                }
                Err(e) if e.is_field_local() => {
                    tracing::warn!(field = %record.name, error = %e, "skipping field");
                    report.skip(&record.name, e.to_string());
                    continue;
                }
                Err(e) => return Err(e),
            };

            for warning in &planned.warnings {
                tracing::warn!(field = %warning.name, warning = ?warning.kind, "degraded field");
            }
            report.warnings.extend(planned.warnings);

            tracing::debug!(field = %record.name, strategy = planned.strategy.as_str(), "filling field");

            match Self::apply(&record.name, &planned.plan, surface) {
                Ok(()) => report.fields_filled += 1,
                Err(e) if e.is_field_local() => {
                    tracing::warn!(field = %record.name, error = %e, "failed to fill field");
                    report.skip(&record.name, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Carry out one plan. A drawn field's widget is removed only once every
    /// primitive is on the page; when a primitive fails the widget stays and
    /// primitives already drawn are left in place.
    fn apply<S: FormSurface>(name: &str, plan: &FieldPlan, surface: &mut S) -> Result<()> {
        match plan {
            FieldPlan::SetValue { value } => surface.set_field_value(name, value),
            FieldPlan::Clear { page } => {
                Self::check_page(*page, surface)?;
                surface.remove_field(name)?;
                Ok(())
            }
            FieldPlan::Draw { page, instruction } => {
                let page = *page;
                Self::check_page(page, surface)?;

                match instruction {
                    RenderInstruction::Text(text) => {
                        for line in &text.lines {
                            surface.draw_text(page, line, text.font_size)?;
                        }
                    }
                    RenderInstruction::Image { placement, image } => {
                        surface.draw_image(page, placement, image)?;
                    }
                    RenderInstruction::Checkbox(mark) => {
                        surface.draw_rect(page, &mark.fill, RectStyle::Fill { gray: 1.0 })?;
                        surface.draw_rect(
                            page,
                            &mark.border,
                            RectStyle::Stroke {
                                gray: 0.0,
                                width: mark.border_width,
                            },
                        )?;
                        surface.draw_path(page, &mark.mark, mark.border_width)?;
                    }
                }
                surface.remove_field(name)?;
                Ok(())
            }
        }
    }

    fn check_page<S: FormSurface>(page: u32, surface: &S) -> Result<()> {
        let total = surface.page_count();
        if page < 1 || page > total {
            return Err(Error::PageOutOfBounds { page, total });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::decode::RasterDecoder;
    use crate::form::surface::DrawingSink;
    use crate::layout::{
        DecodedImage, FieldBox, ImagePlacement, LinePlacement, Point, Rect,
    };
    use base64::Engine;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Text(u32, String, f32, f32),
        Image(u32, ImagePlacement),
        Rect(u32, Rect, RectStyle),
        Path(u32, Vec<Point>),
        Remove(String),
        Set(String, String),
    }

    #[derive(Default)]
    struct Recorder {
        pages: u32,
        fields: HashMap<String, FieldPosition>,
        /// Fields that can be written but have no position
        unplaced: Vec<String>,
        fail_paths: bool,
        ops: Vec<Op>,
    }

    impl DrawingSink for Recorder {
        fn draw_text(&mut self, page: u32, line: &LinePlacement, _font_size: f32) -> Result<()> {
            self.ops
                .push(Op::Text(page, line.text.clone(), line.x, line.y));
            Ok(())
        }

        fn draw_image(
            &mut self,
            page: u32,
            placement: &ImagePlacement,
            _image: &DecodedImage,
        ) -> Result<()> {
            self.ops.push(Op::Image(page, *placement));
            Ok(())
        }

        fn draw_rect(&mut self, page: u32, rect: &Rect, style: RectStyle) -> Result<()> {
            self.ops.push(Op::Rect(page, *rect, style));
            Ok(())
        }

        fn draw_path(&mut self, page: u32, points: &[Point], _stroke_width: f32) -> Result<()> {
            if self.fail_paths {
                return Err(Error::Pdfium {
                    reason: "path rejected".to_string(),
                });
            }
            self.ops.push(Op::Path(page, points.to_vec()));
            Ok(())
        }
    }

    impl FormSurface for Recorder {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn field_position(&self, name: &str) -> Option<FieldPosition> {
            self.fields.get(name).copied()
        }

        fn set_field_value(&mut self, name: &str, value: &str) -> Result<()> {
            if !self.fields.contains_key(name) && !self.unplaced.iter().any(|n| n == name) {
                return Err(Error::FieldNotFound {
                    name: name.to_string(),
                });
            }
            self.ops.push(Op::Set(name.to_string(), value.to_string()));
            Ok(())
        }

        fn remove_field(&mut self, name: &str) -> Result<bool> {
            self.ops.push(Op::Remove(name.to_string()));
            Ok(self.fields.contains_key(name))
        }
    }

    fn fixed_width(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.6
    }

    fn record(name: &str, value: &str) -> FormFieldRecord {
        FormFieldRecord {
            name: name.to_string(),
            value: Some(value.to_string()),
            left: Some(100.0),
            right: Some(150.0),
            top: Some(200.0),
            bottom: Some(180.0),
            page_number: Some(1),
            ..FormFieldRecord::default()
        }
    }

    fn png_data_uri(width: u32, height: u32) -> String {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        )
    }

    #[test]
    fn test_empty_list_is_fatal() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let result = filler.fill(&[], &mut surface);
        assert!(matches!(result, Err(Error::EmptyFieldList)));
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_text_field_draws_then_removes_widget() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let mut r = record("name", "Hi");
        r.text_align = Some(8);

        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 1);
        assert_eq!(
            surface.ops,
            vec![
                Op::Text(1, "Hi".to_string(), 138.0, 180.0),
                Op::Remove("name".to_string()),
            ]
        );
    }

    #[test]
    fn test_checked_checkbox_draws_three_primitives() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let mut r = record("agree", " ON ");
        r.field_type = Some(crate::form::FieldKind::Checkbox);

        filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(surface.ops.len(), 4);
        assert!(matches!(
            surface.ops[0],
            Op::Rect(1, _, RectStyle::Fill { gray }) if gray == 1.0
        ));
        assert!(matches!(
            surface.ops[1],
            Op::Rect(1, _, RectStyle::Stroke { gray, width }) if gray == 0.0 && width == 1.0
        ));
        assert!(matches!(&surface.ops[2], Op::Path(1, points) if points.len() == 3));
        assert_eq!(surface.ops[3], Op::Remove("agree".to_string()));
    }

    #[test]
    fn test_unchecked_checkbox_only_clears() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let mut r = record("agree", "no");
        r.field_type = Some(crate::form::FieldKind::Checkbox);

        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 1);
        assert_eq!(surface.ops, vec![Op::Remove("agree".to_string())]);
    }

    #[test]
    fn test_image_field_is_centered() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let r = FormFieldRecord {
            name: "signature".to_string(),
            value: Some(png_data_uri(200, 100)),
            left: Some(0.0),
            top: Some(100.0),
            width: Some(100.0),
            height: Some(100.0),
            page_number: Some(1),
            ..FormFieldRecord::default()
        };

        filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(
            surface.ops[0],
            Op::Image(
                1,
                ImagePlacement {
                    x: 0.0,
                    y: 25.0,
                    width: 100.0,
                    height: 50.0
                }
            )
        );
    }

    #[test]
    fn test_failures_are_isolated_per_field() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let mut no_value = record("no_value", "x");
        no_value.value = None;
        let mut far_page = record("far_page", "x");
        far_page.page_number = Some(7);
        let records = vec![
            record("broken_image", "data:image/png;base64,!!!!"),
            no_value,
            far_page,
            record("ok", "fine"),
        ];

        let report = filler.fill(&records, &mut surface).unwrap();
        assert_eq!(report.fields_filled, 1);
        let skipped: Vec<&str> = report
            .fields_skipped
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(skipped, vec!["broken_image", "no_value", "far_page"]);
        assert!(report.fields_skipped[0]
            .reason
            .starts_with("Malformed image payload"));
        assert_eq!(report.fields_skipped[1].reason, "No value provided");
        assert_eq!(
            surface.ops,
            vec![
                Op::Text(1, "fine".to_string(), 100.0, 180.0),
                Op::Remove("ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_geometry_degrades_with_warning() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let r = FormFieldRecord {
            name: "loose".to_string(),
            value: Some("text".to_string()),
            left: Some(40.0),
            top: Some(300.0),
            page_number: Some(1),
            text_align: Some(31),
            ..FormFieldRecord::default()
        };

        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 1);
        assert_eq!(
            report.warnings,
            vec![
                FieldWarning {
                    name: "loose".to_string(),
                    kind: WarningKind::UnsupportedAlignment { code: 31 },
                },
                FieldWarning {
                    name: "loose".to_string(),
                    kind: WarningKind::MissingGeometry {
                        dimensions: vec!["width".to_string(), "height".to_string()],
                    },
                },
            ]
        );
        // zero-height box, bottom-left fallback: baseline on the top edge
        assert_eq!(
            surface.ops[0],
            Op::Text(1, "text".to_string(), 40.0, 300.0)
        );
    }

    #[test]
    fn test_located_field_uses_document_geometry() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 2,
            ..Recorder::default()
        };
        surface.fields.insert(
            "city".to_string(),
            FieldPosition {
                page: 2,
                field_box: FieldBox::new(10.0, 50.0, 60.0, 20.0),
            },
        );
        let r = FormFieldRecord {
            name: "city".to_string(),
            value: Some("Oslo".to_string()),
            ..FormFieldRecord::default()
        };

        filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(surface.ops[0], Op::Text(2, "Oslo".to_string(), 10.0, 30.0));
    }

    #[test]
    fn test_unknown_geometry_falls_back_to_set_value() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let r = FormFieldRecord {
            name: "ghost".to_string(),
            value: Some("boo".to_string()),
            ..FormFieldRecord::default()
        };

        let planned = filler.plan_field(&r, None).unwrap().unwrap();
        assert_eq!(planned.strategy, RenderStrategy::SetFieldValue);
        assert!(matches!(planned.plan, FieldPlan::SetValue { ref value } if value == "boo"));

        // the surface does not know the field either, so it is skipped
        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 0);
        assert_eq!(
            report.fields_skipped[0].reason,
            "Field not found in PDF: ghost"
        );
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_fields_processed_in_input_order() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            ..Recorder::default()
        };
        let mut second = record("b", "2");
        second.tab_order = Some(1);
        let mut first = record("a", "1");
        first.tab_order = Some(2);

        filler.fill(&[first, second], &mut surface).unwrap();
        let removed: Vec<&Op> = surface
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Remove(_)))
            .collect();
        assert_eq!(
            removed,
            vec![&Op::Remove("a".to_string()), &Op::Remove("b".to_string())]
        );
    }

    #[test]
    fn test_set_value_fallback_writes_unplaced_field() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            unplaced: vec!["legacy".to_string()],
            ..Recorder::default()
        };
        let r = FormFieldRecord {
            name: "legacy".to_string(),
            value: Some("kept".to_string()),
            ..FormFieldRecord::default()
        };

        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 1);
        assert!(report.fields_skipped.is_empty());
        assert_eq!(
            surface.ops,
            vec![Op::Set("legacy".to_string(), "kept".to_string())]
        );
    }

    #[test]
    fn test_failed_primitive_keeps_widget() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));
        let mut surface = Recorder {
            pages: 1,
            fail_paths: true,
            ..Recorder::default()
        };
        let mut r = record("agree", "yes");
        r.field_type = Some(crate::form::FieldKind::Checkbox);

        let report = filler.fill(&[r], &mut surface).unwrap();
        assert_eq!(report.fields_filled, 0);
        assert_eq!(report.fields_skipped[0].name, "agree");
        assert!(!surface.ops.iter().any(|op| matches!(op, Op::Remove(_))));
    }

    #[test]
    fn test_multiline_content_plans_stacked_lines() {
        let config = FillConfig::default();
        let filler = FormFiller::new(&config, fixed_width, RasterDecoder::new(1_000_000));

        let planned = filler.plan_field(&record("addr", "A\nB"), None).unwrap().unwrap();
        assert_eq!(planned.strategy, RenderStrategy::MultiLineText);
        match planned.plan {
            FieldPlan::Draw {
                instruction: RenderInstruction::Text(text),
                ..
            } => {
                let lines: Vec<&str> = text.lines.iter().map(|l| l.text.as_str()).collect();
                assert_eq!(lines, vec!["A", "B"]);
            }
            other => panic!("expected text plan, got {:?}", other),
        }

        let planned = filler.plan_field(&record("name", "Hi"), None).unwrap().unwrap();
        assert_eq!(planned.strategy, RenderStrategy::SingleLineText);
    }
}
