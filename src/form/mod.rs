//! Form filling: input records, image decoding and the fill pass

pub mod decode;
pub mod filler;
pub mod record;
pub mod surface;

pub use decode::{decode_payload, RasterDecoder};
pub use filler::{
    FieldPlan, FieldWarning, FillReport, FormFiller, PlannedField, SkippedField, WarningKind,
};
pub use record::{parse_pages, parse_records, FieldKind, FieldValue, FormFieldRecord, PageFields};
pub use surface::{DrawingSink, FieldPosition, FormSurface, RectStyle};
