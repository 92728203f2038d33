//! Field bounding boxes in PDF user space (origin bottom-left, y up)

/// A point in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle given by its lower-left corner and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Canonical field box. `left`/`top` are stored; `right`/`bottom` are derived.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl FieldBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a box from its four edges, clamping inverted edges to zero size
    pub fn from_edges(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            top,
            width: (right - left).max(0.0),
            height: (top - bottom).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top - self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.bottom() + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn to_rect(&self) -> Rect {
        Rect {
            x: self.left,
            y: self.bottom(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Raw, possibly incomplete geometry as it arrives in an input record.
///
/// Either `width`/`height` are present and `left`/`top` are the origin, or the
/// size is derived from `right - left` and `top - bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldGeometry {
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Outcome of geometry resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGeometry {
    pub field_box: FieldBox,
    /// Names of the inputs that were absent and resolved to 0
    pub missing: Vec<&'static str>,
}

impl ResolvedGeometry {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl FieldGeometry {
    /// Whether any coordinate at all was supplied
    pub fn is_present(&self) -> bool {
        self.left.is_some()
            || self.top.is_some()
            || self.right.is_some()
            || self.bottom.is_some()
            || self.width.is_some()
            || self.height.is_some()
    }

    /// Normalize into a [`FieldBox`]. Never fails: any absent dimension is 0
    /// and is listed in [`ResolvedGeometry::missing`].
    pub fn resolve(&self) -> ResolvedGeometry {
        let mut missing = Vec::new();

        let left = self.left.unwrap_or_else(|| {
            missing.push("left");
            0.0
        });
        let top = self.top.unwrap_or_else(|| {
            missing.push("top");
            0.0
        });

        let width = match self.width {
            Some(w) => w.max(0.0),
            None => match self.right {
                Some(right) if self.left.is_some() => (right - left).max(0.0),
                _ => {
                    missing.push("width");
                    0.0
                }
            },
        };

        let height = match self.height {
            Some(h) => h.max(0.0),
            None => match self.bottom {
                Some(bottom) if self.top.is_some() => (top - bottom).max(0.0),
                _ => {
                    missing.push("height");
                    0.0
                }
            },
        };

        ResolvedGeometry {
            field_box: FieldBox::new(left, top, width, height),
            missing,
        }
    }
}
