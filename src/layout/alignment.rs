//! Nine-way field alignment

/// Horizontal anchor of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Center,
    Bottom,
}

/// Alignment of content inside a field box, wire-coded 0..=8 row by row
/// starting at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    #[default]
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Alignment {
    pub const ALL: [Alignment; 9] = [
        Alignment::TopLeft,
        Alignment::TopCenter,
        Alignment::TopRight,
        Alignment::CenterLeft,
        Alignment::CenterCenter,
        Alignment::CenterRight,
        Alignment::BottomLeft,
        Alignment::BottomCenter,
        Alignment::BottomRight,
    ];

    /// Decode a `text_align` code; `None` for codes outside 0..=8
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn anchors(self) -> (HorizontalAnchor, VerticalAnchor) {
        (self.horizontal(), self.vertical())
    }

    pub fn horizontal(self) -> HorizontalAnchor {
        match self {
            Alignment::TopLeft | Alignment::CenterLeft | Alignment::BottomLeft => {
                HorizontalAnchor::Left
            }
            Alignment::TopCenter | Alignment::CenterCenter | Alignment::BottomCenter => {
                HorizontalAnchor::Center
            }
            Alignment::TopRight | Alignment::CenterRight | Alignment::BottomRight => {
                HorizontalAnchor::Right
            }
        }
    }

    pub fn vertical(self) -> VerticalAnchor {
        match self {
            Alignment::TopLeft | Alignment::TopCenter | Alignment::TopRight => VerticalAnchor::Top,
            Alignment::CenterLeft | Alignment::CenterCenter | Alignment::CenterRight => {
                VerticalAnchor::Center
            }
            Alignment::BottomLeft | Alignment::BottomCenter | Alignment::BottomRight => {
                VerticalAnchor::Bottom
            }
        }
    }
}
