//! Checkbox mark geometry

use crate::config::Calibration;
use crate::layout::geometry::{FieldBox, Point, Rect};

/// Values that mark a checkbox, compared after trimming and lowercasing
pub const TRUTHY_VALUES: [&str; 5] = ["true", "yes", "1", "checked", "on"];

/// Whether a checkbox value means "checked"
pub fn is_truthy(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    TRUTHY_VALUES.contains(&normalized.as_str())
}

/// Primitives drawn for a checked box: white fill, black border, check polyline
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxMark {
    pub fill: Rect,
    pub border: Rect,
    pub border_width: f32,
    pub mark: [Point; 3],
}

/// Build the mark for a box. The check spans `size = scale * min(w, h)`
/// around the box center.
pub fn checkbox_mark(field_box: &FieldBox, calibration: &Calibration) -> CheckboxMark {
    let rect = field_box.to_rect();
    let center = field_box.center();
    let size = calibration.check_mark_scale * field_box.width.min(field_box.height);

    CheckboxMark {
        fill: rect,
        border: rect,
        border_width: calibration.border_width,
        mark: [
            Point::new(center.x - size, center.y),
            Point::new(center.x - size / 3.0, center.y - size / 2.0),
            Point::new(center.x + size, center.y + size / 2.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true")]
    #[case("  TRUE ")]
    #[case("On")]
    #[case("1")]
    #[case("yes")]
    #[case("Checked")]
    #[case("\ton\n")]
    fn test_truthy(#[case] value: &str) {
        assert!(is_truthy(value));
    }

    #[rstest]
    #[case("false")]
    #[case("")]
    #[case("no")]
    #[case("0")]
    #[case("off")]
    #[case("x")]
    #[case("truely")]
    fn test_not_truthy(#[case] value: &str) {
        assert!(!is_truthy(value));
    }

    #[test]
    fn test_mark_geometry() {
        let field_box = FieldBox::new(100.0, 220.0, 20.0, 20.0);
        let mark = checkbox_mark(&field_box, &Calibration::default());

        let expected = Rect {
            x: 100.0,
            y: 200.0,
            width: 20.0,
            height: 20.0,
        };
        assert_eq!(mark.fill, expected);
        assert_eq!(mark.border, expected);
        assert_eq!(mark.border_width, 1.0);

        // center (110, 210), size 6
        let eps = 1e-4;
        let [a, b, c] = mark.mark;
        assert!((a.x - 104.0).abs() < eps && (a.y - 210.0).abs() < eps);
        assert!((b.x - 108.0).abs() < eps && (b.y - 207.0).abs() < eps);
        assert!((c.x - 116.0).abs() < eps && (c.y - 213.0).abs() < eps);
    }

    #[test]
    fn test_mark_uses_shorter_side() {
        let field_box = FieldBox::new(0.0, 10.0, 100.0, 10.0);
        let mark = checkbox_mark(&field_box, &Calibration::default());
        // size = 3, center (50, 5)
        assert!((mark.mark[0].x - 47.0).abs() < 1e-4);
        assert!((mark.mark[2].x - 53.0).abs() < 1e-4);
        for p in mark.mark {
            assert!(p.x >= 0.0 && p.x <= 100.0);
            assert!(p.y >= 0.0 && p.y <= 10.0);
        }
    }
}
