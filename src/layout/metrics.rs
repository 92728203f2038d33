//! Font metrics used to measure text runs

/// Measures the advance width of a text run, in points
pub trait TextMetrics {
    fn measure_width(&self, text: &str, font_size: f32) -> f32;
}

impl<F> TextMetrics for F
where
    F: Fn(&str, f32) -> f32,
{
    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        self(text, font_size)
    }
}

/// Times-Roman advance widths for WinAnsi codes 32..=126, in 1/1000 em
const TIMES_ROMAN_ASCII: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // '0'..'?'
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // '@'..'O'
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 'P'..'_'
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // '`'..'o'
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 'p'..'~'
];

/// Width used for characters outside the table
const FALLBACK_WIDTH: u16 = 500;

/// Metrics of one of the standard 14 PDF fonts
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    ascii_widths: &'static [u16; 95],
    fallback: u16,
}

impl StandardFontMetrics {
    /// Times-Roman, the font the filler draws with
    pub fn times_roman() -> Self {
        Self {
            ascii_widths: &TIMES_ROMAN_ASCII,
            fallback: FALLBACK_WIDTH,
        }
    }

    /// Width of one character in 1/1000 em
    pub fn char_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (32..=126).contains(&code) {
            self.ascii_widths[(code - 32) as usize]
        } else {
            self.fallback
        }
    }
}

impl TextMetrics for StandardFontMetrics {
    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * font_size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_roman_widths() {
        let metrics = StandardFontMetrics::times_roman();
        assert_eq!(metrics.char_width(' '), 250);
        assert_eq!(metrics.char_width('A'), 722);
        assert_eq!(metrics.char_width('W'), 944);
        assert_eq!(metrics.char_width('i'), 278);
        assert_eq!(metrics.char_width('~'), 541);
        assert_eq!(metrics.char_width('é'), FALLBACK_WIDTH);
    }

    #[test]
    fn test_measure_scales_with_font_size() {
        let metrics = StandardFontMetrics::times_roman();
        // H = 722, i = 278
        assert!((metrics.measure_width("Hi", 10.0) - 10.0).abs() < 1e-4);
        assert!((metrics.measure_width("Hi", 20.0) - 20.0).abs() < 1e-4);
        assert_eq!(metrics.measure_width("", 12.0), 0.0);
    }

    #[test]
    fn test_closure_metrics() {
        let fixed = |text: &str, size: f32| text.len() as f32 * size * 0.5;
        assert_eq!(fixed.measure_width("abcd", 10.0), 20.0);
    }
}
