//! Braille renderer: Unicode braille patterns, 2x4 dots per character.
//!
//! Each braille character encodes a 2-wide by 4-tall dot matrix directly in
//! its codepoint (U+2800 + bits), giving 8 binary pixels per terminal cell.

use std::io::Write;
use std::str::FromStr;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::color::{gray_code, push_indexed, push_truecolor, to_byte, Layer, RESET};
use crate::error::{DappleError, Result};

use super::Renderer;

/// Braille base character (U+2800, empty braille pattern).
pub const BRAILLE_BASE: char = '\u{2800}';

/// Bit index of each dot, indexed by `[row][col]` within the 2x4 block.
///
/// ```text
/// [0,0]=bit0  [0,1]=bit3
/// [1,0]=bit1  [1,1]=bit4
/// [2,0]=bit2  [2,1]=bit5
/// [3,0]=bit6  [3,1]=bit7
/// ```
const DOT_BITS: [[u8; 2]; 4] = [[0, 3], [1, 4], [2, 5], [6, 7]];

/// Lower bound of the automatic threshold.
const AUTO_THRESHOLD_MIN: f32 = 0.1;
/// Upper bound of the automatic threshold.
const AUTO_THRESHOLD_MAX: f32 = 0.9;

/// Convert a 4x2 dot grid (`dots[row][col]`) to a braille character.
pub fn dots_to_braille(dots: [[bool; 2]; 4]) -> char {
    let mut code = 0u32;
    for (row, bits) in DOT_BITS.iter().enumerate() {
        for (col, &bit) in bits.iter().enumerate() {
            if dots[row][col] {
                code |= 1 << bit;
            }
        }
    }
    char::from_u32(BRAILLE_BASE as u32 + code).unwrap_or(BRAILLE_BASE)
}

/// How braille characters are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Plain braille, no escape codes.
    #[default]
    None,
    /// 24-level gray foreground from the block's mean brightness.
    Grayscale,
    /// 24-bit foreground from the block's mean color.
    Truecolor,
}

impl FromStr for ColorMode {
    type Err = DappleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(ColorMode::None),
            "grayscale" => Ok(ColorMode::Grayscale),
            "truecolor" => Ok(ColorMode::Truecolor),
            other => Err(DappleError::unsupported("color mode", other)),
        }
    }
}

/// Render bitmaps as Unicode braille (2x4 dots per character).
///
/// A dot is raised when its pixel is strictly brighter than the threshold.
/// With no threshold set, the bitmap mean (clamped to [0.1, 0.9]) is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrailleRenderer {
    threshold: Option<f32>,
    color_mode: ColorMode,
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self {
            threshold: Some(0.5),
            color_mode: ColorMode::None,
        }
    }
}

impl BrailleRenderer {
    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Set the dot threshold; `None` selects the automatic mean threshold.
    pub fn with_threshold(self, threshold: Option<f32>) -> Result<Self> {
        if let Some(t) = threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(DappleError::unsupported("threshold", t));
            }
        }
        Ok(Self { threshold, ..self })
    }

    pub fn with_color_mode(self, color_mode: ColorMode) -> Self {
        Self { color_mode, ..self }
    }

    fn effective_threshold(&self, bitmap: &Bitmap) -> f32 {
        self.threshold.unwrap_or_else(|| {
            bitmap
                .mean()
                .clamp(AUTO_THRESHOLD_MIN, AUTO_THRESHOLD_MAX)
        })
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn cell_width(&self) -> usize {
        2
    }

    fn cell_height(&self) -> usize {
        4
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        check_colors(bitmap, colors)?;

        let threshold = self.effective_threshold(bitmap);
        let (h, w) = bitmap.shape();
        let mut line = String::new();

        for cy in (0..h).step_by(4) {
            line.clear();
            if cy > 0 {
                line.push('\n');
            }

            for cx in (0..w).step_by(2) {
                // Partial edge blocks are padded with unlit dots.
                let region_h = (h - cy).min(4);
                let region_w = (w - cx).min(2);
                let mut dots = [[false; 2]; 4];
                let mut sum = 0.0f32;
                for dy in 0..region_h {
                    for dx in 0..region_w {
                        let v = bitmap.get(cy + dy, cx + dx);
                        dots[dy][dx] = v > threshold;
                        sum += v;
                    }
                }
                let count = (region_h * region_w) as f32;
                let glyph = dots_to_braille(dots);

                match self.color_mode {
                    ColorMode::None => {}
                    ColorMode::Grayscale => {
                        let level = (sum / count * 23.999) as i32;
                        push_indexed(&mut line, Layer::Foreground, gray_code(level));
                    }
                    ColorMode::Truecolor => {
                        let [r, g, b] = match colors {
                            Some(colors) => {
                                let mut acc = [0.0f32; 3];
                                for dy in 0..region_h {
                                    for dx in 0..region_w {
                                        let rgb = colors.get(cy + dy, cx + dx);
                                        for c in 0..3 {
                                            acc[c] += rgb[c];
                                        }
                                    }
                                }
                                acc.map(|c| to_byte(c / count, 255.999))
                            }
                            None => [to_byte(sum / count, 255.999); 3],
                        };
                        push_truecolor(&mut line, Layer::Foreground, r, g, b);
                    }
                }
                line.push(glyph);
            }

            if self.color_mode != ColorMode::None {
                line.push_str(RESET);
            }
            sink.write_all(line.as_bytes())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::render_to_string;

    #[test]
    fn test_braille_base() {
        assert_eq!(BRAILLE_BASE, '\u{2800}');
    }

    #[test]
    fn test_dots_empty_and_full() {
        assert_eq!(dots_to_braille([[false; 2]; 4]), '\u{2800}');
        assert_eq!(dots_to_braille([[true; 2]; 4]), '\u{28FF}');
    }

    #[test]
    fn test_dots_single_positions() {
        let cases = [
            ((0, 0), '\u{2801}'),
            ((1, 0), '\u{2802}'),
            ((2, 0), '\u{2804}'),
            ((0, 1), '\u{2808}'),
            ((1, 1), '\u{2810}'),
            ((2, 1), '\u{2820}'),
            ((3, 0), '\u{2840}'),
            ((3, 1), '\u{2880}'),
        ];
        for ((row, col), expected) in cases {
            let mut dots = [[false; 2]; 4];
            dots[row][col] = true;
            assert_eq!(dots_to_braille(dots), expected, "dot at ({}, {})", row, col);
        }
    }

    #[test]
    fn test_threshold_domain() {
        assert!(BrailleRenderer::default().with_threshold(Some(1.5)).is_err());
        assert!(BrailleRenderer::default().with_threshold(Some(-0.1)).is_err());
        assert!(BrailleRenderer::default().with_threshold(None).is_ok());
    }

    #[test]
    fn test_auto_threshold_clamped() {
        let r = BrailleRenderer::default().with_threshold(None).unwrap();
        assert_eq!(r.effective_threshold(&Bitmap::filled(4, 2, 1.0)), 0.9);
        assert_eq!(r.effective_threshold(&Bitmap::filled(4, 2, 0.0)), 0.1);
    }

    #[test]
    fn test_partial_block_padded() {
        // 3x3 bright bitmap: two cells across, one row; right cell has one column.
        let out = render_to_string(&BrailleRenderer::default(), &Bitmap::filled(3, 3, 1.0), None)
            .unwrap();
        assert_eq!(out, "\u{283F}\u{2807}");
    }

    #[test]
    fn test_grayscale_mode_escape() {
        let r = BrailleRenderer::default().with_color_mode(ColorMode::Grayscale);
        let out = render_to_string(&r, &Bitmap::filled(4, 2, 1.0), None).unwrap();
        assert_eq!(out, "\x1b[38;5;255m\u{28FF}\x1b[0m");
    }

    #[test]
    fn test_truecolor_uses_mean_color() {
        let r = BrailleRenderer::default().with_color_mode(ColorMode::Truecolor);
        let bitmap = Bitmap::filled(4, 2, 1.0);
        let colors = ColorArray::from_fn(4, 2, |_, _| [1.0, 0.0, 0.5]);
        let out = render_to_string(&r, &bitmap, Some(&colors)).unwrap();
        assert_eq!(out, "\x1b[38;2;255;0;127m\u{28FF}\x1b[0m");
    }

    #[test]
    fn test_color_mode_from_str() {
        assert_eq!("truecolor".parse::<ColorMode>().unwrap(), ColorMode::Truecolor);
        assert!("sepia".parse::<ColorMode>().is_err());
    }
}
