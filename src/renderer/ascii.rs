//! ASCII renderer: 1x2 pixels per character through a density ramp.

use std::io::Write;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::error::{DappleError, Result};

use super::Renderer;

/// Standard ASCII density ramp (10 levels), darkest (space) to brightest (@).
pub const CHARSET_STANDARD: &str = " .:-=+*#%@";

/// Detailed ramp (70 levels) for large outputs.
pub const CHARSET_DETAILED: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Unicode shade blocks (5 levels).
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Minimal ramp (5 levels), less noisy.
pub const CHARSET_SIMPLE: &str = " .oO@";

/// Look up a preset ramp by name.
pub fn charset_preset(name: &str) -> Option<&'static str> {
    match name {
        "standard" => Some(CHARSET_STANDARD),
        "detailed" => Some(CHARSET_DETAILED),
        "blocks" => Some(CHARSET_BLOCKS),
        "simple" => Some(CHARSET_SIMPLE),
        _ => None,
    }
}

/// Render bitmaps as plain characters, one per 1x2 pixel cell.
///
/// Output contains no escape sequences; colors are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiRenderer {
    charset: Vec<char>,
    invert: bool,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self {
            charset: CHARSET_STANDARD.chars().collect(),
            invert: false,
        }
    }
}

impl AsciiRenderer {
    pub fn charset(&self) -> &[char] {
        &self.charset
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Replace the ramp. Characters are ordered dark to bright.
    pub fn with_charset(self, charset: &str) -> Result<Self> {
        if charset.is_empty() {
            return Err(DappleError::unsupported("charset", "(empty)"));
        }
        Ok(Self {
            charset: charset.chars().collect(),
            ..self
        })
    }

    pub fn with_invert(self, invert: bool) -> Self {
        Self { invert, ..self }
    }

    /// Map a brightness to its ramp character.
    fn char_for(&self, value: f32) -> char {
        let n = self.charset.len();
        let v = if self.invert { 1.0 - value } else { value };
        let idx = (v * (n as f32 - 0.001)).max(0.0) as usize;
        self.charset[idx.min(n - 1)]
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn cell_width(&self) -> usize {
        1
    }

    fn cell_height(&self) -> usize {
        2
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        check_colors(bitmap, colors)?;

        let rows = bitmap.height() / 2;
        let mut line = String::with_capacity(bitmap.width() + 1);
        for row in 0..rows {
            line.clear();
            if row > 0 {
                line.push('\n');
            }
            let top = bitmap.row(row * 2);
            let bottom = bitmap.row(row * 2 + 1);
            for (a, b) in top.iter().zip(bottom) {
                line.push(self.char_for((a + b) / 2.0));
            }
            sink.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}
