//! Sextants renderer: sextant block characters, 2x3 pixels per character.
//!
//! Unicode sextants (U+1FB00..U+1FB3B) cover 60 of the 64 possible 2x3
//! patterns. The remaining four reuse existing block characters: empty
//! (space), left half (`▌`), right half (`▐`) and full (`█`).

use std::io::Write;

use crate::bitmap::{Bitmap, ColorArray};
use crate::error::Result;

use super::blocks::{render_blocks, BlockShape, BlockStyle};
use super::Renderer;

/// First sextant codepoint.
const SEXTANT_BASE: u32 = 0x1FB00;

/// Unicode-numbered patterns that have no dedicated sextant codepoint.
const LEFT_HALF: u8 = 21;
const RIGHT_HALF: u8 = 42;

const SHAPE: BlockShape = BlockShape {
    width: 2,
    height: 3,
    weights: &[32, 16, 8, 4, 2, 1],
    full: 0b11_1111,
    glyph: sextant_char,
};

/// Glyph for a pattern with raster-order weights `[32, 16, 8, 4, 2, 1]`.
///
/// Unicode numbers sextant cells the other way round (cell i contributes
/// 2^i), so the pattern's bits are reversed before lookup.
pub fn sextant_char(pattern: u8) -> char {
    let unicode = (pattern & 0x3F).reverse_bits() >> 2;
    match unicode {
        0 => ' ',
        LEFT_HALF => '▌',
        RIGHT_HALF => '▐',
        63 => '█',
        p => {
            let skipped = [LEFT_HALF, RIGHT_HALF].iter().filter(|&&s| s < p).count() as u32;
            char::from_u32(SEXTANT_BASE + p as u32 - 1 - skipped).unwrap_or(' ')
        }
    }
}

/// Render bitmaps as sextant blocks with fg/bg colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SextantsRenderer {
    true_color: bool,
    grayscale: bool,
}

impl Default for SextantsRenderer {
    fn default() -> Self {
        Self {
            true_color: true,
            grayscale: false,
        }
    }
}

impl SextantsRenderer {
    pub fn true_color(&self) -> bool {
        self.true_color
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn with_true_color(self, true_color: bool) -> Self {
        Self { true_color, ..self }
    }

    pub fn with_grayscale(self, grayscale: bool) -> Self {
        Self { grayscale, ..self }
    }
}

impl Renderer for SextantsRenderer {
    fn name(&self) -> &'static str {
        "sextants"
    }

    fn cell_width(&self) -> usize {
        2
    }

    fn cell_height(&self) -> usize {
        3
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let style = BlockStyle {
            true_color: self.true_color,
            grayscale: self.grayscale,
        };
        render_blocks(&SHAPE, style, bitmap, colors, sink)
    }
}
