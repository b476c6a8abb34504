//! Quadrants renderer: quadrant block characters, 2x2 pixels per character.
//!
//! Uses the 16 quadrant glyphs (`▘▝▖▗▀▄▌▐▚▞▙▛▜▟█`) with a foreground and a
//! background color, so each cell carries both shape and two tones.

use std::io::Write;

use crate::bitmap::{Bitmap, ColorArray};
use crate::error::Result;

use super::blocks::{render_blocks, BlockShape, BlockStyle};
use super::Renderer;

/// Quadrant glyphs indexed by 4-bit pattern (TL=8, TR=4, BL=2, BR=1).
pub const QUADRANT_CHARS: [char; 16] = [
    ' ', '▗', '▖', '▄', '▝', '▐', '▞', '▟', '▘', '▚', '▌', '▙', '▀', '▜', '▛', '█',
];

const SHAPE: BlockShape = BlockShape {
    width: 2,
    height: 2,
    weights: &[8, 4, 2, 1],
    full: 0b1111,
    glyph: quadrant_char,
};

fn quadrant_char(pattern: u8) -> char {
    QUADRANT_CHARS[(pattern & 0x0F) as usize]
}

/// Render bitmaps as quadrant blocks with fg/bg colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadrantsRenderer {
    true_color: bool,
    grayscale: bool,
}

impl Default for QuadrantsRenderer {
    fn default() -> Self {
        Self {
            true_color: true,
            grayscale: false,
        }
    }
}

impl QuadrantsRenderer {
    pub fn true_color(&self) -> bool {
        self.true_color
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    /// 24-bit escapes when true, 256-color palette otherwise.
    pub fn with_true_color(self, true_color: bool) -> Self {
        Self { true_color, ..self }
    }

    /// Ignore colors and render the bitmap's tones only.
    pub fn with_grayscale(self, grayscale: bool) -> Self {
        Self { grayscale, ..self }
    }
}

impl Renderer for QuadrantsRenderer {
    fn name(&self) -> &'static str {
        "quadrants"
    }

    fn cell_width(&self) -> usize {
        2
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
        let style = BlockStyle {
            true_color: self.true_color,
            grayscale: self.grayscale,
        };
        render_blocks(&SHAPE, style, bitmap, colors, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::render_to_string;

    #[test]
    fn test_quadrant_table_corners() {
        assert_eq!(quadrant_char(0), ' ');
        assert_eq!(quadrant_char(0b1000), '▘');
        assert_eq!(quadrant_char(0b0001), '▗');
        assert_eq!(quadrant_char(0b1010), '▌');
        assert_eq!(quadrant_char(0b1111), '█');
    }

    #[test]
    fn test_uniform_block_is_full() {
        let out = render_to_string(
            &QuadrantsRenderer::default(),
            &Bitmap::filled(2, 2, 0.5),
            None,
        )
        .unwrap();
        assert_eq!(out, "\x1b[38;2;127;127;127m\x1b[48;2;127;127;127m█\x1b[0m");
    }

    #[test]
    fn test_incomplete_blocks_dropped() {
        let out = render_to_string(
            &QuadrantsRenderer::default(),
            &Bitmap::filled(1, 5, 1.0),
            None,
        )
        .unwrap();
        assert!(out.is_empty());
    }
}
