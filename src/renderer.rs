//! Renderer interface and the seven terminal encoders.
//!
//! A renderer turns a bitmap (plus optional colors) into terminal output and
//! streams it to a sink. Each renderer has a characteristic cell size: the
//! number of source pixels represented by one output unit.
//!
//! | Renderer      | Cell  | Output                                  |
//! |---------------|-------|-----------------------------------------|
//! | `Braille`     | 2x4   | U+2800 block, optional ANSI foreground  |
//! | `Quadrants`   | 2x2   | quadrant blocks with fg/bg colors       |
//! | `Sextants`    | 2x3   | sextant blocks with fg/bg colors        |
//! | `Ascii`       | 1x2   | density ramp, no escapes                |
//! | `Sixel`       | 1x1   | DEC sixel device control string         |
//! | `Kitty`       | 1x1   | kitty graphics protocol APC chunks      |
//! | `Fingerprint` | 8x16* | closest pre-rendered glyph (* default)  |
//!
//! Renderer values are immutable. Reconfiguration goes through `with_*`
//! methods that return a new value, so one renderer can be shared freely
//! across threads.

pub mod ascii;
mod blocks;
pub mod braille;
pub mod fingerprint;
mod glyphs;
pub mod kitty;
mod png;
pub mod quadrants;
pub mod sextants;
pub mod sixel;

use std::io::Write;

use crate::bitmap::{Bitmap, ColorArray};
use crate::error::Result;

pub use ascii::{AsciiRenderer, CHARSET_BLOCKS, CHARSET_DETAILED, CHARSET_SIMPLE, CHARSET_STANDARD};
pub use braille::{BrailleRenderer, ColorMode, BRAILLE_BASE};
pub use fingerprint::{FingerprintRenderer, FontSource, GlyphSet, Metric};
pub use kitty::{KittyFormat, KittyRenderer};
pub use quadrants::QuadrantsRenderer;
pub use sextants::SextantsRenderer;
pub use sixel::SixelRenderer;

/// Capability contract implemented by every encoder.
pub trait Renderer: Send + Sync {
    /// Short lowercase name, used in logs and `Debug` output.
    fn name(&self) -> &'static str;

    /// Source pixels per output unit, horizontally.
    fn cell_width(&self) -> usize;

    /// Source pixels per output unit, vertically.
    fn cell_height(&self) -> usize;

    /// Encode `bitmap` (and `colors`, when the encoder uses them) into `sink`.
    ///
    /// Output is written incrementally; a blocked sink blocks this call.
    /// Fails with ShapeMismatch when `colors` does not match the bitmap.
    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()>;
}

/// Render into an in-memory string.
///
/// Intended for tests and small outputs; large images should be streamed.
pub fn render_to_string(
    renderer: &dyn Renderer,
    bitmap: &Bitmap,
    colors: Option<&ColorArray>,
) -> Result<String> {
    let mut buf = Vec::new();
    renderer.render(bitmap, colors, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Any of the built-in renderers, selected at runtime (e.g. from a config file).
#[derive(Debug, Clone)]
pub enum AnyRenderer {
    Braille(BrailleRenderer),
    Quadrants(QuadrantsRenderer),
    Sextants(SextantsRenderer),
    Ascii(AsciiRenderer),
    Sixel(SixelRenderer),
    Kitty(KittyRenderer),
    Fingerprint(FingerprintRenderer),
}

impl AnyRenderer {
    fn inner(&self) -> &dyn Renderer {
        match self {
            AnyRenderer::Braille(r) => r,
            AnyRenderer::Quadrants(r) => r,
            AnyRenderer::Sextants(r) => r,
            AnyRenderer::Ascii(r) => r,
            AnyRenderer::Sixel(r) => r,
            AnyRenderer::Kitty(r) => r,
            AnyRenderer::Fingerprint(r) => r,
        }
    }
}

impl Default for AnyRenderer {
    fn default() -> Self {
        AnyRenderer::Braille(BrailleRenderer::default())
    }
}

impl Renderer for AnyRenderer {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn cell_width(&self) -> usize {
        self.inner().cell_width()
    }

    fn cell_height(&self) -> usize {
        self.inner().cell_height()
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        self.inner().render(bitmap, colors, sink)
    }
}
