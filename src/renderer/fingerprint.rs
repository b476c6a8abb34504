//! Fingerprint renderer: picks, per cell, the glyph that looks most alike.
//!
//! Every glyph of the selected set is pre-rendered into a cell-sized ink
//! bitmap. Each input cell is compared against all of them and the glyph
//! with the smallest mean squared (or absolute) difference is emitted.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::error::{DappleError, Result};

use super::glyphs::{self, GlyphKey};
use super::Renderer;

/// Block elements, box drawing and quadrants.
const BLOCK_GLYPHS: &str = concat!(
    " ▀▁▂▃▄▅▆▇█▉▊▋▌▍▎▏▐░▒▓",
    "─━│┃┄┅┆┇┈┉┊┋┌┍┎┏┐┑┒┓└┕┖┗┘┙┚┛├┝┞┟┠┡┢┣┤┥┦┧┨┩┪┫┬┭┮┯┰┱┲┳┴┵┶┷┸┹┺┻┼┽┾┿╀╁╂╃╄╅╆╇╈╉╊╋",
    "╌╍╎╏═║╒╓╔╕╖╗╘╙╚╛╜╝╞╟╠╡╢╣╤╥╦╧╨╩╪╫╬",
    "▖▗▘▙▚▛▜▝▞▟",
);

/// Candidate characters for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlyphSet {
    /// Printable ASCII, 32 to 126.
    #[default]
    Basic,
    /// Block elements, box drawing and quadrants.
    Blocks,
    /// All 256 braille patterns.
    Braille,
    /// Basic, blocks and braille together.
    Extended,
}

impl GlyphSet {
    pub fn name(self) -> &'static str {
        match self {
            GlyphSet::Basic => "basic",
            GlyphSet::Blocks => "blocks",
            GlyphSet::Braille => "braille",
            GlyphSet::Extended => "extended",
        }
    }

    /// Characters of the set in matching order.
    pub fn chars(self) -> Vec<char> {
        let basic = (32u8..127).map(char::from);
        let braille = (0x2800..=0x28FF).filter_map(char::from_u32);
        match self {
            GlyphSet::Basic => basic.collect(),
            GlyphSet::Blocks => BLOCK_GLYPHS.chars().collect(),
            GlyphSet::Braille => braille.collect(),
            GlyphSet::Extended => basic.chain(BLOCK_GLYPHS.chars()).chain(braille).collect(),
        }
    }
}

impl FromStr for GlyphSet {
    type Err = DappleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(GlyphSet::Basic),
            "blocks" => Ok(GlyphSet::Blocks),
            "braille" => Ok(GlyphSet::Braille),
            "extended" => Ok(GlyphSet::Extended),
            other => Err(DappleError::unsupported("glyph set", other)),
        }
    }
}

/// Distance between an input cell and a glyph bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
}

impl Metric {
    fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        let sum: f32 = match self {
            Metric::Mse => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Metric::Mae => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        };
        sum / a.len() as f32
    }
}

impl FromStr for Metric {
    type Err = DappleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mse" => Ok(Metric::Mse),
            "mae" => Ok(Metric::Mae),
            other => Err(DappleError::unsupported("metric", other)),
        }
    }
}

/// Where glyph shapes come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FontSource {
    /// A monospace system font; builtin shapes when none is installed.
    #[default]
    System,
    /// A TrueType/OpenType file.
    File(PathBuf),
    /// Geometric space, block elements and braille. Font independent.
    Builtin,
}

/// Render bitmaps by matching each cell to the closest glyph.
///
/// Colors are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRenderer {
    glyph_set: GlyphSet,
    cell_width: usize,
    cell_height: usize,
    metric: Metric,
    font: FontSource,
}

impl Default for FingerprintRenderer {
    fn default() -> Self {
        Self {
            glyph_set: GlyphSet::Basic,
            cell_width: 8,
            cell_height: 16,
            metric: Metric::Mse,
            font: FontSource::System,
        }
    }
}

impl FingerprintRenderer {
    pub fn glyph_set(&self) -> GlyphSet {
        self.glyph_set
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn font(&self) -> &FontSource {
        &self.font
    }

    pub fn with_glyph_set(self, glyph_set: GlyphSet) -> Self {
        Self { glyph_set, ..self }
    }

    /// Pixels per character; both must be at least 1.
    pub fn with_cell_size(self, cell_width: usize, cell_height: usize) -> Result<Self> {
        if cell_width == 0 {
            return Err(DappleError::unsupported("cell_width", cell_width));
        }
        if cell_height == 0 {
            return Err(DappleError::unsupported("cell_height", cell_height));
        }
        Ok(Self {
            cell_width,
            cell_height,
            ..self
        })
    }

    pub fn with_metric(self, metric: Metric) -> Self {
        Self { metric, ..self }
    }

    pub fn with_font(self, font: FontSource) -> Self {
        Self { font, ..self }
    }

    fn key(&self) -> GlyphKey {
        GlyphKey {
            glyph_set: self.glyph_set,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            font: self.font.clone(),
        }
    }
}

impl Renderer for FingerprintRenderer {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn cell_width(&self) -> usize {
        self.cell_width
    }

    fn cell_height(&self) -> usize {
        self.cell_height
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        check_colors(bitmap, colors)?;

        let (cw, ch) = (self.cell_width, self.cell_height);
        let rows = bitmap.height() / ch;
        let cols = bitmap.width() / cw;
        if rows == 0 || cols == 0 {
            return Ok(());
        }

        let table = glyphs::table(&self.key())?;
        let mut region = vec![0.0f32; cw * ch];
        let mut line = String::new();

        for row in 0..rows {
            line.clear();
            if row > 0 {
                line.push('\n');
            }
            for col in 0..cols {
                for dy in 0..ch {
                    let src = &bitmap.row(row * ch + dy)[col * cw..(col + 1) * cw];
                    region[dy * cw..(dy + 1) * cw].copy_from_slice(src);
                }

                // Strict comparison keeps the first of equally close glyphs.
                let mut best = 0;
                let mut best_distance = f32::INFINITY;
                for i in 0..table.len() {
                    let d = self.metric.distance(&region, table.bitmap(i));
                    if d < best_distance {
                        best = i;
                        best_distance = d;
                    }
                }
                line.push(table.char_at(best));
            }
            sink.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}
