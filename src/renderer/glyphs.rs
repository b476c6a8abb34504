//! Pre-rendered glyph tables for the fingerprint renderer.
//!
//! A table holds one `cell_width x cell_height` ink bitmap (1.0 = ink) per
//! renderable glyph of a set. Tables are built once per key and shared
//! read-only for the life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, warn};
use once_cell::sync::{Lazy, OnceCell};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, OutlineBuilder};

use crate::error::{DappleError, Result};

use super::fingerprint::{FontSource, GlyphSet};

/// Cache key: everything a table's contents depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GlyphKey {
    pub glyph_set: GlyphSet,
    pub cell_width: usize,
    pub cell_height: usize,
    pub font: FontSource,
}

/// Rendered glyphs of one set, flattened row-major per glyph.
#[derive(Debug)]
pub(crate) struct GlyphTable {
    chars: Vec<char>,
    pixels: Vec<f32>,
    cell_len: usize,
}

impl GlyphTable {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn char_at(&self, i: usize) -> char {
        self.chars[i]
    }

    pub fn bitmap(&self, i: usize) -> &[f32] {
        &self.pixels[i * self.cell_len..(i + 1) * self.cell_len]
    }
}

type Slot = Arc<OnceCell<Arc<GlyphTable>>>;

static TABLES: Lazy<Mutex<HashMap<GlyphKey, Slot>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Fetch (building on first use) the table for `key`.
///
/// Concurrent first users of one key block until the single build finishes.
/// A failed build leaves the slot empty so a later call retries.
pub(crate) fn table(key: &GlyphKey) -> Result<Arc<GlyphTable>> {
    let slot = {
        let mut tables = TABLES.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(tables.entry(key.clone()).or_default())
    };
    slot.get_or_try_init(|| build(key).map(Arc::new))
        .map(Arc::clone)
}

fn build(key: &GlyphKey) -> Result<GlyphTable> {
    let started = Instant::now();
    let source = GlyphSource::open(&key.font)?;
    let shapes = source.shapes()?;
    let cell_len = key.cell_width * key.cell_height;

    let mut chars = Vec::new();
    let mut pixels = Vec::new();
    let mut skipped = 0usize;
    for ch in key.glyph_set.chars() {
        match shapes.render(ch, key.cell_width, key.cell_height) {
            Some(bitmap) => {
                debug_assert_eq!(bitmap.len(), cell_len);
                chars.push(ch);
                pixels.extend(bitmap);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "{} of {} glyphs in set '{}' could not be rendered and were skipped",
            skipped,
            skipped + chars.len(),
            key.glyph_set.name()
        );
    }
    // One glyph cannot distinguish cells.
    if chars.len() < 2 {
        warn!(
            "glyph set '{}' kept {} renderable glyph(s)",
            key.glyph_set.name(),
            chars.len()
        );
        return Err(DappleError::NoGlyphs {
            glyph_set: key.glyph_set.name(),
        });
    }
    debug!(
        "built glyph table {:?}: {} glyphs in {:?}",
        key,
        chars.len(),
        started.elapsed()
    );

    Ok(GlyphTable {
        chars,
        pixels,
        cell_len,
    })
}

/// Raw font file bytes plus the face index within the collection.
struct FontData {
    bytes: Vec<u8>,
    index: u32,
    origin: PathBuf,
}

/// Families tried, in order, before any face flagged monospaced.
const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Menlo",
    "Consolas",
    "Courier New",
];

static SYSTEM_FONT: Lazy<Option<Arc<FontData>>> = Lazy::new(load_system_font);

fn load_system_font() -> Option<Arc<FontData>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!("font database: {} faces", db.len());

    let id = MONOSPACE_FAMILIES
        .iter()
        .find_map(|name| {
            db.query(&fontdb::Query {
                families: &[fontdb::Family::Name(*name)],
                ..Default::default()
            })
        })
        .or_else(|| db.faces().find(|face| face.monospaced).map(|face| face.id))?;

    let origin = match db.face(id).map(|face| &face.source) {
        Some(fontdb::Source::File(path)) => path.clone(),
        _ => PathBuf::from("<system font>"),
    };
    db.with_face_data(id, |data, index| {
        Arc::new(FontData {
            bytes: data.to_vec(),
            index,
            origin,
        })
    })
}

fn load_font_file(path: &Path) -> Result<FontData> {
    let bytes = std::fs::read(path).map_err(|e| DappleError::FontLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Face::parse(&bytes, 0).map_err(|e| DappleError::FontLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(FontData {
        bytes,
        index: 0,
        origin: path.to_path_buf(),
    })
}

/// Where glyph shapes come from for one table build.
enum GlyphSource {
    Font(Arc<FontData>),
    Builtin,
}

impl GlyphSource {
    fn open(font: &FontSource) -> Result<Self> {
        match font {
            FontSource::System => match SYSTEM_FONT.as_ref() {
                Some(data) => Ok(GlyphSource::Font(Arc::clone(data))),
                None => {
                    warn!("no monospace system font found, using builtin glyph shapes");
                    Ok(GlyphSource::Builtin)
                }
            },
            FontSource::File(path) => Ok(GlyphSource::Font(Arc::new(load_font_file(path)?))),
            FontSource::Builtin => Ok(GlyphSource::Builtin),
        }
    }

    /// Parse the font face once for the whole build.
    fn shapes(&self) -> Result<Shapes<'_>> {
        match self {
            GlyphSource::Font(data) => Face::parse(&data.bytes, data.index)
                .map(Shapes::Font)
                .map_err(|e| DappleError::FontLoad {
                    path: data.origin.clone(),
                    message: e.to_string(),
                }),
            GlyphSource::Builtin => Ok(Shapes::Builtin),
        }
    }
}

/// Glyph shapes ready to rasterize.
enum Shapes<'a> {
    Font(Face<'a>),
    Builtin,
}

impl Shapes<'_> {
    fn render(&self, ch: char, width: usize, height: usize) -> Option<Vec<f32>> {
        match self {
            Shapes::Font(face) => rasterize(face, ch, width, height),
            Shapes::Builtin => BuiltinShape::of(ch).map(|shape| shape.raster(width, height)),
        }
    }
}

/// Feeds glyph outlines into a tiny-skia path, mapping font units to pixels.
struct PathSink {
    path: PathBuilder,
    scale: f32,
    dx: f32,
    dy: f32,
}

impl PathSink {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.dx + x * self.scale, self.dy - y * self.scale)
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.path.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.path.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.path.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.path.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.path.close();
    }
}

/// Draw one glyph at size `height - 2`, its ink box centred in the cell.
///
/// Returns `None` when the font has no glyph for `ch`. Glyphs without
/// outlines (space) render as blank cells.
fn rasterize(face: &Face<'_>, ch: char, width: usize, height: usize) -> Option<Vec<f32>> {
    let id = face.glyph_index(ch)?;
    let blank = vec![0.0; width * height];
    let Some(bbox) = face.glyph_bounding_box(id) else {
        return Some(blank);
    };

    let px = height.saturating_sub(2).max(1) as f32;
    let scale = px / face.units_per_em() as f32;
    let ink_w = (bbox.x_max - bbox.x_min) as f32 * scale;
    let ink_h = (bbox.y_max - bbox.y_min) as f32 * scale;
    let left = ((width as f32 - ink_w) / 2.0).floor();
    let top = ((height as f32 - ink_h) / 2.0).floor();

    let mut sink = PathSink {
        path: PathBuilder::new(),
        scale,
        dx: left - bbox.x_min as f32 * scale,
        dy: top + bbox.y_max as f32 * scale,
    };
    face.outline_glyph(id, &mut sink)?;
    let Some(path) = sink.path.finish() else {
        return Some(blank);
    };

    let mut pixmap = Pixmap::new(width as u32, height as u32)?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    Some(
        pixmap
            .data()
            .chunks_exact(4)
            .map(|rgba| rgba[3] as f32 / 255.0)
            .collect(),
    )
}

/// Font-independent shapes for space, block elements and braille.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BuiltinShape {
    /// Solid rectangle in cell fractions: x0, y0, x1, y1.
    Rect(f32, f32, f32, f32),
    /// Uniform partial ink.
    Shade(f32),
    /// Quadrant bits: TL=8, TR=4, BL=2, BR=1.
    Quadrants(u8),
    /// Braille dot bits (U+2800 offset).
    Braille(u8),
}

impl BuiltinShape {
    fn of(ch: char) -> Option<Self> {
        let code = ch as u32;
        let shape = match code {
            0x20 => BuiltinShape::Shade(0.0),
            0x2580 => BuiltinShape::Rect(0.0, 0.0, 1.0, 0.5),
            0x2581..=0x2587 => {
                let k = (code - 0x2580) as f32;
                BuiltinShape::Rect(0.0, 1.0 - k / 8.0, 1.0, 1.0)
            }
            0x2588 => BuiltinShape::Rect(0.0, 0.0, 1.0, 1.0),
            0x2589..=0x258F => {
                let k = (code - 0x2588) as f32;
                BuiltinShape::Rect(0.0, 0.0, (8.0 - k) / 8.0, 1.0)
            }
            0x2590 => BuiltinShape::Rect(0.5, 0.0, 1.0, 1.0),
            0x2591 => BuiltinShape::Shade(0.25),
            0x2592 => BuiltinShape::Shade(0.5),
            0x2593 => BuiltinShape::Shade(0.75),
            0x2594 => BuiltinShape::Rect(0.0, 0.0, 1.0, 0.125),
            0x2595 => BuiltinShape::Rect(0.875, 0.0, 1.0, 1.0),
            0x2596..=0x259F => {
                const QUADS: [u8; 10] = [2, 1, 8, 11, 9, 14, 13, 4, 6, 7];
                BuiltinShape::Quadrants(QUADS[(code - 0x2596) as usize])
            }
            0x2800..=0x28FF => BuiltinShape::Braille((code - 0x2800) as u8),
            _ => return None,
        };
        Some(shape)
    }

    /// Ink at a pixel centre given as cell fractions.
    fn ink(self, fx: f32, fy: f32) -> f32 {
        let inside = |x0: f32, y0: f32, x1: f32, y1: f32| fx >= x0 && fx < x1 && fy >= y0 && fy < y1;
        let on = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BuiltinShape::Rect(x0, y0, x1, y1) => on(inside(x0, y0, x1, y1)),
            BuiltinShape::Shade(v) => v,
            BuiltinShape::Quadrants(bits) => {
                let bit = match (fy < 0.5, fx < 0.5) {
                    (true, true) => 8,
                    (true, false) => 4,
                    (false, true) => 2,
                    (false, false) => 1,
                };
                on(bits & bit != 0)
            }
            BuiltinShape::Braille(bits) => {
                const DOT_BITS: [[u8; 2]; 4] = [[0, 3], [1, 4], [2, 5], [6, 7]];
                let col = ((fx * 2.0) as usize).min(1);
                let row = ((fy * 4.0) as usize).min(3);
                let lx = (fx * 2.0).fract();
                let ly = (fy * 4.0).fract();
                let dot = (0.25..0.75).contains(&lx) && (0.25..0.75).contains(&ly);
                on(dot && bits & (1 << DOT_BITS[row][col]) != 0)
            }
        }
    }

    fn raster(self, width: usize, height: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let fx = (x as f32 + 0.5) / width as f32;
                let fy = (y as f32 + 0.5) / height as f32;
                out.push(self.ink(fx, fy));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn builtin_key(glyph_set: GlyphSet) -> GlyphKey {
        GlyphKey {
            glyph_set,
            cell_width: 8,
            cell_height: 16,
            font: FontSource::Builtin,
        }
    }

    #[test]
    fn test_builtin_full_block_is_all_ink() {
        let shape = BuiltinShape::of('█').unwrap();
        assert!(shape.raster(8, 16).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_builtin_upper_half() {
        let bitmap = BuiltinShape::of('▀').unwrap().raster(2, 4);
        assert_eq!(bitmap, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_builtin_quadrant_upper_left() {
        let bitmap = BuiltinShape::of('▘').unwrap().raster(2, 2);
        assert_eq!(bitmap, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_builtin_braille_single_dot() {
        // Dot 1 (top-left) at 8x16: subcell is 4x4, dot covers its middle 2x2.
        let bitmap = BuiltinShape::of('\u{2801}').unwrap().raster(8, 16);
        let ink: Vec<(usize, usize)> = (0..16)
            .flat_map(|y| (0..8).map(move |x| (y, x)))
            .filter(|&(y, x)| bitmap[y * 8 + x] > 0.0)
            .collect();
        assert_eq!(ink, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_builtin_unknown_char() {
        assert!(BuiltinShape::of('A').is_none());
    }

    #[test]
    fn test_table_is_cached() {
        let key = builtin_key(GlyphSet::Braille);
        let a = table(&key).unwrap();
        let b = table(&key).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 256);
        assert_eq!(a.bitmap(0).len(), 8 * 16);
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        // Unusual cell size so no other test warms this key.
        let key = GlyphKey {
            glyph_set: GlyphSet::Extended,
            cell_width: 5,
            cell_height: 7,
            font: FontSource::Builtin,
        };
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let key = key.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    table(&key).unwrap()
                })
            })
            .collect();
        let tables: Vec<Arc<GlyphTable>> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let first = &tables[0];
        for t in &tables[1..] {
            assert!(Arc::ptr_eq(first, t));
        }
        assert!(first.len() > 256);
        assert_eq!(first.bitmap(first.len() - 1).len(), 5 * 7);
    }

    #[test]
    fn test_single_glyph_table_rejected() {
        // Builtin shapes cover only the space of the basic set.
        let err = table(&builtin_key(GlyphSet::Basic)).unwrap_err();
        assert!(matches!(err, DappleError::NoGlyphs { glyph_set: "basic" }));
    }

    #[test]
    fn test_missing_font_file_errors() {
        let key = GlyphKey {
            font: FontSource::File(PathBuf::from("/nonexistent/font.ttf")),
            ..builtin_key(GlyphSet::Basic)
        };
        assert!(matches!(table(&key), Err(DappleError::FontLoad { .. })));
    }
}
