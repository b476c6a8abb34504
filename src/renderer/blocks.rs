//! Shared fg/bg block quantization for the quadrant and sextant renderers.
//!
//! Every block of `width x height` pixels is reduced to one glyph drawn with
//! a foreground and a background color. The foreground tone is the block's
//! brightest pixel, the background its darkest; pixels strictly above the
//! midpoint set their bit in the glyph pattern. Ties for brightest/darkest
//! pixel resolve to the first pixel in raster order.

use std::io::Write;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::color::{
    cube_code, gray_code, luminance, push_indexed, push_truecolor, to_byte, Layer, RESET,
};
use crate::error::Result;

/// Blocks whose tonal spread is below this are drawn as a solid glyph.
const UNIFORM_THRESHOLD: f32 = 0.001;

/// Geometry and glyph table of one block family.
pub(crate) struct BlockShape {
    pub width: usize,
    pub height: usize,
    /// Bit weight of each pixel, in raster order within the block.
    pub weights: &'static [u8],
    /// Pattern used for uniform blocks (all bits set).
    pub full: u8,
    /// Glyph for a pattern.
    pub glyph: fn(u8) -> char,
}

/// Output options shared by the block renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockStyle {
    pub true_color: bool,
    pub grayscale: bool,
}

/// Encode one block's fg/bg colors and glyph.
struct Cell {
    fg: [f32; 3],
    bg: [f32; 3],
    pattern: u8,
}

pub(crate) fn render_blocks(
    shape: &BlockShape,
    style: BlockStyle,
    bitmap: &Bitmap,
    colors: Option<&ColorArray>,
    sink: &mut dyn Write,
) -> Result<()> {
    check_colors(bitmap, colors)?;

    let rows = bitmap.height() / shape.height;
    let cols = bitmap.width() / shape.width;
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let colors = if style.grayscale { None } else { colors };
    let n = shape.width * shape.height;
    let mut tones = vec![0.0f32; n];
    let mut rgbs = vec![[0.0f32; 3]; n];
    let mut line = String::new();

    for row in 0..rows {
        line.clear();
        if row > 0 {
            line.push('\n');
        }

        for col in 0..cols {
            let y0 = row * shape.height;
            let x0 = col * shape.width;
            for dy in 0..shape.height {
                for dx in 0..shape.width {
                    let i = dy * shape.width + dx;
                    match colors {
                        Some(colors) => {
                            rgbs[i] = colors.get(y0 + dy, x0 + dx);
                            tones[i] = luminance(rgbs[i]);
                        }
                        None => tones[i] = bitmap.get(y0 + dy, x0 + dx),
                    }
                }
            }

            let cell = match colors {
                Some(_) => quantize_rgb(shape, &tones, &rgbs),
                None => quantize_gray(shape, &tones),
            };

            match colors {
                Some(_) => {
                    push_color(&mut line, Layer::Foreground, cell.fg, style.true_color);
                    push_color(&mut line, Layer::Background, cell.bg, style.true_color);
                }
                None => {
                    push_gray(&mut line, Layer::Foreground, cell.fg[0], style.true_color);
                    push_gray(&mut line, Layer::Background, cell.bg[0], style.true_color);
                }
            }
            line.push((shape.glyph)(cell.pattern));
        }

        line.push_str(RESET);
        sink.write_all(line.as_bytes())?;
    }

    Ok(())
}

/// Index of the first maximum and the first minimum.
fn extremes(tones: &[f32]) -> (usize, usize) {
    let mut hi = 0;
    let mut lo = 0;
    for (i, &v) in tones.iter().enumerate().skip(1) {
        if v > tones[hi] {
            hi = i;
        }
        if v < tones[lo] {
            lo = i;
        }
    }
    (hi, lo)
}

fn pattern(shape: &BlockShape, tones: &[f32], fg: f32, bg: f32) -> u8 {
    if fg - bg < UNIFORM_THRESHOLD {
        return shape.full;
    }
    let split = (fg + bg) / 2.0;
    tones
        .iter()
        .zip(shape.weights)
        .filter(|(&v, _)| v > split)
        .map(|(_, &w)| w)
        .sum()
}

fn quantize_gray(shape: &BlockShape, tones: &[f32]) -> Cell {
    let (hi, lo) = extremes(tones);
    let (fg, bg) = (tones[hi], tones[lo]);
    Cell {
        fg: [fg; 3],
        bg: [bg; 3],
        pattern: pattern(shape, tones, fg, bg),
    }
}

fn quantize_rgb(shape: &BlockShape, tones: &[f32], rgbs: &[[f32; 3]]) -> Cell {
    let (hi, lo) = extremes(tones);
    let pattern = pattern(shape, tones, tones[hi], tones[lo]);
    if tones[hi] - tones[lo] < UNIFORM_THRESHOLD {
        let mut mean = [0.0f32; 3];
        for rgb in rgbs {
            for c in 0..3 {
                mean[c] += rgb[c];
            }
        }
        let mean = mean.map(|c| c / rgbs.len() as f32);
        return Cell {
            fg: mean,
            bg: mean,
            pattern,
        };
    }
    Cell {
        fg: rgbs[hi],
        bg: rgbs[lo],
        pattern,
    }
}

fn push_gray(out: &mut String, layer: Layer, brightness: f32, true_color: bool) {
    if true_color {
        let v = to_byte(brightness, 255.0);
        push_truecolor(out, layer, v, v, v);
    } else {
        push_indexed(out, layer, gray_code((brightness * 23.0) as i32));
    }
}

fn push_color(out: &mut String, layer: Layer, rgb: [f32; 3], true_color: bool) {
    if true_color {
        let [r, g, b] = rgb.map(|c| to_byte(c, 255.0));
        push_truecolor(out, layer, r, g, b);
    } else {
        push_indexed(out, layer, cube_code(rgb));
    }
}
