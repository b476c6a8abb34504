//! Sixel renderer: DEC sixel graphics, one output pixel per source pixel.
//!
//! Format: `ESC P q <palette> <bands> ESC \`.
//!
//! - `#n;2;r;g;b` defines palette entry `n` (RGB percentages 0-100)
//! - `#n` selects entry `n` for the following pixel data
//! - characters `?` (0x3F) to `~` (0x7E) encode a 6-pixel column, bit 0 on top
//! - `!<count><char>` repeats a column character
//! - `$` returns to the start of the band, `-` moves to the next band

use std::fmt::Write as _;
use std::io::Write;

use log::debug;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::error::{DappleError, Result};

use super::Renderer;

/// Device control string introducer for sixel data.
pub const DCS_START: &str = "\x1bPq";
/// String terminator.
pub const DCS_END: &str = "\x1b\\";

/// Offset of the column characters.
const SIXEL_OFFSET: u8 = 0x3F;
/// Longest run written as a single repeat.
const MAX_RUN: usize = 255;
/// Runs longer than this are written with `!`.
const MIN_RLE_RUN: usize = 3;
/// Gray palettes never exceed this many levels.
const MAX_GRAY_LEVELS: usize = 64;

/// Render bitmaps as sixel graphics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixelRenderer {
    max_colors: usize,
    scale: usize,
}

impl Default for SixelRenderer {
    fn default() -> Self {
        Self {
            max_colors: 256,
            scale: 1,
        }
    }
}

impl SixelRenderer {
    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Palette size limit, 1 to 256.
    pub fn with_max_colors(self, max_colors: usize) -> Result<Self> {
        if !(1..=256).contains(&max_colors) {
            return Err(DappleError::unsupported("max_colors", max_colors));
        }
        Ok(Self { max_colors, ..self })
    }

    /// Integer upscale factor (nearest neighbour), at least 1.
    pub fn with_scale(self, scale: usize) -> Result<Self> {
        if scale == 0 {
            return Err(DappleError::unsupported("scale", scale));
        }
        Ok(Self { scale, ..self })
    }
}

/// Palette-indexed image at source resolution.
struct Indexed {
    width: usize,
    height: usize,
    indices: Vec<u8>,
    palette: Vec<[f32; 3]>,
}

impl Indexed {
    /// Palette index at scaled coordinates; rows past the image are index 0.
    fn at(&self, y: usize, x: usize, scale: usize) -> u8 {
        let (sy, sx) = (y / scale, x / scale);
        if sy >= self.height {
            0
        } else {
            self.indices[sy * self.width + sx]
        }
    }
}

/// Integer cube root.
fn icbrt(n: usize) -> usize {
    let mut r = 0;
    while (r + 1) * (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

/// Bin a [0, 1] value into one of `levels` equal bins.
fn bin(v: f32, levels: usize) -> usize {
    ((v * (levels as f32 - 0.001)).max(0.0) as usize).min(levels - 1)
}

fn bin_centre(i: usize, levels: usize) -> f32 {
    (i as f32 + 0.5) / levels as f32
}

/// Uniform per-channel binning of RGB input.
fn quantize_colors(colors: &ColorArray, max_colors: usize) -> Indexed {
    let levels = icbrt(max_colors).clamp(1, 6);
    let indices = colors
        .as_slice()
        .iter()
        .map(|&[r, g, b]| {
            (bin(r, levels) * levels * levels + bin(g, levels) * levels + bin(b, levels)) as u8
        })
        .collect();
    let palette = (0..levels * levels * levels)
        .map(|i| {
            [
                bin_centre(i / (levels * levels), levels),
                bin_centre((i / levels) % levels, levels),
                bin_centre(i % levels, levels),
            ]
        })
        .collect();
    Indexed {
        width: colors.width(),
        height: colors.height(),
        indices,
        palette,
    }
}

fn quantize_gray(bitmap: &Bitmap, max_colors: usize) -> Indexed {
    let levels = max_colors.min(MAX_GRAY_LEVELS);
    let indices = bitmap
        .as_slice()
        .iter()
        .map(|&v| bin(v, levels) as u8)
        .collect();
    let palette = (0..levels)
        .map(|i| [bin_centre(i, levels); 3])
        .collect();
    Indexed {
        width: bitmap.width(),
        height: bitmap.height(),
        indices,
        palette,
    }
}

/// Append one color pass: column characters, run-length compressed.
fn push_runs(out: &mut String, masks: &[u8]) {
    let mut x = 0;
    while x < masks.len() {
        let mask = masks[x];
        let mut run = 1;
        while x + run < masks.len() && run < MAX_RUN && masks[x + run] == mask {
            run += 1;
        }
        let c = (SIXEL_OFFSET + mask) as char;
        if run > MIN_RLE_RUN {
            let _ = write!(out, "!{}{}", run, c);
        } else {
            out.extend(std::iter::repeat(c).take(run));
        }
        x += run;
    }
}

impl Renderer for SixelRenderer {
    fn name(&self) -> &'static str {
        "sixel"
    }

    fn cell_width(&self) -> usize {
        1
    }

    fn cell_height(&self) -> usize {
        1
    }

    fn render(
        &self,
        bitmap: &Bitmap,
        colors: Option<&ColorArray>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        check_colors(bitmap, colors)?;

        let image = match colors {
            Some(colors) => quantize_colors(colors, self.max_colors),
            None => quantize_gray(bitmap, self.max_colors),
        };
        let scale = self.scale;
        let width = image.width * scale;
        let height = (image.height * scale).div_ceil(6) * 6;
        debug!(
            "sixel: {}x{} px, {} palette entries",
            width,
            height,
            image.palette.len()
        );

        let mut out = String::from(DCS_START);
        for (i, rgb) in image.palette.iter().enumerate() {
            let [r, g, b] = rgb.map(|c| (c * 100.0) as u32);
            let _ = write!(out, "#{};2;{};{};{}", i, r, g, b);
        }
        sink.write_all(out.as_bytes())?;

        let mut present = vec![false; image.palette.len()];
        let mut masks = vec![0u8; width];
        for band_y in (0..height).step_by(6) {
            out.clear();
            present.fill(false);
            for dy in 0..6 {
                for x in 0..width {
                    present[image.at(band_y + dy, x, scale) as usize] = true;
                }
            }

            for (color, _) in present.iter().enumerate().filter(|(_, &p)| p) {
                for (x, mask) in masks.iter_mut().enumerate() {
                    *mask = (0..6)
                        .filter(|&dy| image.at(band_y + dy, x, scale) as usize == color)
                        .fold(0, |m, dy| m | (1 << dy));
                }
                let _ = write!(out, "#{}", color);
                push_runs(&mut out, &masks);
                out.push('$');
            }
            out.push('-');
            sink.write_all(out.as_bytes())?;
        }

        sink.write_all(DCS_END.as_bytes())?;
        Ok(())
    }
}
