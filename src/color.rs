//! Luminance and ANSI color escape helpers.
//!
//! Luminance uses the ITU-R BT.601 coefficients:
//! `Y = 0.299*R + 0.587*G + 0.114*B`.

use std::fmt::Write;

/// Red weight of the luminance formula.
pub const LUM_R: f32 = 0.299;
/// Green weight of the luminance formula.
pub const LUM_G: f32 = 0.587;
/// Blue weight of the luminance formula.
pub const LUM_B: f32 = 0.114;

/// Reset all SGR attributes.
pub const RESET: &str = "\x1b[0m";

/// First code of the 24-step grayscale ramp in the 256-color palette.
pub const GRAY_BASE: u8 = 232;

/// First code of the 6x6x6 color cube in the 256-color palette.
pub const CUBE_BASE: u8 = 16;

/// Perceptual luminance of an RGB triple with components in [0, 1].
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    LUM_R * rgb[0] + LUM_G * rgb[1] + LUM_B * rgb[2]
}

/// Which SGR color slot an escape code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Foreground,
    Background,
}

impl Layer {
    fn prefix(self) -> u8 {
        match self {
            Layer::Foreground => 38,
            Layer::Background => 48,
        }
    }
}

/// Append a 256-color escape (`ESC[38;5;N m` / `ESC[48;5;N m`).
pub fn push_indexed(out: &mut String, layer: Layer, code: u8) {
    let _ = write!(out, "\x1b[{};5;{}m", layer.prefix(), code);
}

/// Append a 24-bit escape (`ESC[38;2;R;G;B m` / `ESC[48;2;R;G;B m`).
pub fn push_truecolor(out: &mut String, layer: Layer, r: u8, g: u8, b: u8) {
    let _ = write!(out, "\x1b[{};2;{};{};{}m", layer.prefix(), r, g, b);
}

/// Scale a [0, 1] component to a byte by truncation, clamping out-of-range input.
#[inline]
pub fn to_byte(v: f32, scale: f32) -> u8 {
    (v * scale).clamp(0.0, 255.0) as u8
}

/// 256-color code of the 6x6x6 cube cell containing an RGB triple.
pub fn cube_code(rgb: [f32; 3]) -> u8 {
    let level = |c: f32| (c * 5.0).clamp(0.0, 5.0) as u8;
    CUBE_BASE + 36 * level(rgb[0]) + 6 * level(rgb[1]) + level(rgb[2])
}

/// 256-color code of a gray level, clamped to the 24-step ramp.
pub fn gray_code(level: i32) -> u8 {
    GRAY_BASE + level.clamp(0, 23) as u8
}
