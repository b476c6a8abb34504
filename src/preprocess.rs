//! Bitmap preprocessing filters.
//!
//! Every filter takes a bitmap and returns a new one; inputs are never
//! modified. Filters compose freely, and [`PreprocessStep`] describes a
//! filter as data so pipelines can be loaded from configuration.

mod dither;
mod geometry;
mod tone;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::Result;

pub use dither::floyd_steinberg;
pub use geometry::{crop, flip, resize, rotate, Axis};
pub use tone::{auto_contrast, gamma_correct, invert, sharpen, threshold};

fn default_level() -> f32 {
    0.5
}

fn default_gamma() -> f32 {
    2.2
}

fn default_strength() -> f32 {
    1.0
}

/// One filter with its parameters.
///
/// Deserializes from tables tagged by `op`, e.g.
/// `{ op = "gamma_correct", gamma = 1.8 }` or `{ op = "flip", axis = "h" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PreprocessStep {
    AutoContrast,
    FloydSteinberg {
        #[serde(default = "default_level")]
        threshold: f32,
    },
    GammaCorrect {
        #[serde(default = "default_gamma")]
        gamma: f32,
    },
    Sharpen {
        #[serde(default = "default_strength")]
        strength: f32,
    },
    Threshold {
        #[serde(default = "default_level")]
        level: f32,
    },
    Invert,
    Resize {
        height: usize,
        width: usize,
    },
    Crop {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    Flip {
        axis: Axis,
    },
    Rotate {
        degrees: f32,
    },
}

impl PreprocessStep {
    pub fn apply(&self, bitmap: &Bitmap) -> Result<Bitmap> {
        match *self {
            PreprocessStep::AutoContrast => Ok(auto_contrast(bitmap)),
            PreprocessStep::FloydSteinberg { threshold } => Ok(floyd_steinberg(bitmap, threshold)),
            PreprocessStep::GammaCorrect { gamma } => gamma_correct(bitmap, gamma),
            PreprocessStep::Sharpen { strength } => Ok(sharpen(bitmap, strength)),
            PreprocessStep::Threshold { level } => Ok(threshold(bitmap, level)),
            PreprocessStep::Invert => Ok(invert(bitmap)),
            PreprocessStep::Resize { height, width } => resize(bitmap, height, width),
            PreprocessStep::Crop {
                x,
                y,
                width,
                height,
            } => crop(bitmap, x, y, width, height),
            PreprocessStep::Flip { axis } => Ok(flip(bitmap, axis)),
            PreprocessStep::Rotate { degrees } => Ok(rotate(bitmap, degrees)),
        }
    }
}

/// Run `steps` in order, feeding each output into the next.
pub fn apply_all(steps: &[PreprocessStep], bitmap: &Bitmap) -> Result<Bitmap> {
    let mut current = bitmap.clone();
    for step in steps {
        debug!("preprocess {:?} on {}x{}", step, current.height(), current.width());
        current = step.apply(&current)?;
    }
    Ok(current)
}
