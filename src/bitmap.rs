//! Immutable grayscale bitmaps and RGB color arrays.
//!
//! Both types store pixels in row-major order with values nominally in
//! [0, 1]. Neither exposes mutable access: every transform builds a new value.

use crate::color::luminance;
use crate::error::{DappleError, Result};

/// A 2D grayscale image of shape (height, width).
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Bitmap {
    /// Wrap row-major data. Fails when `data.len() != height * width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width {
            return Err(DappleError::ShapeMismatch {
                expected: format!("{} values for {}x{}", height * width, height, width),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// A bitmap where every pixel has the same value.
    pub fn filled(height: usize, width: usize, value: f32) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// Build a bitmap by evaluating `f(y, x)` for every pixel.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                data.push(f(y, x));
            }
        }
        Self {
            height,
            width,
            data,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pixel at row `y`, column `x`. Panics when out of range.
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// One row of pixels.
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Smallest pixel value (0.0 for an empty bitmap).
    pub fn min(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Largest pixel value (0.0 for an empty bitmap).
    pub fn max(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Arithmetic mean (0.0 for an empty bitmap).
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        (sum / self.data.len() as f64) as f32
    }

    /// Apply `f` to every pixel, producing a new bitmap of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// A 3-channel RGB image of shape (height, width, 3).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorArray {
    height: usize,
    width: usize,
    data: Vec<[f32; 3]>,
}

impl ColorArray {
    /// Wrap row-major RGB data. Fails when `data.len() != height * width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<[f32; 3]>) -> Result<Self> {
        if data.len() != height * width {
            return Err(DappleError::ShapeMismatch {
                expected: format!("{} pixels for {}x{}x3", height * width, height, width),
                actual: format!("{} pixels", data.len()),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build a color array by evaluating `f(y, x)` for every pixel.
    pub fn from_fn(
        height: usize,
        width: usize,
        mut f: impl FnMut(usize, usize) -> [f32; 3],
    ) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                data.push(f(y, x));
            }
        }
        Self {
            height,
            width,
            data,
        }
    }

    /// Gray replica of a bitmap: every channel equals the pixel value.
    pub fn from_luminance(bitmap: &Bitmap) -> Self {
        Self {
            height: bitmap.height,
            width: bitmap.width,
            data: bitmap.data.iter().map(|&v| [v, v, v]).collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width); the channel dimension is always 3.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> [f32; 3] {
        self.data[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[[f32; 3]] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Luminance of every pixel as a bitmap.
    pub fn luminance(&self) -> Bitmap {
        Bitmap {
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&rgb| luminance(rgb)).collect(),
        }
    }
}

/// Fail with ShapeMismatch unless `colors` covers exactly the bitmap's pixels.
pub(crate) fn check_colors(bitmap: &Bitmap, colors: Option<&ColorArray>) -> Result<()> {
    match colors {
        Some(colors) if colors.shape() != bitmap.shape() => Err(DappleError::ShapeMismatch {
            expected: format!("colors of shape {}x{}x3", bitmap.height, bitmap.width),
            actual: format!("{}x{}x3", colors.height, colors.width),
        }),
        _ => Ok(()),
    }
}
