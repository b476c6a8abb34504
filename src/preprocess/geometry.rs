//! Geometric transforms: resize, crop, flip and rotate.

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::{DappleError, Result};

/// Mirror axis for [`flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Left-right mirror.
    #[serde(alias = "h")]
    Horizontal,
    /// Top-bottom mirror.
    #[serde(alias = "v")]
    Vertical,
}

/// Resize with bilinear interpolation.
///
/// # Arguments
/// * `bitmap` - Source image
/// * `height` - Target height in pixels (non-zero)
/// * `width` - Target width in pixels (non-zero)
///
/// # Returns
/// A `height x width` bitmap, or UnsupportedOption when a target dimension
/// is zero or the source is empty.
pub fn resize(bitmap: &Bitmap, height: usize, width: usize) -> Result<Bitmap> {
    if height == 0 || width == 0 {
        return Err(DappleError::unsupported("resize target", format!("{}x{}", height, width)));
    }
    if bitmap.is_empty() {
        return Err(DappleError::unsupported("resize source", "empty bitmap"));
    }

    let (old_h, old_w) = bitmap.shape();
    let y_ratio = old_h as f64 / height as f64;
    let x_ratio = old_w as f64 / width as f64;

    // Per-axis source indices and weights: (lower, upper, fraction).
    let axis = |n: usize, ratio: f64, old: usize| -> Vec<(usize, usize, f32)> {
        (0..n)
            .map(|i| {
                let pos = i as f64 * ratio;
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(old - 1);
                (lo, hi, (pos - lo as f64) as f32)
            })
            .collect()
    };
    let ys = axis(height, y_ratio, old_h);
    let xs = axis(width, x_ratio, old_w);

    Ok(Bitmap::from_fn(height, width, |y, x| {
        let (y0, y1, fy) = ys[y];
        let (x0, x1, fx) = xs[x];
        let top = bitmap.get(y0, x0) * (1.0 - fx) + bitmap.get(y0, x1) * fx;
        let bottom = bitmap.get(y1, x0) * (1.0 - fx) + bitmap.get(y1, x1) * fx;
        top * (1.0 - fy) + bottom * fy
    }))
}

/// Extract the `width x height` region whose top-left corner is `(x, y)`.
///
/// Fails with OutOfBounds when the region has zero size or leaves the bitmap.
pub fn crop(bitmap: &Bitmap, x: usize, y: usize, width: usize, height: usize) -> Result<Bitmap> {
    let (h, w) = bitmap.shape();
    let (x2, y2) = (x.saturating_add(width), y.saturating_add(height));
    if width == 0 || height == 0 || x2 > w || y2 > h {
        return Err(DappleError::OutOfBounds {
            x1: x,
            y1: y,
            x2,
            y2,
            width: w,
            height: h,
        });
    }
    Ok(Bitmap::from_fn(height, width, |dy, dx| bitmap.get(y + dy, x + dx)))
}

/// Mirror along `axis`.
pub fn flip(bitmap: &Bitmap, axis: Axis) -> Bitmap {
    let (h, w) = bitmap.shape();
    match axis {
        Axis::Horizontal => Bitmap::from_fn(h, w, |y, x| bitmap.get(y, w - 1 - x)),
        Axis::Vertical => Bitmap::from_fn(h, w, |y, x| bitmap.get(h - 1 - y, x)),
    }
}

/// Rotate counter-clockwise by `degrees`.
///
/// Multiples of 90 permute pixels exactly (90 and 270 swap the dimensions).
/// Other angles enlarge the output to the rotated bounding box, sample the
/// source bilinearly and fill uncovered corners with 0.0.
pub fn rotate(bitmap: &Bitmap, degrees: f32) -> Bitmap {
    let (h, w) = bitmap.shape();
    let degrees = degrees.rem_euclid(360.0);
    match degrees {
        d if d == 0.0 => bitmap.clone(),
        d if d == 90.0 => Bitmap::from_fn(w, h, |y, x| bitmap.get(x, w - 1 - y)),
        d if d == 180.0 => Bitmap::from_fn(h, w, |y, x| bitmap.get(h - 1 - y, w - 1 - x)),
        d if d == 270.0 => Bitmap::from_fn(w, h, |y, x| bitmap.get(h - 1 - x, y)),
        d => rotate_resampled(bitmap, d as f64),
    }
}

fn rotate_resampled(bitmap: &Bitmap, degrees: f64) -> Bitmap {
    let (h, w) = bitmap.shape();
    if bitmap.is_empty() {
        return bitmap.clone();
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (hf, wf) = (h as f64, w as f64);

    let out_h = (hf * cos.abs() + wf * sin.abs() + 0.5) as usize;
    let out_w = (wf * cos.abs() + hf * sin.abs() + 0.5) as usize;

    let (in_cy, in_cx) = ((hf - 1.0) / 2.0, (wf - 1.0) / 2.0);
    let (out_cy, out_cx) = ((out_h as f64 - 1.0) / 2.0, (out_w as f64 - 1.0) / 2.0);
    const EDGE: f64 = 1e-9;

    Bitmap::from_fn(out_h, out_w, |y, x| {
        let dy = y as f64 - out_cy;
        let dx = x as f64 - out_cx;
        let sy = cos * dy + sin * dx + in_cy;
        let sx = -sin * dy + cos * dx + in_cx;
        if sy < -EDGE || sx < -EDGE || sy > hf - 1.0 + EDGE || sx > wf - 1.0 + EDGE {
            return 0.0;
        }
        let sy = sy.clamp(0.0, hf - 1.0);
        let sx = sx.clamp(0.0, wf - 1.0);
        let (y0, x0) = (sy.floor() as usize, sx.floor() as usize);
        let (y1, x1) = ((y0 + 1).min(h - 1), (x0 + 1).min(w - 1));
        let (fy, fx) = ((sy - y0 as f64) as f32, (sx - x0 as f64) as f32);
        let top = bitmap.get(y0, x0) * (1.0 - fx) + bitmap.get(y0, x1) * fx;
        let bottom = bitmap.get(y1, x0) * (1.0 - fx) + bitmap.get(y1, x1) * fx;
        (top * (1.0 - fy) + bottom * fy).clamp(0.0, 1.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Bitmap {
        // [[1, 2], [3, 4]] scaled into [0, 1].
        Bitmap::from_vec(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap()
    }

    #[test]
    fn test_resize_identity() {
        let b = Bitmap::from_fn(3, 5, |y, x| (y * 5 + x) as f32 / 15.0);
        assert_eq!(resize(&b, 3, 5).unwrap(), b);
    }

    #[test]
    fn test_resize_upscale_interpolates() {
        let b = Bitmap::from_vec(1, 2, vec![0.0, 1.0]).unwrap();
        let out = resize(&b, 1, 4).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_resize_rejects_zero() {
        assert!(resize(&grid(), 0, 3).is_err());
        assert!(resize(&Bitmap::filled(0, 0, 0.0), 2, 2).is_err());
    }

    #[test]
    fn test_crop_region() {
        let out = crop(&grid(), 1, 0, 1, 2).unwrap();
        assert_eq!(out.as_slice(), &[0.2, 0.4]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        assert!(matches!(
            crop(&grid(), 1, 1, 2, 1),
            Err(DappleError::OutOfBounds { .. })
        ));
        assert!(crop(&grid(), 0, 0, 0, 1).is_err());
    }

    #[test]
    fn test_flip() {
        assert_eq!(flip(&grid(), Axis::Horizontal).as_slice(), &[0.2, 0.1, 0.4, 0.3]);
        assert_eq!(flip(&grid(), Axis::Vertical).as_slice(), &[0.3, 0.4, 0.1, 0.2]);
    }

    #[test]
    fn test_rotate_quarter_turns() {
        assert_eq!(rotate(&grid(), 90.0).as_slice(), &[0.2, 0.4, 0.1, 0.3]);
        assert_eq!(rotate(&grid(), 180.0).as_slice(), &[0.4, 0.3, 0.2, 0.1]);
        assert_eq!(rotate(&grid(), 270.0).as_slice(), &[0.3, 0.1, 0.4, 0.2]);
        assert_eq!(rotate(&grid(), -90.0), rotate(&grid(), 270.0));
        assert_eq!(rotate(&grid(), 360.0), grid());
    }

    #[test]
    fn test_rotate_quarter_turn_swaps_shape() {
        let b = Bitmap::filled(2, 5, 1.0);
        assert_eq!(rotate(&b, 90.0).shape(), (5, 2));
    }

    #[test]
    fn test_rotate_arbitrary_expands_and_pads() {
        let b = Bitmap::filled(10, 10, 1.0);
        let out = rotate(&b, 45.0);
        // 10 * sqrt(2) = 14.14, rounded.
        assert_eq!(out.shape(), (14, 14));
        assert_eq!(out.get(0, 0), 0.0);
        assert!((out.get(7, 7) - 1.0).abs() < 1e-5);
        assert!(out.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
