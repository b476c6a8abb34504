//! Per-pixel tone adjustments: contrast, gamma, sharpening, thresholding.

use crate::bitmap::Bitmap;
use crate::error::{DappleError, Result};

/// Spread below which a bitmap counts as constant.
const CONSTANT_EPSILON: f32 = 1e-6;

/// Stretch the histogram so the darkest pixel becomes 0.0 and the
/// brightest 1.0.
///
/// A constant bitmap has no range to stretch and becomes a uniform 0.5.
pub fn auto_contrast(bitmap: &Bitmap) -> Bitmap {
    let (lo, hi) = (bitmap.min(), bitmap.max());
    if hi - lo < CONSTANT_EPSILON {
        let (h, w) = bitmap.shape();
        return Bitmap::filled(h, w, 0.5);
    }
    let range = hi - lo;
    bitmap.map(|v| (v - lo) / range)
}

/// Apply `v' = clamp(v, 0, 1) ^ gamma`.
///
/// Gamma above 1 darkens, below 1 brightens; 2.2 is the usual display
/// gamma. Fails with UnsupportedOption unless gamma is finite and positive.
pub fn gamma_correct(bitmap: &Bitmap, gamma: f32) -> Result<Bitmap> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(DappleError::unsupported("gamma", gamma));
    }
    Ok(bitmap.map(|v| v.clamp(0.0, 1.0).powf(gamma)))
}

/// Laplacian sharpening: `v' = v + strength * (4v - up - down - left - right)`.
///
/// Edges are padded by replication; the result is clamped to [0, 1].
pub fn sharpen(bitmap: &Bitmap, strength: f32) -> Bitmap {
    let (h, w) = bitmap.shape();
    Bitmap::from_fn(h, w, |y, x| {
        let c = bitmap.get(y, x);
        let up = bitmap.get(y.saturating_sub(1), x);
        let down = bitmap.get((y + 1).min(h - 1), x);
        let left = bitmap.get(y, x.saturating_sub(1));
        let right = bitmap.get(y, (x + 1).min(w - 1));
        let laplacian = 4.0 * c - up - down - left - right;
        (c + strength * laplacian).clamp(0.0, 1.0)
    })
}

/// Binary step: 1.0 where `v > level`, else 0.0.
pub fn threshold(bitmap: &Bitmap, level: f32) -> Bitmap {
    bitmap.map(|v| if v > level { 1.0 } else { 0.0 })
}

/// `1 - v` for every pixel.
pub fn invert(bitmap: &Bitmap) -> Bitmap {
    bitmap.map(|v| 1.0 - v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_contrast_stretches() {
        let b = Bitmap::from_vec(2, 2, vec![0.3, 0.5, 0.4, 0.6]).unwrap();
        let out = auto_contrast(&b);
        assert_eq!(out.min(), 0.0);
        assert_eq!(out.max(), 1.0);
    }

    #[test]
    fn test_auto_contrast_constant_is_half() {
        let out = auto_contrast(&Bitmap::filled(3, 2, 0.8));
        assert!(out.as_slice().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_gamma() {
        let out = gamma_correct(&Bitmap::from_vec(1, 3, vec![0.5, 1.0, -0.2]).unwrap(), 2.0)
            .unwrap();
        assert_eq!(out.as_slice(), &[0.25, 1.0, 0.0]);
    }

    #[test]
    fn test_gamma_rejects_nonpositive() {
        let b = Bitmap::filled(1, 1, 0.5);
        assert!(gamma_correct(&b, 0.0).is_err());
        assert!(gamma_correct(&b, -1.0).is_err());
        assert!(gamma_correct(&b, f32::NAN).is_err());
    }

    #[test]
    fn test_sharpen_flat_unchanged() {
        let b = Bitmap::filled(3, 3, 0.5);
        assert_eq!(sharpen(&b, 1.0), b);
    }

    #[test]
    fn test_sharpen_boosts_peak() {
        let b = Bitmap::from_fn(3, 3, |y, x| if (y, x) == (1, 1) { 0.6 } else { 0.5 });
        let out = sharpen(&b, 2.0);
        assert_eq!(out.get(1, 1), 1.0);
        assert!(out.get(0, 1) < 0.5);
    }

    #[test]
    fn test_threshold_strict() {
        let out = threshold(&Bitmap::from_vec(1, 3, vec![0.4, 0.5, 0.6]).unwrap(), 0.5);
        assert_eq!(out.as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_invert() {
        let out = invert(&Bitmap::from_vec(1, 2, vec![0.0, 0.25]).unwrap());
        assert_eq!(out.as_slice(), &[1.0, 0.75]);
    }
}
