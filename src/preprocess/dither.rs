//! Floyd-Steinberg error diffusion.
//!
//! Kept apart from the block-parallel filters: the output of every pixel
//! depends on all pixels visited before it, so the traversal order below
//! is part of the result.

use crate::bitmap::Bitmap;

/// Binarize with Floyd-Steinberg dithering.
///
/// Pixels are visited row by row, left to right. Each is set to 1.0 when
/// its accumulated value exceeds `threshold`, and the quantization error is
/// pushed to unvisited neighbours:
///
/// ```text
///         X    7/16
///  3/16  5/16  1/16
/// ```
///
/// The result contains only 0.0 and 1.0.
pub fn floyd_steinberg(bitmap: &Bitmap, threshold: f32) -> Bitmap {
    let (h, w) = bitmap.shape();
    let threshold = threshold as f64;
    let mut work: Vec<f64> = bitmap.as_slice().iter().map(|&v| v as f64).collect();

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let old = work[i];
            let new = if old > threshold { 1.0 } else { 0.0 };
            work[i] = new;
            let error = old - new;

            if x + 1 < w {
                work[i + 1] += error * 7.0 / 16.0;
            }
            if y + 1 < h {
                let below = i + w;
                if x > 0 {
                    work[below - 1] += error * 3.0 / 16.0;
                }
                work[below] += error * 5.0 / 16.0;
                if x + 1 < w {
                    work[below + 1] += error / 16.0;
                }
            }
        }
    }

    Bitmap::from_fn(h, w, |y, x| work[y * w + x] as f32)
}
