//! Canvas: a bitmap, its optional colors and an optional default renderer.
//!
//! Composition operations (crop, stack, overlay, invert) never modify the
//! receiver; each returns a fresh canvas.

use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::error::{DappleError, Result};
use crate::renderer::{BrailleRenderer, Renderer};

/// A renderable image.
///
/// Invariant: when colors are present their (height, width) equals the
/// bitmap's.
#[derive(Clone)]
pub struct Canvas {
    bitmap: Bitmap,
    colors: Option<ColorArray>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Canvas {
    /// Create a canvas, failing with ShapeMismatch when `colors` does not
    /// match the bitmap.
    pub fn new(bitmap: Bitmap, colors: Option<ColorArray>) -> Result<Self> {
        check_colors(&bitmap, colors.as_ref())?;
        Ok(Self {
            bitmap,
            colors,
            renderer: None,
        })
    }

    /// Create a canvas from RGB data; the bitmap is its luminance.
    pub fn from_colors(colors: ColorArray) -> Self {
        Self {
            bitmap: colors.luminance(),
            colors: Some(colors),
            renderer: None,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn colors(&self) -> Option<&ColorArray> {
        self.colors.as_ref()
    }

    /// The renderer used by `Display`, if one was attached.
    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn pixel_width(&self) -> usize {
        self.bitmap.width()
    }

    pub fn pixel_height(&self) -> usize {
        self.bitmap.height()
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        self.bitmap.shape()
    }

    /// (width, height)
    pub fn size(&self) -> (usize, usize) {
        (self.bitmap.width(), self.bitmap.height())
    }

    /// Attach a default renderer for `Display`.
    pub fn with_renderer(self, renderer: impl Renderer + 'static) -> Self {
        Self {
            renderer: Some(Arc::new(renderer)),
            ..self
        }
    }

    /// Render through `renderer` into `sink`.
    pub fn out(&self, renderer: &dyn Renderer, sink: &mut dyn Write) -> Result<()> {
        renderer.render(&self.bitmap, self.colors.as_ref(), sink)
    }

    /// Extract the half-open region `[x1, x2) x [y1, y2)`.
    ///
    /// Fails with OutOfBounds when the region is empty or extends past the
    /// canvas.
    pub fn crop(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> Result<Self> {
        let (h, w) = self.shape();
        if x2 <= x1 || y2 <= y1 || x2 > w || y2 > h {
            return Err(DappleError::OutOfBounds {
                x1,
                y1,
                x2,
                y2,
                width: w,
                height: h,
            });
        }
        let bitmap = Bitmap::from_fn(y2 - y1, x2 - x1, |y, x| self.bitmap.get(y1 + y, x1 + x));
        let colors = self
            .colors
            .as_ref()
            .map(|c| ColorArray::from_fn(y2 - y1, x2 - x1, |y, x| c.get(y1 + y, x1 + x)));
        Ok(self.derive(bitmap, colors))
    }

    /// Place `other` to the right of this canvas. Heights must match.
    pub fn hstack(&self, other: &Canvas) -> Result<Self> {
        let (h, w) = self.shape();
        let (oh, ow) = other.shape();
        if h != oh {
            return Err(DappleError::DimensionMismatch {
                dimension: "height",
                left: h,
                right: oh,
            });
        }
        let bitmap = Bitmap::from_fn(h, w + ow, |y, x| {
            if x < w {
                self.bitmap.get(y, x)
            } else {
                other.bitmap.get(y, x - w)
            }
        });
        let colors = joined_colors(self, other, |left, right| {
            ColorArray::from_fn(h, w + ow, |y, x| {
                if x < w {
                    left.get(y, x)
                } else {
                    right.get(y, x - w)
                }
            })
        });
        Ok(self.derive(bitmap, colors))
    }

    /// Place `other` below this canvas. Widths must match.
    pub fn vstack(&self, other: &Canvas) -> Result<Self> {
        let (h, w) = self.shape();
        let (oh, ow) = other.shape();
        if w != ow {
            return Err(DappleError::DimensionMismatch {
                dimension: "width",
                left: w,
                right: ow,
            });
        }
        let bitmap = Bitmap::from_fn(h + oh, w, |y, x| {
            if y < h {
                self.bitmap.get(y, x)
            } else {
                other.bitmap.get(y - h, x)
            }
        });
        let colors = joined_colors(self, other, |top, bottom| {
            ColorArray::from_fn(h + oh, w, |y, x| {
                if y < h {
                    top.get(y, x)
                } else {
                    bottom.get(y - h, x)
                }
            })
        });
        Ok(self.derive(bitmap, colors))
    }

    /// Paste `other` with its top-left corner at `(x, y)`.
    ///
    /// Offsets may be negative. Parts of `other` falling outside this canvas
    /// are clipped.
    pub fn overlay(&self, other: &Canvas, x: isize, y: isize) -> Self {
        let (h, w) = self.shape();
        let (oh, ow) = other.shape();
        // Source pixel of `other` covering (py, px), if any.
        let source = |py: usize, px: usize| -> Option<(usize, usize)> {
            let sy = usize::try_from(py as isize - y).ok()?;
            let sx = usize::try_from(px as isize - x).ok()?;
            (sy < oh && sx < ow).then_some((sy, sx))
        };

        let bitmap = Bitmap::from_fn(h, w, |py, px| match source(py, px) {
            Some((sy, sx)) => other.bitmap.get(sy, sx),
            None => self.bitmap.get(py, px),
        });
        let colors = joined_colors(self, other, |base, top| {
            ColorArray::from_fn(h, w, |py, px| match source(py, px) {
                Some((sy, sx)) => top.get(sy, sx),
                None => base.get(py, px),
            })
        });
        self.derive(bitmap, colors)
    }

    /// Replace every bitmap value `v` with `1 - v`. Colors are unchanged.
    pub fn with_invert(&self) -> Self {
        self.derive(self.bitmap.map(|v| 1.0 - v), self.colors.clone())
    }

    fn derive(&self, bitmap: Bitmap, colors: Option<ColorArray>) -> Self {
        Self {
            bitmap,
            colors,
            renderer: self.renderer.clone(),
        }
    }

    /// Colors of this canvas, or a gray replica of the bitmap.
    fn colors_or_gray(&self) -> Cow<'_, ColorArray> {
        match &self.colors {
            Some(c) => Cow::Borrowed(c),
            None => Cow::Owned(ColorArray::from_luminance(&self.bitmap)),
        }
    }
}

/// Combine the colors of two canvases. When only one side has colors the
/// other is promoted to a gray replica so the result stays homogeneous.
fn joined_colors(
    a: &Canvas,
    b: &Canvas,
    join: impl FnOnce(&ColorArray, &ColorArray) -> ColorArray,
) -> Option<ColorArray> {
    if a.colors.is_none() && b.colors.is_none() {
        return None;
    }
    Some(join(&a.colors_or_gray(), &b.colors_or_gray()))
}

impl PartialEq for Canvas {
    /// Pixel equality; the attached renderer is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.bitmap == other.bitmap && self.colors == other.colors
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, w) = self.shape();
        let renderer = self.renderer.as_ref().map_or("None", |r| r.name());
        write!(
            f,
            "Canvas({}x{}, colors={}, renderer={})",
            h,
            w,
            self.colors.is_some(),
            renderer
        )
    }
}

impl fmt::Display for Canvas {
    /// Render through the attached renderer, or braille when none is set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let rendered = match &self.renderer {
            Some(r) => self.out(r.as_ref(), &mut buf),
            None => self.out(&BrailleRenderer::default(), &mut buf),
        };
        rendered.map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
