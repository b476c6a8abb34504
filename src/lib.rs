//! dapple: render bitmaps to the terminal.
//!
//! A grayscale [`Bitmap`] (plus optional [`ColorArray`]) flows through
//! optional [`preprocess`] filters into a [`Canvas`], and a [`Renderer`]
//! encodes it as braille, block characters, ASCII, sixel or kitty graphics.
//!
//! # Example
//! ```ignore
//! use dapple::{Bitmap, Canvas, QuadrantsRenderer};
//!
//! let bitmap = Bitmap::from_fn(8, 16, |y, x| ((x + y) % 2) as f32);
//! let canvas = Canvas::new(bitmap, None)?;
//! canvas.out(&QuadrantsRenderer::default(), &mut std::io::stdout())?;
//! ```

pub mod bitmap;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod renderer;

pub use bitmap::{Bitmap, ColorArray};
pub use canvas::Canvas;
pub use config::{Config, ConfigError};
pub use error::{DappleError, Result};
pub use preprocess::{Axis, PreprocessStep};
pub use renderer::{
    render_to_string, AnyRenderer, AsciiRenderer, BrailleRenderer, ColorMode,
    FingerprintRenderer, FontSource, GlyphSet, KittyFormat, KittyRenderer, Metric,
    QuadrantsRenderer, Renderer, SextantsRenderer, SixelRenderer,
};
