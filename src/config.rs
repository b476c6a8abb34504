//! Configuration file handling for dapple.
//!
//! Loads configuration from `<config dir>/dapple/config.toml` or a custom path.
//!
//! ```toml
//! [renderer]
//! kind = "quadrants"
//! true_color = false
//!
//! [[preprocess]]
//! op = "auto_contrast"
//!
//! [[preprocess]]
//! op = "gamma_correct"
//! gamma = 1.8
//! ```

use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bitmap::Bitmap;
use crate::error::{DappleError, Result};
use crate::preprocess::{self, PreprocessStep};
use crate::renderer::ascii::charset_preset;
use crate::renderer::{
    AnyRenderer, AsciiRenderer, BrailleRenderer, FingerprintRenderer, FontSource,
    KittyRenderer, QuadrantsRenderer, Renderer, SextantsRenderer, SixelRenderer,
};

/// Configuration file structure for dapple.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub preprocess: Vec<PreprocessStep>,
}

/// Renderer selection. Every option is optional; options that do not apply
/// to the selected kind are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct RendererConfig {
    /// braille, quadrants, sextants, ascii, sixel, kitty or fingerprint.
    #[serde(default)]
    pub kind: Option<String>,

    // braille
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Use the bitmap mean as the braille threshold.
    #[serde(default)]
    pub auto_threshold: bool,
    #[serde(default)]
    pub color_mode: Option<String>,

    // quadrants, sextants
    #[serde(default)]
    pub true_color: Option<bool>,
    #[serde(default)]
    pub grayscale: Option<bool>,

    // ascii
    /// Preset name (standard, detailed, blocks, simple) or a literal ramp.
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub invert: Option<bool>,

    // sixel
    #[serde(default)]
    pub max_colors: Option<usize>,
    #[serde(default)]
    pub scale: Option<usize>,

    // kitty
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub compression: Option<bool>,
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default)]
    pub rows: Option<u32>,

    // fingerprint
    #[serde(default)]
    pub glyph_set: Option<String>,
    #[serde(default)]
    pub cell_width: Option<usize>,
    #[serde(default)]
    pub cell_height: Option<usize>,
    #[serde(default)]
    pub metric: Option<String>,
    /// "system", "builtin" or a path to a font file.
    #[serde(default)]
    pub font: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            debug!("loaded config from {}", path.display());
            Ok(config)
        } else {
            debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Build the configured renderer.
    ///
    /// Fails with UnsupportedOption for unknown names or out-of-range values.
    pub fn renderer(&self) -> Result<AnyRenderer> {
        self.renderer.build()
    }

    /// Run the configured preprocessing pipeline over `bitmap`.
    pub fn preprocess(&self, bitmap: &Bitmap) -> Result<Bitmap> {
        preprocess::apply_all(&self.preprocess, bitmap)
    }
}

impl RendererConfig {
    pub fn build(&self) -> Result<AnyRenderer> {
        let kind = self.kind.as_deref().unwrap_or("braille");
        let renderer = match kind {
            "braille" => {
                let mut r = BrailleRenderer::default();
                if self.auto_threshold {
                    r = r.with_threshold(None)?;
                } else if let Some(t) = self.threshold {
                    r = r.with_threshold(Some(t))?;
                }
                if let Some(mode) = &self.color_mode {
                    r = r.with_color_mode(mode.parse()?);
                }
                AnyRenderer::Braille(r)
            }
            "quadrants" => {
                let mut r = QuadrantsRenderer::default();
                if let Some(v) = self.true_color {
                    r = r.with_true_color(v);
                }
                if let Some(v) = self.grayscale {
                    r = r.with_grayscale(v);
                }
                AnyRenderer::Quadrants(r)
            }
            "sextants" => {
                let mut r = SextantsRenderer::default();
                if let Some(v) = self.true_color {
                    r = r.with_true_color(v);
                }
                if let Some(v) = self.grayscale {
                    r = r.with_grayscale(v);
                }
                AnyRenderer::Sextants(r)
            }
            "ascii" => {
                let mut r = AsciiRenderer::default();
                if let Some(charset) = &self.charset {
                    r = r.with_charset(charset_preset(charset).unwrap_or(charset.as_str()))?;
                }
                if let Some(v) = self.invert {
                    r = r.with_invert(v);
                }
                AnyRenderer::Ascii(r)
            }
            "sixel" => {
                let mut r = SixelRenderer::default();
                if let Some(n) = self.max_colors {
                    r = r.with_max_colors(n)?;
                }
                if let Some(n) = self.scale {
                    r = r.with_scale(n)?;
                }
                AnyRenderer::Sixel(r)
            }
            "kitty" => {
                let mut r = KittyRenderer::default();
                if let Some(format) = &self.format {
                    r = r.with_format(format.parse()?);
                }
                if let Some(v) = self.compression {
                    r = r.with_compression(v);
                }
                r = r.with_columns(self.columns)?.with_rows(self.rows)?;
                AnyRenderer::Kitty(r)
            }
            "fingerprint" => {
                let mut r = FingerprintRenderer::default();
                if let Some(set) = &self.glyph_set {
                    r = r.with_glyph_set(set.parse()?);
                }
                if self.cell_width.is_some() || self.cell_height.is_some() {
                    let w = self.cell_width.unwrap_or(r.cell_width());
                    let h = self.cell_height.unwrap_or(r.cell_height());
                    r = r.with_cell_size(w, h)?;
                }
                if let Some(metric) = &self.metric {
                    r = r.with_metric(metric.parse()?);
                }
                if let Some(font) = &self.font {
                    r = r.with_font(font_source(font));
                }
                AnyRenderer::Fingerprint(r)
            }
            other => return Err(DappleError::unsupported("renderer", other)),
        };
        Ok(renderer)
    }
}

fn font_source(value: &str) -> FontSource {
    match value {
        "system" => FontSource::System,
        "builtin" => FontSource::Builtin,
        path => FontSource::File(PathBuf::from(path)),
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dapple")
        .join("config.toml")
}
