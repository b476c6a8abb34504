//! Kitty renderer: kitty graphics protocol, one output pixel per source pixel.
//!
//! Protocol: <https://sw.kovidgoyal.net/kitty/graphics-protocol/>
//!
//! The image is encoded once (PNG, or raw RGB/RGBA with optional zlib),
//! then sent base64-encoded in APC chunks of at most 4096 characters:
//!
//! ```text
//! ESC _G a=T,f=100,m=1;<base64> ESC \     first chunk: all parameters
//! ESC _G m=1;<base64> ESC \               continuation
//! ESC _G m=0;<base64> ESC \               last chunk
//! ```

use std::io::Write;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::debug;

use crate::bitmap::{check_colors, Bitmap, ColorArray};
use crate::color::to_byte;
use crate::error::{DappleError, Result};

use super::png::{self, Channels, Raster};
use super::Renderer;

/// APC introducer for graphics commands.
pub const APC_START: &str = "\x1b_G";
/// String terminator.
pub const APC_END: &str = "\x1b\\";

/// Maximum base64 characters per chunk.
pub const MAX_CHUNK_SIZE: usize = 4096;
/// Payload bytes per chunk (4096 base64 characters).
const RAW_CHUNK_SIZE: usize = MAX_CHUNK_SIZE / 4 * 3;

/// Transmission format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KittyFormat {
    #[default]
    Png,
    Rgb,
    Rgba,
}

impl KittyFormat {
    /// Value of the `f` key.
    pub fn code(self) -> u32 {
        match self {
            KittyFormat::Png => 100,
            KittyFormat::Rgb => 24,
            KittyFormat::Rgba => 32,
        }
    }
}

impl FromStr for KittyFormat {
    type Err = DappleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "png" => Ok(KittyFormat::Png),
            "rgb" => Ok(KittyFormat::Rgb),
            "rgba" => Ok(KittyFormat::Rgba),
            other => Err(DappleError::unsupported("kitty format", other)),
        }
    }
}

/// Render bitmaps through the kitty graphics protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KittyRenderer {
    format: KittyFormat,
    compression: bool,
    columns: Option<u32>,
    rows: Option<u32>,
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self {
            format: KittyFormat::Png,
            compression: true,
            columns: None,
            rows: None,
        }
    }
}

impl KittyRenderer {
    pub fn format(&self) -> KittyFormat {
        self.format
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    pub fn columns(&self) -> Option<u32> {
        self.columns
    }

    pub fn rows(&self) -> Option<u32> {
        self.rows
    }

    pub fn with_format(self, format: KittyFormat) -> Self {
        Self { format, ..self }
    }

    /// zlib-compress raw formats (`o=z`). PNG is always compressed.
    pub fn with_compression(self, compression: bool) -> Self {
        Self {
            compression,
            ..self
        }
    }

    /// Display width in terminal columns; `None` keeps native pixel size.
    pub fn with_columns(self, columns: Option<u32>) -> Result<Self> {
        if columns == Some(0) {
            return Err(DappleError::unsupported("columns", 0));
        }
        Ok(Self { columns, ..self })
    }

    /// Display height in terminal rows; `None` keeps native pixel size.
    pub fn with_rows(self, rows: Option<u32>) -> Result<Self> {
        if rows == Some(0) {
            return Err(DappleError::unsupported("rows", 0));
        }
        Ok(Self { rows, ..self })
    }

    /// Encoded image and the parameters of the first chunk.
    fn payload(&self, bitmap: &Bitmap, colors: Option<&ColorArray>) -> Result<(Vec<u8>, String)> {
        let (h, w) = bitmap.shape();

        let mut params = match self.format {
            KittyFormat::Png if w == 0 || h == 0 => {
                // PNG cannot encode an empty image; send an empty payload.
                let params = self.display_params(format!("a=T,f={}", self.format.code()));
                return Ok((Vec::new(), params));
            }
            KittyFormat::Png => {
                let (channels, data) = match colors {
                    Some(colors) => (Channels::Rgb, rgb_bytes(bitmap, Some(colors), false)),
                    None => (
                        Channels::Gray,
                        bitmap.as_slice().iter().map(|&v| to_byte(v, 255.0)).collect(),
                    ),
                };
                let raster = Raster {
                    width: w as u32,
                    height: h as u32,
                    channels,
                    data: &data,
                };
                let png = png::encode(&raster)?;
                return Ok((png, self.display_params(format!("a=T,f={}", self.format.code()))));
            }
            KittyFormat::Rgb | KittyFormat::Rgba => format!("a=T,f={}", self.format.code()),
        };

        let mut data = rgb_bytes(bitmap, colors, self.format == KittyFormat::Rgba);
        if self.compression {
            let mut zlib = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(6));
            zlib.write_all(&data)?;
            data = zlib.finish()?;
            params.push_str(",o=z");
        }
        params.push_str(&format!(",s={},v={}", w, h));
        Ok((data, self.display_params(params)))
    }

    fn display_params(&self, mut params: String) -> String {
        if let Some(c) = self.columns {
            params.push_str(&format!(",c={}", c));
        }
        if let Some(r) = self.rows {
            params.push_str(&format!(",r={}", r));
        }
        params
    }
}

/// Interleaved 8-bit RGB(A); gray input is replicated to all channels.
fn rgb_bytes(bitmap: &Bitmap, colors: Option<&ColorArray>, alpha: bool) -> Vec<u8> {
    let stride = if alpha { 4 } else { 3 };
    let mut out = Vec::with_capacity(bitmap.as_slice().len() * stride);
    let mut push = |rgb: [f32; 3]| {
        out.extend(rgb.map(|c| to_byte(c, 255.0)));
        if alpha {
            out.push(255);
        }
    };
    match colors {
        Some(colors) => colors.as_slice().iter().for_each(|&rgb| push(rgb)),
        None => bitmap.as_slice().iter().for_each(|&v| push([v; 3])),
    }
    out
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
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

        let (data, params) = self.payload(bitmap, colors)?;
        let count = data.len().div_ceil(RAW_CHUNK_SIZE).max(1);
        debug!(
            "kitty: {:?} payload of {} bytes in {} chunks",
            self.format,
            data.len(),
            count
        );

        let mut out = String::with_capacity(MAX_CHUNK_SIZE + params.len() + 16);
        for i in 0..count {
            let start = (i * RAW_CHUNK_SIZE).min(data.len());
            let end = ((i + 1) * RAW_CHUNK_SIZE).min(data.len());
            let more = u8::from(i + 1 < count);

            out.clear();
            out.push_str(APC_START);
            if i == 0 {
                out.push_str(&params);
                out.push(',');
            }
            out.push_str(&format!("m={};", more));
            BASE64.encode_string(&data[start..end], &mut out);
            out.push_str(APC_END);
            sink.write_all(out.as_bytes())?;
        }
        Ok(())
    }
}
