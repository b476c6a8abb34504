//! PNG encoding for the kitty renderer.
//!
//! The `png` crate (default feature `png`) is preferred. Without it, or when
//! it rejects the image, a minimal encoder writes IHDR, one IDAT of
//! zlib-compressed unfiltered scanlines, and IEND.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::info;

use crate::error::{DappleError, Result};

/// PNG signature bytes.
const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// 8-bit channel layout of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }

    /// PNG IHDR color type.
    fn color_type(self) -> u8 {
        match self {
            Channels::Gray => 0,
            Channels::Rgb => 2,
        }
    }
}

/// Row-major 8-bit pixel data.
pub(crate) struct Raster<'a> {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub data: &'a [u8],
}

/// Encode a raster as PNG, falling back to the minimal encoder.
///
/// PNG has no zero-sized images; those are rejected.
pub(crate) fn encode(raster: &Raster<'_>) -> Result<Vec<u8>> {
    if raster.width == 0 || raster.height == 0 {
        return Err(DappleError::unsupported(
            "png size",
            format!("{}x{}", raster.width, raster.height),
        ));
    }
    #[cfg(feature = "png")]
    {
        match encode_with_png_crate(raster) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => info!("png encoder failed ({}), using minimal encoder", e),
        }
    }
    #[cfg(not(feature = "png"))]
    info!("png feature disabled, using minimal encoder");

    encode_minimal(raster)
}

#[cfg(feature = "png")]
fn encode_with_png_crate(raster: &Raster<'_>) -> std::result::Result<Vec<u8>, ::png::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut encoder = ::png::Encoder::new(&mut buf, raster.width, raster.height);
        encoder.set_color(match raster.channels {
            Channels::Gray => ::png::ColorType::Grayscale,
            Channels::Rgb => ::png::ColorType::Rgb,
        });
        encoder.set_depth(::png::BitDepth::Eight);
        encoder.set_compression(::png::Compression::Best);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.data)?;
    }
    Ok(buf)
}

/// Minimal PNG: unfiltered scanlines, zlib level 6.
pub(crate) fn encode_minimal(raster: &Raster<'_>) -> Result<Vec<u8>> {
    let stride = raster.width as usize * raster.channels.count();

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::new(6));
    if stride > 0 {
        for row in raster.data.chunks(stride) {
            zlib.write_all(&[0])?;
            zlib.write_all(row)?;
        }
    }
    let idat = zlib.finish()?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&raster.width.to_be_bytes());
    ihdr.extend_from_slice(&raster.height.to_be_bytes());
    // Bit depth, color type, compression, filter, interlace.
    ihdr.extend_from_slice(&[8, raster.channels.color_type(), 0, 0, 0]);

    let mut out = Vec::with_capacity(SIGNATURE.len() + idat.len() + 64);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, b"IHDR", &ihdr);
    write_chunk(&mut out, b"IDAT", &idat);
    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(kind.iter().chain(data));
    out.extend_from_slice(&crc.to_be_bytes());
}

/// CRC-32 (IEEE) over the chunk type and data.
fn crc32<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}
