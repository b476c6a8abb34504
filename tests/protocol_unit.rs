//! Unit tests for the graphics protocol renderers (sixel and kitty).
//!
//! The emitted escape streams are decoded back and compared with the input:
//! - Sixel: palette, band structure and run-length encoding
//! - Kitty: chunk framing, base64 reassembly, raw/zlib/PNG payloads

use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use dapple::renderer::kitty::{APC_END, APC_START, MAX_CHUNK_SIZE};
use dapple::renderer::sixel::{DCS_END, DCS_START};
use dapple::*;
use flate2::read::ZlibDecoder;

// ==================== Sixel Decoder ====================

/// A decoded sixel image: palette plus per-pixel palette index.
struct SixelImage {
    palette: Vec<(usize, [u32; 3])>,
    bands: usize,
    pixels: Vec<Vec<Option<usize>>>,
}

impl SixelImage {
    fn index(&self, y: usize, x: usize) -> Option<usize> {
        self.pixels.get(y).and_then(|row| row.get(x).copied().flatten())
    }
}

fn read_number(chars: &[char], i: &mut usize) -> usize {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    chars[start..*i].iter().collect::<String>().parse().unwrap()
}

/// Set `mask`'s pixels in column `x` of `band` to `color`.
fn paint(image: &mut SixelImage, band: usize, x: usize, color: usize, mask: u8) {
    for bit in 0..6 {
        if mask & (1 << bit) != 0 {
            let y = band * 6 + bit;
            if image.pixels.len() <= y {
                image.pixels.resize(y + 1, Vec::new());
            }
            let row = &mut image.pixels[y];
            if row.len() <= x {
                row.resize(x + 1, None);
            }
            assert!(row[x].is_none(), "pixel ({}, {}) painted twice", y, x);
            row[x] = Some(color);
        }
    }
}

fn decode_sixel(data: &str) -> SixelImage {
    assert!(data.starts_with(DCS_START), "missing DCS introducer");
    assert!(data.ends_with(DCS_END), "missing string terminator");
    let body: Vec<char> = data[DCS_START.len()..data.len() - DCS_END.len()]
        .chars()
        .collect();

    let mut image = SixelImage {
        palette: Vec::new(),
        bands: 0,
        pixels: Vec::new(),
    };
    let (mut i, mut x, mut color) = (0, 0, 0);

    while i < body.len() {
        let c = body[i];
        match c {
            '#' => {
                i += 1;
                let n = read_number(&body, &mut i);
                if i < body.len() && body[i] == ';' {
                    // Palette definition: #n;2;r;g;b
                    let mut values = [0u32; 4];
                    for v in values.iter_mut() {
                        assert_eq!(body[i], ';');
                        i += 1;
                        *v = read_number(&body, &mut i) as u32;
                    }
                    assert_eq!(values[0], 2, "palette must use RGB space");
                    image.palette.push((n, [values[1], values[2], values[3]]));
                } else {
                    color = n;
                }
            }
            '!' => {
                i += 1;
                let count = read_number(&body, &mut i);
                assert!(count > 3 && count <= 255, "run length {}", count);
                let mask = body[i] as u8 - 0x3F;
                let band = image.bands;
                for _ in 0..count {
                    paint(&mut image, band, x, color, mask);
                    x += 1;
                }
                i += 1;
            }
            '$' => {
                x = 0;
                i += 1;
            }
            '-' => {
                image.bands += 1;
                x = 0;
                i += 1;
            }
            '?'..='~' => {
                let band = image.bands;
                paint(&mut image, band, x, color, c as u8 - 0x3F);
                x += 1;
                i += 1;
            }
            other => panic!("unexpected character {:?} in sixel body", other),
        }
    }
    image
}

fn sixel(renderer: &SixelRenderer, bitmap: &Bitmap, colors: Option<&ColorArray>) -> SixelImage {
    decode_sixel(&render_to_string(renderer, bitmap, colors).unwrap())
}

// ==================== Sixel Tests ====================

#[test]
fn test_sixel_roundtrip_gray_indices() {
    let bitmap = Bitmap::from_fn(9, 13, |y, x| if (x * 3 + y) % 5 < 2 { 1.0 } else { 0.0 });
    let r = SixelRenderer::default().with_max_colors(2).unwrap();
    let image = sixel(&r, &bitmap, None);

    assert_eq!(image.bands, 2);
    for y in 0..9 {
        for x in 0..13 {
            let expected = if bitmap.get(y, x) > 0.5 { 1 } else { 0 };
            assert_eq!(image.index(y, x), Some(expected), "pixel ({}, {})", y, x);
        }
    }
}

#[test]
fn test_sixel_gray_palette_centres() {
    let r = SixelRenderer::default().with_max_colors(2).unwrap();
    let image = sixel(&r, &Bitmap::filled(6, 1, 0.0), None);
    assert_eq!(image.palette, vec![(0, [25, 25, 25]), (1, [75, 75, 75])]);
}

#[test]
fn test_sixel_gray_palette_capped_at_64() {
    let image = sixel(&SixelRenderer::default(), &Bitmap::filled(6, 1, 0.0), None);
    assert_eq!(image.palette.len(), 64);
}

#[test]
fn test_sixel_color_palette_is_cube() {
    let colors = ColorArray::from_fn(6, 2, |_, x| if x == 0 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] });
    let bitmap = colors.luminance();
    let r = SixelRenderer::default().with_max_colors(8).unwrap();
    let image = sixel(&r, &bitmap, Some(&colors));

    // Two levels per channel: 8 entries, red is r=1,g=0,b=0 -> index 4.
    assert_eq!(image.palette.len(), 8);
    assert_eq!(image.palette[4], (4, [75, 25, 25]));
    assert_eq!(image.index(0, 0), Some(4));
    assert_eq!(image.index(5, 1), Some(1));
}

#[test]
fn test_sixel_palette_never_exceeds_max_colors() {
    let colors = ColorArray::from_fn(6, 6, |y, x| [y as f32 / 5.0, x as f32 / 5.0, 0.5]);
    for max_colors in [1, 7, 8, 26, 27, 100, 216, 256] {
        let r = SixelRenderer::default().with_max_colors(max_colors).unwrap();
        let image = sixel(&r, &colors.luminance(), Some(&colors));
        assert!(image.palette.len() <= max_colors, "max_colors {}", max_colors);
    }
}

#[test]
fn test_sixel_long_runs_compressed() {
    let out = render_to_string(
        &SixelRenderer::default().with_max_colors(2).unwrap(),
        &Bitmap::filled(6, 600, 1.0),
        None,
    )
    .unwrap();
    // 600 columns split into runs of at most 255.
    assert!(out.contains("#1!255~!255~!90~$"), "got {:?}", out);
}

#[test]
fn test_sixel_short_runs_literal() {
    let out = render_to_string(
        &SixelRenderer::default().with_max_colors(2).unwrap(),
        &Bitmap::filled(6, 3, 1.0),
        None,
    )
    .unwrap();
    assert!(out.contains("#1~~~$"), "got {:?}", out);
    assert!(!out.contains('!'));
}

#[test]
fn test_sixel_scale_replicates_pixels() {
    let bitmap = Bitmap::from_vec(1, 2, vec![1.0, 0.0]).unwrap();
    let r = SixelRenderer::default()
        .with_max_colors(2)
        .unwrap()
        .with_scale(3)
        .unwrap();
    let image = sixel(&r, &bitmap, None);
    for y in 0..3 {
        for x in 0..6 {
            let expected = if x < 3 { 1 } else { 0 };
            assert_eq!(image.index(y, x), Some(expected));
        }
    }
}

#[test]
fn test_sixel_invalid_options() {
    assert!(SixelRenderer::default().with_max_colors(0).is_err());
    assert!(SixelRenderer::default().with_max_colors(257).is_err());
    assert!(SixelRenderer::default().with_scale(0).is_err());
}

// ==================== Kitty Decoder ====================

struct KittyChunk {
    params: Option<String>,
    more: bool,
    payload: String,
}

fn split_chunks(data: &str) -> Vec<KittyChunk> {
    let mut chunks = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        assert!(rest.starts_with(APC_START), "chunk must start with APC: {:?}", rest);
        let end = rest.find(APC_END).expect("unterminated chunk");
        let body = &rest[APC_START.len()..end];
        let (control, payload) = body.split_once(';').expect("missing payload separator");
        let (params, m) = match control.rsplit_once(',') {
            Some((params, m)) => (Some(params.to_string()), m),
            None => (None, control),
        };
        chunks.push(KittyChunk {
            params,
            more: match m {
                "m=1" => true,
                "m=0" => false,
                other => panic!("bad continuation key {:?}", other),
            },
            payload: payload.to_string(),
        });
        rest = &rest[end + APC_END.len()..];
    }
    chunks
}

/// First-chunk parameters and the decoded payload bytes.
fn decode_kitty(data: &str) -> (String, Vec<u8>) {
    let chunks = split_chunks(data);
    assert!(!chunks.is_empty());
    assert_eq!(chunks.iter().filter(|c| !c.more).count(), 1, "exactly one final chunk");
    assert!(!chunks.last().unwrap().more, "last chunk must be final");
    assert!(chunks.iter().skip(1).all(|c| c.params.is_none()));
    assert!(chunks.iter().all(|c| c.payload.len() <= MAX_CHUNK_SIZE));

    let params = chunks[0].params.clone().expect("first chunk carries parameters");
    let mut bytes = Vec::new();
    for chunk in &chunks {
        bytes.extend(BASE64.decode(&chunk.payload).unwrap());
    }
    (params, bytes)
}

fn noise(h: usize, w: usize) -> Bitmap {
    let mut state = 0x2545_F491u32;
    Bitmap::from_fn(h, w, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state % 256) as f32 / 255.0
    })
}

// ==================== Kitty Tests ====================

#[test]
fn test_kitty_raw_rgb_roundtrip() {
    let bitmap = noise(3, 4);
    let r = KittyRenderer::default()
        .with_format(KittyFormat::Rgb)
        .with_compression(false);
    let (params, bytes) = decode_kitty(&render_to_string(&r, &bitmap, None).unwrap());
    assert_eq!(params, "a=T,f=24,s=4,v=3");
    assert_eq!(bytes.len(), 3 * 4 * 3);
    for (i, &v) in bitmap.as_slice().iter().enumerate() {
        let byte = (v * 255.0) as u8;
        assert_eq!(&bytes[i * 3..i * 3 + 3], &[byte, byte, byte]);
    }
}

#[test]
fn test_kitty_compressed_rgba_roundtrip() {
    let colors = ColorArray::from_fn(5, 7, |y, x| [y as f32 / 4.0, x as f32 / 6.0, 0.0]);
    let r = KittyRenderer::default().with_format(KittyFormat::Rgba);
    let out = render_to_string(&r, &colors.luminance(), Some(&colors)).unwrap();
    let (params, compressed) = decode_kitty(&out);
    assert_eq!(params, "a=T,f=32,o=z,s=7,v=5");

    let mut bytes = Vec::new();
    ZlibDecoder::new(&compressed[..]).read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 5 * 7 * 4);
    assert!(bytes.chunks(4).all(|px| px[3] == 255));
    assert_eq!(&bytes[..4], &[0, 0, 0, 255]);
    assert_eq!(&bytes[bytes.len() - 4..], &[255, 255, 0, 255]);
}

#[test]
fn test_kitty_multi_chunk_reassembly() {
    // 64x64 RGB uncompressed is 12288 bytes: four full 3072-byte slices.
    let bitmap = noise(64, 64);
    let r = KittyRenderer::default()
        .with_format(KittyFormat::Rgb)
        .with_compression(false);
    let out = render_to_string(&r, &bitmap, None).unwrap();
    let chunks = split_chunks(&out);
    assert_eq!(chunks.len(), 4);
    assert!(chunks[..3].iter().all(|c| c.more && c.payload.len() == MAX_CHUNK_SIZE));

    // Concatenated chunk payloads equal the one-shot base64 of the data.
    let joined: String = chunks.iter().map(|c| c.payload.as_str()).collect();
    let (_, bytes) = decode_kitty(&out);
    assert_eq!(joined, BASE64.encode(&bytes));
}

#[test]
fn test_kitty_uneven_final_chunk() {
    // 3073 gray pixels as RGB: 9219 bytes -> 3 full slices + 3 bytes.
    let bitmap = noise(1, 3073);
    let r = KittyRenderer::default()
        .with_format(KittyFormat::Rgb)
        .with_compression(false);
    let chunks = split_chunks(&render_to_string(&r, &bitmap, None).unwrap());
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[3].payload.len(), 4);
}

#[test]
fn test_kitty_png_payload() {
    let bitmap = noise(6, 5);
    let out = render_to_string(&KittyRenderer::default(), &bitmap, None).unwrap();
    let (params, bytes) = decode_kitty(&out);
    assert_eq!(params, "a=T,f=100");
    assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[cfg(feature = "png")]
#[test]
fn test_kitty_png_decodes_to_input() {
    let bitmap = noise(6, 5);
    let out = render_to_string(&KittyRenderer::default(), &bitmap, None).unwrap();
    let (_, bytes) = decode_kitty(&out);

    let decoder = png::Decoder::new(&bytes[..]);
    let mut reader = decoder.read_info().unwrap();
    let mut pixels = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels).unwrap();
    assert_eq!((info.width, info.height), (5, 6));
    assert_eq!(info.color_type, png::ColorType::Grayscale);
    let expected: Vec<u8> = bitmap.as_slice().iter().map(|&v| (v * 255.0) as u8).collect();
    assert_eq!(&pixels[..info.buffer_size()], &expected[..]);
}

#[test]
fn test_kitty_display_size() {
    let r = KittyRenderer::default()
        .with_format(KittyFormat::Rgb)
        .with_columns(Some(40))
        .unwrap()
        .with_rows(Some(10))
        .unwrap();
    let (params, _) = decode_kitty(&render_to_string(&r, &noise(2, 2), None).unwrap());
    assert_eq!(params, "a=T,f=24,o=z,s=2,v=2,c=40,r=10");
}
