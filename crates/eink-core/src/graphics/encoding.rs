//! Container encoding for palette-reduced images.
//!
//! [`encode`] is lossless: it tries each candidate container in a fixed order
//! and keeps the smallest output.  Devices decode whatever arrives, so the
//! choice only affects transfer size.
//!
//! | Candidate       | Applies when                    | Bit depth                    |
//! |-----------------|---------------------------------|------------------------------|
//! | Indexed PNG     | at most 256 distinct colors     | 1, 2, 4 or 8 (fewest bits)   |
//! | Grayscale PNG   | every pixel has `r == g == b`   | smallest exact depth         |
//!
//! [`render_jpeg`] is the lossy alternative, used for status images that are
//! configured with a quality below 100.

use std::collections::HashMap;
use std::fmt;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use tracing::debug;

use super::palette::{Color, MAX_COLORS};
use super::{ensure_no_alpha, ImageError};

/// The container format of an [`EncodedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    IndexedPng,
    GrayscalePng,
    Jpeg,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncodingKind::IndexedPng => "indexed PNG",
            EncodingKind::GrayscalePng => "grayscale PNG",
            EncodingKind::Jpeg => "JPEG",
        };
        f.write_str(name)
    }
}

/// Encoded image bytes together with the container that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub kind: EncodingKind,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A lossless candidate: `Ok(None)` means the candidate does not apply.
type Candidate = fn(&RgbImage) -> Result<Option<Vec<u8>>, ImageError>;

/// Candidates in preference order; on equal size the earlier one wins.
const CANDIDATES: [(EncodingKind, Candidate); 2] = [
    (EncodingKind::IndexedPng, encode_indexed_png),
    (EncodingKind::GrayscalePng, encode_grayscale_png),
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Losslessly encodes `image`, choosing the smallest applicable container.
///
/// # Errors
///
/// - [`ImageError::UnsupportedAlpha`] if the image has an alpha channel.
/// - [`ImageError::EmptyImage`] if either dimension is zero.
/// - [`ImageError::TooManyColors`] if the image has more than 256 distinct
///   colors and is not pure grayscale.
pub fn encode(image: &DynamicImage) -> Result<EncodedImage, ImageError> {
    ensure_no_alpha(image)?;
    ensure_not_empty(image)?;

    let rgb = image.to_rgb8();
    let mut outputs = Vec::with_capacity(CANDIDATES.len());
    let mut first_error = None;

    for (kind, candidate) in CANDIDATES {
        match candidate(&rgb) {
            Ok(Some(bytes)) => outputs.push((kind, bytes)),
            Ok(None) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match select_smallest(outputs) {
        Some(encoded) => {
            debug!(
                kind = %encoded.kind,
                bytes = encoded.len(),
                width = rgb.width(),
                height = rgb.height(),
                "encoded image"
            );
            Ok(encoded)
        }
        None => Err(first_error.unwrap_or(ImageError::TooManyColors)),
    }
}

/// Encodes `image` as a baseline JPEG.
///
/// JPEG is lossy at every quality setting, including 100.  A quality of 0 is
/// treated as 1, the lowest the encoder accepts.
///
/// # Errors
///
/// - [`ImageError::InvalidQuality`] if `quality > 100`.
/// - [`ImageError::UnsupportedAlpha`] if the image has an alpha channel.
/// - [`ImageError::EmptyImage`] if either dimension is zero.
pub fn render_jpeg(image: &DynamicImage, quality: u8) -> Result<EncodedImage, ImageError> {
    if quality > 100 {
        return Err(ImageError::InvalidQuality(quality));
    }
    ensure_no_alpha(image)?;
    ensure_not_empty(image)?;

    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.max(1));
        encoder.encode_image(&rgb)?;
    }

    debug!(quality, bytes = bytes.len(), "encoded JPEG");
    Ok(EncodedImage {
        kind: EncodingKind::Jpeg,
        bytes,
    })
}

/// Decodes PNG or JPEG bytes back into an image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    Ok(image::load_from_memory(bytes)?)
}

// ── Candidates ────────────────────────────────────────────────────────────────

fn encode_indexed_png(rgb: &RgbImage) -> Result<Option<Vec<u8>>, ImageError> {
    let mut lookup: HashMap<Color, u8> = HashMap::new();
    let mut palette: Vec<Color> = Vec::new();
    let mut indices = Vec::with_capacity(rgb.len() / 3);

    for pixel in rgb.pixels() {
        let index = match lookup.get(&pixel.0) {
            Some(&index) => index,
            None => {
                if palette.len() == MAX_COLORS {
                    return Err(ImageError::TooManyColors);
                }
                let index = palette.len() as u8;
                palette.push(pixel.0);
                lookup.insert(pixel.0, index);
                index
            }
        };
        indices.push(index);
    }

    let depth = match palette.len() {
        0..=2 => 1,
        3..=4 => 2,
        5..=16 => 4,
        _ => 8,
    };
    let data = pack_rows(&indices, rgb.width(), depth);

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, rgb.width(), rgb.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(bit_depth(depth));
        encoder.set_palette(palette.concat());
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
    }
    Ok(Some(bytes))
}

fn encode_grayscale_png(rgb: &RgbImage) -> Result<Option<Vec<u8>>, ImageError> {
    let mut levels = Vec::with_capacity(rgb.len() / 3);
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        if r != g || g != b {
            return Ok(None);
        }
        levels.push(r);
    }

    // Smallest depth at which every level is exactly representable.
    let (depth, step) = if levels.iter().all(|&v| v == 0 || v == 255) {
        (1, 255)
    } else if levels.iter().all(|&v| v % 85 == 0) {
        (2, 85)
    } else if levels.iter().all(|&v| v % 17 == 0) {
        (4, 17)
    } else {
        (8, 1)
    };
    for level in &mut levels {
        *level /= step;
    }
    let data = pack_rows(&levels, rgb.width(), depth);

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, rgb.width(), rgb.height());
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(bit_depth(depth));
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
    }
    Ok(Some(bytes))
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn ensure_not_empty(image: &DynamicImage) -> Result<(), ImageError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// Keeps the shortest output; `min_by_key` returns the first of equal minima.
fn select_smallest(outputs: Vec<(EncodingKind, Vec<u8>)>) -> Option<EncodedImage> {
    outputs
        .into_iter()
        .min_by_key(|(_, bytes)| bytes.len())
        .map(|(kind, bytes)| EncodedImage { kind, bytes })
}

fn bit_depth(bits: u8) -> png::BitDepth {
    match bits {
        1 => png::BitDepth::One,
        2 => png::BitDepth::Two,
        4 => png::BitDepth::Four,
        _ => png::BitDepth::Eight,
    }
}

/// Packs `depth`-bit samples into PNG scanlines, most significant bits first.
/// Each row is padded to a whole byte.
fn pack_rows(samples: &[u8], width: u32, depth: u8) -> Vec<u8> {
    let width = width as usize;
    let depth = depth as usize;
    if depth == 8 {
        return samples.to_vec();
    }

    let row_bytes = (width * depth + 7) / 8;
    let rows = if width == 0 { 0 } else { samples.len() / width };
    let mut packed = vec![0u8; row_bytes * rows];

    for (row, chunk) in samples.chunks(width.max(1)).enumerate().take(rows) {
        let line = &mut packed[row * row_bytes..(row + 1) * row_bytes];
        for (x, &sample) in chunk.iter().enumerate() {
            let bit = x * depth;
            let shift = 8 - depth - (bit % 8);
            line[bit / 8] |= sample << shift;
        }
    }
    packed
}
