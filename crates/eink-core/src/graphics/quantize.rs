//! Palette reduction: nearest-color rounding and Floyd–Steinberg dithering.
//!
//! Both functions take any opaque [`DynamicImage`] and return an image whose
//! every pixel is a member of the palette.  Grayscale palettes produce a
//! single-channel `Luma8` image; color palettes produce `Rgb8`.
//!
//! Color input is converted to luminance with the ITU-R 601 weights
//! (`0.299 R + 0.587 G + 0.114 B`), evaluated in 16-bit fixed point.
//! Single-channel input is used as-is.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use tracing::trace;

use super::palette::{Color, Palette};
use super::{ensure_no_alpha, ImageError};

/// ITU-R 601 luminance of an RGB color.
///
/// The weights are scaled by 2^16 and sum to exactly 65536, so gray input
/// maps to itself.  Adding `0x8000` before the shift rounds to nearest.
#[inline]
pub fn luminance([r, g, b]: Color) -> u8 {
    let weighted = 19_595 * r as u32 + 38_470 * g as u32 + 7_471 * b as u32;
    ((weighted + 0x8000) >> 16) as u8
}

/// Maps every pixel to its nearest palette color.
///
/// Deterministic: the same input always yields the same output.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedAlpha`] if the image has an alpha channel.
pub fn round(image: &DynamicImage, palette: &Palette) -> Result<DynamicImage, ImageError> {
    ensure_no_alpha(image)?;
    trace!(
        width = image.width(),
        height = image.height(),
        palette = palette.name(),
        "rounding image"
    );

    if palette.is_grayscale() {
        let table = palette.round_table();
        let mut gray = to_luminance(image);
        for pixel in gray.pixels_mut() {
            pixel.0[0] = table[pixel.0[0] as usize];
        }
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    let mut rgb = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        pixel.0 = palette.nearest_color(pixel.0);
    }
    Ok(DynamicImage::ImageRgb8(rgb))
}

/// Reduces the image to the palette with Floyd–Steinberg error diffusion.
///
/// Pixels are visited left to right, top to bottom.  The difference between
/// each pixel's accumulated value and its chosen palette color is spread to
/// unvisited neighbours:
///
/// ```text
///            *     7/16
///   3/16   5/16    1/16
/// ```
///
/// Color palettes diffuse error per RGB channel.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedAlpha`] if the image has an alpha channel.
pub fn dither(image: &DynamicImage, palette: &Palette) -> Result<DynamicImage, ImageError> {
    ensure_no_alpha(image)?;
    trace!(
        width = image.width(),
        height = image.height(),
        palette = palette.name(),
        "dithering image"
    );

    let (width, height) = (image.width() as usize, image.height() as usize);

    if palette.is_grayscale() {
        let gray = to_luminance(image);
        let mut levels: Vec<[f32; 1]> = gray.pixels().map(|p| [p.0[0] as f32]).collect();
        let mut out = GrayImage::new(image.width(), image.height());

        for y in 0..height {
            for x in 0..width {
                let [value] = levels[y * width + x];
                let chosen = palette.nearest_gray(clamp_channel(value));
                diffuse(&mut levels, width, height, x, y, [value - chosen as f32]);
                out.put_pixel(x as u32, y as u32, Luma([chosen]));
            }
        }
        return Ok(DynamicImage::ImageLuma8(out));
    }

    let rgb = image.to_rgb8();
    let mut levels: Vec<[f32; 3]> = rgb
        .pixels()
        .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
        .collect();
    let mut out = RgbImage::new(image.width(), image.height());

    for y in 0..height {
        for x in 0..width {
            let value = levels[y * width + x];
            let chosen = palette.nearest_color(value.map(clamp_channel));
            let error = [
                value[0] - chosen[0] as f32,
                value[1] - chosen[1] as f32,
                value[2] - chosen[2] as f32,
            ];
            diffuse(&mut levels, width, height, x, y, error);
            out.put_pixel(x as u32, y as u32, Rgb(chosen));
        }
    }
    Ok(DynamicImage::ImageRgb8(out))
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn to_luminance(image: &DynamicImage) -> GrayImage {
    if image.color().channel_count() == 1 {
        return image.to_luma8();
    }
    let rgb = image.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (dst, src) in gray.pixels_mut().zip(rgb.pixels()) {
        dst.0[0] = luminance(src.0);
    }
    gray
}

#[inline]
fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Spreads `error` from `(x, y)` to the four Floyd–Steinberg neighbours.
fn diffuse<const N: usize>(
    levels: &mut [[f32; N]],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    error: [f32; N],
) {
    let mut add = |nx: usize, ny: usize, weight: f32| {
        let cell = &mut levels[ny * width + nx];
        for (channel, e) in cell.iter_mut().zip(error) {
            *channel += e * weight;
        }
    };

    if x + 1 < width {
        add(x + 1, y, 7.0 / 16.0);
    }
    if y + 1 < height {
        if x > 0 {
            add(x - 1, y + 1, 3.0 / 16.0);
        }
        add(x, y + 1, 5.0 / 16.0);
        if x + 1 < width {
            add(x + 1, y + 1, 1.0 / 16.0);
        }
    }
}
