//! Palette reduction and image encoding.
//!
//! The pipeline for every image sent to a device is:
//!
//! ```text
//! DynamicImage ──round/dither──► palette-constrained image ──encode──► PNG bytes
//! ```
//!
//! - **`palette`**  – The fixed color sets a panel can display.
//! - **`quantize`** – [`round`] (nearest color) and [`dither`]
//!   (Floyd–Steinberg) reduce arbitrary images to a palette.
//! - **`encoding`** – [`encode`] picks the smallest lossless container;
//!   [`render_jpeg`] is the explicitly lossy path.

use image::ColorType;
use thiserror::Error;

pub mod encoding;
pub mod palette;
pub mod quantize;

pub use encoding::{decode, encode, render_jpeg, EncodedImage, EncodingKind};
pub use palette::{
    Color, Palette, PaletteError, BLACK_WHITE_AND_RED, FOUR_BIT_GRAYSCALE, MAX_COLORS,
    MONOCHROME, SEVEN_COLOR, THREE_BIT_GRAYSCALE,
};
pub use quantize::{dither, luminance, round};

/// Errors raised while quantizing or encoding an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The image carries an alpha channel, which e-ink panels cannot show.
    #[error("images with an alpha channel are not supported (color type {0:?})")]
    UnsupportedAlpha(ColorType),

    /// The image does not match the dimensions of the display.
    #[error(
        "image is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}"
    )]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The image has zero width or height.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// More distinct colors than an indexed container can hold.
    #[error("image has more than {MAX_COLORS} distinct colors")]
    TooManyColors,

    /// JPEG quality outside `0..=100`.
    #[error("JPEG quality must be between 0 and 100, got {0}")]
    InvalidQuality(u8),

    /// The PNG encoder rejected the image.
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    /// The `image` crate failed to encode or decode a container.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

/// Fails with [`ImageError::UnsupportedAlpha`] if `image` has an alpha channel.
pub fn ensure_no_alpha(image: &image::DynamicImage) -> Result<(), ImageError> {
    let color = image.color();
    if color.has_alpha() {
        return Err(ImageError::UnsupportedAlpha(color));
    }
    Ok(())
}

/// Fails with [`ImageError::SizeMismatch`] unless `image` is exactly
/// `width` × `height`.
pub fn ensure_size(image: &image::DynamicImage, width: u32, height: u32) -> Result<(), ImageError> {
    if image.width() != width || image.height() != height {
        return Err(ImageError::SizeMismatch {
            expected_width: width,
            expected_height: height,
            actual_width: image.width(),
            actual_height: image.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayAlphaImage, RgbImage, RgbaImage};

    #[test]
    fn test_ensure_no_alpha_rejects_rgba() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        assert!(matches!(
            ensure_no_alpha(&image),
            Err(ImageError::UnsupportedAlpha(ColorType::Rgba8))
        ));
    }

    #[test]
    fn test_ensure_no_alpha_rejects_gray_alpha() {
        let image = DynamicImage::ImageLumaA8(GrayAlphaImage::new(2, 2));
        assert!(ensure_no_alpha(&image).is_err());
    }

    #[test]
    fn test_ensure_no_alpha_accepts_rgb() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(ensure_no_alpha(&image).is_ok());
    }

    #[test]
    fn test_ensure_size_reports_both_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(3, 4));
        let err = ensure_size(&image, 600, 448).unwrap_err();
        assert_eq!(err.to_string(), "image is 3x4, expected 600x448");
    }
}
