//! Status images: full-screen images stored on the device itself.
//!
//! A status image is shown without contacting the server: on power-up (the
//! *initial* image), when the battery runs low, and as the screensaver after
//! the server has been unreachable for a while.  Each one is referenced over
//! the wire by the [`ContentId`] of its name.
//!
//! [`StatusImages::prepare`] reduces every image to the device palette and
//! encodes it, ready to be embedded in firmware.

use std::collections::BTreeMap;

use eink_core::graphics::{ensure_no_alpha, ensure_size};
use eink_core::{encode, render_jpeg, round, ContentId, EncodedImage, ImageError, Palette};
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use super::provider::DEFAULT_SCREENSAVER_NAME;

/// Default name of the image shown on power-up.
pub const DEFAULT_INITIAL_IMAGE_NAME: &str = DEFAULT_SCREENSAVER_NAME;

/// Default name of the image shown when the battery is low.
pub const DEFAULT_LOW_BATTERY_IMAGE_NAME: &str = "low_battery";

/// Quality that selects lossless encoding.
pub const LOSSLESS_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum StatusImageError {
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A role (initial or low battery) names an image that was never set.
    #[error("the {role} image {name:?} has not been set")]
    MissingImage { role: &'static str, name: String },
}

#[derive(Debug, Clone)]
struct StatusImage {
    image: DynamicImage,
    quality: u8,
}

/// A status image after palette reduction and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatusImage {
    pub name: String,
    pub id: ContentId,
    pub encoded: EncodedImage,
}

/// The set of status images for one display.
#[derive(Debug, Clone)]
pub struct StatusImages {
    width: u32,
    height: u32,
    images: BTreeMap<String, StatusImage>,
    initial_image_name: String,
    low_battery_image_name: String,
}

impl StatusImages {
    /// Creates an empty set for a `width` × `height` display (after rotation).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            images: BTreeMap::new(),
            initial_image_name: DEFAULT_INITIAL_IMAGE_NAME.to_string(),
            low_battery_image_name: DEFAULT_LOW_BATTERY_IMAGE_NAME.to_string(),
        }
    }

    /// Adds or replaces the status image called `name`.
    ///
    /// `quality` is a JPEG quality from 0 to 100; 100 stores the image
    /// losslessly.  Lower values save device memory when there are many
    /// large status images.
    ///
    /// # Errors
    ///
    /// - [`ImageError::SizeMismatch`] if the image is not the display size.
    /// - [`ImageError::UnsupportedAlpha`] if the image has an alpha channel.
    /// - [`ImageError::InvalidQuality`] if `quality > 100`.
    pub fn set_image(
        &mut self,
        name: impl Into<String>,
        image: DynamicImage,
        quality: u8,
    ) -> Result<(), ImageError> {
        ensure_size(&image, self.width, self.height)?;
        ensure_no_alpha(&image)?;
        if quality > LOSSLESS_QUALITY {
            return Err(ImageError::InvalidQuality(quality));
        }
        self.images
            .insert(name.into(), StatusImage { image, quality });
        Ok(())
    }

    pub fn set_initial_image_name(&mut self, name: impl Into<String>) {
        self.initial_image_name = name.into();
    }

    pub fn set_low_battery_image_name(&mut self, name: impl Into<String>) {
        self.low_battery_image_name = name.into();
    }

    pub fn initial_image_name(&self) -> &str {
        &self.initial_image_name
    }

    pub fn low_battery_image_name(&self) -> &str {
        &self.low_battery_image_name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Image names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// Rounds every image to `palette` and encodes it.
    ///
    /// Images are returned sorted by name, so repeated calls produce
    /// identical firmware tables.
    ///
    /// # Errors
    ///
    /// - [`StatusImageError::MissingImage`] if the initial or low-battery
    ///   image name is not registered.
    /// - [`StatusImageError::Image`] if rounding or encoding fails.
    pub fn prepare(&self, palette: &Palette) -> Result<Vec<PreparedStatusImage>, StatusImageError> {
        for (role, name) in [
            ("initial", &self.initial_image_name),
            ("low battery", &self.low_battery_image_name),
        ] {
            if !self.contains(name) {
                return Err(StatusImageError::MissingImage {
                    role,
                    name: name.clone(),
                });
            }
        }

        self.images
            .iter()
            .map(|(name, status)| -> Result<PreparedStatusImage, StatusImageError> {
                let rounded = round(&status.image, palette)?;
                let encoded = if status.quality == LOSSLESS_QUALITY {
                    encode(&rounded)?
                } else {
                    render_jpeg(&rounded, status.quality)?
                };
                debug!(
                    name = name.as_str(),
                    kind = %encoded.kind,
                    bytes = encoded.len(),
                    "prepared status image"
                );
                Ok(PreparedStatusImage {
                    name: name.clone(),
                    id: ContentId::for_name(name),
                    encoded,
                })
            })
            .collect()
    }
}
