//! ServeRequest use case: one device Request in, one Response out.
//!
//! Each exchange runs these steps and keeps no state between exchanges:
//!
//! 1. Validate the Request (header and protocol version).
//! 2. Compute the request-time schedule from the provider's timing intents.
//! 3. Resolve the screensaver name to a [`ContentId`].
//! 4. Render, check the image, and reduce it to the active palette.
//! 5. Encode the image losslessly and serialize the Response.
//!
//! # Architecture
//!
//! The use case depends only on the [`ContentProvider`] trait, so tests inject
//! providers that return fixed images and intents.  Transport (HTTP or
//! otherwise) is the caller's concern: it hands [`Server::exec`] the request
//! body and writes back the returned bytes.

use std::collections::BTreeSet;

use eink_core::graphics::{dither, encode, ensure_no_alpha, ensure_size, round, THREE_BIT_GRAYSCALE};
use eink_core::{ContentId, ImageError, Palette, ProtocolError, Request, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::schedule::{interval_to_ds, request_times_ds, ScheduleError};
use crate::domain::provider::ContentProvider;

/// Error type for the serve-request use case.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("image error: {0}")]
    Image(#[from] ImageError),
}

/// How rendered images are reduced to the palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// Nearest palette color.  Deterministic, flat areas stay flat.
    #[default]
    Round,
    /// Floyd–Steinberg error diffusion.  Better for photos and gradients.
    Dither,
}

/// Display dimensions after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

/// Resolved settings for a [`Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Palette used when the provider does not choose one.
    pub palette: Palette,
    pub quantization: Quantization,
    /// When set, rendered images must match exactly.
    pub display: Option<DisplaySize>,
    /// Status images compiled into the firmware.  Empty disables the
    /// screensaver-name check.
    pub status_image_names: BTreeSet<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            palette: THREE_BIT_GRAYSCALE.clone(),
            quantization: Quantization::default(),
            display: None,
            status_image_names: BTreeSet::new(),
        }
    }
}

/// Serves device Requests from a single [`ContentProvider`].
///
/// `Server` is `Send + Sync` whenever the provider is, and `exec` takes
/// `&self`, so one instance can serve concurrent exchanges.
pub struct Server<P> {
    provider: P,
    settings: ServerSettings,
}

impl<P: ContentProvider> Server<P> {
    pub fn new(provider: P, settings: ServerSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Handles one exchange and returns the serialized Response.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the Request is invalid, the timing intents
    /// are out of range, or the rendered image cannot be sent.  No partial
    /// Response is produced.
    pub fn exec(&self, payload: &[u8]) -> Result<Vec<u8>, ServerError> {
        let response = self.exec_response(payload)?;
        let bytes = response.to_bytes()?;
        info!(
            bytes = bytes.len(),
            image_bytes = response.image_data.len(),
            "response ready"
        );
        Ok(bytes)
    }

    /// Handles one exchange and returns the Response before serialization.
    ///
    /// # Errors
    ///
    /// See [`Server::exec`].
    pub fn exec_response(&self, payload: &[u8]) -> Result<Response, ServerError> {
        Request::parse(payload)?;
        debug!(payload_len = payload.len(), "request accepted");

        let intent = self.provider.timing_intents();
        let request_times_ds = request_times_ds(&intent)?;
        let screensaver_time_ds = interval_to_ds(intent.screensaver_time)?;
        debug!(?request_times_ds, screensaver_time_ds, "schedule computed");

        let screensaver_name = self.provider.screensaver_name();
        if !self.settings.status_image_names.is_empty()
            && !self.settings.status_image_names.contains(&screensaver_name)
        {
            warn!(
                screensaver = screensaver_name.as_str(),
                "screensaver is not a configured status image"
            );
        }

        let image_data = self.render_image()?;

        Ok(Response {
            request_times_ds,
            screensaver_id: ContentId::for_name(&screensaver_name),
            screensaver_time_ds,
            image_data,
        })
    }

    fn render_image(&self) -> Result<Vec<u8>, ServerError> {
        let image = self.provider.render();
        ensure_no_alpha(&image)?;
        if let Some(display) = self.settings.display {
            ensure_size(&image, display.width, display.height)?;
        }

        let provider_palette = self.provider.palette();
        let palette = provider_palette.as_ref().unwrap_or(&self.settings.palette);
        let quantized = match self.settings.quantization {
            Quantization::Round => round(&image, palette)?,
            Quantization::Dither => dither(&image, palette)?,
        };
        Ok(encode(&quantized)?.into_bytes())
    }
}
