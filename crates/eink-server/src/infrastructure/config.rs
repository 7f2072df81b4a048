//! TOML configuration for the server.
//!
//! # What is TOML? (for beginners)
//!
//! TOML is a configuration format designed to be easy to read and write.  A
//! complete server configuration looks like this:
//!
//! ```toml
//! [rendering]
//! palette = "7_COLOR"
//! quantization = "dither"
//!
//! [display]
//! width = 600
//! height = 448
//!
//! [status_images]
//! names = ["connecting", "low_battery", "mountain"]
//! ```
//!
//! Every section and field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` use the return value of `some_fn()` when
//! they are absent, so an empty file is a valid configuration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use eink_core::Palette;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::application::serve_request::{DisplaySize, Quantization, ServerSettings};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `rendering.palette` is not a standard palette name.
    #[error("unknown palette {0:?}")]
    UnknownPalette(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySize>,
    #[serde(default)]
    pub status_images: StatusImagesConfig,
}

/// How rendered content is reduced for the panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderingConfig {
    /// Standard palette name, e.g. `"3_BIT_GRAYSCALE"` or `"7_COLOR"`.
    #[serde(default = "default_palette")]
    pub palette: String,
    #[serde(default)]
    pub quantization: Quantization,
}

/// Names of the status images compiled into the firmware.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusImagesConfig {
    #[serde(default)]
    pub names: BTreeSet<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_palette() -> String {
    "3_BIT_GRAYSCALE".to_string()
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            quantization: Quantization::default(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ServerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown field values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), palette = config.rendering.palette.as_str(), "loaded config");
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Looks up the configured standard palette.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPalette`] if the name is not a standard
    /// palette.
    pub fn palette(&self) -> Result<&'static Palette, ConfigError> {
        Palette::standard(&self.rendering.palette)
            .ok_or_else(|| ConfigError::UnknownPalette(self.rendering.palette.clone()))
    }

    /// Resolves the configuration into [`ServerSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPalette`] if the palette name is unknown.
    pub fn to_settings(&self) -> Result<ServerSettings, ConfigError> {
        Ok(ServerSettings {
            palette: self.palette()?.clone(),
            quantization: self.rendering.quantization,
            display: self.display,
            status_image_names: self.status_images.names.clone(),
        })
    }
}
