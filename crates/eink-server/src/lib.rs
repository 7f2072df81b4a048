//! eink-server library entry point.
//!
//! Answers e-ink device Requests with rendered, palette-reduced content and a
//! poll schedule.  The embedding application supplies a [`ContentProvider`]
//! and a transport; [`Server::exec`] does the rest.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use eink_server::{ContentProvider, ScheduleIntent, Server, ServerSettings};
//! use image::DynamicImage;
//!
//! struct Clock;
//!
//! impl ContentProvider for Clock {
//!     fn render(&self) -> DynamicImage {
//!         DynamicImage::new_rgb8(600, 448)
//!     }
//!
//!     fn timing_intents(&self) -> ScheduleIntent {
//!         ScheduleIntent::new().with_update_time(Duration::from_secs(60))
//!     }
//! }
//!
//! let server = Server::new(Clock, ServerSettings::default());
//! # let request_body = eink_core::Request::new().to_bytes()?;
//! let response_body = server.exec(&request_body)?;
//! # Ok::<(), eink_server::ServerError>(())
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::schedule::{interval_to_ds, request_times_ds, ScheduleError};
pub use application::serve_request::{
    DisplaySize, Quantization, Server, ServerError, ServerSettings,
};
pub use domain::provider::{ContentProvider, ScheduleIntent};
pub use domain::status_images::{PreparedStatusImage, StatusImageError, StatusImages};
pub use infrastructure::config::{ConfigError, ServerConfig};
