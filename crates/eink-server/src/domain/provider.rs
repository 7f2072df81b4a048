//! The capability contract between the server and the content it serves.
//!
//! A [`ContentProvider`] knows what to draw and how often it changes.  The
//! server knows everything else: protocol framing, palette reduction, encoding,
//! and how to turn timing intentions into a schedule the device can store.

use std::time::Duration;

use eink_core::Palette;
use image::DynamicImage;

/// Status image shown by default when the device cannot reach the server.
pub const DEFAULT_SCREENSAVER_NAME: &str = "connecting";

/// Supplies the image and timing for each exchange.
///
/// Implementations must be `Send + Sync`: exchanges may run in parallel and
/// share one provider.  `render` may block (fetching a forecast, taking a
/// screenshot); the server imposes no timeout of its own.
pub trait ContentProvider: Send + Sync {
    /// Draws the content to send.  Must have no alpha channel.
    fn render(&self) -> DynamicImage;

    /// When the device should ask again.
    fn timing_intents(&self) -> ScheduleIntent;

    /// Name of the status image to show if the device stops hearing from the
    /// server for the intent's `screensaver_time`.
    fn screensaver_name(&self) -> String {
        DEFAULT_SCREENSAVER_NAME.to_string()
    }

    /// Palette to reduce rendered images to.  `None` uses the server's
    /// configured palette.
    fn palette(&self) -> Option<Palette> {
        None
    }
}

/// A provider's abstract timing intentions for one exchange.
///
/// `None` durations mean "never".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleIntent {
    /// How long until the content changes.
    pub update_time: Option<Duration>,
    /// How long to wait after each failed attempt.  `None` selects the
    /// default; see [`ScheduleIntent::retry_times`].
    pub retry_times: Option<Vec<Option<Duration>>>,
    /// How long without a successful update before the screensaver is shown.
    pub screensaver_time: Option<Duration>,
}

impl ScheduleIntent {
    /// An intent that never updates, never retries, and never shows the
    /// screensaver.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update_time(mut self, update_time: Duration) -> Self {
        self.update_time = Some(update_time);
        self
    }

    pub fn with_retry_times(mut self, retry_times: Vec<Option<Duration>>) -> Self {
        self.retry_times = Some(retry_times);
        self
    }

    pub fn with_screensaver_time(mut self, screensaver_time: Duration) -> Self {
        self.screensaver_time = Some(screensaver_time);
        self
    }

    /// The retry intervals to use.
    ///
    /// Without explicit retries this is a quarter of the update interval, or
    /// "never" if the content never updates.
    pub fn retry_times(&self) -> Vec<Option<Duration>> {
        match &self.retry_times {
            Some(times) => times.clone(),
            None => vec![self.update_time.map(|update| update / 4)],
        }
    }
}
