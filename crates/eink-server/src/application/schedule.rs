//! Turns a provider's timing intentions into the schedule a device stores.
//!
//! # How the device uses the schedule (for beginners)
//!
//! After each exchange the device sleeps for `request_times[0]` deciseconds
//! and then asks again.  If that request fails it sleeps for
//! `request_times[1]`, then `request_times[2]`, and so on; once it reaches
//! the last entry it keeps using that one.  A value of [`NEVER_DS`] means
//! "stop asking".
//!
//! Firmware has room for only [`MAX_REQUEST_TIMES`] entries, so long retry
//! lists are shortened here while keeping the final steady-state cadence.

use std::time::Duration;

use eink_core::protocol::{MAX_REQUEST_TIMES, NEVER};
use thiserror::Error;

use crate::domain::provider::ScheduleIntent;

/// Sentinel for "never", in deciseconds.
pub const NEVER_DS: i32 = NEVER;

/// Longest interval a provider may request.
pub const MAX_TIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const NANOS_PER_DS: u128 = 100_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// An interval exceeds [`MAX_TIME`].  Rejected rather than clamped, so a
    /// provider bug cannot silently starve the device's retry budget.
    #[error("interval {0:?} exceeds the maximum of 365 days")]
    IntervalOutOfRange(Duration),

    /// The provider supplied an explicit, empty retry list.
    #[error("retry times must not be empty")]
    EmptyRetryTimes,
}

/// Converts an interval to deciseconds, rounding half up.
///
/// `None` means "never" and maps to [`NEVER_DS`].
///
/// # Errors
///
/// Returns [`ScheduleError::IntervalOutOfRange`] above [`MAX_TIME`].
pub fn interval_to_ds(interval: Option<Duration>) -> Result<i32, ScheduleError> {
    let Some(interval) = interval else {
        return Ok(NEVER_DS);
    };
    if interval > MAX_TIME {
        return Err(ScheduleError::IntervalOutOfRange(interval));
    }
    // MAX_TIME is about 3.2e8 ds, so the quotient always fits.
    let ds = (interval.as_nanos() + NANOS_PER_DS / 2) / NANOS_PER_DS;
    Ok(ds as i32)
}

/// Computes the request-time schedule for `intent`.
///
/// The sequence is the update interval followed by the retry intervals, in
/// deciseconds.  Every entry must be in range, but entries after the first
/// "never" are unreachable and dropped.  Trailing repeats of the final value
/// are then collapsed, and a sequence still longer than
/// [`MAX_REQUEST_TIMES`] keeps its first 19 entries plus its last.
///
/// # Errors
///
/// - [`ScheduleError::EmptyRetryTimes`] for an explicit empty retry list.
/// - [`ScheduleError::IntervalOutOfRange`] for any interval above
///   [`MAX_TIME`].
pub fn request_times_ds(intent: &ScheduleIntent) -> Result<Vec<i32>, ScheduleError> {
    let retry_times = intent.retry_times();
    if retry_times.is_empty() {
        return Err(ScheduleError::EmptyRetryTimes);
    }

    // Every entry is range-checked, including those after a "never".
    let mut times = std::iter::once(intent.update_time)
        .chain(retry_times)
        .map(interval_to_ds)
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(first_never) = times.iter().position(|&ds| ds == NEVER_DS) {
        times.truncate(first_never + 1);
    }

    while times.len() > 1 && times[times.len() - 1] == times[times.len() - 2] {
        times.pop();
    }

    if times.len() > MAX_REQUEST_TIMES {
        let last = times[times.len() - 1];
        times.truncate(MAX_REQUEST_TIMES - 1);
        times.push(last);
    }
    Ok(times)
}
