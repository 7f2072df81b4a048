//! Binary encoding and decoding of Requests and Responses.
//!
//! Wire format (all integers little-endian `i32`):
//! ```text
//! Request:  [header:12][version_len:4][version:N]
//! Response: [header:12][count:4][request_time:4 × count][screensaver_id:32]
//!           [screensaver_time:4][image_len:4][image:M]
//! ```

use thiserror::Error;

use crate::protocol::messages::{
    ContentId, Request, Response, CONTENT_ID_SIZE, HEADER, HEADER_SIZE, MAX_REQUEST_TIMES,
    PROTOCOL_VERSION,
};
use crate::protocol::wire::{write_i32, write_length_prefixed_bytes, WireReader};

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message does not start with the magic header.
    #[error("invalid {context} header")]
    InvalidHeader { context: &'static str },

    /// The device was built for a different protocol version.
    #[error("protocol version mismatch: expected {expected:?}, got {actual:?}")]
    VersionMismatch { expected: &'static str, actual: String },

    /// A fixed-size or length-prefixed field ran past the end of the input.
    #[error("truncated payload: need {declared} bytes, {available} available")]
    TruncatedPayload { declared: usize, available: usize },

    /// A length prefix was negative.
    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    /// The request-time count is outside `1..=MAX_REQUEST_TIMES`.
    #[error("request time count {0} is outside 1..={MAX_REQUEST_TIMES}")]
    InvalidScheduleLength(i64),

    /// A request time is negative.
    #[error("negative request time: {0}")]
    NegativeRequestTime(i32),

    /// A field is too large to describe with an `i32` length.
    #[error("payload of {0} bytes exceeds the maximum length")]
    PayloadTooLarge(usize),
}

// ── Request ───────────────────────────────────────────────────────────────────

impl Request {
    /// Serializes the Request a device would send.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eink_core::protocol::Request;
    ///
    /// let bytes = Request::new().to_bytes()?;
    /// assert_eq!(Request::parse(&bytes), Ok(Request::new()));
    /// # Ok::<(), eink_core::protocol::ProtocolError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the version string does not fit
    /// an `i32` length.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + 4 + PROTOCOL_VERSION.len());
        buf.extend_from_slice(&HEADER);
        write_length_prefixed_bytes(&mut buf, PROTOCOL_VERSION.as_bytes())?;
        Ok(buf)
    }

    /// Parses and validates a Request.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidHeader`] if the magic header is missing.
    /// - [`ProtocolError::VersionMismatch`] unless the version is exactly
    ///   [`PROTOCOL_VERSION`].  No partial compatibility is attempted.
    /// - [`ProtocolError::TruncatedPayload`] / [`ProtocolError::NegativeLength`]
    ///   if the version field is malformed.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = WireReader::new(bytes);
        read_header(&mut reader, "request")?;

        let version = reader.read_length_prefixed_bytes()?;
        if version != PROTOCOL_VERSION.as_bytes() {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: String::from_utf8_lossy(version).into_owned(),
            });
        }
        Ok(Request)
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

impl Response {
    /// Serializes the Response.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidScheduleLength`] unless there are between 1
    ///   and [`MAX_REQUEST_TIMES`] request times.
    /// - [`ProtocolError::NegativeRequestTime`] if any request time is
    ///   negative.
    /// - [`ProtocolError::PayloadTooLarge`] if the image does not fit an
    ///   `i32` length.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let count = self.request_times_ds.len();
        if !(1..=MAX_REQUEST_TIMES).contains(&count) {
            return Err(ProtocolError::InvalidScheduleLength(count as i64));
        }
        check_request_times(&self.request_times_ds)?;

        let mut buf = Vec::with_capacity(
            HEADER_SIZE + 4 * (count + 3) + CONTENT_ID_SIZE + self.image_data.len(),
        );
        buf.extend_from_slice(&HEADER);
        write_i32(&mut buf, count as i32);
        for &time in &self.request_times_ds {
            write_i32(&mut buf, time);
        }
        buf.extend_from_slice(self.screensaver_id.as_bytes());
        write_i32(&mut buf, self.screensaver_time_ds);
        write_length_prefixed_bytes(&mut buf, &self.image_data)?;
        Ok(buf)
    }

    /// Parses a Response.
    ///
    /// Request times follow the permissive integer rule: if the input ends
    /// inside the schedule, the missing values read as `0`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidHeader`] if the magic header is missing.
    /// - [`ProtocolError::InvalidScheduleLength`] if the count is not between
    ///   1 and [`MAX_REQUEST_TIMES`].
    /// - [`ProtocolError::NegativeRequestTime`] if a request time is negative.
    /// - [`ProtocolError::TruncatedPayload`] if the screensaver id or image
    ///   is cut short.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = WireReader::new(bytes);
        read_header(&mut reader, "response")?;

        let count = reader.read_i32();
        let count = usize::try_from(count)
            .ok()
            .filter(|n| (1..=MAX_REQUEST_TIMES).contains(n))
            .ok_or(ProtocolError::InvalidScheduleLength(count as i64))?;
        let request_times_ds: Vec<i32> = (0..count).map(|_| reader.read_i32()).collect();
        check_request_times(&request_times_ds)?;

        let mut id = [0u8; CONTENT_ID_SIZE];
        id.copy_from_slice(reader.read_exact(CONTENT_ID_SIZE)?);
        let screensaver_time_ds = reader.read_i32();
        let image_data = reader.read_length_prefixed_bytes()?.to_vec();

        Ok(Response {
            request_times_ds,
            screensaver_id: ContentId::from_bytes(id),
            screensaver_time_ds,
            image_data,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_header(reader: &mut WireReader<'_>, context: &'static str) -> Result<(), ProtocolError> {
    if reader.take(HEADER_SIZE) != HEADER {
        return Err(ProtocolError::InvalidHeader { context });
    }
    Ok(())
}

fn check_request_times(times: &[i32]) -> Result<(), ProtocolError> {
    match times.iter().find(|&&time| time < 0) {
        Some(&time) => Err(ProtocolError::NegativeRequestTime(time)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{content_id, NEVER};

    fn sample_response() -> Response {
        Response {
            request_times_ds: vec![3000, 1200, 3000, 6000],
            screensaver_id: content_id("mountain"),
            screensaver_time_ds: NEVER,
            image_data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        }
    }

    // ── Request ───────────────────────────────────────────────────────────────

    #[test]
    fn test_request_bytes_layout() {
        let bytes = Request::new().to_bytes().unwrap();

        assert_eq!(&bytes[..HEADER_SIZE], &HEADER);
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 4], &20i32.to_le_bytes());
        assert_eq!(&bytes[HEADER_SIZE + 4..], b"2021-02-27T23:07:41Z");
    }

    #[test]
    fn test_request_bad_header() {
        let mut bytes = Request::new().to_bytes().unwrap();
        bytes[0] = 0x88;

        assert_eq!(
            Request::parse(&bytes),
            Err(ProtocolError::InvalidHeader { context: "request" })
        );
    }

    #[test]
    fn test_request_short_header() {
        assert!(matches!(
            Request::parse(&HEADER[..5]),
            Err(ProtocolError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_request_version_mismatch() {
        // Arrange
        let mut bytes = HEADER.to_vec();
        write_length_prefixed_bytes(&mut bytes, b"2020-01-01T00:00:00Z").unwrap();

        // Act
        let result = Request::parse(&bytes);

        // Assert
        assert_eq!(
            result,
            Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: "2020-01-01T00:00:00Z".to_string(),
            })
        );
    }

    #[test]
    fn test_request_truncated_version() {
        let bytes = Request::new().to_bytes().unwrap();
        let result = Request::parse(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::TruncatedPayload { .. })));
    }

    // ── Response ──────────────────────────────────────────────────────────────

    #[test]
    fn test_response_round_trip() {
        let response = sample_response();
        let bytes = response.to_bytes().unwrap();
        assert_eq!(Response::parse(&bytes), Ok(response));
    }

    #[test]
    fn test_response_bytes_layout() {
        // Arrange
        let response = sample_response();

        // Act
        let bytes = response.to_bytes().unwrap();

        // Assert
        let mut offset = HEADER_SIZE;
        assert_eq!(&bytes[offset..offset + 4], &4i32.to_le_bytes());
        offset += 4 + 4 * 4;
        assert_eq!(
            &bytes[offset..offset + CONTENT_ID_SIZE],
            content_id("mountain").as_bytes()
        );
        offset += CONTENT_ID_SIZE;
        assert_eq!(&bytes[offset..offset + 4], &i32::MAX.to_le_bytes());
        offset += 4;
        assert_eq!(&bytes[offset..offset + 4], &7i32.to_le_bytes());
        assert_eq!(bytes.len(), offset + 4 + 7);
    }

    #[test]
    fn test_response_single_never_and_empty_image() {
        let response = Response {
            request_times_ds: vec![NEVER],
            screensaver_id: content_id(""),
            screensaver_time_ds: 0,
            image_data: Vec::new(),
        };
        let bytes = response.to_bytes().unwrap();
        assert_eq!(Response::parse(&bytes), Ok(response));
    }

    #[test]
    fn test_response_to_bytes_rejects_empty_schedule() {
        let mut response = sample_response();
        response.request_times_ds.clear();

        assert_eq!(
            response.to_bytes(),
            Err(ProtocolError::InvalidScheduleLength(0))
        );
    }

    #[test]
    fn test_response_to_bytes_rejects_negative_time() {
        // Arrange
        let mut response = sample_response();
        response.request_times_ds = vec![3000, -1, 6000];

        // Act
        let result = response.to_bytes();

        // Assert
        assert_eq!(result, Err(ProtocolError::NegativeRequestTime(-1)));
    }

    #[test]
    fn test_response_parse_rejects_negative_time() {
        let mut bytes = HEADER.to_vec();
        write_i32(&mut bytes, 2);
        write_i32(&mut bytes, 3000);
        write_i32(&mut bytes, i32::MIN);

        assert_eq!(
            Response::parse(&bytes),
            Err(ProtocolError::NegativeRequestTime(i32::MIN))
        );
    }

    #[test]
    fn test_response_to_bytes_rejects_long_schedule() {
        let mut response = sample_response();
        response.request_times_ds = vec![1; MAX_REQUEST_TIMES + 1];

        assert_eq!(
            response.to_bytes(),
            Err(ProtocolError::InvalidScheduleLength(21))
        );
    }

    #[test]
    fn test_response_parse_rejects_bad_count() {
        for count in [-1, 0, 21, i32::MAX] {
            let mut bytes = HEADER.to_vec();
            write_i32(&mut bytes, count);
            assert_eq!(
                Response::parse(&bytes),
                Err(ProtocolError::InvalidScheduleLength(count as i64))
            );
        }
    }

    #[test]
    fn test_response_parse_bad_header() {
        let mut bytes = sample_response().to_bytes().unwrap();
        bytes[11] = b'e';
        assert_eq!(
            Response::parse(&bytes),
            Err(ProtocolError::InvalidHeader { context: "response" })
        );
    }

    #[test]
    fn test_response_parse_truncated_id() {
        let bytes = sample_response().to_bytes().unwrap();
        let cut = HEADER_SIZE + 4 + 16 + 10;

        assert_eq!(
            Response::parse(&bytes[..cut]),
            Err(ProtocolError::TruncatedPayload {
                declared: CONTENT_ID_SIZE,
                available: 10
            })
        );
    }

    #[test]
    fn test_response_parse_truncated_image() {
        let bytes = sample_response().to_bytes().unwrap();
        let result = Response::parse(&bytes[..bytes.len() - 2]);
        assert_eq!(
            result,
            Err(ProtocolError::TruncatedPayload {
                declared: 7,
                available: 5
            })
        );
    }

    #[test]
    fn test_response_parse_schedule_under_read_yields_zero() {
        // Header + count of 2 + one full time + two stray bytes: the second time
        // reads as 0, then the id is missing.
        let mut bytes = HEADER.to_vec();
        write_i32(&mut bytes, 2);
        write_i32(&mut bytes, 3000);
        bytes.extend_from_slice(&[0x01, 0x02]);

        let result = Response::parse(&bytes);

        assert_eq!(
            result,
            Err(ProtocolError::TruncatedPayload {
                declared: CONTENT_ID_SIZE,
                available: 0
            })
        );
    }
}
