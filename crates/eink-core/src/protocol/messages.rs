//! Request and Response message types and the protocol constants they share.
//!
//! The byte layout lives in [`crate::protocol::codec`]; this module only
//! defines what the messages contain.

use std::fmt;

use sha2::{Digest, Sha256};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Magic bytes at the start of every Request and Response.
pub const HEADER: [u8; 12] = *b"\x89INK{\x98 $\x97\xaf\x80d";

/// Length of [`HEADER`] in bytes.
pub const HEADER_SIZE: usize = HEADER.len();

/// Version string sent by devices.  Any other value is rejected.
pub const PROTOCOL_VERSION: &str = "2021-02-27T23:07:41Z";

/// Length of a [`ContentId`] in bytes.
pub const CONTENT_ID_SIZE: usize = 32;

/// Maximum number of request times a device can store.
pub const MAX_REQUEST_TIMES: usize = 20;

/// Sentinel meaning "never" in every decisecond field.
pub const NEVER: i32 = i32::MAX;

// ── Content ids ───────────────────────────────────────────────────────────────

/// A fixed-width identifier for a named image: the SHA-256 of its name.
///
/// Firmware stores status images in a table keyed by this id, so the Response
/// never has to carry variable-length names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId([u8; CONTENT_ID_SIZE]);

impl ContentId {
    /// Returns the id of the image called `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eink_core::protocol::ContentId;
    ///
    /// assert_eq!(ContentId::for_name("mountain"), ContentId::for_name("mountain"));
    /// assert_ne!(ContentId::for_name("mountain"), ContentId::for_name("sunrise"));
    /// ```
    pub fn for_name(name: &str) -> Self {
        Self(Sha256::digest(name.as_bytes()).into())
    }

    pub const fn from_bytes(bytes: [u8; CONTENT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; CONTENT_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({self})")
    }
}

/// SHA-256 of the UTF-8 encoding of `name`.
pub fn content_id(name: &str) -> ContentId {
    ContentId::for_name(name)
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// The handshake a device sends to ask for new content.
///
/// A Request carries nothing beyond the header and the protocol version, so
/// every valid Request is equal to every other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Request;

impl Request {
    pub fn new() -> Self {
        Self
    }
}

/// The server's answer: an encoded image plus when to ask again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Deciseconds to wait before each successive request attempt.  The last
    /// entry repeats indefinitely.  [`NEVER`] stops further requests.
    pub request_times_ds: Vec<i32>,
    /// Status image to show once `screensaver_time_ds` elapses without a
    /// successful update.
    pub screensaver_id: ContentId,
    /// Deciseconds until the screensaver is shown, or [`NEVER`].
    pub screensaver_time_ds: i32,
    /// Encoded image container (PNG or JPEG).
    pub image_data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bytes() {
        assert_eq!(
            HEADER,
            [0x89, 0x49, 0x4E, 0x4B, 0x7B, 0x98, 0x20, 0x24, 0x97, 0xAF, 0x80, 0x64]
        );
        assert_eq!(HEADER_SIZE, 12);
    }

    #[test]
    fn test_content_id_known_digests() {
        assert_eq!(
            content_id("mountain").to_string(),
            "3b80d38f7686a8b5f8e61ad562ec069ac172732fb4dab946401f21a438669a4b"
        );
        assert_eq!(
            content_id("connecting").to_string(),
            "3d6df245178e60766e3478a821dd81b9702e3e4d4e1319d5484b0351f29c0149"
        );
        assert_eq!(
            content_id("").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_id_is_deterministic() {
        let first = ContentId::for_name("sunrise");
        let second = ContentId::for_name("sunrise");
        assert_eq!(first, second);
        assert_eq!(first.as_bytes().len(), CONTENT_ID_SIZE);
    }

    #[test]
    fn test_content_id_from_bytes_round_trips() {
        let id = content_id("mountain");
        assert_eq!(ContentId::from_bytes(*id.as_bytes()), id);
    }
}
