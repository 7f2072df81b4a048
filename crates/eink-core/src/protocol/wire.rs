//! Primitive reads and writes shared by Request and Response.
//!
//! All integers are 4-byte little-endian signed.  Byte strings are prefixed
//! with their length as one such integer.

use super::codec::ProtocolError;

/// Appends `value` as 4 little-endian bytes.
pub fn write_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Appends a length prefix followed by `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if `bytes` is longer than
/// `i32::MAX`.
pub fn write_length_prefixed_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ProtocolError> {
    let len = i32::try_from(bytes.len()).map_err(|_| ProtocolError::PayloadTooLarge(bytes.len()))?;
    write_i32(buf, len);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// A forward-only cursor over a received message.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes up to `len` bytes; returns fewer if the input runs out.
    pub fn take(&mut self, len: usize) -> &'a [u8] {
        let end = self.pos + len.min(self.remaining());
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        slice
    }

    /// Consumes exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TruncatedPayload`] if fewer remain.  Nothing
    /// is consumed in that case.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < len {
            return Err(ProtocolError::TruncatedPayload {
                declared: len,
                available: self.remaining(),
            });
        }
        Ok(self.take(len))
    }

    /// Reads a little-endian `i32`.
    ///
    /// Deployed firmware treats a short read as zero, and so does this: with
    /// fewer than 4 bytes left, the remaining bytes are consumed and `0` is
    /// returned.
    pub fn read_i32(&mut self) -> i32 {
        match <[u8; 4]>::try_from(self.take(4)) {
            Ok(bytes) => i32::from_le_bytes(bytes),
            Err(_) => 0,
        }
    }

    /// Reads a length prefix and then that many bytes.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NegativeLength`] if the prefix is negative.
    /// - [`ProtocolError::TruncatedPayload`] if fewer bytes remain than the
    ///   prefix declares.
    pub fn read_length_prefixed_bytes(&mut self) -> Result<&'a [u8], ProtocolError> {
        let len = self.read_i32();
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len))?;
        self.read_exact(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_i32_is_little_endian() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 0x0102_0304);
        write_i32(&mut buf, -1);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_read_i32_round_trips_extremes() {
        let mut buf = Vec::new();
        for value in [0, 1, -1, i32::MAX, i32::MIN] {
            write_i32(&mut buf, value);
        }
        let mut reader = WireReader::new(&buf);
        for value in [0, 1, -1, i32::MAX, i32::MIN] {
            assert_eq!(reader.read_i32(), value);
        }
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_i32_under_read_returns_zero_and_consumes_rest() {
        let mut reader = WireReader::new(&[0xFF, 0xFF, 0xFF]);

        assert_eq!(reader.read_i32(), 0);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_i32(), 0);
    }

    #[test]
    fn test_length_prefixed_round_trip() {
        let mut buf = Vec::new();
        write_length_prefixed_bytes(&mut buf, b"hello").unwrap();
        write_length_prefixed_bytes(&mut buf, b"").unwrap();

        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.read_length_prefixed_bytes().unwrap(), b"hello");
        assert_eq!(reader.read_length_prefixed_bytes().unwrap(), b"");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_length_prefixed_truncated() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 10);
        buf.extend_from_slice(b"abc");

        let mut reader = WireReader::new(&buf);
        assert_eq!(
            reader.read_length_prefixed_bytes(),
            Err(ProtocolError::TruncatedPayload {
                declared: 10,
                available: 3
            })
        );
    }

    #[test]
    fn test_length_prefixed_negative_length() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -5);

        let mut reader = WireReader::new(&buf);
        assert_eq!(
            reader.read_length_prefixed_bytes(),
            Err(ProtocolError::NegativeLength(-5))
        );
    }

    #[test]
    fn test_read_exact_does_not_consume_on_failure() {
        let mut reader = WireReader::new(b"ab");
        assert!(reader.read_exact(3).is_err());
        assert_eq!(reader.read_exact(2).unwrap(), b"ab");
    }
}
