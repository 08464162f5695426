use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// `codec_flags` byte: high nibble is the major version, low nibble
/// selects the minor version / encoding used for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecFlags {
    pub major: u8,
    pub minor: u8,
}

impl CodecFlags {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    fn to_byte(self) -> u8 {
        (self.major << 4) | (self.minor & 0x0F)
    }

    fn from_byte(b: u8) -> Self {
        Self {
            major: (b >> 4) & 0x0F,
            minor: b & 0x0F,
        }
    }
}

/// A single length-prefixed framed message: `[u32 len][u8 flags][payload]`.
/// `len` does not include itself or the flags byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub flags: CodecFlags,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(flags: CodecFlags, payload: Bytes) -> Self {
        Self { flags, payload }
    }

    /// Encodes this frame, failing with [`Error::MaxPayloadExceeded`] and
    /// writing nothing if the encoded payload is too large.
    pub fn encode(&self, max_payload: u32) -> Result<Bytes> {
        let payload_len = 1 + self.payload.len();
        if payload_len as u64 > u64::from(max_payload) {
            return Err(Error::MaxPayloadExceeded(payload_len as u32, max_payload));
        }
        let mut buf = BytesMut::with_capacity(4 + payload_len);
        buf.put_u32(payload_len as u32);
        buf.put_u8(self.flags.to_byte());
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// Decodes one frame from the front of `buf`, advancing it past the
    /// consumed bytes on success. Returns `Ok(None)` if `buf` does not yet
    /// contain a complete frame (caller should read more bytes).
    pub fn try_decode(
        buf: &mut BytesMut,
        local_major: u8,
        max_payload: u32,
    ) -> Result<Option<Self>> {
        if buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        if len == 0 {
            return Err(Error::MissingPayload);
        }
        if len > max_payload {
            return Err(Error::MaxPayloadExceeded(len, max_payload));
        }
        let total = 4 + len as usize;
        if buf.len() < total {
            return Ok(None);
        }

        buf.advance(4);
        let flags = CodecFlags::from_byte(buf.get_u8());
        if flags.major > local_major {
            // Drain the frame we now own so the connection stays in sync.
            buf.advance(len as usize - 1);
            return Err(Error::TransportVersion {
                peer_major: flags.major,
                local_major,
            });
        }
        if len as usize - 1 == 0 {
            return Err(Error::MissingPayload);
        }
        let payload = buf.split_to(len as usize - 1).freeze();
        Ok(Some(Frame { flags, payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_encode_decode() {
        let frame = Frame::new(CodecFlags::new(1, 1), Bytes::from_static(b"hello"));
        let encoded = frame.encode(1024).unwrap();
        let mut buf = BytesMut::from(&encoded[..]);
        let decoded = Frame::try_decode(&mut buf, 1, 1024).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_frame_returns_none() {
        let frame = Frame::new(CodecFlags::new(1, 1), Bytes::from_static(b"hello"));
        let encoded = frame.encode(1024).unwrap();
        let mut buf = BytesMut::from(&encoded[..encoded.len() - 2]);
        assert!(Frame::try_decode(&mut buf, 1, 1024).unwrap().is_none());
    }

    #[test]
    fn peer_major_too_high_fails_version() {
        let frame = Frame::new(CodecFlags::new(9, 1), Bytes::from_static(b"hello"));
        let encoded = frame.encode(1024).unwrap();
        let mut buf = BytesMut::from(&encoded[..]);
        let err = Frame::try_decode(&mut buf, 1, 1024).unwrap_err();
        assert!(matches!(err, Error::TransportVersion { peer_major: 9, local_major: 1 }));
        assert!(buf.is_empty(), "frame must be fully drained even on version error");
    }

    #[test]
    fn empty_payload_is_missing_payload() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&[CodecFlags::new(1, 1).to_byte()]);
        let err = Frame::try_decode(&mut buf, 1, 1024).unwrap_err();
        assert!(matches!(err, Error::MissingPayload));
    }

    #[test]
    fn oversized_payload_rejected() {
        let frame = Frame::new(CodecFlags::new(1, 1), Bytes::from(vec![0u8; 100]));
        assert!(matches!(
            frame.encode(10),
            Err(Error::MaxPayloadExceeded(_, 10))
        ));
    }
}
