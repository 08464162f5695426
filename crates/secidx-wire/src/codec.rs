use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::frame::{CodecFlags, Frame};

/// Rewrites a payload encoded under an older minor version into the
/// current minor version's shape, run before the message is handed to
/// the dispatcher.
pub type Upgrader = fn(Bytes) -> Result<Bytes>;

/// Encodes and decodes message payloads for one transport version,
/// with a table of upgraders for older minor versions that are still
/// wire-compatible at the major-version level.
pub struct CodecRegistry {
    current: CodecFlags,
    upgraders: HashMap<(u8, u8), Upgrader>,
}

impl CodecRegistry {
    pub fn new(current: CodecFlags) -> Self {
        Self {
            current,
            upgraders: HashMap::new(),
        }
    }

    /// Registers an upgrader invoked when a frame's `(major, minor)`
    /// does not match `current`, but major is still accepted (caller is
    /// responsible for rejecting major mismatches before this point via
    /// [`crate::frame::Frame::try_decode`]).
    pub fn register_upgrader(&mut self, major: u8, minor: u8, upgrader: Upgrader) {
        self.upgraders.insert((major, minor), upgrader);
    }

    pub fn current_flags(&self) -> CodecFlags {
        self.current
    }

    /// Applies any registered upgrader for `frame`'s version, then
    /// decodes the (possibly rewritten) payload as JSON.
    pub fn decode<T: DeserializeOwned>(&self, frame: &Frame) -> Result<T> {
        let payload = if frame.flags.minor == self.current.minor {
            frame.payload.clone()
        } else {
            match self.upgraders.get(&(frame.flags.major, frame.flags.minor)) {
                Some(upgrader) => upgrader(frame.payload.clone())?,
                None => frame.payload.clone(),
            }
        };
        if payload.is_empty() {
            return Err(Error::MissingPayload);
        }
        serde_json::from_slice(&payload).map_err(Error::from)
    }

    /// Encodes `value` into a frame stamped with the registry's current
    /// version.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Frame> {
        let payload = serde_json::to_vec(value)?;
        Ok(Frame::new(self.current, Bytes::from(payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Msg {
        a: u32,
    }

    #[test]
    fn encode_decode_roundtrip() {
        let registry = CodecRegistry::new(CodecFlags::new(1, 1));
        let frame = registry.encode(&Msg { a: 7 }).unwrap();
        let decoded: Msg = registry.decode(&frame).unwrap();
        assert_eq!(decoded, Msg { a: 7 });
    }

    #[test]
    fn upgrader_runs_on_minor_mismatch() {
        let mut registry = CodecRegistry::new(CodecFlags::new(1, 2));
        registry.register_upgrader(1, 1, |payload| {
            // v1 payloads lacked the `a` field default; synthesize it.
            let mut v: serde_json::Value = serde_json::from_slice(&payload)?;
            v["a"] = serde_json::json!(0);
            Ok(Bytes::from(serde_json::to_vec(&v)?))
        });

        let old_frame = Frame::new(CodecFlags::new(1, 1), Bytes::from_static(b"{}"));
        let decoded: Msg = registry.decode(&old_frame).unwrap();
        assert_eq!(decoded, Msg { a: 0 });
    }

    #[test]
    fn missing_payload_after_decode_fails() {
        let registry = CodecRegistry::new(CodecFlags::new(1, 1));
        let frame = Frame::new(CodecFlags::new(1, 1), Bytes::new());
        let err = registry.decode::<Msg>(&frame).unwrap_err();
        assert!(matches!(err, Error::MissingPayload));
    }
}
