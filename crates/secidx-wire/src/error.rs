use thiserror::Error;

/// Transport and codec errors (spec.md §7).
#[derive(Error, Debug)]
pub enum Error {
    /// Peer's major version exceeds ours; no retry.
    #[error("transport version mismatch: peer major {peer_major}, local major {local_major}")]
    TransportVersion { peer_major: u8, local_major: u8 },

    /// A decoded message is missing its required payload.
    #[error("framed message has no payload")]
    MissingPayload,

    /// `length` field exceeded `maxPayload`.
    #[error("payload of {0} bytes exceeds max payload {1}")]
    MaxPayloadExceeded(u32, u32),

    /// Truncated frame: fewer bytes available than `length` declared.
    #[error("truncated frame: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    /// JSON (de)serialization of the payload failed.
    #[error("payload codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// No encoder/decoder registered for the requested (major, minor).
    #[error("no codec registered for major={0} minor={1}")]
    UnknownCodec(u8, u8),
}

pub type Result<T> = std::result::Result<T, Error>;
