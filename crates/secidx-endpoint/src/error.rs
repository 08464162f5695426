use thiserror::Error;

/// Endpoint errors (spec.md §7).
#[derive(Error, Debug)]
pub enum Error {
    /// Non-blocking `Send` found the command queue full.
    #[error("endpoint command channel is full")]
    ChannelFull,

    /// The endpoint actor has already closed.
    #[error("endpoint is closed")]
    ConnClosed,

    /// The underlying sink write failed; the endpoint aborts.
    #[error("flush to sink failed: {0}")]
    FlushFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
