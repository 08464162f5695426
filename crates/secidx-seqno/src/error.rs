/// Error kinds surfaced by a sequence-number reader.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("fan-out to node {0} failed: {1}")]
    NodeFetchFailed(String, String),
    #[error("reader returned {got} seqnos, expected {want}")]
    IncompleteSeqnos { got: usize, want: usize },
    #[error("reader for bucket is closed")]
    ConnClosed,
    #[error("bucket is error-tainted, teardown in progress")]
    ErrorTainted,
}

pub type Result<T> = std::result::Result<T, Error>;
