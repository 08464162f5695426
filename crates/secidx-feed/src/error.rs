/// Error kinds a feed operation can surface (spec.md §4.E, §7).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed kv node address list")]
    InvalidKVaddrs,
    #[error("topic already opened with a different bucket/instance schema")]
    InconsistentFeed,
    #[error("vbuuid not present in failover log for vb {0}")]
    InvalidVbucketBranch(u16),
    #[error("no StreamBegin within deadline for vb {0}")]
    ResponseTimeout(u16),
    #[error("dcp layer error on vb {0}: {1}")]
    DcpError(u16, String),
    #[error("topic has no feed")]
    TopicMissing,
    #[error("bucket not part of this topic's feed")]
    InvalidBucket,
    #[error("feed actor is closed")]
    ConnClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
