use thiserror::Error;

/// Semantic-fault kind carried through a [`Error::Semantic`] without
/// collapsing it to [`Error::Internal`] (spec.md §7: "Semantic faults
/// propagate unchanged"). Each variant corresponds to one row of the
/// error taxonomy table whose policy is "surface" rather than "retry"
/// or "500, stack logged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticKind {
    /// `TopicMissing` / `FeedNotFound` -- registry mismatch, surface, no retry.
    TopicMissing,
    /// `TopicExist` / `FeedAlreadyExists` -- registry mismatch, surface, no retry.
    TopicExist,
    /// `InvalidBucket` -- request references an absent entity, surface, no retry.
    InvalidBucket,
    /// `InvalidKVaddrs` -- malformed endpoint list, surface, no retry.
    InvalidKVaddrs,
    /// `InvalidVbucketBranch` -- vbuuid not in failover log, client must rollback.
    InvalidVbucketBranch,
    /// `ResponseTimeout` -- DCP StreamBegin missed its deadline, surface to caller.
    ResponseTimeout,
    /// `InconsistentFeed` -- topic reopened with a different schema, surface, no retry.
    InconsistentFeed,
    /// `ConnClosed` -- actor already torn down, caller retries with a fresh handle.
    ConnClosed,
}

/// Admin dispatcher errors (spec.md §7).
#[derive(Error, Debug)]
pub enum Error {
    /// Register/unregister attempted after the listener started.
    #[error("cannot register or unregister handlers after the listener has started")]
    RegisteringRequest,

    /// No handler registered for this path.
    #[error("no handler registered for path {0:?}")]
    PathNotFound(String),

    /// Body failed to decode into the registered prototype.
    #[error("failed to decode request body: {0}")]
    DecodeRequest(String),

    /// Response failed to encode.
    #[error("failed to encode response: {0}")]
    EncodeResponse(String),

    /// Credential validation rejected the request.
    #[error("unauthorized")]
    Unauthorized,

    /// A named semantic fault from a downstream operation (feed, projector),
    /// propagated with its kind intact rather than collapsed to `Internal`.
    #[error("semantic fault ({kind:?}): {detail}")]
    Semantic { kind: SemanticKind, detail: String },

    /// Handler panicked; recovered at the dispatch boundary.
    #[error("internal error: handler panicked")]
    Internal,
}

pub type Result<T> = std::result::Result<T, Error>;
