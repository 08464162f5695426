use secidx_types::TopicId;
use thiserror::Error;

/// Projector-level errors (spec.md §4.F/§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("no feed registered for topic {0}")]
    FeedNotFound(TopicId),

    #[error("feed already registered for topic {0}")]
    FeedAlreadyExists(TopicId),

    #[error("failed to decode request body: {0}")]
    Decode(String),

    #[error("failed to encode response: {0}")]
    Encode(String),

    #[error(transparent)]
    Feed(#[from] secidx_feed::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
