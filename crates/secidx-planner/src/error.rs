/// Error kinds a planning run can surface (spec.md §4.G/§4.H, §7).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no placement satisfies server-group/HA constraints")]
    PlannerConstraintViolation,
    #[error("no subcluster below the high watermark")]
    PlannerMaxResourceUsageLimit,
    #[error("no low-watermark target has capacity for eviction")]
    NotEnoughCapacity,
    #[error("bucket index count at or above the serverless limit")]
    IndexBucketLimitReached,
    #[error("index scope count at or above the serverless limit")]
    IndexScopeLimitReached,
    #[error("an index with this keyspace and name already exists")]
    IndexAlreadyExists,
}

pub type Result<T> = std::result::Result<T, Error>;
