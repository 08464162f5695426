use std::fmt;

/// Collection id a request is tagged with, or the bucket-level sentinel
/// for collection-unaware requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid(u32);

impl Cid {
    /// Sentinel used when the caller doesn't distinguish collections.
    pub const BUCKET: Cid = Cid(u32::MAX);

    /// Cid used for the implicit default collection once the cluster
    /// has crossed into the collection-aware protocol.
    pub const DEFAULT_COLLECTION: Cid = Cid(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn is_bucket_level(self) -> bool {
        self == Self::BUCKET
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bucket_level() {
            write!(f, "cid(bucket)")
        } else {
            write!(f, "cid({})", self.0)
        }
    }
}
