use serde::{Deserialize, Serialize};

use crate::ids::{DefnId, InstId, PartnId, ReplicaId};
use crate::vbucket::Bucket;

/// Lifecycle state of an index instance.
///
/// Ordered by "usefulness" for tiebreaks, per spec: a node holding a
/// `Deleted`/`Error` instance is preferred as a drop/move candidate over
/// one holding `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexState {
    Deleted,
    Error,
    Created,
    Ready,
    Initial,
    Catchup,
    Active,
}

impl IndexState {
    /// Numeric usefulness rank; higher is more useful to keep in place.
    pub fn rank(self) -> u8 {
        match self {
            IndexState::Deleted => 0,
            IndexState::Error => 1,
            IndexState::Created => 2,
            IndexState::Ready => 3,
            IndexState::Initial => 4,
            IndexState::Catchup => 5,
            IndexState::Active => 6,
        }
    }
}

/// Numeric sizing hints used by the planner's cost model and sizing method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingHints {
    pub avg_key_size_bytes: u64,
    pub doc_count: u64,
    pub mutation_rate: f64,
    pub scan_rate: f64,
}

impl SizingHints {
    /// Whether this index carries no usable load statistics yet
    /// ("NoUsage" in the planner's neighbor-generation rules).
    pub fn is_no_usage(&self) -> bool {
        self.doc_count == 0 && self.mutation_rate == 0.0 && self.scan_rate == 0.0
    }

    /// Rough estimate of in-memory footprint, used by the cost model's
    /// memory deviation component.
    pub fn estimated_memory_bytes(&self) -> u64 {
        self.avg_key_size_bytes.saturating_mul(self.doc_count)
    }
}

impl Default for SizingHints {
    fn default() -> Self {
        Self {
            avg_key_size_bytes: 0,
            doc_count: 0,
            mutation_rate: 0.0,
            scan_rate: 0.0,
        }
    }
}

/// A globally unique index definition: keyspace, shape, and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefn {
    pub defn_id: DefnId,
    pub name: String,
    pub bucket: Bucket,
    pub scope: String,
    pub collection: String,
    pub expressions: Vec<String>,
    pub num_partitions: u32,
    pub num_replica: u32,
    pub sizing: SizingHints,
}

impl IndexDefn {
    /// The keyspace this definition projects, for duplicate-name checks
    /// (`IndexAlreadyExists`).
    pub fn keyspace(&self) -> (&str, &str, &str) {
        (self.bucket.as_str(), self.scope.as_str(), self.collection.as_str())
    }
}

/// A materialization of an [`IndexDefn`]: one replica, one partition set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInstance {
    pub inst_id: InstId,
    pub defn_id: DefnId,
    pub replica_id: ReplicaId,
    pub state: IndexState,
    /// Non-partitioned indexes carry a single `PartnId(0)`.
    pub partitions: Vec<PartnId>,
}

impl IndexInstance {
    pub fn is_partitioned(&self) -> bool {
        !(self.partitions.len() == 1 && self.partitions[0] == PartnId(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ordering_matches_usefulness() {
        assert!(IndexState::Deleted < IndexState::Error);
        assert!(IndexState::Error < IndexState::Created);
        assert!(IndexState::Created < IndexState::Ready);
        assert!(IndexState::Ready < IndexState::Initial);
        assert!(IndexState::Initial < IndexState::Catchup);
        assert!(IndexState::Catchup < IndexState::Active);
    }

    #[test]
    fn no_usage_detection() {
        let hints = SizingHints::default();
        assert!(hints.is_no_usage());
        let hints = SizingHints {
            doc_count: 10,
            ..SizingHints::default()
        };
        assert!(!hints.is_no_usage());
    }
}
