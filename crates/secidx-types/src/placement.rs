use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::ids::{DefnId, InstId, PartnId, ReplicaId};
use crate::index::{IndexState, SizingHints};
use crate::vbucket::Bucket;

/// Identifier for one physical indexer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Stable identity surviving node restart, used to tell "the same node
/// rejoining" apart from "a freshly provisioned replacement".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeUuid(pub u128);

/// Fault-domain tag on a node. Replicas of the same partition prefer
/// pairwise-distinct server groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerGroup(pub String);

/// One index replica-partition hosted on (or being moved to/from) a node.
///
/// `initial_node`/`dest_node` are populated by the planner while it
/// computes a placement; they are `None` on input `IndexerNode::indexes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexUsage {
    pub defn_id: DefnId,
    pub inst_id: InstId,
    pub replica_id: ReplicaId,
    pub partitions: Vec<PartnId>,
    pub state: IndexState,
    pub bucket: Bucket,
    pub sizing: SizingHints,
    pub initial_node: Option<NodeId>,
    pub dest_node: Option<NodeId>,
}

impl IndexUsage {
    /// Memory footprint contributed to whichever node currently hosts this
    /// usage, per the cost model's memory deviation component.
    pub fn memory_bytes(&self) -> u64 {
        self.sizing.estimated_memory_bytes()
    }

    pub fn is_moving(&self) -> bool {
        matches!((self.initial_node, self.dest_node), (Some(a), Some(b)) if a != b)
    }
}

/// A physical indexer node and the index usages it currently hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerNode {
    pub node_id: NodeId,
    pub node_uuid: NodeUuid,
    pub server_group: ServerGroup,
    pub mem_quota: u64,
    pub cpu_quota: f64,
    pub indexes: Vec<IndexUsage>,
    /// Marked for removal from the cluster; the planner must evacuate it.
    pub is_delete: bool,
    /// Newly added, empty, and eligible to receive transfers.
    pub is_new: bool,
}

impl IndexerNode {
    pub fn used_memory_bytes(&self) -> u64 {
        self.indexes.iter().map(IndexUsage::memory_bytes).sum()
    }

    pub fn used_cpu(&self) -> f64 {
        self.indexes
            .iter()
            .map(|u| u.sizing.mutation_rate + u.sizing.scan_rate)
            .sum()
    }

    pub fn has_replica(&self, defn_id: DefnId, partn_id: PartnId) -> bool {
        self.indexes
            .iter()
            .any(|u| u.defn_id == defn_id && u.partitions.contains(&partn_id))
    }
}

/// An ordered pair of nodes in distinct server groups hosting matching
/// replica sets, used by the tenant-aware (serverless) planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCluster {
    pub nodes: [NodeId; 2],
}

impl SubCluster {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self { nodes: [a, b] }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// The other node of the pair, given one of its members.
    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        if self.nodes[0] == node {
            Some(self.nodes[1])
        } else if self.nodes[1] == node {
            Some(self.nodes[0])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcluster_sibling_lookup() {
        let sc = SubCluster::new(NodeId(1), NodeId(2));
        assert_eq!(sc.sibling(NodeId(1)), Some(NodeId(2)));
        assert_eq!(sc.sibling(NodeId(2)), Some(NodeId(1)));
        assert_eq!(sc.sibling(NodeId(3)), None);
    }

    #[test]
    fn memory_bytes_from_sizing() {
        let usage = IndexUsage {
            defn_id: DefnId::new(1),
            inst_id: InstId::new(1),
            replica_id: ReplicaId(0),
            partitions: vec![PartnId(0)],
            state: IndexState::Active,
            bucket: Bucket::new("b"),
            sizing: SizingHints {
                avg_key_size_bytes: 100,
                doc_count: 1000,
                mutation_rate: 0.0,
                scan_rate: 0.0,
            },
            initial_node: None,
            dest_node: None,
        };
        assert_eq!(usage.memory_bytes(), 100_000);
    }
}
