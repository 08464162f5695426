use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use secidx_types::{IndexUsage, InstId, NodeId, NodeUuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMode {
    Move,
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
    Created,
    ShardTokenCreated,
}

/// A declarative instruction to move one index replica-partition set
/// between two nodes (spec.md §6 "Transfer token").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferToken {
    pub id: String,
    pub master_id: NodeId,
    pub source_uuid: NodeUuid,
    pub dest_uuid: NodeUuid,
    pub rebal_id: String,
    pub state: TokenState,
    pub inst_id: InstId,
    pub index_inst: IndexUsage,
    pub transfer_mode: TransferMode,
    pub source_host: NodeId,
    pub dest_host: NodeId,
}

/// Variant used by the tenant-aware rebalancer to move a whole shard
/// group atomically, linked to its mirror-pair token via
/// `sibling_token_id` (spec.md §4.H step 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardTransferToken {
    pub id: String,
    pub dest_uuid: NodeUuid,
    pub rebal_id: String,
    pub state: TokenState,
    pub shard_ids: Vec<u64>,
    pub index_insts: Vec<IndexUsage>,
    pub inst_ids: Vec<InstId>,
    pub real_inst_ids: Vec<InstId>,
    pub inst_rename_map: Option<HashMap<InstId, String>>,
    pub sibling_token_id: Option<String>,
    pub transfer_mode: TransferMode,
    pub source_host: NodeId,
    pub dest_host: NodeId,
}

pub fn new_token_id() -> String {
    format!("TransferToken{}", uuid::Uuid::new_v4())
}
