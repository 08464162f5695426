//! # secidx-planner: placement planner
//!
//! Implements spec.md §4.G/§4.H: a simulated-annealing solver for
//! general clusters ([`anneal`]) plus cost ([`cost`]), constraint
//! ([`violation`]), post-processing ([`postprocess`]), and replica-drop
//! ([`replica_drop`]) support, and a tenant-aware (serverless) planner
//! ([`tenant`]) for sub-cluster placement, repair, and eviction.
//!
//! The transfer-token and shard-transfer-token wire shapes live in
//! [`token`].

pub mod anneal;
pub mod config;
pub mod cost;
pub mod error;
pub mod postprocess;
pub mod replica_drop;
pub mod tenant;
pub mod token;
pub mod violation;

pub use anneal::{anneal, find_neighbor};
pub use config::AnnealConfig;
pub use cost::{cost, CostWeights};
pub use error::{Error, Result};
pub use postprocess::{emit_transfer_tokens, filter_solution};
pub use replica_drop::{select_duplicates_to_remove, Backlog};
pub use tenant::{
    discover_subclusters, execute_plan2, execute_tenant_aware_rebalance, repair_replica, select_evictions,
    RebalanceOutcome, TenantNode, UsageThreshold,
};
pub use token::{ShardTransferToken, TokenState, TransferMode, TransferToken};
pub use violation::{check_move, ViolationCode};

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use secidx_types::{Bucket, DefnId, IndexState, IndexUsage, InstId, NodeId, NodeUuid, PartnId, ReplicaId, ServerGroup, SizingHints};

    use crate::anneal::{anneal, find_neighbor};
    use crate::config::AnnealConfig;
    use crate::postprocess::filter_solution;

    fn arb_node(id: u32, sg: u32, index_defs: Vec<u64>) -> secidx_types::IndexerNode {
        secidx_types::IndexerNode {
            node_id: NodeId(id),
            node_uuid: NodeUuid(id as u128),
            server_group: ServerGroup(format!("sg{sg}")),
            mem_quota: 1_000_000,
            cpu_quota: 1000.0,
            indexes: index_defs
                .into_iter()
                .map(|d| IndexUsage {
                    defn_id: DefnId::new(d),
                    inst_id: InstId::new(d),
                    replica_id: ReplicaId(0),
                    partitions: vec![PartnId(0)],
                    state: IndexState::Active,
                    bucket: Bucket::new("b"),
                    sizing: SizingHints { avg_key_size_bytes: 1, doc_count: 100, mutation_rate: 0.0, scan_rate: 0.0 },
                    initial_node: Some(NodeId(id)),
                    dest_node: Some(NodeId(id)),
                })
                .collect(),
            is_delete: false,
            is_new: false,
        }
    }

    fn defn_multiset(nodes: &[secidx_types::IndexerNode]) -> Vec<u64> {
        let mut v: Vec<u64> = nodes.iter().flat_map(|n| n.indexes.iter()).map(|u| u.defn_id.into()).collect();
        v.sort_unstable();
        v
    }

    proptest! {
        #[test]
        fn neighbor_generation_preserves_index_multiset(seed in 0u32..50) {
            let nodes = vec![
                arb_node(1, 1, (1..=(seed % 8 + 1) as u64).collect()),
                arb_node(2, 2, vec![]),
                arb_node(3, 1, vec![]),
            ];
            let before = defn_multiset(&nodes);
            if let Some(next) = find_neighbor(&nodes) {
                prop_assert_eq!(defn_multiset(&next), before);
            }
        }

        #[test]
        fn anneal_never_loses_or_duplicates_indexes(seed in 0u32..20) {
            let nodes = vec![
                arb_node(1, 1, (1..=(seed % 6 + 1) as u64).collect()),
                arb_node(2, 2, vec![]),
            ];
            let before = defn_multiset(&nodes);
            let result = anneal(&nodes, &AnnealConfig { iterations_per_temp: 20, ..AnnealConfig::default() });
            prop_assert_eq!(defn_multiset(&result), before);
        }

        #[test]
        fn filter_solution_is_idempotent_under_random_chains(a in 1u32..4, b in 1u32..4, c in 1u32..4) {
            let mut nodes = vec![
                secidx_types::IndexerNode {
                    node_id: NodeId(1),
                    node_uuid: NodeUuid(1),
                    server_group: ServerGroup("sg".into()),
                    mem_quota: 0,
                    cpu_quota: 0.0,
                    indexes: vec![IndexUsage {
                        defn_id: DefnId::new(1),
                        inst_id: InstId::new(1),
                        replica_id: ReplicaId(0),
                        partitions: vec![PartnId(0)],
                        state: IndexState::Active,
                        bucket: Bucket::new("b"),
                        sizing: SizingHints::default(),
                        initial_node: Some(NodeId(a)),
                        dest_node: Some(NodeId(b)),
                    }],
                    is_delete: false,
                    is_new: false,
                },
                secidx_types::IndexerNode {
                    node_id: NodeId(2),
                    node_uuid: NodeUuid(2),
                    server_group: ServerGroup("sg".into()),
                    mem_quota: 0,
                    cpu_quota: 0.0,
                    indexes: vec![IndexUsage {
                        defn_id: DefnId::new(1),
                        inst_id: InstId::new(2),
                        replica_id: ReplicaId(1),
                        partitions: vec![PartnId(0)],
                        state: IndexState::Active,
                        bucket: Bucket::new("b"),
                        sizing: SizingHints::default(),
                        initial_node: Some(NodeId(b)),
                        dest_node: Some(NodeId(c)),
                    }],
                    is_delete: false,
                    is_new: false,
                },
            ];
            filter_solution(&mut nodes);
            let once = nodes.clone();
            filter_solution(&mut nodes);
            prop_assert_eq!(nodes, once);
        }
    }
}
